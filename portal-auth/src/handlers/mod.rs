pub mod oauth;
pub mod registration;

pub use oauth::{authorize, callback};
pub use registration::register;
