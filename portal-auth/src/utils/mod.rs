pub mod password;
pub mod signature;
pub mod state;

pub use password::{generate_random_password, hash_password, verify_password, Password, PasswordHashString};
pub use signature::{generate_signature, verify_signature};
pub use state::generate_state_token;
