pub mod user;

pub use user::{Account, AccountStatus, PendingUser, RegistrationStats, Role};
