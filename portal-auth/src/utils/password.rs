use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Newtype for password to prevent accidental logging
#[derive(Debug, Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Newtype for password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password with SHA-256, hex-encoded.
///
/// This is the digest format the account store compares against at login.
pub fn hash_password(password: &Password) -> PasswordHashString {
    let digest = Sha256::digest(password.as_str().as_bytes());
    PasswordHashString::new(hex::encode(digest))
}

/// Verify a password against a stored hash using constant-time comparison.
pub fn verify_password(password: &Password, password_hash: &PasswordHashString) -> bool {
    let computed = hash_password(password);
    let computed_bytes = computed.as_str().as_bytes();
    let stored_bytes = password_hash.as_str().as_bytes();

    if computed_bytes.len() != stored_bytes.len() {
        return false;
    }

    computed_bytes.ct_eq(stored_bytes).into()
}

/// Generate a throwaway local password: 16 random bytes, hex-encoded.
///
/// Used to satisfy the store's password-required invariant for
/// OAuth-provisioned accounts; never shown to the user.
pub fn generate_random_password() -> Password {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    Password::new(hex::encode(bytes))
}
