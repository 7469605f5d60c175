use rand::RngCore;

/// Generate a CSRF state token: 32 bytes from the OS RNG, hex-encoded
/// to 64 characters.
pub fn generate_state_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
