use rand::Rng;

/// Length in bytes of the randomness behind an invitation token
pub const TOKEN_BYTES: usize = 16;

/// Generate a random hex string from `length` random bytes
pub fn generate_random_string(length: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..length).map(|_| rng.random()).collect();
    hex::encode(bytes)
}

/// Generate an invitation token (lowercase hex, alphanumeric only)
pub fn generate_invitation_token() -> String {
    generate_random_string(TOKEN_BYTES)
}

/// Tokens arriving from links must be non-empty and alphanumeric
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric())
}
