//! Password reset tokens.
//!
//! The plain token goes to the user by e-mail; only its SHA-256 hash is
//! stored.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// A freshly issued reset token.
#[derive(Debug, Clone)]
pub struct ResetToken {
    /// Token sent to the user.
    pub token: String,
    /// Hex SHA-256 of `token`, kept in the store.
    pub hash: String,
}

impl ResetToken {
    /// Generates a token from 32 random bytes.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..32).map(|_| rng.random::<u8>()).collect();
        let token = URL_SAFE_NO_PAD.encode(&bytes);
        let hash = hash_reset_token(&token);

        Self { token, hash }
    }
}

/// Hashes a reset token for storage and lookup.
pub fn hash_reset_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
