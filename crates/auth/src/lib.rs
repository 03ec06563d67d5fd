//! Authentication for Readlog.
//!
//! This crate provides:
//! - JWT access token generation and validation
//! - Argon2 password hashing
//! - Single-use password reset tokens

mod error;
mod jwt;
pub mod password;
pub mod reset;

pub use error::*;
pub use jwt::*;
pub use password::{hash_password, validate_password_strength, verify_password};
pub use reset::{ResetToken, hash_reset_token};

/// Default JWT expiration time in hours.
pub const DEFAULT_JWT_EXPIRATION_HOURS: u64 = 24;

/// Default JWT issuer.
pub const DEFAULT_JWT_ISSUER: &str = "readlog";

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;
