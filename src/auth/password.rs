//! Password hashing with bcrypt

use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn default_cost() -> u32 {
    DEFAULT_COST
}

/// A malformed stored hash counts as a mismatch rather than an error
pub fn password_matches(password: &str, stored_hash: &str) -> bool {
    verify(password, stored_hash).unwrap_or(false)
}
