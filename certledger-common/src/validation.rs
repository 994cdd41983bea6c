//! Input validation utilities and patterns

use crate::{
    error::{LedgerError, LedgerResult},
    types::sizes::HASH_SIZE,
};

/// Validation utilities for common data types
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate hex string format and length
    pub fn validate_hex_string(hex_str: &str, expected_length: usize) -> LedgerResult<()> {
        if hex_str.is_empty() {
            return Err(LedgerError::validation("Hex string cannot be empty"));
        }

        if hex_str.len() != expected_length * 2 {
            return Err(LedgerError::validation(format!(
                "Invalid hex length: expected {}, got {}",
                expected_length * 2,
                hex_str.len()
            )));
        }

        if !hex_str.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerError::validation("Invalid hex characters"));
        }

        Ok(())
    }

    /// Validate a fingerprint as produced by the hash engine: 64 lowercase
    /// hex characters
    pub fn validate_fingerprint_hex(hex_str: &str) -> LedgerResult<()> {
        Self::validate_hex_string(hex_str, HASH_SIZE)?;
        if hex_str.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(LedgerError::validation(
                "Fingerprint must be lowercase hex",
            ));
        }
        Ok(())
    }

    /// Validate string length
    pub fn validate_string_length(s: &str, max_len: usize, field_name: &str) -> LedgerResult<()> {
        if s.len() > max_len {
            return Err(LedgerError::validation(format!(
                "{} too long: {} bytes (max {})",
                field_name,
                s.len(),
                max_len
            )));
        }
        Ok(())
    }
}
