//certledger-common/src/error.rs
//! Standardized error types for all CertLedger components

use crate::types::BlockIndex;
use std::sync::PoisonError;
use std::sync::{MutexGuard, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Standard result type used throughout CertLedger
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// First integrity problem found while walking a chain.
///
/// Reported by chain validation; a violation is a result, not a failure of the
/// validating call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// Stored fingerprint no longer matches the block's fields
    #[error("Block {index}: stored fingerprint {stored} does not match recomputed {computed}")]
    FingerprintMismatch {
        /// Offending block
        index: BlockIndex,
        /// Fingerprint stored in the block
        stored: String,
        /// Fingerprint recomputed from the block's fields
        computed: String,
    },

    /// Fingerprint does not satisfy the admission rule
    #[error("Block {index}: fingerprint {fingerprint} does not satisfy difficulty {difficulty}")]
    AdmissionUnsatisfied {
        /// Offending block
        index: BlockIndex,
        /// The block's fingerprint
        fingerprint: String,
        /// Leading zeros the rule requires
        difficulty: usize,
    },

    /// Block does not point at its predecessor
    #[error("Block {index}: previous fingerprint {found} does not link to {expected}")]
    BrokenLink {
        /// Block whose link is broken
        index: BlockIndex,
        /// Fingerprint of the preceding block
        expected: String,
        /// Previous fingerprint the block carries
        found: String,
    },

    /// Block index differs from its position
    #[error("Block at position {position} carries index {found}")]
    IndexGap {
        /// Position in the block list
        position: usize,
        /// Index stored in the block at that position
        found: BlockIndex,
    },

    /// Chain is empty or its first block lacks the zero sentinel
    #[error("Genesis block is malformed: {0}")]
    BadGenesis(String),
}

impl IntegrityViolation {
    /// Index of the offending block
    pub fn index(&self) -> BlockIndex {
        match self {
            Self::FingerprintMismatch { index, .. }
            | Self::AdmissionUnsatisfied { index, .. }
            | Self::BrokenLink { index, .. } => *index,
            Self::IndexGap { position, .. } => *position as BlockIndex,
            Self::BadGenesis(_) => 0,
        }
    }
}

/// Comprehensive error type for all CertLedger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Payload has no canonical encoding or an upload failed its form
    /// checks; the chain is left unchanged
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Index or fingerprint lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Admission search gave up after the configured number of attempts
    #[error("Admission search exhausted after {attempts} attempts at difficulty {difficulty}")]
    AdmissionTimeout {
        /// Fingerprints computed before giving up
        attempts: u64,
        /// Leading zeros the rule requires
        difficulty: usize,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// A thread panicked while holding a chain lock
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IO(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// External library errors
    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl LedgerError {
    /// Create a new invalid payload error
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error is an expected lookup miss rather than a fault
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl<T> From<PoisonError<RwLockReadGuard<'_, T>>> for LedgerError {
    fn from(err: PoisonError<RwLockReadGuard<'_, T>>) -> Self {
        LedgerError::LockPoisoned(err.to_string())
    }
}

impl<T> From<PoisonError<RwLockWriteGuard<'_, T>>> for LedgerError {
    fn from(err: PoisonError<RwLockWriteGuard<'_, T>>) -> Self {
        LedgerError::LockPoisoned(err.to_string())
    }
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for LedgerError {
    fn from(err: PoisonError<MutexGuard<'_, T>>) -> Self {
        LedgerError::LockPoisoned(err.to_string())
    }
}

/// Convenience macro for creating LedgerError instances
#[macro_export]
macro_rules! ledger_error {
    ($variant:ident, $($arg:tt)*) => {
        $crate::error::LedgerError::$variant(format!($($arg)*))
    };
}

/// Convenience macro for returning early with a LedgerError
#[macro_export]
macro_rules! ledger_bail {
    ($variant:ident, $($arg:tt)*) => {
        return Err($crate::ledger_error!($variant, $($arg)*))
    };
}
