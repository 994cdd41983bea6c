//! # CertLedger Common
//!
//! Common utilities, traits, and standardized patterns for the CertLedger
//! integrity chain. This crate is the single source of truth for everything the
//! ledger and its callers must agree on bit-for-bit: fingerprint format, the
//! canonical encoding that block fingerprints are computed over, and the error
//! taxonomy surfaced to the web layer.
//!
//! ## Modules
//!
//! - **crypto**: SHA-256 fingerprinting (the hash engine) and hex helpers
//! - **serialization**: Canonical encoding used for every hashed structure
//! - **validation**: Input validation utilities
//! - **types**: Common type definitions and constants
//! - **error**: Standardized error types
//!
//! ## Example Usage
//!
//! ```rust
//! use certledger_common::prelude::*;
//!
//! let fingerprint = CryptoUtils::fingerprint_bytes(b"cert-A");
//! assert_eq!(fingerprint.len(), FINGERPRINT_HEX_LEN);
//! assert!(ValidationUtils::validate_fingerprint_hex(&fingerprint).is_ok());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod crypto;
pub mod error;
pub mod serialization;
pub mod types;
pub mod validation;

/// Re-export commonly used types and traits
pub mod prelude {
    pub use crate::crypto::{CryptoUtils, FINGERPRINT_HEX_LEN, HASH_SIZE};
    pub use crate::error::{IntegrityViolation, LedgerError, LedgerResult};
    pub use crate::serialization::{CanonicalEncode, HashCompute};
    pub use crate::types::{
        BlockIndex, Fingerprint, Nonce, TimestampMillis, ZERO_FINGERPRINT,
    };
    pub use crate::validation::ValidationUtils;

    // Re-export essential external crates
    pub use anyhow::Result;
    pub use serde::{Deserialize, Serialize};
}

/// CertLedger Common crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

