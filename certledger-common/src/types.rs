//certledger-common/src/types.rs
//! Common type definitions and constants used throughout CertLedger

/// Fingerprint - lowercase hex SHA-256 digest (64 characters)
pub type Fingerprint = String;

/// Position of a block in the chain, genesis is 0
pub type BlockIndex = u64;

/// Admission search counter
pub type Nonce = u64;

/// Milliseconds since the Unix epoch. Integral so canonical encoding never
/// depends on float formatting.
pub type TimestampMillis = u64;

/// Hash type - 32-byte SHA-256
pub type Hash = [u8; 32];

/// Previous-fingerprint sentinel carried by the genesis block
pub const ZERO_FINGERPRINT: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Cryptographic sizes
pub mod sizes {
    /// Hash size in bytes (SHA-256)
    pub const HASH_SIZE: usize = 32;

    /// Hex-encoded hash length
    pub const FINGERPRINT_HEX_LEN: usize = HASH_SIZE * 2;
}

/// Admission rule constants
pub mod admission {
    /// Character every admitted fingerprint must start with, repeated
    /// `difficulty` times
    pub const SENTINEL_CHAR: char = '0';

    /// Default number of leading sentinel characters
    pub const DEFAULT_DIFFICULTY: usize = 1;

    /// Upper bound accepted by configuration, one per hex character
    pub const MAX_DIFFICULTY: usize = super::sizes::FINGERPRINT_HEX_LEN;
}
