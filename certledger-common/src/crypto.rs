//! Cryptographic utilities and hash operations
//!
//! Everything here is stateless and safe to call from any number of threads.

use crate::types::{admission::SENTINEL_CHAR, Fingerprint, Hash};
use sha2::{Digest, Sha256};
use std::io::Read;

/// Cryptographic constants
pub const HASH_SIZE: usize = crate::types::sizes::HASH_SIZE;
/// Length of a hex fingerprint
pub const FINGERPRINT_HEX_LEN: usize = crate::types::sizes::FINGERPRINT_HEX_LEN;

/// Read buffer used when fingerprinting streams
const STREAM_CHUNK_SIZE: usize = 8192;

/// Central cryptographic utilities
pub struct CryptoUtils;

impl CryptoUtils {
    /// Compute SHA-256 hash of data
    pub fn hash(data: &[u8]) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        result.into()
    }

    /// Fingerprint raw bytes. Empty input is valid and yields the SHA-256 of
    /// zero bytes.
    pub fn fingerprint_bytes(data: &[u8]) -> Fingerprint {
        Self::hash_to_hex(&Self::hash(data))
    }

    /// Fingerprint the UTF-8 encoding of `text`
    pub fn fingerprint_text(text: &str) -> Fingerprint {
        Self::fingerprint_bytes(text.as_bytes())
    }

    /// Fingerprint everything `reader` yields, in fixed-size chunks.
    ///
    /// Produces the same digest as [`CryptoUtils::fingerprint_bytes`] over the
    /// concatenated contents.
    pub fn fingerprint_reader<R: Read>(mut reader: R) -> std::io::Result<Fingerprint> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; STREAM_CHUNK_SIZE];
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..read]);
        }
        let hash: Hash = hasher.finalize().into();
        Ok(Self::hash_to_hex(&hash))
    }

    /// Whether `fingerprint` starts with `difficulty` sentinel characters
    pub fn meets_difficulty(fingerprint: &str, difficulty: usize) -> bool {
        fingerprint.len() >= difficulty
            && fingerprint
                .chars()
                .take(difficulty)
                .all(|c| c == SENTINEL_CHAR)
    }

    /// Convert hash to hex string
    pub fn hash_to_hex(hash: &Hash) -> String {
        hex::encode(hash)
    }
}
