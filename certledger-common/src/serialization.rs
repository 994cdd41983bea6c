//! Canonical encoding for everything CertLedger hashes.
//!
//! Fingerprints are recomputed from stored fields during validation, so the
//! bytes produced here must never depend on map iteration order, and every
//! value must parse back to the same bytes.

use crate::{
    crypto::CryptoUtils,
    error::{LedgerError, LedgerResult},
    types::Fingerprint,
};
use serde::Serialize;

/// Trait for types whose fingerprint is computed over a canonical encoding.
///
/// The default encoding is compact JSON: struct fields appear in declaration
/// order and maps must be `BTreeMap` so keys come out sorted. Implementors
/// with stricter needs override [`CanonicalEncode::canonical_bytes`].
pub trait CanonicalEncode: Serialize {
    /// Encode into the exact byte sequence that gets hashed
    fn canonical_bytes(&self) -> LedgerResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| LedgerError::serialization(e.to_string()))
    }

    /// Encoded form as text, for logging and debugging
    fn canonical_string(&self) -> LedgerResult<String> {
        let bytes = self.canonical_bytes()?;
        String::from_utf8(bytes).map_err(|e| LedgerError::serialization(e.to_string()))
    }
}

/// Hash computation utilities with standardized patterns
pub struct HashCompute;

impl HashCompute {
    /// Fingerprint the canonical encoding of `data`
    pub fn fingerprint_data<T: CanonicalEncode + ?Sized>(data: &T) -> LedgerResult<Fingerprint> {
        let encoded = data.canonical_bytes()?;
        Ok(CryptoUtils::fingerprint_bytes(&encoded))
    }
}
