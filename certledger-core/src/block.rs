//! Sealed blocks.
//!
//! A block's fingerprint is the SHA-256 of the compact JSON of
//! `{index, timestamp, payload, previous_fingerprint, nonce}` in exactly that
//! order. Validation recomputes it from the stored fields, so the encoding
//! here is part of the ledger's contract with anything that stores exports.

use certledger_common::error::{IntegrityViolation, LedgerResult};
use certledger_common::serialization::{CanonicalEncode, HashCompute};
use certledger_common::types::{BlockIndex, Fingerprint, Nonce, TimestampMillis, ZERO_FINGERPRINT};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::admission::AdmissionRule;
use crate::clock::Clock;
use crate::payload::CertificatePayload;

/// Exactly the fields covered by a block fingerprint, in canonical order
#[derive(Serialize)]
struct BlockPreimage<'a> {
    index: BlockIndex,
    timestamp: TimestampMillis,
    payload: &'a CertificatePayload,
    previous_fingerprint: &'a str,
    nonce: Nonce,
}

impl CanonicalEncode for BlockPreimage<'_> {}

/// Fingerprint a candidate block from its fields
pub fn compute_fingerprint(
    index: BlockIndex,
    timestamp: TimestampMillis,
    payload: &CertificatePayload,
    previous_fingerprint: &str,
    nonce: Nonce,
) -> LedgerResult<Fingerprint> {
    HashCompute::fingerprint_data(&BlockPreimage {
        index,
        timestamp,
        payload,
        previous_fingerprint,
        nonce,
    })
}

/// One sealed record in the ledger. Never mutated once sealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) index: BlockIndex,
    pub(crate) timestamp: TimestampMillis,
    pub(crate) payload: CertificatePayload,
    pub(crate) previous_fingerprint: Fingerprint,
    pub(crate) nonce: Nonce,
    pub(crate) fingerprint: Fingerprint,
}

/// Run the admission search for a block at `index` and return it sealed.
///
/// The timestamp is read once, before the search starts.
pub fn seal_block(
    index: BlockIndex,
    payload: CertificatePayload,
    previous_fingerprint: &str,
    clock: &dyn Clock,
    rule: &AdmissionRule,
) -> LedgerResult<Block> {
    let timestamp = clock.now_millis();
    let admission = rule.search(|nonce| {
        compute_fingerprint(index, timestamp, &payload, previous_fingerprint, nonce)
    })?;

    Ok(Block {
        index,
        timestamp,
        payload,
        previous_fingerprint: previous_fingerprint.to_string(),
        nonce: admission.nonce,
        fingerprint: admission.fingerprint,
    })
}

impl Block {
    /// Seal the first block of a chain. Its previous fingerprint is the
    /// all-zero sentinel.
    pub fn genesis(
        payload: CertificatePayload,
        clock: &dyn Clock,
        rule: &AdmissionRule,
    ) -> LedgerResult<Self> {
        seal_block(0, payload, ZERO_FINGERPRINT, clock, rule)
    }

    pub fn index(&self) -> BlockIndex {
        self.index
    }

    pub fn timestamp(&self) -> TimestampMillis {
        self.timestamp
    }

    pub fn payload(&self) -> &CertificatePayload {
        &self.payload
    }

    pub fn previous_fingerprint(&self) -> &str {
        &self.previous_fingerprint
    }

    pub fn nonce(&self) -> Nonce {
        self.nonce
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Leading characters of the fingerprint, for logs
    pub fn short_fingerprint(&self) -> &str {
        self.fingerprint.get(..16).unwrap_or(&self.fingerprint)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Fingerprint recomputed from the stored fields
    pub fn recompute_fingerprint(&self) -> LedgerResult<Fingerprint> {
        compute_fingerprint(
            self.index,
            self.timestamp,
            &self.payload,
            &self.previous_fingerprint,
            self.nonce,
        )
    }

    /// Check that the stored fingerprint matches the stored fields and
    /// satisfies `rule`.
    pub fn verify_seal(&self, rule: &AdmissionRule) -> Result<(), IntegrityViolation> {
        // A payload that no longer encodes cannot match its fingerprint.
        let computed = self.recompute_fingerprint().unwrap_or_default();
        if computed != self.fingerprint {
            return Err(IntegrityViolation::FingerprintMismatch {
                index: self.index,
                stored: self.fingerprint.clone(),
                computed,
            });
        }

        if !rule.is_satisfied(&self.fingerprint) {
            return Err(IntegrityViolation::AdmissionUnsatisfied {
                index: self.index,
                fingerprint: self.fingerprint.clone(),
                difficulty: rule.difficulty(),
            });
        }

        Ok(())
    }

    /// Whether this block's previous fingerprint points at `previous`
    pub fn links_to(&self, previous: &Block) -> bool {
        self.previous_fingerprint == previous.fingerprint
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block(index={}, hash={}...)",
            self.index,
            self.short_fingerprint()
        )
    }
}
