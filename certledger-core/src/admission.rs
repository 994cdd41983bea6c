//! Proof-of-work admission rule.
//!
//! A block is admitted once its fingerprint starts with `difficulty` '0' hex
//! characters. The nonce search is illustrative effort, not a security
//! boundary: at difficulty 1 it takes about 16 attempts on average.

use certledger_common::crypto::CryptoUtils;
use certledger_common::error::{LedgerError, LedgerResult};
use certledger_common::types::admission::DEFAULT_DIFFICULTY;
use certledger_common::types::{Fingerprint, Nonce};
use tracing::warn;

/// Outcome of a successful nonce search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub nonce: Nonce,
    pub fingerprint: Fingerprint,
    /// Number of fingerprints computed, including the winning one
    pub attempts: u64,
}

/// Admission predicate plus an optional search bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionRule {
    difficulty: usize,
    max_attempts: Option<u64>,
}

impl Default for AdmissionRule {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY)
    }
}

impl AdmissionRule {
    pub fn new(difficulty: usize) -> Self {
        Self {
            difficulty,
            max_attempts: None,
        }
    }

    /// Bound the search; `None` searches until a nonce is found
    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn max_attempts(&self) -> Option<u64> {
        self.max_attempts
    }

    /// Whether `fingerprint` satisfies the predicate
    pub fn is_satisfied(&self, fingerprint: &str) -> bool {
        CryptoUtils::meets_difficulty(fingerprint, self.difficulty)
    }

    /// Try nonces 0, 1, 2, ... until `fingerprint_for(nonce)` satisfies the
    /// predicate.
    ///
    /// Fails with [`LedgerError::AdmissionTimeout`] once `max_attempts`
    /// fingerprints have been rejected. Errors from `fingerprint_for` are
    /// returned unchanged.
    pub fn search<F>(&self, mut fingerprint_for: F) -> LedgerResult<Admission>
    where
        F: FnMut(Nonce) -> LedgerResult<Fingerprint>,
    {
        let mut nonce: Nonce = 0;
        let mut attempts: u64 = 0;

        loop {
            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    warn!(
                        "Admission search gave up after {} attempts (difficulty {})",
                        attempts, self.difficulty
                    );
                    return Err(LedgerError::AdmissionTimeout {
                        attempts,
                        difficulty: self.difficulty,
                    });
                }
            }

            let fingerprint = fingerprint_for(nonce)?;
            attempts += 1;

            if self.is_satisfied(&fingerprint) {
                return Ok(Admission {
                    nonce,
                    fingerprint,
                    attempts,
                });
            }

            nonce = nonce
                .checked_add(1)
                .ok_or_else(|| LedgerError::internal("nonce space exhausted"))?;
        }
    }
}
