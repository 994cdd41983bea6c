// lib.rs - CertLedger Core Library
//! # CertLedger Core
//!
//! The in-process integrity ledger behind certificate issuance and
//! verification.
//!
//! Certificate fingerprints are sealed into an append-only chain of blocks.
//! Each block is bound to its predecessor's fingerprint and admitted only after
//! a small proof-of-work search, so any edit to a stored block is detectable by
//! recomputing the chain.
//!
//! ## Architecture
//!
//! - **Block**: Immutable sealed record (index, timestamp, payload, link, nonce, fingerprint)
//! - **AdmissionRule**: Leading-zero proof-of-work predicate, fixed per chain
//! - **Chain**: Serialized appends, concurrent reads, lookup and validation
//! - **ChainRegistry**: One chain per process, created race-free on first use
//! - **HashService**: The single fingerprinting path for uploads and verification
//! - **CertificateLedger**: Record, verify and explorer flows
//!
//! ## Example
//!
//! ```no_run
//! use certledger_core::{CertificateDetails, CertificateLedger, ChainRegistry, LedgerConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ChainRegistry::new(LedgerConfig::default())?;
//!     let ledger = CertificateLedger::new(registry.get_instance()?);
//!
//!     let receipt = ledger.record_certificate(b"certificate bytes", CertificateDetails::default())?;
//!     println!("recorded in block #{}", receipt.index);
//!
//!     let outcome = ledger.verify_document(b"certificate bytes");
//!     assert!(outcome.is_verified());
//!     Ok(())
//! }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

/// Proof-of-work admission rule
pub mod admission;

/// Sealed blocks and canonical fingerprints
pub mod block;

/// Append-only chain
pub mod chain;

/// Certificate record and verify flows
pub mod certificate;

/// Timestamp sources
pub mod clock;

/// Configuration module
pub mod config;

/// Document fingerprinting
pub mod hash_service;

/// Block payloads
pub mod payload;

/// Process-wide chain ownership
pub mod registry;

/// Prelude with commonly used types
pub mod prelude {
    pub use crate::admission::AdmissionRule;
    pub use crate::block::Block;
    pub use crate::certificate::{
        CertificateDetails, CertificateLedger, VerificationOutcome, VerificationStatus,
    };
    pub use crate::chain::{AppendReceipt, Chain, ChainExport};
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::config::LedgerConfig;
    pub use crate::hash_service::HashService;
    pub use crate::payload::{CertificatePayload, CertificateType, PayloadValue};
    pub use crate::registry::ChainRegistry;
    // Re-export certledger-common prelude
    pub use certledger_common::prelude::*;
}

// Re-export main types at crate root
pub use admission::AdmissionRule;
pub use block::Block;
pub use certificate::{CertificateDetails, CertificateLedger, VerificationOutcome, VerificationStatus};
pub use chain::{AppendReceipt, Chain, ChainExport};
pub use config::LedgerConfig;
pub use hash_service::HashService;
pub use payload::{CertificatePayload, CertificateType};
pub use registry::ChainRegistry;

/// CertLedger version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use certledger_common::crypto::CryptoUtils;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_end_to_end_scenario() {
        let registry = ChainRegistry::new(LedgerConfig::default()).unwrap();
        let chain = registry.get_instance().unwrap();

        let cert_fingerprint = CryptoUtils::fingerprint_bytes(b"abc123");
        let block = chain
            .append(CertificatePayload::new(cert_fingerprint.clone()).with_student("S1", "S1"))
            .unwrap();
        assert_eq!(chain.length(), 2);

        let found = chain.find_by_fingerprint(&cert_fingerprint).unwrap();
        assert_eq!(found, block);
        assert!(chain
            .find_by_fingerprint(&CryptoUtils::fingerprint_bytes(b"zzz999"))
            .is_none());
        assert!(chain.is_valid());
    }

    #[test]
    fn test_shared_chain_across_flows() {
        let registry = Arc::new(ChainRegistry::new(LedgerConfig::default()).unwrap());

        let uploads: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let ledger = CertificateLedger::new(registry.get_instance().unwrap());
                    let document = format!("certificate #{}", i);
                    ledger
                        .record_certificate(document.as_bytes(), CertificateDetails::default())
                        .unwrap()
                })
            })
            .collect();
        let receipts: Vec<AppendReceipt> = uploads.into_iter().map(|h| h.join().unwrap()).collect();

        let verifier = CertificateLedger::new(registry.get_instance().unwrap());
        for i in 0..8 {
            let outcome = verifier.verify_document(format!("certificate #{}", i).as_bytes());
            assert!(outcome.is_verified());
            assert!(receipts.iter().any(|r| Some(r.index) == outcome.block_index));
        }
        assert!(!verifier.verify_document(b"certificate #8").is_verified());

        let view = verifier.explorer();
        assert_eq!(view.length, 9);
        assert!(view.valid);
    }
}
