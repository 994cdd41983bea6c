//! Certificate record and verify flows on top of a shared chain.
//!
//! Upload handlers call [`CertificateLedger::record_certificate`]; the verify
//! handler calls [`CertificateLedger::verify_document`] with whatever the user
//! uploaded. A document is VERIFIED when its fingerprint was recorded by some
//! earlier upload and TAMPERED otherwise.

use certledger_common::error::LedgerResult;
use certledger_common::types::{BlockIndex, Fingerprint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::chain::{AppendReceipt, Chain, ChainExport};
use crate::hash_service::HashService;
use crate::payload::{CertificatePayload, CertificateType, PayloadValue};

/// Metadata the upload form supplies alongside the file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CertificateDetails {
    pub student_id: String,
    pub student_name: String,
    pub certificate_type: CertificateType,
    pub title: String,
    pub institution: String,
    pub issued_at: Option<String>,
    /// Assigned automatically when `None`
    pub transaction_id: Option<Uuid>,
    pub extensions: BTreeMap<String, PayloadValue>,
}

impl CertificateDetails {
    fn into_payload(self, certificate_hash: Fingerprint) -> CertificatePayload {
        CertificatePayload {
            certificate_hash,
            student_name: self.student_name,
            student_id: self.student_id,
            certificate_type: self.certificate_type,
            title: self.title,
            institution: self.institution,
            transaction_id: Some(self.transaction_id.unwrap_or_else(Uuid::new_v4)),
            issued_at: self.issued_at,
            extensions: self.extensions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    Tampered,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => f.pad("verified"),
            Self::Tampered => f.pad("tampered"),
        }
    }
}

/// Result of checking one uploaded document against the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    pub document_fingerprint: Fingerprint,
    pub block_index: Option<BlockIndex>,
    pub block_fingerprint: Option<Fingerprint>,
    pub transaction_id: Option<Uuid>,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        self.status == VerificationStatus::Verified
    }
}

pub struct CertificateLedger {
    chain: Arc<Chain>,
}

impl CertificateLedger {
    pub fn new(chain: Arc<Chain>) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &Arc<Chain> {
        &self.chain
    }

    /// Fingerprint an uploaded certificate and record it
    pub fn record_certificate(
        &self,
        document: &[u8],
        details: CertificateDetails,
    ) -> LedgerResult<AppendReceipt> {
        let fingerprint = HashService::hash_uploaded_bytes(document);
        self.record_fingerprint(fingerprint, details)
    }

    /// Fingerprint a stored certificate file and record it
    pub fn record_certificate_file(
        &self,
        path: impl AsRef<Path>,
        details: CertificateDetails,
    ) -> LedgerResult<AppendReceipt> {
        let fingerprint = HashService::hash_file(path)?;
        self.record_fingerprint(fingerprint, details)
    }

    fn record_fingerprint(
        &self,
        fingerprint: Fingerprint,
        details: CertificateDetails,
    ) -> LedgerResult<AppendReceipt> {
        let title = details.title.clone();
        let payload = details.into_payload(fingerprint);
        payload.validate()?;

        let receipt = self.chain.append_record(payload)?;
        info!(
            "Certificate recorded: {} | Block #{} | tx {}",
            title,
            receipt.index,
            receipt
                .transaction_id
                .map(|id| id.to_string())
                .unwrap_or_default()
        );
        Ok(receipt)
    }

    /// Classify an uploaded document
    pub fn verify_document(&self, document: &[u8]) -> VerificationOutcome {
        self.verify_fingerprint(HashService::hash_uploaded_bytes(document))
    }

    /// Classify a document stored on disk
    pub fn verify_file(&self, path: impl AsRef<Path>) -> LedgerResult<VerificationOutcome> {
        Ok(self.verify_fingerprint(HashService::hash_file(path)?))
    }

    /// Classify a fingerprint computed by the caller through [`HashService`]
    pub fn verify_fingerprint(&self, fingerprint: Fingerprint) -> VerificationOutcome {
        let outcome = match self.chain.find_by_fingerprint(&fingerprint) {
            Some(block) => VerificationOutcome {
                status: VerificationStatus::Verified,
                block_index: Some(block.index()),
                block_fingerprint: Some(block.fingerprint().to_string()),
                transaction_id: block.payload().transaction_id,
                document_fingerprint: fingerprint,
            },
            None => VerificationOutcome {
                status: VerificationStatus::Tampered,
                block_index: None,
                block_fingerprint: None,
                transaction_id: None,
                document_fingerprint: fingerprint,
            },
        };

        info!(
            "Verification {}: {}...",
            outcome.status,
            outcome
                .document_fingerprint
                .get(..16)
                .unwrap_or(&outcome.document_fingerprint)
        );
        outcome
    }

    /// Everything the explorer page shows
    pub fn explorer(&self) -> ChainExport {
        self.chain.export()
    }
}
