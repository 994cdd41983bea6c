//! Certificate payloads carried by blocks.
//!
//! The chain treats a payload as opaque apart from `certificate_hash`, the
//! field lookups match against. Field order here is the canonical order used
//! when hashing, so reordering fields changes every fingerprint.

use certledger_common::error::{LedgerError, LedgerResult};
use certledger_common::serialization::CanonicalEncode;
use certledger_common::validation::ValidationUtils;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Longest accepted value for any free-text field
pub const MAX_TEXT_LEN: usize = 255;

/// Kind of certificate being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateType {
    #[default]
    Academic,
    Internship,
    Achievement,
    Course,
    Other,
    /// Only ever used by the genesis block
    Genesis,
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Academic => "academic",
            Self::Internship => "internship",
            Self::Achievement => "achievement",
            Self::Course => "course",
            Self::Other => "other",
            Self::Genesis => "genesis",
        };
        f.write_str(name)
    }
}

/// Value in the open extension map.
///
/// Each variant maps to a distinct JSON kind (integer, float, string), so a
/// value read back from an export encodes to the same bytes it was sealed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

/// Stored as hyphenated lowercase text
impl From<Uuid> for PayloadValue {
    fn from(value: Uuid) -> Self {
        Self::Text(value.to_string())
    }
}

/// Data sealed into a block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CertificatePayload {
    /// Fingerprint of the certificate file, the lookup key
    pub certificate_hash: String,
    pub student_name: String,
    pub student_id: String,
    pub certificate_type: CertificateType,
    pub title: String,
    pub institution: String,
    pub transaction_id: Option<Uuid>,
    /// RFC 3339 text supplied by the caller
    pub issued_at: Option<String>,
    /// Caller-defined fields, kept sorted by key
    pub extensions: BTreeMap<String, PayloadValue>,
}

impl CanonicalEncode for CertificatePayload {}

impl CertificatePayload {
    pub fn new(certificate_hash: impl Into<String>) -> Self {
        Self {
            certificate_hash: certificate_hash.into(),
            ..Default::default()
        }
    }

    /// Payload of the genesis block. Its empty certificate hash never matches
    /// a lookup.
    pub fn genesis(institution: impl Into<String>) -> Self {
        Self {
            certificate_hash: String::new(),
            student_name: "Genesis".to_string(),
            student_id: "0".to_string(),
            certificate_type: CertificateType::Genesis,
            title: String::new(),
            institution: institution.into(),
            transaction_id: None,
            issued_at: None,
            extensions: BTreeMap::new(),
        }
    }

    pub fn with_student(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.student_id = id.into();
        self.student_name = name.into();
        self
    }

    pub fn with_type(mut self, certificate_type: CertificateType) -> Self {
        self.certificate_type = certificate_type;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = institution.into();
        self
    }

    pub fn with_transaction_id(mut self, transaction_id: Uuid) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    pub fn with_issued_at(mut self, issued_at: impl Into<String>) -> Self {
        self.issued_at = Some(issued_at.into());
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Check that the payload has a canonical encoding.
    ///
    /// This is the only check the chain applies before sealing. Non-finite
    /// decimals have no JSON form, so they are rejected with
    /// [`LedgerError::InvalidPayload`].
    pub fn check_encodable(&self) -> LedgerResult<()> {
        for (key, value) in &self.extensions {
            if let PayloadValue::Decimal(d) = value {
                if !d.is_finite() {
                    return Err(LedgerError::invalid_payload(format!(
                        "extension '{}' is not a finite number",
                        key
                    )));
                }
            }
        }

        self.canonical_bytes()
            .map(|_| ())
            .map_err(|e| LedgerError::invalid_payload(e.to_string()))
    }

    /// Form checks applied to certificate uploads before they are recorded:
    /// the certificate hash must be a fingerprint, text fields are bounded,
    /// extension keys are non-empty, and the payload must be encodable.
    pub fn validate(&self) -> LedgerResult<()> {
        ValidationUtils::validate_fingerprint_hex(&self.certificate_hash).map_err(|e| {
            LedgerError::invalid_payload(format!("certificate_hash: {}", e))
        })?;

        if self.certificate_type == CertificateType::Genesis {
            return Err(LedgerError::invalid_payload(
                "certificate_type 'genesis' is reserved for the first block",
            ));
        }

        for (value, field) in [
            (&self.student_name, "student_name"),
            (&self.student_id, "student_id"),
            (&self.title, "title"),
            (&self.institution, "institution"),
        ] {
            ValidationUtils::validate_string_length(value, MAX_TEXT_LEN, field)
                .map_err(|e| LedgerError::invalid_payload(e.to_string()))?;
        }

        if let Some(issued_at) = &self.issued_at {
            ValidationUtils::validate_string_length(issued_at, MAX_TEXT_LEN, "issued_at")
                .map_err(|e| LedgerError::invalid_payload(e.to_string()))?;
        }

        if self.extensions.keys().any(|key| key.is_empty()) {
            return Err(LedgerError::invalid_payload("extension key cannot be empty"));
        }

        self.check_encodable()
    }
}
