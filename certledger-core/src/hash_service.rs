//! Fingerprinting for certificate documents.
//!
//! Upload and verify flows must fingerprint documents identically or lookups
//! silently stop matching. Both go through this service, which hashes the raw
//! bytes with no normalization.

use certledger_common::crypto::CryptoUtils;
use certledger_common::error::LedgerResult;
use certledger_common::types::Fingerprint;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{error, info};

/// Service for generating SHA-256 fingerprints of certificate files
pub struct HashService;

impl HashService {
    /// Fingerprint a file's contents, streaming it in chunks
    pub fn hash_file(path: impl AsRef<Path>) -> LedgerResult<Fingerprint> {
        let path = path.as_ref();
        let result = File::open(path).and_then(|f| CryptoUtils::fingerprint_reader(BufReader::new(f)));

        match result {
            Ok(fingerprint) => {
                info!("Generated hash for file: {}...", &fingerprint[..16]);
                Ok(fingerprint)
            }
            Err(e) => {
                error!("Failed to hash file {}: {}", path.display(), e);
                Err(e.into())
            }
        }
    }

    /// Fingerprint an upload stream
    pub fn hash_reader<R: Read>(reader: R) -> LedgerResult<Fingerprint> {
        Ok(CryptoUtils::fingerprint_reader(reader)?)
    }

    /// Fingerprint an in-memory upload
    pub fn hash_uploaded_bytes(bytes: &[u8]) -> Fingerprint {
        CryptoUtils::fingerprint_bytes(bytes)
    }

    /// Fingerprint text content
    pub fn hash_text(text: &str) -> Fingerprint {
        CryptoUtils::fingerprint_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certledger_common::error::LedgerError;
    use std::io::Write;

    #[test]
    fn test_file_and_bytes_agree() {
        let contents = b"%PDF-1.4 certificate of completion".repeat(1000);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&contents).unwrap();

        let from_file = HashService::hash_file(file.path()).unwrap();
        let from_bytes = HashService::hash_uploaded_bytes(&contents);
        let from_reader = HashService::hash_reader(&contents[..]).unwrap();

        assert_eq!(from_file, from_bytes);
        assert_eq!(from_reader, from_bytes);
        assert_eq!(HashService::hash_file(file.path()).unwrap(), from_file);
    }

    #[test]
    fn test_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            HashService::hash_file(file.path()).unwrap(),
            HashService::hash_uploaded_bytes(b"")
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = HashService::hash_file(dir.path().join("missing.pdf")).unwrap_err();
        assert!(matches!(err, LedgerError::IO(_)));
    }

    #[test]
    fn test_distinct_documents_differ() {
        assert_ne!(
            HashService::hash_uploaded_bytes(b"cert-A"),
            HashService::hash_uploaded_bytes(b"cert-B")
        );
        assert_eq!(HashService::hash_text("cert-A"), HashService::hash_uploaded_bytes(b"cert-A"));
    }
}
