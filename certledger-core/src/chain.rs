//! The append-only block chain.
//!
//! # Concurrency
//!
//! Appends are serialized by `append_lock`, which covers computing the next
//! index, sealing, and pushing. Sealing runs while holding only that mutex, so
//! readers keep going during the nonce search. The block list itself sits
//! behind an `RwLock` that is write-locked only for the final `push`; readers
//! therefore see the chain either before or after an append, never a block
//! that is still being sealed.

use certledger_common::error::{IntegrityViolation, LedgerError, LedgerResult};
use certledger_common::ledger_bail;
use certledger_common::types::{BlockIndex, Fingerprint, ZERO_FINGERPRINT};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::admission::AdmissionRule;
use crate::block::{seal_block, Block};
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::payload::CertificatePayload;

/// What the upload flow keeps after recording a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendReceipt {
    pub index: BlockIndex,
    pub fingerprint: Fingerprint,
    pub transaction_id: Option<Uuid>,
}

impl From<&Block> for AppendReceipt {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index(),
            fingerprint: block.fingerprint().to_string(),
            transaction_id: block.payload().transaction_id,
        }
    }
}

/// Plain-record copy of a chain for display or for an external store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainExport {
    pub length: usize,
    pub valid: bool,
    pub difficulty: usize,
    pub blocks: Vec<Block>,
}

pub struct Chain {
    blocks: RwLock<Vec<Block>>,
    append_lock: Mutex<()>,
    rule: AdmissionRule,
    clock: Arc<dyn Clock>,
}

impl Chain {
    /// Create a chain from configuration and seal its genesis block
    pub fn new(config: &LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        Self::with_clock(
            config.admission_rule(),
            Arc::new(SystemClock),
            &config.genesis_institution,
        )
    }

    /// Create a chain with an explicit admission rule and clock
    pub fn with_clock(
        rule: AdmissionRule,
        clock: Arc<dyn Clock>,
        genesis_institution: &str,
    ) -> LedgerResult<Self> {
        let genesis = Block::genesis(
            CertificatePayload::genesis(genesis_institution),
            clock.as_ref(),
            &rule,
        )?;

        info!(
            "Sealed genesis block {} (difficulty {})",
            genesis.short_fingerprint(),
            rule.difficulty()
        );

        Ok(Self {
            blocks: RwLock::new(vec![genesis]),
            append_lock: Mutex::new(()),
            rule,
            clock,
        })
    }

    /// Rebuild a chain from previously exported blocks.
    ///
    /// Nothing is repaired; call [`Chain::validate`] to check the result.
    pub fn from_blocks(
        blocks: Vec<Block>,
        rule: AdmissionRule,
        clock: Arc<dyn Clock>,
    ) -> LedgerResult<Self> {
        if blocks.is_empty() {
            ledger_bail!(Validation, "cannot rebuild a chain without a genesis block");
        }

        debug!("Rebuilt chain from {} stored blocks", blocks.len());

        Ok(Self {
            blocks: RwLock::new(blocks),
            append_lock: Mutex::new(()),
            rule,
            clock,
        })
    }

    /// Rebuild a chain from the JSON produced by [`Chain::export_json`].
    ///
    /// The export must have been written under the same difficulty as `rule`
    /// and its recorded length must match the blocks it carries.
    pub fn from_export_json(
        json: &str,
        rule: AdmissionRule,
        clock: Arc<dyn Clock>,
    ) -> LedgerResult<Self> {
        let export: ChainExport = serde_json::from_str(json)?;

        if export.difficulty != rule.difficulty() {
            ledger_bail!(
                Validation,
                "export was sealed at difficulty {} but the rule requires {}",
                export.difficulty,
                rule.difficulty()
            );
        }
        if export.length != export.blocks.len() {
            ledger_bail!(
                Validation,
                "export records length {} but carries {} blocks",
                export.length,
                export.blocks.len()
            );
        }
        if !export.valid {
            warn!("Rebuilding from an export that was already invalid when written");
        }

        Self::from_blocks(export.blocks, rule, clock)
    }

    // Writers hold the write guard only across a single `push`, so a poisoned
    // lock still guards whole, sealed blocks.
    fn read_blocks(&self) -> RwLockReadGuard<'_, Vec<Block>> {
        self.blocks.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn admission_rule(&self) -> &AdmissionRule {
        &self.rule
    }

    /// Seal `payload` into a new block and make it the latest.
    ///
    /// The payload is opaque here. Fails with [`LedgerError::InvalidPayload`]
    /// only if it has no canonical encoding, and with
    /// [`LedgerError::AdmissionTimeout`] if a bounded search runs out; in both
    /// cases the chain is unchanged.
    pub fn append(&self, payload: CertificatePayload) -> LedgerResult<Block> {
        payload.check_encodable()?;

        let _guard = self.append_lock.lock()?;

        let (index, previous) = {
            let blocks = self.read_blocks();
            let latest = blocks
                .last()
                .ok_or_else(|| LedgerError::internal("chain has no genesis block"))?;
            (blocks.len() as BlockIndex, latest.fingerprint().to_string())
        };

        let block = seal_block(index, payload, &previous, self.clock.as_ref(), &self.rule)?;

        self.blocks.write()?.push(block.clone());

        info!(
            "Appended block #{} | hash {}... | nonce {}",
            block.index(),
            block.short_fingerprint(),
            block.nonce()
        );

        Ok(block)
    }

    /// [`Chain::append`], returning only what the caller needs to store
    pub fn append_record(&self, payload: CertificatePayload) -> LedgerResult<AppendReceipt> {
        self.append(payload).map(|block| AppendReceipt::from(&block))
    }

    /// Block at `index`, or [`LedgerError::NotFound`]
    pub fn get_block(&self, index: BlockIndex) -> LedgerResult<Block> {
        let blocks = self.read_blocks();
        usize::try_from(index)
            .ok()
            .and_then(|i| blocks.get(i))
            .cloned()
            .ok_or_else(|| {
                LedgerError::not_found(format!(
                    "block {} (chain length {})",
                    index,
                    blocks.len()
                ))
            })
    }

    /// First block whose payload records `certificate_hash`.
    ///
    /// `None` means no append ever recorded that fingerprint.
    pub fn find_by_fingerprint(&self, certificate_hash: &str) -> Option<Block> {
        if certificate_hash.is_empty() {
            return None;
        }

        let found = self
            .read_blocks()
            .iter()
            .find(|block| block.payload().certificate_hash == certificate_hash)
            .cloned();

        debug!(
            "Lookup {}... -> {}",
            certificate_hash.get(..16).unwrap_or(certificate_hash),
            found
                .as_ref()
                .map(|b| format!("block #{}", b.index()))
                .unwrap_or_else(|| "not found".to_string())
        );

        found
    }

    /// Walk the whole chain and report the first integrity violation.
    ///
    /// Every block, genesis included, must recompute to its stored
    /// fingerprint and satisfy the admission rule; indices must run 0..n and
    /// each block must link to its predecessor.
    pub fn validate(&self) -> Result<(), IntegrityViolation> {
        let blocks = self.read_blocks();
        let result = Self::validate_blocks(&blocks, &self.rule);
        if let Err(violation) = &result {
            warn!("Chain integrity check failed: {}", violation);
        }
        result
    }

    fn validate_blocks(blocks: &[Block], rule: &AdmissionRule) -> Result<(), IntegrityViolation> {
        let genesis = blocks
            .first()
            .ok_or_else(|| IntegrityViolation::BadGenesis("chain is empty".to_string()))?;

        if genesis.previous_fingerprint() != ZERO_FINGERPRINT {
            return Err(IntegrityViolation::BadGenesis(format!(
                "previous fingerprint is {} instead of the zero sentinel",
                genesis.previous_fingerprint()
            )));
        }

        for (position, block) in blocks.iter().enumerate() {
            if block.index() != position as BlockIndex {
                return Err(IntegrityViolation::IndexGap {
                    position,
                    found: block.index(),
                });
            }

            block.verify_seal(rule)?;

            if position > 0 {
                let previous = &blocks[position - 1];
                if !block.links_to(previous) {
                    return Err(IntegrityViolation::BrokenLink {
                        index: block.index(),
                        expected: previous.fingerprint().to_string(),
                        found: block.previous_fingerprint().to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Integrity check as a yes/no answer. Not a gate on `append`.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn length(&self) -> usize {
        self.read_blocks().len()
    }

    pub fn latest(&self) -> Block {
        // The list starts with genesis and only grows.
        let blocks = self.read_blocks();
        blocks[blocks.len() - 1].clone()
    }

    /// Owned copy of every block, oldest first
    pub fn snapshot(&self) -> Vec<Block> {
        self.read_blocks().clone()
    }

    /// Snapshot plus validity, as one consistent view
    pub fn export(&self) -> ChainExport {
        let blocks = self.snapshot();
        let valid = Self::validate_blocks(&blocks, &self.rule).is_ok();
        ChainExport {
            length: blocks.len(),
            valid,
            difficulty: self.rule.difficulty(),
            blocks,
        }
    }

    pub fn export_json(&self) -> LedgerResult<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use certledger_common::crypto::CryptoUtils;
    use std::collections::HashSet;
    use std::thread;

    fn test_chain() -> Chain {
        Chain::with_clock(
            AdmissionRule::default(),
            Arc::new(FixedClock::new(1_700_000_000_000)),
            "Test College",
        )
        .unwrap()
    }

    fn payload(cert: &[u8], student: &str) -> CertificatePayload {
        CertificatePayload::new(CryptoUtils::fingerprint_bytes(cert)).with_student(student, student)
    }

    #[test]
    fn test_new_chain_has_genesis() {
        let chain = test_chain();
        assert_eq!(chain.length(), 1);

        let genesis = chain.latest();
        assert_eq!(genesis.index(), 0);
        assert_eq!(genesis.previous_fingerprint(), ZERO_FINGERPRINT);
        assert_eq!(genesis.payload().institution, "Test College");
        assert!(chain.is_valid());
    }

    #[test]
    fn test_append_links_and_seals() {
        let chain = test_chain();
        let genesis = chain.latest();
        let block = chain.append(payload(b"cert-A", "S1")).unwrap();

        assert_eq!(block.index(), 1);
        assert_eq!(block.previous_fingerprint(), genesis.fingerprint());
        assert_eq!(block.recompute_fingerprint().unwrap(), block.fingerprint());
        assert!(chain.admission_rule().is_satisfied(block.fingerprint()));
        assert_eq!(chain.latest(), block);
    }

    #[test]
    fn test_invalid_payload_leaves_chain_unchanged() {
        let chain = test_chain();
        let before = chain.snapshot();

        let err = chain
            .append(payload(b"cert-A", "S1").with_extension("gpa", f64::INFINITY))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidPayload(_)));

        assert_eq!(chain.snapshot(), before);
    }

    #[test]
    fn test_append_treats_payload_as_opaque() {
        let chain = test_chain();
        let block = chain
            .append(
                CertificatePayload::new("abc123")
                    .with_student("S1", "S1")
                    .with_title("t".repeat(1000))
                    .with_extension("", "empty key"),
            )
            .unwrap();

        assert_eq!(chain.find_by_fingerprint("abc123").unwrap(), block);
        assert!(chain.find_by_fingerprint("zzz999").is_none());
        assert!(chain.is_valid());
    }

    #[test]
    fn test_admission_timeout_leaves_chain_unchanged() {
        // Difficulty 64 needs an all-zero digest; two attempts never find it.
        let chain = test_chain();
        let strict = Chain::from_blocks(
            chain.snapshot(),
            AdmissionRule::new(64).with_max_attempts(Some(2)),
            Arc::new(FixedClock::new(1)),
        )
        .unwrap();

        let err = strict.append(payload(b"cert-A", "S1")).unwrap_err();
        assert!(matches!(err, LedgerError::AdmissionTimeout { attempts: 2, .. }));
        assert_eq!(strict.length(), 1);
    }

    #[test]
    fn test_get_block() {
        let chain = test_chain();
        chain.append(payload(b"cert-A", "S1")).unwrap();

        assert_eq!(chain.get_block(1).unwrap().index(), 1);
        assert!(chain.get_block(2).unwrap_err().is_not_found());
        assert!(chain.get_block(u64::MAX).unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_by_fingerprint() {
        let chain = test_chain();
        let a = chain.append(payload(b"cert-A", "S1")).unwrap();
        chain.append(payload(b"cert-B", "S2")).unwrap();

        let found = chain
            .find_by_fingerprint(&CryptoUtils::fingerprint_bytes(b"cert-A"))
            .unwrap();
        assert_eq!(found, a);

        assert!(chain
            .find_by_fingerprint(&CryptoUtils::fingerprint_bytes(b"cert-C"))
            .is_none());
        // Genesis carries an empty certificate hash and must never match.
        assert!(chain.find_by_fingerprint("").is_none());
        assert!(chain.find_by_fingerprint(ZERO_FINGERPRINT).is_none());
    }

    #[test]
    fn test_corrupted_payload_invalidates_chain() {
        let chain = test_chain();
        for i in 0..4 {
            chain
                .append(payload(format!("cert-{}", i).as_bytes(), "S"))
                .unwrap();
        }
        assert!(chain.is_valid());

        for target in 0..chain.length() {
            let mut blocks = chain.snapshot();
            blocks[target].payload.student_name = "tampered".to_string();
            let tampered =
                Chain::from_blocks(blocks, AdmissionRule::default(), Arc::new(SystemClock))
                    .unwrap();

            assert!(!tampered.is_valid());
            assert_eq!(tampered.validate().unwrap_err().index(), target as u64);
        }
    }

    #[test]
    fn test_resealed_block_breaks_link() {
        let chain = test_chain();
        chain.append(payload(b"cert-A", "S1")).unwrap();
        chain.append(payload(b"cert-B", "S2")).unwrap();

        let mut blocks = chain.snapshot();
        let forged = seal_block(
            1,
            payload(b"forged", "S9"),
            blocks[0].fingerprint(),
            &FixedClock::new(5),
            &AdmissionRule::default(),
        )
        .unwrap();
        blocks[1] = forged;

        let tampered =
            Chain::from_blocks(blocks, AdmissionRule::default(), Arc::new(SystemClock)).unwrap();
        assert!(matches!(
            tampered.validate(),
            Err(IntegrityViolation::BrokenLink { index: 2, .. })
        ));
    }

    #[test]
    fn test_index_gap_detected() {
        let chain = test_chain();
        chain.append(payload(b"cert-A", "S1")).unwrap();
        chain.append(payload(b"cert-B", "S2")).unwrap();

        let mut blocks = chain.snapshot();
        blocks.remove(1);
        let gapped =
            Chain::from_blocks(blocks, AdmissionRule::default(), Arc::new(SystemClock)).unwrap();
        assert!(matches!(
            gapped.validate(),
            Err(IntegrityViolation::IndexGap { position: 1, found: 2 })
        ));
    }

    #[test]
    fn test_from_blocks_rejects_empty() {
        assert!(Chain::from_blocks(Vec::new(), AdmissionRule::default(), Arc::new(SystemClock))
            .is_err());
    }

    #[test]
    fn test_export_round_trip() {
        let chain = test_chain();
        chain
            .append(payload(b"cert-A", "S1").with_transaction_id(Uuid::new_v4()))
            .unwrap();

        let export = chain.export();
        assert_eq!(export.length, 2);
        assert!(export.valid);
        assert_eq!(export.difficulty, 1);

        let json = chain.export_json().unwrap();
        let restored =
            Chain::from_export_json(&json, AdmissionRule::default(), Arc::new(SystemClock))
                .unwrap();
        assert_eq!(restored.snapshot(), chain.snapshot());
        assert!(restored.is_valid());

        // The restored chain keeps growing from where the export left off.
        let next = restored.append(payload(b"cert-B", "S2")).unwrap();
        assert_eq!(next.index(), 2);
        assert!(restored.is_valid());
    }

    #[test]
    fn test_export_round_trip_with_awkward_extensions() {
        let chain = test_chain();
        chain
            .append(
                payload(b"cert-A", "S1")
                    .with_extension("md5", "9e107d9d372bb6826bd81d3542a419d6")
                    .with_extension("upper", "67E55044-10B1-426F-9247-BB680E5FE0C8")
                    .with_extension("braced", "{67e55044-10b1-426f-9247-bb680e5fe0c8}")
                    .with_extension("urn", "urn:uuid:67e55044-10b1-426f-9247-bb680e5fe0c8")
                    .with_extension("ref", Uuid::new_v4()),
            )
            .unwrap();
        chain
            .append(
                payload(b"cert-B", "S2")
                    .with_extension("tiny", 1.0715660391465826e-75)
                    .with_extension("small", -1.81996730402717e-179)
                    .with_extension("huge", -1.603964615428183e143)
                    .with_extension("subnormal", 5e-324)
                    .with_extension("max", f64::MAX)
                    .with_extension("whole", 2.0)
                    .with_extension("min_int", i64::MIN),
            )
            .unwrap();
        assert!(chain.is_valid());

        let json = chain.export_json().unwrap();
        let restored =
            Chain::from_export_json(&json, AdmissionRule::default(), Arc::new(SystemClock))
                .unwrap();

        assert_eq!(restored.snapshot(), chain.snapshot());
        assert_eq!(restored.validate(), Ok(()));
        assert_eq!(restored.export_json().unwrap(), json);
    }

    #[test]
    fn test_from_export_json_rejects_mismatched_export() {
        let chain = test_chain();
        chain.append(payload(b"cert-A", "S1")).unwrap();
        let json = chain.export_json().unwrap();

        let err = Chain::from_export_json(&json, AdmissionRule::new(2), Arc::new(SystemClock))
            .err()
            .unwrap();
        assert!(matches!(err, LedgerError::Validation(_)));

        let mut export = chain.export();
        export.length = 5;
        let truncated = serde_json::to_string(&export).unwrap();
        let err =
            Chain::from_export_json(&truncated, AdmissionRule::default(), Arc::new(SystemClock))
                .err()
                .unwrap();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let chain = test_chain();
        let mut snapshot = chain.snapshot();
        snapshot.clear();
        assert_eq!(chain.length(), 1);
    }

    #[test]
    fn test_concurrent_appends_are_gapless() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 4;

        let chain = Arc::new(Chain::new(&LedgerConfig::default()).unwrap());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let chain = chain.clone();
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        let cert = format!("cert-{}-{}", t, i);
                        chain.append(payload(cert.as_bytes(), "S")).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let blocks = chain.snapshot();
        assert_eq!(blocks.len(), THREADS * PER_THREAD + 1);
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block.index(), i as u64);
        }
        let fingerprints: HashSet<_> = blocks.iter().map(|b| b.fingerprint().to_string()).collect();
        assert_eq!(fingerprints.len(), blocks.len());
        assert!(chain.is_valid());
    }

    #[test]
    fn test_readers_during_appends_see_whole_blocks() {
        let chain = Arc::new(test_chain());
        let writer = {
            let chain = chain.clone();
            thread::spawn(move || {
                for i in 0..32 {
                    chain
                        .append(payload(format!("cert-{}", i).as_bytes(), "S"))
                        .unwrap();
                }
            })
        };

        let reader = {
            let chain = chain.clone();
            thread::spawn(move || {
                for _ in 0..64 {
                    let snapshot = chain.snapshot();
                    assert!(Chain::validate_blocks(&snapshot, &AdmissionRule::default()).is_ok());
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(chain.length(), 33);
    }
}
