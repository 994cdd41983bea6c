// config.rs - Configuration for certledger-core
use certledger_common::error::{LedgerError, LedgerResult};
use certledger_common::types::admission::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::admission::AdmissionRule;

/// Institution recorded in the genesis payload when none is configured
pub const DEFAULT_GENESIS_INSTITUTION: &str = "BlockVerify System";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Number of leading '0' hex characters every block fingerprint needs.
    /// Fixed for the lifetime of a chain.
    pub difficulty: usize,

    /// Give up the nonce search after this many attempts.
    /// `None` searches until a nonce is found.
    pub max_admission_attempts: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Institution named in the genesis payload
    pub genesis_institution: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_admission_attempts: None,
            log_level: "info".to_string(),
            genesis_institution: DEFAULT_GENESIS_INSTITUTION.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Validate configuration
    pub fn validate(&self) -> LedgerResult<()> {
        if self.difficulty == 0 || self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::config(format!(
                "difficulty must be between 1 and {}",
                MAX_DIFFICULTY
            )));
        }

        if self.max_admission_attempts == Some(0) {
            return Err(LedgerError::config(
                "max_admission_attempts must be greater than 0",
            ));
        }

        if self.log_level.is_empty() {
            return Err(LedgerError::config("log_level cannot be empty"));
        }

        Ok(())
    }

    /// Load a config file, picking the format from its extension
    /// (`.toml`, `.yaml`/`.yml` or `.json`), then validate it.
    pub fn from_file(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let config: LedgerConfig = match extension.as_str() {
            "toml" => toml::from_str(&contents)
                .map_err(|e| LedgerError::config(format!("{}: {}", path.display(), e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| LedgerError::config(format!("{}: {}", path.display(), e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| LedgerError::config(format!("{}: {}", path.display(), e)))?,
            other => {
                return Err(LedgerError::config(format!(
                    "unsupported config format '{}' for {}",
                    other,
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Admission rule a chain built from this config enforces
    pub fn admission_rule(&self) -> AdmissionRule {
        AdmissionRule::new(self.difficulty).with_max_attempts(self.max_admission_attempts)
    }
}
