//! One chain per process.
//!
//! The registry is an ordinary value owned by the application's composition
//! root and handed to whoever needs the chain. It creates the chain, and its
//! genesis block, on first access; concurrent first accesses still produce
//! exactly one genesis block.

use certledger_common::error::LedgerResult;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::info;

use crate::chain::Chain;
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;

pub struct ChainRegistry {
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
    chain: OnceLock<Arc<Chain>>,
    init_lock: Mutex<()>,
}

impl ChainRegistry {
    /// Registry whose chain uses the wall clock
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: LedgerConfig, clock: Arc<dyn Clock>) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            chain: OnceLock::new(),
            init_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The process's chain, created with its genesis block on first call.
    ///
    /// Every call returns the same chain. If sealing genesis fails the error
    /// is returned and the next call tries again.
    pub fn get_instance(&self) -> LedgerResult<Arc<Chain>> {
        if let Some(chain) = self.chain.get() {
            return Ok(chain.clone());
        }

        let _init = self.init_lock.lock()?;
        if let Some(chain) = self.chain.get() {
            return Ok(chain.clone());
        }

        let chain = Arc::new(Chain::with_clock(
            self.config.admission_rule(),
            self.clock.clone(),
            &self.config.genesis_institution,
        )?);
        info!("Chain registry initialized (genesis {})", chain.latest().short_fingerprint());

        Ok(self.chain.get_or_init(|| chain).clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.chain.get().is_some()
    }
}
