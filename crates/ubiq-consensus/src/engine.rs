//! The ubqhash consensus engine.

use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ubiq_chain_types::{Address, Block, Header, Receipt, Transaction, B256, U256};

use crate::batch::AbortHandle;
use crate::chain::{ChainHeaderReader, StateDb};
use crate::difficulty;
use crate::error::{ConsensusError, ConsensusResult};
use crate::rewards::accumulate_rewards;
use crate::seal::{self, Cache, Dataset, UbqhashBackend};

/// How much of the expensive verification work the engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Full consensus rules.
    Normal,
    /// Seal verification is delegated to another engine instance so its
    /// caches are reused.
    Shared,
    /// Full rules with a 32 KiB dataset, for protocol tests.
    Test,
    /// Header rules apply but seals are accepted after an optional delay,
    /// except at a designated failing height.
    Fake,
    /// Every header, uncle and seal is accepted unconditionally.
    FullFake,
}

/// Engine configuration.
///
/// Cache and DAG housekeeping (directories, retention) belongs to the
/// [`UbqhashBackend`] collaborator, not the engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Verification mode.
    pub pow_mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pow_mode: Mode::Normal,
        }
    }
}

/// Where seal verification work is performed.
pub(crate) enum Sealer {
    /// This engine owns a backend and hashes itself.
    Own(Arc<dyn UbqhashBackend>),
    /// Verification is forwarded to a shared engine instance.
    Delegated(Ubqhash),
}

pub(crate) struct Inner {
    pub(crate) config: Config,
    pub(crate) sealer: Sealer,
    pub(crate) fake_fail: Option<u64>,
    pub(crate) fake_delay: Duration,
}

/// The ubqhash proof-of-work consensus engine.
///
/// Cheap to clone; clones share the same configuration and sealer.
#[derive(Clone)]
pub struct Ubqhash {
    pub(crate) inner: Arc<Inner>,
}

impl fmt::Debug for Ubqhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ubqhash")
            .field("mode", &self.inner.config.pow_mode)
            .finish_non_exhaustive()
    }
}

/// Backend for the fake engines. Fake modes answer before any seal work, so
/// none of these are ever consulted.
struct InertBackend;

impl UbqhashBackend for InertBackend {
    fn cache(&self, _number: u64) -> Arc<Cache> {
        Arc::new(Cache::new(0, Vec::new()))
    }

    fn dataset(&self, _number: u64, _wait: bool) -> Arc<Dataset> {
        Arc::new(Dataset::new(0, Vec::new()))
    }

    fn dataset_size(&self, _number: u64) -> u64 {
        0
    }

    fn hashimoto_light(
        &self,
        _size: u64,
        _cache: &Cache,
        _seal_hash: B256,
        _nonce: u64,
    ) -> (B256, B256) {
        (B256::ZERO, B256::ZERO)
    }

    fn hashimoto_full(&self, _dataset: &Dataset, _seal_hash: B256, _nonce: u64) -> (B256, B256) {
        (B256::ZERO, B256::ZERO)
    }
}

impl Ubqhash {
    fn with_parts(config: Config, sealer: Sealer, fake_fail: Option<u64>, fake_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                sealer,
                fake_fail,
                fake_delay,
            }),
        }
    }

    /// Create a normal engine backed by `backend`.
    pub fn new(config: Config, backend: Arc<dyn UbqhashBackend>) -> Self {
        Self::with_parts(config, Sealer::Own(backend), None, Duration::ZERO)
    }

    /// Create a test-mode engine: full rules, but the light verification
    /// dataset size is pinned to 32 KiB.
    pub fn new_tester(backend: Arc<dyn UbqhashBackend>) -> Self {
        Self::with_parts(
            Config {
                pow_mode: Mode::Test,
            },
            Sealer::Own(backend),
            None,
            Duration::ZERO,
        )
    }

    /// Create a fake engine that accepts every seal.
    pub fn new_faker() -> Self {
        Self::with_parts(
            Config {
                pow_mode: Mode::Fake,
            },
            Sealer::Own(Arc::new(InertBackend)),
            None,
            Duration::ZERO,
        )
    }

    /// Create a fake engine that rejects the seal at the given height and
    /// accepts every other one.
    pub fn new_fake_failer(fail: u64) -> Self {
        Self::with_parts(
            Config {
                pow_mode: Mode::Fake,
            },
            Sealer::Own(Arc::new(InertBackend)),
            Some(fail),
            Duration::ZERO,
        )
    }

    /// Create a fake engine that sleeps for `delay` before accepting a seal.
    pub fn new_fake_delayer(delay: Duration) -> Self {
        Self::with_parts(
            Config {
                pow_mode: Mode::Fake,
            },
            Sealer::Own(Arc::new(InertBackend)),
            None,
            delay,
        )
    }

    /// Create an engine that accepts all headers, uncles and seals.
    pub fn new_full_faker() -> Self {
        Self::with_parts(
            Config {
                pow_mode: Mode::FullFake,
            },
            Sealer::Own(Arc::new(InertBackend)),
            None,
            Duration::ZERO,
        )
    }

    /// Create an engine that delegates seal verification to `shared`,
    /// reusing its caches.
    pub fn new_shared(shared: &Ubqhash) -> Self {
        Self::with_parts(
            Config {
                pow_mode: Mode::Shared,
            },
            Sealer::Delegated(shared.clone()),
            None,
            Duration::ZERO,
        )
    }

    /// The engine's verification mode.
    pub fn mode(&self) -> Mode {
        self.inner.config.pow_mode
    }
}

/// The consensus engine interface exposed to the rest of the node.
pub trait Engine: Send + Sync {
    /// The address to credit as the block's author.
    fn author(&self, header: &Header) -> Address;

    /// Check a single header against the consensus rules, optionally
    /// verifying its seal. Succeeds immediately for known headers.
    fn verify_header(
        &self,
        chain: &dyn ChainHeaderReader,
        header: &Header,
        seal: bool,
    ) -> ConsensusResult<()>;

    /// Verify a batch of headers concurrently. Results arrive on the
    /// returned channel in input order; the handle aborts outstanding work.
    fn verify_headers(
        &self,
        chain: Arc<dyn ChainHeaderReader>,
        headers: Vec<Header>,
        seals: Vec<bool>,
    ) -> (AbortHandle, Receiver<ConsensusResult<()>>);

    /// Check that a block's uncles conform to the consensus rules.
    fn verify_uncles(&self, chain: &dyn ChainHeaderReader, block: &Block) -> ConsensusResult<()>;

    /// Check that a header's seal satisfies the proof-of-work requirement.
    fn verify_seal(&self, chain: &dyn ChainHeaderReader, header: &Header) -> ConsensusResult<()>;

    /// The difficulty a new block on top of `parent` must declare.
    fn calc_difficulty(&self, chain: &dyn ChainHeaderReader, time: u64, parent: &Header) -> U256;

    /// Initialize a candidate header's difficulty from its parent.
    fn prepare(&self, chain: &dyn ChainHeaderReader, header: &mut Header) -> ConsensusResult<()>;

    /// Accumulate block and uncle rewards and set the final state root.
    fn finalize(
        &self,
        chain: &dyn ChainHeaderReader,
        header: &mut Header,
        state: &mut dyn StateDb,
        txs: &[Transaction],
        uncles: &[Header],
    );

    /// Finalize and assemble the resulting block.
    fn finalize_and_assemble(
        &self,
        chain: &dyn ChainHeaderReader,
        header: Header,
        state: &mut dyn StateDb,
        txs: Vec<Transaction>,
        uncles: Vec<Header>,
        receipts: Vec<Receipt>,
    ) -> Block;

    /// The hash a sealer works on: the header hash excluding the seal
    /// fields.
    fn seal_hash(&self, header: &Header) -> B256;
}

impl Engine for Ubqhash {
    fn author(&self, header: &Header) -> Address {
        header.coinbase
    }

    fn verify_header(
        &self,
        chain: &dyn ChainHeaderReader,
        header: &Header,
        seal: bool,
    ) -> ConsensusResult<()> {
        if self.mode() == Mode::FullFake {
            return Ok(());
        }
        // Short circuit if the header is known, or its parent not.
        let number = header.number;
        if chain.get_header(header.hash(), number).is_some() {
            return Ok(());
        }
        let parent = chain
            .get_header(header.parent_hash, number.wrapping_sub(1))
            .ok_or(ConsensusError::UnknownAncestor)?;
        self.verify_header_against(chain, header, &parent, false, seal)
    }

    fn verify_headers(
        &self,
        chain: Arc<dyn ChainHeaderReader>,
        headers: Vec<Header>,
        seals: Vec<bool>,
    ) -> (AbortHandle, Receiver<ConsensusResult<()>>) {
        self.verify_headers_inner(chain, headers, seals)
    }

    fn verify_uncles(&self, chain: &dyn ChainHeaderReader, block: &Block) -> ConsensusResult<()> {
        if self.mode() == Mode::FullFake {
            return Ok(());
        }
        self.verify_uncles_inner(chain, block)
    }

    fn verify_seal(&self, _chain: &dyn ChainHeaderReader, header: &Header) -> ConsensusResult<()> {
        self.verify_seal_inner(header, false)
    }

    fn calc_difficulty(&self, chain: &dyn ChainHeaderReader, time: u64, parent: &Header) -> U256 {
        difficulty::calc_difficulty(chain, time, parent)
    }

    fn prepare(&self, chain: &dyn ChainHeaderReader, header: &mut Header) -> ConsensusResult<()> {
        let parent = chain
            .get_header(header.parent_hash, header.number.wrapping_sub(1))
            .ok_or(ConsensusError::UnknownAncestor)?;
        header.difficulty = difficulty::calc_difficulty(chain, header.time, &parent);
        Ok(())
    }

    fn finalize(
        &self,
        chain: &dyn ChainHeaderReader,
        header: &mut Header,
        state: &mut dyn StateDb,
        _txs: &[Transaction],
        uncles: &[Header],
    ) {
        let config = chain.config();
        accumulate_rewards(config, state, header, uncles);
        header.state_root = state.intermediate_root(config.is_eip158(header.number));
    }

    fn finalize_and_assemble(
        &self,
        chain: &dyn ChainHeaderReader,
        mut header: Header,
        state: &mut dyn StateDb,
        txs: Vec<Transaction>,
        uncles: Vec<Header>,
        receipts: Vec<Receipt>,
    ) -> Block {
        self.finalize(chain, &mut header, state, &txs, &uncles);
        Block::new(header, txs, uncles, receipts)
    }

    fn seal_hash(&self, header: &Header) -> B256 {
        seal::seal_hash(header)
    }
}
