//! Shared fixtures: an in-memory chain, a deterministic hashimoto backend
//! and a map-backed state ledger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use num_bigint::BigInt;
use parking_lot::Mutex;
use ubiq_chain_types::{keccak256, Address, Block, Header, B256, EMPTY_UNCLE_HASH, U256};

use crate::chain::{ChainHeaderReader, StateDb};
use crate::chain_config::ChainConfig;
use crate::engine::{Engine, Ubqhash};
use crate::params;
use crate::seal::{Cache, Dataset, UbqhashBackend};

/// In-memory chain reader with scriptable median times.
pub(crate) struct TestChain {
    pub config: ChainConfig,
    pub headers: HashMap<B256, Header>,
    pub blocks: HashMap<B256, Block>,
    pub medians: HashMap<u64, i64>,
}

impl TestChain {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            headers: HashMap::new(),
            blocks: HashMap::new(),
            medians: HashMap::new(),
        }
    }

    pub fn mainnet() -> Self {
        Self::new(ChainConfig::mainnet())
    }

    pub fn insert_header(&mut self, header: Header) {
        self.headers.insert(header.hash(), header);
    }

    pub fn insert_block(&mut self, block: Block) {
        self.insert_header(block.header().clone());
        self.blocks.insert(block.hash(), block);
    }

    /// Pin the past-median-time oracle's answer for `number`.
    pub fn set_median(&mut self, number: u64, time: i64) {
        self.medians.insert(number, time);
    }
}

impl ChainHeaderReader for TestChain {
    fn get_header(&self, hash: B256, number: u64) -> Option<Header> {
        self.headers
            .get(&hash)
            .filter(|header| header.number == number)
            .cloned()
    }

    fn get_block(&self, hash: B256, number: u64) -> Option<Block> {
        self.blocks
            .get(&hash)
            .filter(|block| block.number() == number)
            .cloned()
    }

    fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn calc_past_median_time(&self, number: u64, _parent: &Header) -> BigInt {
        match self.medians.get(&number) {
            Some(&time) => BigInt::from(time),
            // Unpinned heights behave like a perfectly paced chain.
            None => BigInt::from(number) * params::BLOCK_TIME_SECS,
        }
    }
}

/// A genesis header in the past, with room for descendants.
pub(crate) fn genesis() -> Header {
    Header {
        number: 0,
        time: 1_000_000_000,
        gas_limit: 8_000_000,
        difficulty: U256::from(params::MINIMUM_DIFFICULTY),
        uncle_hash: EMPTY_UNCLE_HASH,
        ..Default::default()
    }
}

/// A structurally valid child of `parent`, `time_delta` seconds later.
/// While the chain is shorter than an averaging window the expected
/// difficulty is the parent's, so the child inherits it.
pub(crate) fn child_of(parent: &Header, time_delta: u64) -> Header {
    Header {
        parent_hash: parent.hash(),
        number: parent.number + 1,
        time: parent.time + time_delta,
        gas_limit: parent.gas_limit,
        difficulty: parent.difficulty,
        uncle_hash: EMPTY_UNCLE_HASH,
        ..Default::default()
    }
}

/// Give `header` the mix digest the deterministic backend will recompute.
pub(crate) fn seal_for(engine: &Ubqhash, header: &mut Header) {
    header.mix_digest = TestBackend::mix(engine.seal_hash(header), header.nonce_u64());
}

/// A test-mode engine over a passing deterministic backend.
pub(crate) fn test_engine() -> (Ubqhash, Arc<TestBackend>) {
    let backend = Arc::new(TestBackend::passing());
    (Ubqhash::new_tester(backend.clone()), backend)
}

/// Deterministic stand-in for the hashimoto provider: the mix digest is a
/// hash of the inputs and the result is a fixed word, so tests can dial the
/// proof-of-work outcome.
pub(crate) struct TestBackend {
    result: B256,
    dataset_generated: AtomicBool,
    /// Sizes passed to `hashimoto_light`, in call order.
    pub light_sizes: Mutex<Vec<u64>>,
    /// Number of `hashimoto_full` invocations.
    pub full_calls: Mutex<usize>,
}

impl TestBackend {
    /// Result zero: meets every target.
    pub fn passing() -> Self {
        Self::with_result(B256::ZERO)
    }

    /// Result all-ones: only meets a difficulty-one target.
    pub fn failing() -> Self {
        Self::with_result(B256::repeat_byte(0xff))
    }

    fn with_result(result: B256) -> Self {
        Self {
            result,
            dataset_generated: AtomicBool::new(false),
            light_sizes: Mutex::new(Vec::new()),
            full_calls: Mutex::new(0),
        }
    }

    pub fn set_dataset_generated(&self, generated: bool) {
        self.dataset_generated.store(generated, Ordering::Release);
    }

    /// The mix digest this backend derives for a seal hash and nonce.
    pub fn mix(seal_hash: B256, nonce: u64) -> B256 {
        let mut preimage = [0u8; 40];
        preimage[..32].copy_from_slice(seal_hash.as_slice());
        preimage[32..].copy_from_slice(&nonce.to_be_bytes());
        keccak256(preimage)
    }
}

impl UbqhashBackend for TestBackend {
    fn cache(&self, number: u64) -> Arc<Cache> {
        Arc::new(Cache::new(number / params::EPOCH_LENGTH, Vec::new()))
    }

    fn dataset(&self, number: u64, _wait: bool) -> Arc<Dataset> {
        let dataset = Dataset::new(number / params::EPOCH_LENGTH, Vec::new());
        if self.dataset_generated.load(Ordering::Acquire) {
            dataset.mark_generated();
        }
        Arc::new(dataset)
    }

    fn dataset_size(&self, _number: u64) -> u64 {
        1 << 20
    }

    fn hashimoto_light(
        &self,
        size: u64,
        _cache: &Cache,
        seal_hash: B256,
        nonce: u64,
    ) -> (B256, B256) {
        self.light_sizes.lock().push(size);
        (Self::mix(seal_hash, nonce), self.result)
    }

    fn hashimoto_full(&self, _dataset: &Dataset, seal_hash: B256, nonce: u64) -> (B256, B256) {
        *self.full_calls.lock() += 1;
        (Self::mix(seal_hash, nonce), self.result)
    }
}

/// Map-backed balance ledger with a deterministic root.
#[derive(Default)]
pub(crate) struct TestState {
    pub balances: HashMap<Address, BigInt>,
    last_root: B256,
}

impl TestState {
    /// The root returned by the most recent `intermediate_root` call.
    pub fn last_root(&self) -> B256 {
        self.last_root
    }
}

impl StateDb for TestState {
    fn add_balance(&mut self, address: Address, amount: &BigInt) {
        *self.balances.entry(address).or_default() += amount;
    }

    fn intermediate_root(&mut self, eip158: bool) -> B256 {
        let mut entries: Vec<(&Address, &BigInt)> = self.balances.iter().collect();
        entries.sort_by_key(|(address, _)| *address);

        let mut preimage = vec![u8::from(eip158)];
        for (address, balance) in entries {
            preimage.extend_from_slice(address.as_slice());
            preimage.extend_from_slice(&balance.to_signed_bytes_be());
        }
        self.last_root = keccak256(preimage);
        self.last_root
    }
}
