//! Seal hashing and proof-of-work verification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use alloy_rlp::RlpEncodable;
use num_bigint::{BigInt, Sign};
use num_traits::One;
use tracing::debug;
use ubiq_chain_types::{keccak256, Address, Bloom, Bytes, Header, B256, U256};

use crate::arith::big_from_u256;
use crate::engine::{Mode, Sealer, Ubqhash};
use crate::error::{ConsensusError, ConsensusResult};

/// Light verification cache for one epoch.
pub struct Cache {
    epoch: u64,
    data: Vec<u32>,
}

impl Cache {
    /// Wrap generated cache data for `epoch`.
    pub fn new(epoch: u64, data: Vec<u32>) -> Self {
        Self { epoch, data }
    }

    /// The epoch this cache belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The cache words.
    pub fn data(&self) -> &[u32] {
        &self.data
    }
}

/// Full mining dataset for one epoch. Generation may still be in progress
/// when a handle is obtained; `generated` flips once the data is complete.
pub struct Dataset {
    epoch: u64,
    data: Vec<u32>,
    generated: AtomicBool,
}

impl Dataset {
    /// Wrap dataset storage for `epoch`; call [`Dataset::mark_generated`]
    /// once the data is usable.
    pub fn new(epoch: u64, data: Vec<u32>) -> Self {
        Self {
            epoch,
            data,
            generated: AtomicBool::new(false),
        }
    }

    /// The epoch this dataset belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The dataset words.
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Whether generation has completed.
    pub fn generated(&self) -> bool {
        self.generated.load(Ordering::Acquire)
    }

    /// Flag the dataset as fully generated.
    pub fn mark_generated(&self) {
        self.generated.store(true, Ordering::Release);
    }
}

/// Provider of epoch caches/datasets and the hashimoto mixing function.
///
/// Handles are reference counted: the verifier keeps the `Arc` alive for the
/// whole hash, so a provider may reclaim an epoch's memory as soon as the
/// last handle drops and never earlier.
pub trait UbqhashBackend: Send + Sync {
    /// The light cache covering the epoch of block `number`.
    fn cache(&self, number: u64) -> Arc<Cache>;

    /// The full dataset covering the epoch of block `number`. With `wait`
    /// the call blocks until generation finishes; otherwise the handle may
    /// come back not yet generated.
    fn dataset(&self, number: u64, wait: bool) -> Arc<Dataset>;

    /// Size in bytes of the full dataset for block `number`.
    fn dataset_size(&self, number: u64) -> u64;

    /// Cache-backed hashimoto. Returns `(mix_digest, result)`.
    fn hashimoto_light(&self, size: u64, cache: &Cache, seal_hash: B256, nonce: u64)
        -> (B256, B256);

    /// Dataset-backed hashimoto. Returns `(mix_digest, result)`.
    fn hashimoto_full(&self, dataset: &Dataset, seal_hash: B256, nonce: u64) -> (B256, B256);
}

/// The header fields a seal commits to, in RLP order. The nonce and mix
/// digest are excluded so the hash stays stable across mining attempts.
#[derive(RlpEncodable)]
struct SealContent {
    parent_hash: B256,
    uncle_hash: B256,
    coinbase: Address,
    state_root: B256,
    tx_root: B256,
    receipt_root: B256,
    bloom: Bloom,
    difficulty: U256,
    number: u64,
    gas_limit: u64,
    gas_used: u64,
    time: u64,
    extra: Bytes,
}

/// The hash a sealer works on: Keccak-256 over the header minus its seal
/// fields.
pub(crate) fn seal_hash(header: &Header) -> B256 {
    let content = SealContent {
        parent_hash: header.parent_hash,
        uncle_hash: header.uncle_hash,
        coinbase: header.coinbase,
        state_root: header.state_root,
        tx_root: header.tx_root,
        receipt_root: header.receipt_root,
        bloom: header.bloom,
        difficulty: header.difficulty,
        number: header.number,
        gas_limit: header.gas_limit,
        gas_used: header.gas_used,
        time: header.time,
        extra: header.extra.clone(),
    };
    keccak256(alloy_rlp::encode(content))
}

impl Ubqhash {
    /// Check that `header`'s seal satisfies the proof-of-work requirement,
    /// using the full dataset when `fulldag` is set and it is already
    /// generated, and the light cache otherwise.
    pub(crate) fn verify_seal_inner(&self, header: &Header, fulldag: bool) -> ConsensusResult<()> {
        // Fake engines accept any seal, apart from the designated failure
        // height.
        if matches!(self.mode(), Mode::Fake | Mode::FullFake) {
            if !self.inner.fake_delay.is_zero() {
                thread::sleep(self.inner.fake_delay);
            }
            if self.inner.fake_fail == Some(header.number) {
                return Err(ConsensusError::InvalidPoW);
            }
            return Ok(());
        }
        // Shared engines forward the work so caches are reused.
        let backend = match &self.inner.sealer {
            Sealer::Delegated(shared) => return shared.verify_seal_inner(header, fulldag),
            Sealer::Own(backend) => backend,
        };

        if header.difficulty.is_zero() {
            return Err(ConsensusError::ZeroDifficulty);
        }

        let number = header.number;
        let seal_hash = seal_hash(header);
        let nonce = header.nonce_u64();

        let mut hashed: Option<(B256, B256)> = None;
        if fulldag {
            // The handle must stay bound until the hash returns; dropping it
            // early would let the backend reclaim the epoch mid-hash.
            let dataset = backend.dataset(number, true);
            if dataset.generated() {
                hashed = Some(backend.hashimoto_full(&dataset, seal_hash, nonce));
            }
            // Not generated yet: fall through to the light path rather than
            // stalling verification behind DAG generation.
        }
        let (digest, result) = match hashed {
            Some(pair) => pair,
            None => {
                let cache = backend.cache(number);
                let size = if self.mode() == Mode::Test {
                    32 * 1024
                } else {
                    backend.dataset_size(number)
                };
                backend.hashimoto_light(size, &cache, seal_hash, nonce)
            }
        };
        debug!(number, %digest, "recomputed seal");

        if digest != header.mix_digest {
            return Err(ConsensusError::InvalidMixDigest);
        }
        let target = (BigInt::one() << 256u32) / big_from_u256(header.difficulty);
        if BigInt::from_bytes_be(Sign::Plus, result.as_slice()) > target {
            return Err(ConsensusError::InvalidPoW);
        }
        Ok(())
    }
}
