//! # ubiq-consensus
//!
//! Consensus rules for the Ubiq blockchain.
//!
//! This crate provides:
//! - Ubqhash (Ethash-family) seal verification
//! - Difficulty retargeting (DigishieldV3, modified DigishieldV3 and Flux,
//!   selected by block height)
//! - Header and uncle validation
//! - Concurrent batch header verification with ordered results
//! - Block and uncle reward accumulation at finalization
//!
//! ## Difficulty
//!
//! Ubiq retargets every block over a median-time window (Digishield v3
//! lineage, 88-second target block time). From the Flux activation height an
//! asymmetric clamp widens or tightens the adjustment based on the most
//! recent inter-block interval.
//!
//! ## Collaborators
//!
//! The engine reads ancestors and chain configuration through
//! [`ChainHeaderReader`], credits rewards through [`StateDb`] and obtains
//! epoch caches/datasets and the hashimoto mixing function through
//! [`UbqhashBackend`]. None of those are implemented here.

mod arith;
mod batch;
mod chain;
mod chain_config;
mod difficulty;
mod engine;
mod error;
mod rewards;
mod seal;
mod validation;

#[cfg(test)]
pub(crate) mod testutil;

pub use batch::AbortHandle;
pub use chain::{ChainHeaderReader, StateDb};
pub use chain_config::{ChainConfig, MonetaryPolicyStep, UbqhashChainConfig};
pub use difficulty::{
    calc_difficulty, DiffConfig, DIGISHIELD_V3_CONFIG, DIGISHIELD_V3_MOD_CONFIG, FLUX_CONFIG,
};
pub use engine::{Config, Engine, Mode, Ubqhash};
pub use error::{ConsensusError, ConsensusResult};
pub use rewards::{calc_base_block_reward, calc_uncle_block_reward};
pub use seal::{Cache, Dataset, UbqhashBackend};

/// Ubiq protocol constants.
pub mod params {
    /// Maximum size of a header's extra-data field in bytes.
    pub const MAXIMUM_EXTRA_DATA_SIZE: usize = 32;

    /// Minimum gas limit a block may declare.
    pub const MIN_GAS_LIMIT: u64 = 5_000;

    /// Hard cap on a block's gas limit (2^63 - 1).
    pub const MAX_GAS_LIMIT: u64 = 0x7fff_ffff_ffff_ffff;

    /// Divisor bounding how far a block's gas limit may drift from its
    /// parent's.
    pub const GAS_LIMIT_BOUND_DIVISOR: u64 = 1_024;

    /// Floor for the retargeted difficulty.
    pub const MINIMUM_DIFFICULTY: u64 = 131_072;

    /// Maximum number of uncles allowed in a single block.
    pub const MAX_UNCLES: usize = 2;

    /// How far into the future a block timestamp may lie before the block is
    /// rejected as a future block.
    pub const ALLOWED_FUTURE_BLOCK_TIME_SECS: u64 = 15;

    /// Target block time in seconds.
    pub const BLOCK_TIME_SECS: u64 = 88;

    /// Number of blocks per ubqhash cache/dataset epoch.
    pub const EPOCH_LENGTH: u64 = 30_000;
}
