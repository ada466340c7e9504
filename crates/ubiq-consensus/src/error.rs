//! Error types for consensus validation.

use thiserror::Error;
use ubiq_chain_types::U256;

/// Consensus validation errors.
///
/// Validation returns the first violation it detects; the variant identity is
/// part of the observable contract, so callers may match on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// The header's parent is not known to the chain.
    #[error("unknown ancestor")]
    UnknownAncestor,

    /// The header's timestamp is too far ahead of wall-clock time.
    #[error("block in the future")]
    FutureBlock,

    /// The header's timestamp is not strictly after its parent's.
    #[error("timestamp equals parent's")]
    ZeroBlockTime,

    /// The extra-data field exceeds the protocol bound.
    #[error("extra-data too long: {len} > {max}")]
    ExtraTooLong { len: usize, max: usize },

    /// The header's difficulty does not match the retargeting algorithm.
    #[error("invalid difficulty: have {have}, want {want}")]
    InvalidDifficulty { have: U256, want: U256 },

    /// The gas limit violates the cap, the minimum, or the parent-relative
    /// bound.
    #[error("invalid gas limit: have {have}, parent {parent}")]
    InvalidGasLimit { have: u64, parent: u64 },

    /// More gas was used than the block allows.
    #[error("invalid gasUsed: have {have}, gasLimit {limit}")]
    InvalidGasUsed { have: u64, limit: u64 },

    /// The block number is not the parent's plus one.
    #[error("invalid block number")]
    InvalidNumber,

    /// The block carries more uncles than the protocol allows.
    #[error("too many uncles")]
    TooManyUncles,

    /// The uncle was already included by this block or a recent ancestor.
    #[error("duplicate uncle")]
    DuplicateUncle,

    /// The uncle is itself an ancestor of the including block.
    #[error("uncle is ancestor")]
    UncleIsAncestor,

    /// The uncle's parent is not a recent ancestor, or is the including
    /// block's own parent.
    #[error("uncle's parent is not ancestor")]
    DanglingUncle,

    /// Seal verification was asked for a header with zero difficulty.
    #[error("non-positive difficulty")]
    ZeroDifficulty,

    /// The hashimoto digest does not match the header's mix digest.
    #[error("invalid mix digest")]
    InvalidMixDigest,

    /// The hashimoto result does not meet the difficulty target.
    #[error("invalid proof-of-work")]
    InvalidPoW,
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
