//! Header and uncle validation.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, instrument};
use ubiq_chain_types::{Block, Header, B256};

use crate::chain::ChainHeaderReader;
use crate::difficulty::calc_difficulty;
use crate::engine::Ubqhash;
use crate::error::{ConsensusError, ConsensusResult};
use crate::params;

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

impl Ubqhash {
    /// Check `header` against the consensus rules given its `parent`.
    ///
    /// Checks run in a fixed order and the first violation is returned;
    /// callers rely on the error identity. Uncles skip the wall-clock check
    /// since they may be arbitrarily old.
    #[instrument(skip(self, chain, header, parent), fields(number = header.number))]
    pub(crate) fn verify_header_against(
        &self,
        chain: &dyn ChainHeaderReader,
        header: &Header,
        parent: &Header,
        uncle: bool,
        seal: bool,
    ) -> ConsensusResult<()> {
        // Ensure that the extra-data section is of a reasonable size.
        if header.extra.len() > params::MAXIMUM_EXTRA_DATA_SIZE {
            return Err(ConsensusError::ExtraTooLong {
                len: header.extra.len(),
                max: params::MAXIMUM_EXTRA_DATA_SIZE,
            });
        }
        // Verify the timestamp.
        if !uncle && header.time > unix_now() + params::ALLOWED_FUTURE_BLOCK_TIME_SECS {
            return Err(ConsensusError::FutureBlock);
        }
        if header.time <= parent.time {
            return Err(ConsensusError::ZeroBlockTime);
        }
        // The declared difficulty must match the retargeting algorithm
        // exactly.
        let expected = calc_difficulty(chain, header.time, parent);
        if expected != header.difficulty {
            return Err(ConsensusError::InvalidDifficulty {
                have: header.difficulty,
                want: expected,
            });
        }
        // Gas limit cap, usage, and parent-relative bounds.
        if header.gas_limit > params::MAX_GAS_LIMIT {
            return Err(ConsensusError::InvalidGasLimit {
                have: header.gas_limit,
                parent: parent.gas_limit,
            });
        }
        if header.gas_used > header.gas_limit {
            return Err(ConsensusError::InvalidGasUsed {
                have: header.gas_used,
                limit: header.gas_limit,
            });
        }
        let drift = parent.gas_limit.abs_diff(header.gas_limit);
        let bound = parent.gas_limit / params::GAS_LIMIT_BOUND_DIVISOR;
        if drift >= bound || header.gas_limit < params::MIN_GAS_LIMIT {
            return Err(ConsensusError::InvalidGasLimit {
                have: header.gas_limit,
                parent: parent.gas_limit,
            });
        }
        // The height must follow the parent's.
        if header.number != parent.number + 1 {
            return Err(ConsensusError::InvalidNumber);
        }
        // Finally the expensive part: the proof-of-work seal.
        if seal {
            self.verify_seal_inner(header, false)?;
        }
        debug!(number = header.number, "header verification passed");
        Ok(())
    }

    /// Check that the uncles of `block` are recent, unique, properly
    /// parented and internally valid.
    pub(crate) fn verify_uncles_inner(
        &self,
        chain: &dyn ChainHeaderReader,
        block: &Block,
    ) -> ConsensusResult<()> {
        if block.uncles().len() > params::MAX_UNCLES {
            return Err(ConsensusError::TooManyUncles);
        }

        // Gather up to seven generations of ancestors together with every
        // uncle they already rewarded.
        let mut ancestors: HashMap<B256, Header> = HashMap::new();
        let mut past_uncles: HashSet<B256> = HashSet::new();

        let mut number = block.number().wrapping_sub(1);
        let mut parent_hash = block.parent_hash();
        for _ in 0..7 {
            let Some(ancestor) = chain.get_block(parent_hash, number) else {
                break;
            };
            for uncle in ancestor.uncles() {
                past_uncles.insert(uncle.hash());
            }
            let header = ancestor.header().clone();
            parent_hash = header.parent_hash;
            number = number.wrapping_sub(1);
            ancestors.insert(ancestor.hash(), header);
        }
        ancestors.insert(block.hash(), block.header().clone());
        past_uncles.insert(block.hash());

        // Verify each uncle in block order: rewarded at most once, not an
        // ancestor, parented inside the window.
        for uncle in block.uncles() {
            let hash = uncle.hash();
            if !past_uncles.insert(hash) {
                return Err(ConsensusError::DuplicateUncle);
            }
            if ancestors.contains_key(&hash) {
                return Err(ConsensusError::UncleIsAncestor);
            }
            // Siblings of the block itself are rejected: an uncle may not
            // share the block's direct parent.
            let parent = match ancestors.get(&uncle.parent_hash) {
                Some(parent) if uncle.parent_hash != block.parent_hash() => parent,
                _ => return Err(ConsensusError::DanglingUncle),
            };
            self.verify_header_against(chain, uncle, parent, true, true)?;
        }
        Ok(())
    }
}
