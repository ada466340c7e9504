//! Collaborator traits the engine consumes.
//!
//! Header/block storage, the median-time oracle and the balance ledger are
//! owned by the surrounding node; the engine only sees these interfaces.

use num_bigint::BigInt;
use ubiq_chain_types::{Address, Block, Header, B256};

use crate::chain_config::ChainConfig;

/// Read access to the header chain.
pub trait ChainHeaderReader: Send + Sync {
    /// Look up a header by hash and height.
    fn get_header(&self, hash: B256, number: u64) -> Option<Header>;

    /// Look up a full block by hash and height.
    fn get_block(&self, hash: B256, number: u64) -> Option<Block>;

    /// The chain configuration in effect.
    fn config(&self) -> &ChainConfig;

    /// Median of the most recent block timestamps ending at `number`,
    /// traversing back through `parent`'s ancestry. The window size is the
    /// chain's concern; the difficulty engine only consumes the median.
    fn calc_past_median_time(&self, number: u64, parent: &Header) -> BigInt;
}

/// Mutable access to account balances during finalization.
pub trait StateDb {
    /// Credit `address` with `amount`. Amounts are signed: before the
    /// EIP-158 fix a deeply nested uncle could carry a negative reward, and
    /// that historical behavior is reproduced faithfully.
    fn add_balance(&mut self, address: Address, amount: &BigInt);

    /// Commit pending balance changes and return the intermediate state
    /// root.
    fn intermediate_root(&mut self, eip158: bool) -> B256;
}
