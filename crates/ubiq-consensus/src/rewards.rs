//! Block and uncle reward accumulation.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use tracing::debug;
use ubiq_chain_types::{Header, U256};

use crate::arith::big_from_u256;
use crate::chain::StateDb;
use crate::chain_config::{ChainConfig, UbqhashChainConfig};

/// The base block reward under the monetary policy at `height`.
///
/// Returns `(initial, current)`: the schedule's first reward and the reward
/// of the last step strictly below `height`.
pub fn calc_base_block_reward(config: &UbqhashChainConfig, height: u64) -> (U256, U256) {
    let mut current = U256::ZERO;
    for step in &config.monetary_policy {
        if height > step.block {
            current = step.reward;
        } else {
            break;
        }
    }
    let initial = config
        .monetary_policy
        .first()
        .map(|step| step.reward)
        .unwrap_or_default();
    (initial, current)
}

/// The reward for an uncle mined at `uncle_height` and included at
/// `block_height`: `(uncle + 2 - block) * reward / 2`, floor division.
///
/// Deep inclusions make the factor negative; once EIP-158 is active a
/// negative reward clamps to zero, before that the historical debit is
/// reproduced.
pub fn calc_uncle_block_reward(
    config: &ChainConfig,
    block_height: u64,
    uncle_height: u64,
    block_reward: U256,
) -> BigInt {
    let mut reward: BigInt = (BigInt::from(uncle_height) + 2 - BigInt::from(block_height))
        * big_from_u256(block_reward);
    reward = reward.div_floor(&BigInt::from(2));

    if config.is_eip158(block_height) && reward.is_negative() {
        reward = BigInt::zero();
    }
    reward
}

/// Credit the block's coinbase with the mining reward: the scheduled base
/// reward plus an inclusion bonus per uncle. Each uncle's coinbase receives
/// its own depth-scaled reward.
pub(crate) fn accumulate_rewards(
    config: &ChainConfig,
    state: &mut dyn StateDb,
    header: &Header,
    uncles: &[Header],
) {
    let (initial_reward, current_reward) = calc_base_block_reward(&config.ubqhash, header.number);

    // Uncle rewards step down with the schedule only from Byzantium; the
    // earlier rule always paid against the initial reward.
    let ufix_reward = if config.is_byzantium(header.number) {
        current_reward
    } else {
        initial_reward
    };

    let mut miner_reward = big_from_u256(current_reward);
    let ufix = big_from_u256(ufix_reward);
    for uncle in uncles {
        let uncle_reward = calc_uncle_block_reward(config, header.number, uncle.number, ufix_reward);
        debug!(
            uncle = uncle.number,
            block = header.number,
            %uncle_reward,
            "crediting uncle"
        );
        state.add_balance(uncle.coinbase, &uncle_reward);
        // Inclusion bonus for the block miner.
        miner_reward += &ufix / 32;
    }
    state.add_balance(header.coinbase, &miner_reward);
}
