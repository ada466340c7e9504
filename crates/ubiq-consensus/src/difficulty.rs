//! Difficulty retargeting.
//!
//! Ubiq retargets every block over a window of past-block median times.
//! Three configurations apply over the chain's history, selected by the
//! parent's height: the original DigishieldV3 parameters, a modified set
//! with a wider averaging window, and Flux, which adds an asymmetric clamp
//! driven by the most recent inter-block interval.
//!
//! All intermediate math runs on signed arbitrary-precision integers; the
//! quarter-step dampening can go negative before the clamp is applied.
//! Divisions round toward negative infinity.

use num_bigint::BigInt;
use num_integer::Integer;
use tracing::debug;
use ubiq_chain_types::{Header, U256};

use crate::arith::{big_from_u256, u256_from_big};
use crate::chain::ChainHeaderReader;
use crate::params;

/// Parameters of one retargeting configuration.
///
/// `max_adjust_up`, `max_adjust_down` and `dampen` are expressed in units of
/// `1/factor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffConfig {
    /// Number of blocks the retarget averages over.
    pub averaging_window: u64,
    /// Upper clamp on the actual timespan (slows difficulty decay).
    pub max_adjust_down: u64,
    /// Lower clamp on the actual timespan (limits difficulty growth).
    pub max_adjust_up: u64,
    /// Tighter clamp used by Flux when the recent interval corroborates the
    /// window's signal.
    pub dampen: Option<u64>,
    /// Denominator for the adjustment ratios.
    pub factor: u64,
}

/// Original DigishieldV3 parameters (8% up, 16% down).
pub const DIGISHIELD_V3_CONFIG: DiffConfig = DiffConfig {
    averaging_window: 21,
    max_adjust_down: 16,
    max_adjust_up: 8,
    dampen: None,
    factor: 100,
};

/// Modified DigishieldV3 parameters (2% up, 3% down over a wider window).
pub const DIGISHIELD_V3_MOD_CONFIG: DiffConfig = DiffConfig {
    averaging_window: 88,
    max_adjust_down: 3,
    max_adjust_up: 2,
    dampen: None,
    factor: 100,
};

/// Flux parameters (0.3% up, 0.5% down, 0.1% dampened bound).
pub const FLUX_CONFIG: DiffConfig = DiffConfig {
    averaging_window: 88,
    max_adjust_down: 5,
    max_adjust_up: 3,
    dampen: Some(1),
    factor: 1000,
};

/// Target cumulative timespan for one averaging window.
fn averaging_window_timespan(config: &DiffConfig) -> BigInt {
    BigInt::from(config.averaging_window * params::BLOCK_TIME_SECS)
}

fn min_actual_timespan(config: &DiffConfig, dampen: bool) -> BigInt {
    let adjust = if dampen {
        config.dampen.unwrap_or(0)
    } else {
        config.max_adjust_up
    };
    averaging_window_timespan(config) * BigInt::from(config.factor - adjust)
        / BigInt::from(config.factor)
}

fn max_actual_timespan(config: &DiffConfig, dampen: bool) -> BigInt {
    let adjust = if dampen {
        config.dampen.unwrap_or(0)
    } else {
        config.max_adjust_down
    };
    averaging_window_timespan(config) * BigInt::from(config.factor + adjust)
        / BigInt::from(config.factor)
}

/// Median timespan observed over the averaging window ending at the parent,
/// dampened a quarter of the way back toward the target timespan.
fn dampened_actual_timespan(
    chain: &dyn ChainHeaderReader,
    parent: &Header,
    config: &DiffConfig,
) -> BigInt {
    let first_block = parent.number - config.averaging_window;
    let last_time = chain.calc_past_median_time(parent.number, parent);
    let first_time = chain.calc_past_median_time(first_block, parent);
    let actual = &last_time - &first_time;
    debug!(number = parent.number, %actual, "actual timespan before dampening");

    let window = averaging_window_timespan(config);
    // Signed floor division: the deviation may be negative here.
    &window + (&actual - &window).div_floor(&BigInt::from(4))
}

/// Retarget: `parent_difficulty * window / actual`, floored at the minimum
/// difficulty. `actual` is strictly positive after clamping.
fn retarget(parent_diff: &BigInt, config: &DiffConfig, actual: &BigInt) -> U256 {
    let mut x = parent_diff * averaging_window_timespan(config);
    x /= actual;
    if x < BigInt::from(params::MINIMUM_DIFFICULTY) {
        x = BigInt::from(params::MINIMUM_DIFFICULTY);
    }
    u256_from_big(&x)
}

/// Compute the difficulty a block created at `time` on top of `parent` must
/// declare. The algorithm and its configuration are selected by the parent's
/// height against the chain's activation schedule.
pub fn calc_difficulty(chain: &dyn ChainHeaderReader, time: u64, parent: &Header) -> U256 {
    let ubqhash = &chain.config().ubqhash;
    if parent.number < ubqhash.flux_block {
        if parent.number < ubqhash.digishield_mod_block {
            calc_difficulty_digishield_v3(chain, parent, &DIGISHIELD_V3_CONFIG)
        } else {
            calc_difficulty_digishield_v3(chain, parent, &DIGISHIELD_V3_MOD_CONFIG)
        }
    } else {
        calc_difficulty_flux(chain, time, parent)
    }
}

/// DigishieldV3 retargeting (original and modified parameter sets).
fn calc_difficulty_digishield_v3(
    chain: &dyn ChainHeaderReader,
    parent: &Header,
    config: &DiffConfig,
) -> U256 {
    // Not enough history for a full window yet.
    if parent.number <= config.averaging_window {
        debug!(
            number = parent.number,
            window = config.averaging_window,
            "short chain, keeping parent difficulty"
        );
        return parent.difficulty;
    }

    let mut actual = dampened_actual_timespan(chain, parent, config);
    debug!(number = parent.number, %actual, "actual timespan before bounds");

    let min = min_actual_timespan(config, false);
    let max = max_actual_timespan(config, false);
    if actual < min {
        actual = min;
    } else if actual > max {
        actual = max;
    }
    debug!(number = parent.number, %actual, "actual timespan final");

    retarget(&big_from_u256(parent.difficulty), config, &actual)
}

/// Flux retargeting: DigishieldV3 with an asymmetric clamp. When the most
/// recent inter-block interval corroborates the window's signal, the bound
/// loosens to the dampened variant; otherwise the hard bound applies.
fn calc_difficulty_flux(chain: &dyn ChainHeaderReader, time: u64, parent: &Header) -> U256 {
    let config = &FLUX_CONFIG;
    if parent.number <= config.averaging_window {
        debug!(
            number = parent.number,
            window = config.averaging_window,
            "short chain, keeping parent difficulty"
        );
        return parent.difficulty;
    }

    let diff_time = BigInt::from(time) - BigInt::from(parent.time);
    let mut actual = dampened_actual_timespan(chain, parent, config);

    let min = min_actual_timespan(config, false);
    let max = max_actual_timespan(config, false);
    if actual < min {
        actual = if diff_time > BigInt::from(2 * params::BLOCK_TIME_SECS) {
            min_actual_timespan(config, true)
        } else {
            min
        };
    } else if actual > max {
        actual = if diff_time < BigInt::from(params::BLOCK_TIME_SECS / 2) {
            max_actual_timespan(config, true)
        } else {
            max
        };
    }
    debug!(number = parent.number, %actual, %diff_time, "actual timespan final");

    retarget(&big_from_u256(parent.difficulty), config, &actual)
}
