//! Chain configuration: fork activation heights and monetary policy.

use serde::{Deserialize, Serialize};
use ubiq_chain_types::U256;

/// One step of the monetary-policy schedule: from the first block *after*
/// `block`, the base reward is `reward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonetaryPolicyStep {
    /// Height after which this step's reward applies (strict).
    pub block: u64,
    /// Base block reward in wei.
    pub reward: U256,
}

/// Ubqhash-specific consensus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UbqhashChainConfig {
    /// Height from which the modified DigishieldV3 config applies
    /// (compared against the parent's number).
    pub digishield_mod_block: u64,
    /// Height from which the Flux retargeting algorithm applies
    /// (compared against the parent's number).
    pub flux_block: u64,
    /// Ordered base-reward schedule, lowest height first.
    pub monetary_policy: Vec<MonetaryPolicyStep>,
}

/// Chain-wide configuration consumed by the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Network identifier.
    pub chain_id: u64,
    /// Byzantium activation height (None = never).
    pub byzantium_block: Option<u64>,
    /// EIP-158 activation height (None = never).
    pub eip158_block: Option<u64>,
    /// Ubqhash parameters.
    pub ubqhash: UbqhashChainConfig,
}

impl ChainConfig {
    /// The Ubiq mainnet configuration.
    pub fn mainnet() -> Self {
        let ubq = |n: u64| U256::from(n) * U256::from(1_000_000_000_000_000_000u64);
        Self {
            chain_id: 8,
            byzantium_block: Some(1_075_090),
            eip158_block: Some(10),
            ubqhash: UbqhashChainConfig {
                digishield_mod_block: 8_000,
                flux_block: 1_075_090,
                monetary_policy: vec![
                    MonetaryPolicyStep { block: 0, reward: ubq(8) },
                    MonetaryPolicyStep { block: 358_363, reward: ubq(7) },
                    MonetaryPolicyStep { block: 716_727, reward: ubq(6) },
                    MonetaryPolicyStep { block: 1_075_090, reward: ubq(5) },
                    MonetaryPolicyStep { block: 1_433_454, reward: ubq(4) },
                    MonetaryPolicyStep { block: 1_791_818, reward: ubq(3) },
                    MonetaryPolicyStep { block: 2_150_181, reward: ubq(2) },
                    MonetaryPolicyStep { block: 2_508_545, reward: ubq(1) },
                ],
            },
        }
    }

    /// Whether Byzantium rules are active at `number`.
    pub fn is_byzantium(&self, number: u64) -> bool {
        self.byzantium_block.is_some_and(|b| number >= b)
    }

    /// Whether EIP-158 rules are active at `number`.
    pub fn is_eip158(&self, number: u64) -> bool {
        self.eip158_block.is_some_and(|b| number >= b)
    }
}
