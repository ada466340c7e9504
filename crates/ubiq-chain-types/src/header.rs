//! Block header type.

use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, B64, U256};
use alloy_rlp::RlpEncodable;
use serde::{Deserialize, Serialize};

/// A block header.
///
/// Field order is the canonical RLP encoding order; `hash()` is the
/// Keccak-256 digest of that encoding and identifies the header on the wire
/// and in storage. Headers are immutable once constructed — validation treats
/// them as pure values.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Keccak-256 hash of the parent header.
    pub parent_hash: B256,
    /// Keccak-256 hash of the RLP list of uncle headers.
    pub uncle_hash: B256,
    /// Beneficiary address credited with block rewards.
    pub coinbase: Address,
    /// Root of the world state after this block.
    pub state_root: B256,
    /// Root of the transaction trie.
    pub tx_root: B256,
    /// Root of the receipt trie.
    pub receipt_root: B256,
    /// Bloom filter over the block's log entries.
    pub bloom: Bloom,
    /// Proof-of-work difficulty this header claims to satisfy.
    pub difficulty: U256,
    /// Block height; one more than the parent's.
    pub number: u64,
    /// Gas ceiling for the block.
    pub gas_limit: u64,
    /// Gas consumed by the block's transactions.
    pub gas_used: u64,
    /// Timestamp in UNIX seconds.
    pub time: u64,
    /// Arbitrary extra data, bounded by consensus.
    pub extra: Bytes,
    /// Seal: hashimoto mix digest.
    pub mix_digest: B256,
    /// Seal: 8-byte big-endian nonce.
    pub nonce: B64,
}

impl Header {
    /// Keccak-256 hash of the RLP-encoded header, including the seal fields.
    pub fn hash(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }

    /// The seal nonce interpreted as a big-endian integer.
    pub fn nonce_u64(&self) -> u64 {
        u64::from_be_bytes(self.nonce.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Header {
        Header {
            parent_hash: B256::repeat_byte(0x11),
            coinbase: Address::repeat_byte(0x22),
            difficulty: U256::from(131_072u64),
            number: 42,
            gas_limit: 8_000_000,
            gas_used: 21_000,
            time: 1_600_000_000,
            extra: Bytes::from_static(b"ubiq"),
            nonce: B64::new(0x0102030405060708u64.to_be_bytes()),
            ..Default::default()
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let header = sample_header();
        assert_eq!(header.hash(), header.hash());
        assert_eq!(header.hash(), header.clone().hash());
    }

    #[test]
    fn hash_covers_every_field() {
        let base = sample_header();

        let mut changed = base.clone();
        changed.number += 1;
        assert_ne!(base.hash(), changed.hash());

        let mut changed = base.clone();
        changed.nonce = B64::new(0xdeadbeefu64.to_be_bytes());
        assert_ne!(base.hash(), changed.hash(), "seal nonce is part of the header hash");

        let mut changed = base.clone();
        changed.extra = Bytes::from_static(b"other");
        assert_ne!(base.hash(), changed.hash());
    }

    #[test]
    fn nonce_round_trips_as_big_endian() {
        let header = sample_header();
        assert_eq!(header.nonce_u64(), 0x0102030405060708);
    }

    #[test]
    fn serde_round_trip() {
        let header = sample_header();
        let json = serde_json::to_string(&header).unwrap();
        assert!(json.contains("parentHash"));
        let back: Header = serde_json::from_str(&json).unwrap();
        assert_eq!(header, back);
    }
}
