//! Block type and uncle-hash helpers.

use alloy_primitives::{b256, keccak256, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::Header;

/// Keccak-256 of the RLP encoding of an empty header list.
pub const EMPTY_UNCLE_HASH: B256 =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// Keccak-256 hash of the RLP list of uncle headers.
pub fn calc_uncle_hash(uncles: &[Header]) -> B256 {
    let mut buf = Vec::new();
    alloy_rlp::encode_list(uncles, &mut buf);
    keccak256(buf)
}

/// An RLP-opaque transaction payload.
///
/// The consensus core never interprets transaction contents; execution and
/// trie-root derivation belong to the outer node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction(pub Bytes);

impl Transaction {
    /// Keccak-256 hash of the payload.
    pub fn hash(&self) -> B256 {
        keccak256(&self.0)
    }
}

/// An RLP-opaque receipt payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt(pub Bytes);

/// A full block: header plus transaction, uncle and receipt lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    header: Header,
    transactions: Vec<Transaction>,
    uncles: Vec<Header>,
    receipts: Vec<Receipt>,
}

impl Block {
    /// Assemble a block. The header's uncle hash is recomputed from the
    /// supplied uncle list so the two can never disagree.
    pub fn new(
        mut header: Header,
        transactions: Vec<Transaction>,
        uncles: Vec<Header>,
        receipts: Vec<Receipt>,
    ) -> Self {
        header.uncle_hash = calc_uncle_hash(&uncles);
        Self {
            header,
            transactions,
            uncles,
            receipts,
        }
    }

    /// The block hash, i.e. the header hash.
    pub fn hash(&self) -> B256 {
        self.header.hash()
    }

    /// Block height.
    pub fn number(&self) -> u64 {
        self.header.number
    }

    /// Hash of the parent block.
    pub fn parent_hash(&self) -> B256 {
        self.header.parent_hash
    }

    /// The block header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Included uncle headers.
    pub fn uncles(&self) -> &[Header] {
        &self.uncles
    }

    /// Transaction payloads.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Receipt payloads.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Take the header back out of the block.
    pub fn into_header(self) -> Header {
        self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_uncle_list_hashes_to_known_constant() {
        assert_eq!(calc_uncle_hash(&[]), EMPTY_UNCLE_HASH);
    }

    #[test]
    fn new_block_recomputes_uncle_hash() {
        let uncle = Header {
            number: 7,
            ..Default::default()
        };
        let header = Header {
            number: 8,
            // deliberately wrong; Block::new must fix it
            uncle_hash: B256::repeat_byte(0xaa),
            ..Default::default()
        };

        let block = Block::new(header, vec![], vec![uncle.clone()], vec![]);
        assert_eq!(block.header().uncle_hash, calc_uncle_hash(&[uncle]));

        let empty = Block::new(Header::default(), vec![], vec![], vec![]);
        assert_eq!(empty.header().uncle_hash, EMPTY_UNCLE_HASH);
    }

    #[test]
    fn uncle_hash_depends_on_uncle_contents() {
        let a = Header {
            number: 1,
            ..Default::default()
        };
        let b = Header {
            number: 2,
            ..Default::default()
        };
        assert_ne!(calc_uncle_hash(&[a.clone()]), calc_uncle_hash(&[b]));
        assert_ne!(calc_uncle_hash(&[a]), EMPTY_UNCLE_HASH);
    }

    #[test]
    fn transaction_hash_is_payload_hash() {
        let tx = Transaction(Bytes::from_static(&[0x01, 0x02]));
        assert_eq!(tx.hash(), keccak256([0x01, 0x02]));
    }
}
