//! # ubiq-chain-types
//!
//! Chain primitives for the Ubiq blockchain.
//!
//! This crate provides:
//! - Block headers with canonical RLP encoding and Keccak-256 hashing
//! - Blocks (header + transactions + uncle headers + receipts)
//! - Uncle-hash computation
//!
//! Transactions and receipts are carried as opaque RLP payloads; execution
//! and receipt derivation live outside this crate.

mod block;
mod header;

pub use block::{calc_uncle_hash, Block, Receipt, Transaction, EMPTY_UNCLE_HASH};
pub use header::Header;

// Re-export the primitive vocabulary so downstream crates don't need a
// direct alloy dependency for ordinary use.
pub use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, B64, U256};
