use serde::{Deserialize, Serialize};
use serde_json::Number;

pub mod config;
pub mod consensus;
pub mod constants;
pub mod engine;
pub mod error;
pub mod hashchain;
pub mod peers;
pub mod pow;

pub use config::{EngineConfig, MiningReward, PendingPolicy};
pub use consensus::{PeerChain, PeerChainFetcher};
pub use engine::LedgerEngine;
pub use error::{ChainViolation, LedgerError, PeerError};
pub use peers::{PeerAddr, PeerSet};
pub use pow::CancelFlag;

use constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, TIMESTAMP_FORMAT};

/// A transfer request. Amounts are kept as the JSON number they arrived as so
/// that hashes of chains built elsewhere reproduce byte for byte.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: Number,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: impl Into<Number>,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount: amount.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub proof: u64,
    pub previous_hash: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(index: u64, proof: u64, previous_hash: String, transactions: Vec<Transaction>) -> Self {
        Self {
            index,
            timestamp: now_timestamp(),
            proof,
            previous_hash,
            transactions,
        }
    }

    /// The fixed first block: proof 1, sentinel previous hash, no transactions.
    pub fn genesis() -> Self {
        Self::new(1, GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string(), vec![])
    }

    /// Lowercase hex SHA-256 of the canonical encoding.
    pub fn hash(&self) -> String {
        hashchain::hash(self)
    }
}

/// Local wall-clock time, e.g. `2024-05-01 13:37:00.123456`.
pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_txs() -> Vec<Transaction> {
        vec![
            Transaction::new("Alice", "Bob", 10u64),
            Transaction::new("Bob", "Charlie", 5u64),
        ]
    }

    #[test]
    fn genesis_block_example() {
        let genesis = Block::genesis();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, 1);
        assert_eq!(genesis.previous_hash, "0");
        assert!(genesis.transactions.is_empty());
        assert!(!genesis.timestamp.is_empty());
    }

    #[test]
    fn timestamp_has_microseconds() {
        let ts = now_timestamp();
        // YYYY-MM-DD HH:MM:SS.ffffff
        assert_eq!(ts.len(), 26);
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn transaction_serialization_example() {
        let tx = Transaction::new("Alice", "Bob", 10u64);
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, r#"{"sender":"Alice","receiver":"Bob","amount":10}"#);
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
    }

    #[test]
    fn transaction_keeps_float_amounts() {
        let tx: Transaction =
            serde_json::from_str(r#"{"sender":"a","receiver":"b","amount":2.5}"#).unwrap();
        assert_eq!(tx.amount.as_f64(), Some(2.5));
        assert!(tx.amount.as_u64().is_none());
    }

    #[test]
    fn transaction_missing_field_is_rejected() {
        let res = serde_json::from_str::<Transaction>(r#"{"sender":"a","amount":1}"#);
        assert!(res.is_err());
    }

    #[test]
    fn block_without_transactions_field_deserializes() {
        let block: Block = serde_json::from_str(
            r#"{"index":1,"timestamp":"t","proof":1,"previous_hash":"0"}"#,
        )
        .unwrap();
        assert!(block.transactions.is_empty());
    }

    #[test]
    fn block_hash_changes_with_proof() {
        let mut block = Block::new(2, 533, "abc".into(), sample_txs());
        let h1 = block.hash();
        block.proof += 1;
        assert_ne!(h1, block.hash());
    }

    #[test]
    fn block_hash_consistency() {
        let mut block = Block::new(2, 533, "abc".into(), sample_txs());
        block.timestamp = "2021-06-01 12:00:00.000000".into();
        let copy = block.clone();
        assert_eq!(block.hash(), copy.hash());
        assert_eq!(block.hash().len(), constants::HASH_HEX_SIZE);
    }
}
