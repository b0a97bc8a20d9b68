use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::constants::DEFAULT_DIFFICULTY;
use crate::Transaction;

/// What happens to the pending buffer once its snapshot lands in a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingPolicy {
    /// Start the next block with an empty buffer.
    #[default]
    Clear,
    /// Keep every queued transaction; each new block repeats all of them.
    Retain,
}

/// Transaction credited to the miner in every block it produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MiningReward {
    pub sender: String,
    pub receiver: String,
    pub amount: Number,
}

impl MiningReward {
    pub fn transaction(&self) -> Transaction {
        Transaction {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            amount: self.amount.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Leading zero hex characters required of a proof hash.
    pub difficulty: usize,
    /// Upper bound on proof candidates; `None` searches until found or cancelled.
    pub max_iterations: Option<u64>,
    /// Spread the proof search over the rayon pool.
    pub parallel: bool,
    pub pending: PendingPolicy,
    pub reward: Option<MiningReward>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_iterations: None,
            parallel: false,
            pending: PendingPolicy::default(),
            reward: None,
        }
    }
}

impl EngineConfig {
    pub fn with_difficulty(mut self, difficulty: usize) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_pending(mut self, pending: PendingPolicy) -> Self {
        self.pending = pending;
        self
    }

    pub fn with_reward(mut self, reward: MiningReward) -> Self {
        self.reward = Some(reward);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_node() {
        let config = EngineConfig::default();
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.max_iterations, None);
        assert!(!config.parallel);
        assert_eq!(config.pending, PendingPolicy::Clear);
        assert!(config.reward.is_none());
    }

    #[test]
    fn reward_transaction_example() {
        let reward = MiningReward {
            sender: "node-1".into(),
            receiver: "Tim".into(),
            amount: 1u64.into(),
        };
        let tx = reward.transaction();
        assert_eq!(tx, Transaction::new("node-1", "Tim", 1u64));
    }

    #[test]
    fn pending_policy_serde_names() {
        assert_eq!(
            serde_json::to_string(&PendingPolicy::Retain).unwrap(),
            r#""retain""#
        );
    }
}
