use clap::Parser;
use ledger_core::{constants::DEFAULT_DIFFICULTY, EngineConfig, MiningReward, PendingPolicy};

use crate::constants::{DEFAULT_LISTEN, DEFAULT_PEER_TIMEOUT_SECS, DEFAULT_REWARD_AMOUNT};

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node")]
pub struct NodeArgs {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Leading zero hex characters required of a proof hash
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    pub difficulty: usize,

    /// Give up the proof search after this many candidates
    #[arg(long)]
    pub max_iterations: Option<u64>,

    /// Search proofs on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Keep already-mined transactions in the pending buffer
    #[arg(long)]
    pub retain_pending: bool,

    /// Credit every mined block to this receiver
    #[arg(long)]
    pub reward_to: Option<String>,

    #[arg(long, default_value_t = DEFAULT_REWARD_AMOUNT)]
    pub reward_amount: u64,

    /// Peer to reconcile with (repeatable)
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Per-request timeout when fetching peer chains
    #[arg(long, default_value_t = DEFAULT_PEER_TIMEOUT_SECS)]
    pub peer_timeout_secs: u64,
}

impl NodeArgs {
    pub fn engine_config(&self, node_id: &str) -> EngineConfig {
        EngineConfig {
            difficulty: self.difficulty,
            max_iterations: self.max_iterations,
            parallel: self.parallel,
            pending: if self.retain_pending {
                PendingPolicy::Retain
            } else {
                PendingPolicy::Clear
            },
            reward: self.reward_to.as_ref().map(|receiver| MiningReward {
                sender: node_id.to_string(),
                receiver: receiver.clone(),
                amount: self.reward_amount.into(),
            }),
        }
    }
}
