use tracing::info;

use crate::config::{EngineConfig, PendingPolicy};
use crate::consensus::{fetch_all, select_longest, PeerChainFetcher, PeerResponse};
use crate::error::Result;
use crate::hashchain::{hash, is_chain_valid};
use crate::peers::PeerSet;
use crate::pow::{self, CancelFlag};
use crate::{Block, Transaction};

/// In-memory ledger: the chain, the pending buffer and the known peers.
///
/// Operations that mutate the chain take `&mut self`; callers sharing an engine
/// across tasks wrap it in a single lock so mining and consensus never interleave.
#[derive(Clone, Debug)]
pub struct LedgerEngine {
    config: EngineConfig,
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    peers: PeerSet,
}

impl Default for LedgerEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl LedgerEngine {
    /// A fresh ledger holding only the genesis block.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            peers: PeerSet::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    pub fn latest_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger chain always holds the genesis block")
    }

    pub fn is_valid(&self) -> bool {
        is_chain_valid(&self.chain, self.config.difficulty)
    }

    /// Register a peer; `Ok(false)` if its location was already known.
    pub fn add_peer(&mut self, address: &str) -> Result<bool> {
        let added = self.peers.add(address)?;
        if added {
            info!(address, peers = self.peers.len(), "peer added");
        }
        Ok(added)
    }

    /// Queue a transaction and return the index of the block expected to carry it.
    pub fn queue_transaction(
        &mut self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: impl Into<serde_json::Number>,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, receiver, amount));
        self.latest_block().index + 1
    }

    pub fn mine_proof(&self, previous_proof: u64, cancel: &CancelFlag) -> Result<u64> {
        let EngineConfig {
            difficulty,
            max_iterations,
            parallel,
            ..
        } = self.config;
        if parallel {
            pow::mine_proof_parallel(previous_proof, difficulty, max_iterations, cancel)
        } else {
            pow::mine_proof(previous_proof, difficulty, max_iterations, cancel)
        }
    }

    /// Search a proof on top of the latest block and append a block holding the
    /// pending transactions. On error the ledger is left untouched.
    pub fn mine_block(&mut self, cancel: &CancelFlag) -> Result<Block> {
        let previous = self.latest_block();
        let proof = self.mine_proof(previous.proof, cancel)?;
        let previous_hash = hash(previous);
        let index = previous.index + 1;

        if let Some(reward) = &self.config.reward {
            self.pending.push(reward.transaction());
        }
        let transactions = match self.config.pending {
            PendingPolicy::Clear => std::mem::take(&mut self.pending),
            PendingPolicy::Retain => self.pending.clone(),
        };

        let block = Block::new(index, proof, previous_hash, transactions);
        info!(index, proof, txs = block.transactions.len(), "mined block");
        self.chain.push(block.clone());
        Ok(block)
    }

    /// Ask every known peer for its chain and adopt the longest valid one that
    /// beats the local chain. Unreachable or invalid peers are skipped.
    pub async fn resolve_consensus<F>(&mut self, fetcher: &F) -> bool
    where
        F: PeerChainFetcher + ?Sized,
    {
        let responses = fetch_all(fetcher, &self.peers).await;
        self.adopt_longest(responses)
    }

    /// Decision half of [`Self::resolve_consensus`] for responses gathered elsewhere.
    pub fn adopt_longest(&mut self, responses: Vec<PeerResponse>) -> bool {
        match select_longest(self.chain.len(), responses, self.config.difficulty) {
            Some((peer, chain)) => {
                info!(
                    %peer,
                    old_len = self.chain.len(),
                    new_len = chain.len(),
                    "replacing local chain"
                );
                self.chain = chain;
                true
            }
            None => false,
        }
    }
}
