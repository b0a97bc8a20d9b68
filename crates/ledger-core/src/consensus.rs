//! Longest-valid-chain selection over peer responses.
//!
//! Fetching is injected through [`PeerChainFetcher`] so the decision can run
//! against canned responses in tests and against HTTP peers in the node.

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PeerError;
use crate::hashchain::is_chain_valid;
use crate::peers::{PeerAddr, PeerSet};
use crate::Block;

/// A peer's view of its ledger, as served by `GET /get_chain`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerChain {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl PeerChain {
    pub fn new(chain: Vec<Block>) -> Self {
        Self {
            length: chain.len(),
            chain,
        }
    }
}

pub type PeerResponse = (PeerAddr, Result<PeerChain, PeerError>);

#[async_trait]
pub trait PeerChainFetcher: Send + Sync {
    async fn fetch_chain(&self, peer: &PeerAddr) -> Result<PeerChain, PeerError>;
}

/// One request per peer, issued concurrently; responses come back in peer-set order.
pub async fn fetch_all<F>(fetcher: &F, peers: &PeerSet) -> Vec<PeerResponse>
where
    F: PeerChainFetcher + ?Sized,
{
    let requests = peers.iter().map(|peer| async move {
        let res = fetcher.fetch_chain(peer).await;
        (peer.clone(), res)
    });
    join_all(requests).await
}

/// Pick the longest chain strictly longer than `local_len` that passes validation.
///
/// Among equally long candidates the first response wins. Failed responses and
/// chains whose reported length disagrees with their content are skipped.
pub fn select_longest(
    local_len: usize,
    responses: Vec<PeerResponse>,
    difficulty: usize,
) -> Option<(PeerAddr, Vec<Block>)> {
    let mut max_length = local_len;
    let mut longest = None;

    for (peer, res) in responses {
        let reply = match res {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%peer, %err, "skipping peer");
                continue;
            }
        };
        if reply.length != reply.chain.len() {
            warn!(
                %peer,
                reported = reply.length,
                actual = reply.chain.len(),
                "skipping peer with inconsistent chain length"
            );
            continue;
        }
        if reply.length <= max_length {
            debug!(%peer, length = reply.length, max_length, "peer chain not longer");
            continue;
        }
        if !is_chain_valid(&reply.chain, difficulty) {
            warn!(%peer, length = reply.length, "skipping peer with invalid chain");
            continue;
        }
        debug!(%peer, length = reply.length, "new longest valid chain");
        max_length = reply.length;
        longest = Some((peer, reply.chain));
    }
    longest
}
