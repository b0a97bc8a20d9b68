use std::time::Duration;

use async_trait::async_trait;
use ledger_core::{PeerAddr, PeerChain, PeerChainFetcher, PeerError};
use reqwest::Client;
use tracing::debug;

/// Fetches `GET http://{peer}/get_chain` from other nodes.
#[derive(Clone, Debug)]
pub struct HttpChainFetcher {
    client: Client,
}

impl HttpChainFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PeerChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, peer: &PeerAddr) -> Result<PeerChain, PeerError> {
        let url = format!("http://{peer}/get_chain");
        debug!(%url, "fetching peer chain");
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| PeerError::Unreachable {
                peer: peer.clone(),
                reason: err.to_string(),
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(PeerError::InvalidResponse {
                peer: peer.clone(),
                reason: format!("status {status}"),
            });
        }
        res.json::<PeerChain>()
            .await
            .map_err(|err| PeerError::InvalidResponse {
                peer: peer.clone(),
                reason: err.to_string(),
            })
    }
}
