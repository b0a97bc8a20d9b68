use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LedgerError, Result};

/// Normalized network location of a peer: `host[:port]`, reached over plain `http`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerAddr(String);

impl PeerAddr {
    /// Accepts an `http` URL (`http://127.0.0.1:5001/`) or a bare `host:port`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = || LedgerError::InvalidPeerAddress(input.to_string());
        if trimmed.is_empty() {
            return Err(invalid());
        }
        let url = if trimmed.contains("://") {
            Url::parse(trimmed)
        } else {
            Url::parse(&format!("http://{trimmed}"))
        }
        .map_err(|_| invalid())?;
        if url.scheme() != "http" {
            return Err(invalid());
        }

        let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(invalid)?;
        let location = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Self(location))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PeerAddr {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Known peers, unique by location and iterated in address order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSet {
    peers: BTreeSet<PeerAddr>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and insert; `Ok(false)` when the location was already known.
    pub fn add(&mut self, address: &str) -> Result<bool> {
        Ok(self.insert(PeerAddr::parse(address)?))
    }

    pub fn insert(&mut self, peer: PeerAddr) -> bool {
        self.peers.insert(peer)
    }

    pub fn contains(&self, peer: &PeerAddr) -> bool {
        self.peers.contains(peer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerAddr> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl<'a> IntoIterator for &'a PeerSet {
    type Item = &'a PeerAddr;
    type IntoIter = std::collections::btree_set::Iter<'a, PeerAddr>;

    fn into_iter(self) -> Self::IntoIter {
        self.peers.iter()
    }
}
