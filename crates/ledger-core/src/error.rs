use thiserror::Error;

use crate::peers::PeerAddr;

/// Failures surfaced by engine operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no proof found for previous proof {previous_proof} within {iterations} candidates")]
    SearchExhausted { previous_proof: u64, iterations: u64 },
    #[error("proof search cancelled")]
    Cancelled,
    #[error("invalid peer address {0:?}")]
    InvalidPeerAddress(String),
}

/// Why a single peer was left out of consensus. Never propagated past the engine.
#[derive(Debug, Clone, Error)]
pub enum PeerError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: PeerAddr, reason: String },
    #[error("peer {peer} sent an invalid response: {reason}")]
    InvalidResponse { peer: PeerAddr, reason: String },
}

/// First broken rule found while walking a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChainViolation {
    #[error("chain is empty")]
    Empty,
    #[error("block {index} does not reference the hash of its predecessor")]
    BrokenLink { index: u64 },
    #[error("block {index} carries a proof that fails the difficulty check")]
    InvalidProof { index: u64 },
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
