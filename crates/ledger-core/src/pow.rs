use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::constants::PARALLEL_WINDOW;
use crate::error::{LedgerError, Result};
use crate::hashchain::satisfies_difficulty;

/// Shared flag polled by the proof search; clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Linear search from 1 for the first proof satisfying `difficulty` against `previous`.
///
/// Candidate `k` is the `k`-th attempt, so `max_iterations` caps the largest
/// candidate tried. `None` searches until a proof is found or `cancel` fires.
pub fn mine_proof(
    previous: u64,
    difficulty: usize,
    max_iterations: Option<u64>,
    cancel: &CancelFlag,
) -> Result<u64> {
    let limit = max_iterations.unwrap_or(u64::MAX);
    for candidate in 1..=limit {
        if cancel.is_cancelled() {
            debug!(previous, candidate, "proof search cancelled");
            return Err(LedgerError::Cancelled);
        }
        if satisfies_difficulty(candidate, previous, difficulty) {
            info!(previous, proof = candidate, difficulty, "found proof");
            return Ok(candidate);
        }
    }
    Err(LedgerError::SearchExhausted {
        previous_proof: previous,
        iterations: limit,
    })
}

/// Same result as [`mine_proof`], with each window of candidates scanned on the rayon pool.
///
/// Windows are visited in ascending order and `find_first` keeps the lowest hit,
/// so the returned proof is still the smallest one.
pub fn mine_proof_parallel(
    previous: u64,
    difficulty: usize,
    max_iterations: Option<u64>,
    cancel: &CancelFlag,
) -> Result<u64> {
    let limit = max_iterations.unwrap_or(u64::MAX);
    let mut start = 1u64;
    while start <= limit {
        if cancel.is_cancelled() {
            debug!(previous, start, "parallel proof search cancelled");
            return Err(LedgerError::Cancelled);
        }
        let end = start.saturating_add(PARALLEL_WINDOW - 1).min(limit);
        let found = (start..=end)
            .into_par_iter()
            .find_first(|candidate| satisfies_difficulty(*candidate, previous, difficulty));
        if let Some(proof) = found {
            info!(previous, proof, difficulty, "found proof");
            return Ok(proof);
        }
        if end == u64::MAX {
            break;
        }
        start = end + 1;
    }
    Err(LedgerError::SearchExhausted {
        previous_proof: previous,
        iterations: limit,
    })
}
