//! HTTP node wrapping a [`ledger_core::LedgerEngine`].

pub mod api;
pub mod config;
pub(crate) mod constants;
pub mod fetcher;

pub use api::{router, AppState};
pub use config::NodeArgs;
pub use fetcher::HttpChainFetcher;

/// Random node identifier used as the sender of mining rewards.
pub fn new_node_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
