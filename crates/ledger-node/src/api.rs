use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{
    consensus::fetch_all, Block, CancelFlag, LedgerEngine, LedgerError, PeerAddr, PeerChain,
    PeerChainFetcher, Transaction,
};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::constants::{MINED_MESSAGE, MISSING_NODES, MISSING_TX_FIELDS, NODES_ADDED};

/// Shared handler state. The engine sits behind one lock so mining and chain
/// replacement are serialized.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<LedgerEngine>>,
    pub fetcher: Arc<dyn PeerChainFetcher>,
    pub cancel: CancelFlag,
    pub node_id: String,
}

impl AppState {
    pub fn new(engine: LedgerEngine, fetcher: Arc<dyn PeerChainFetcher>, node_id: String) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            fetcher,
            cancel: CancelFlag::new(),
            node_id,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match err {
            LedgerError::Cancelled | LedgerError::SearchExhausted { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            LedgerError::InvalidPeerAddress(_) => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub timestamp: String,
    pub proof: u64,
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
}

impl From<Block> for MineResponse {
    fn from(block: Block) -> Self {
        Self {
            message: MINED_MESSAGE.to_string(),
            index: block.index,
            timestamp: block.timestamp,
            proof: block.proof,
            previous_hash: block.previous_hash,
            transactions: block.transactions,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Validity {
    pub is_valid: bool,
}

#[derive(Deserialize)]
struct TxIn {
    sender: String,
    receiver: String,
    amount: Number,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TxAccepted {
    pub message: String,
    pub index: u64,
}

#[derive(Deserialize)]
struct ConnectIn {
    nodes: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Connected {
    pub message: String,
    pub total_nodes: Vec<PeerAddr>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Replaced {
    pub chain_was_replaced: bool,
    pub chain: Vec<Block>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/mine_block", get(mine_block))
        .route("/get_chain", get(get_chain))
        .route("/is_valid", get(is_valid))
        .route("/add_transaction", post(add_transaction))
        .route("/connect_node", post(connect_node))
        .route("/replace_chain", get(replace_chain))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn mine_block(State(state): State<AppState>) -> Result<Json<MineResponse>, ApiError> {
    let engine = state.engine.clone();
    let cancel = state.cancel.clone();
    // the proof search is CPU bound; keep it off the async workers
    let block = tokio::task::spawn_blocking(move || engine.blocking_lock().mine_block(&cancel))
        .await
        .map_err(|err| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))??;
    Ok(Json(block.into()))
}

async fn get_chain(State(state): State<AppState>) -> Json<PeerChain> {
    let engine = state.engine.lock().await;
    Json(PeerChain::new(engine.chain().to_vec()))
}

async fn is_valid(State(state): State<AppState>) -> Json<Validity> {
    let engine = state.engine.lock().await;
    Json(Validity {
        is_valid: engine.is_valid(),
    })
}

async fn add_transaction(
    State(state): State<AppState>,
    payload: Result<Json<TxIn>, JsonRejection>,
) -> Result<(StatusCode, Json<TxAccepted>), ApiError> {
    let Json(tx) = payload.map_err(|rejection| {
        warn!(%rejection, "rejected transaction");
        ApiError::new(StatusCode::BAD_REQUEST, MISSING_TX_FIELDS)
    })?;
    let index = state
        .engine
        .lock()
        .await
        .queue_transaction(tx.sender, tx.receiver, tx.amount);
    Ok((
        StatusCode::CREATED,
        Json(TxAccepted {
            message: format!("This transaction will be added to Block {index}"),
            index,
        }),
    ))
}

async fn connect_node(
    State(state): State<AppState>,
    payload: Result<Json<ConnectIn>, JsonRejection>,
) -> Result<(StatusCode, Json<Connected>), ApiError> {
    let nodes = payload
        .ok()
        .and_then(|Json(body)| body.nodes)
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, MISSING_NODES))?;

    // reject the whole request before touching the peer set
    let parsed = nodes
        .iter()
        .map(|node| PeerAddr::parse(node))
        .collect::<Result<Vec<_>, _>>()?;

    let mut engine = state.engine.lock().await;
    for peer in parsed {
        engine.add_peer(peer.as_str())?;
    }
    let total_nodes: Vec<PeerAddr> = engine.peers().iter().cloned().collect();
    info!(total = total_nodes.len(), "peers connected");
    Ok((
        StatusCode::CREATED,
        Json(Connected {
            message: NODES_ADDED.to_string(),
            total_nodes,
        }),
    ))
}

async fn replace_chain(State(state): State<AppState>) -> Json<Replaced> {
    // lock is released while peers are queried
    let peers = state.engine.lock().await.peers().clone();
    let responses = fetch_all(state.fetcher.as_ref(), &peers).await;

    let mut engine = state.engine.lock().await;
    let chain_was_replaced = engine.adopt_longest(responses);
    Json(Replaced {
        chain_was_replaced,
        chain: engine.chain().to_vec(),
    })
}
