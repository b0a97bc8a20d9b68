//! Endpoint tests against an in-memory router.

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use ledger_core::{EngineConfig, LedgerEngine};
use ledger_node::{router, AppState, HttpChainFetcher};
use serde_json::{json, Value};

fn test_server(config: EngineConfig) -> (TestServer, AppState) {
    let fetcher = HttpChainFetcher::new(Duration::from_millis(500)).expect("http client");
    let state = AppState::new(
        LedgerEngine::new(config),
        Arc::new(fetcher),
        "test-node".to_string(),
    );
    let server = TestServer::new(router(state.clone())).expect("Failed to create test server");
    (server, state)
}

fn fast() -> EngineConfig {
    EngineConfig::default().with_difficulty(2)
}

#[tokio::test]
async fn health_and_initial_chain() {
    let (server, _state) = test_server(fast());

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "ok");

    let response = server.get("/get_chain").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["length"], 1);
    assert_eq!(json["chain"][0]["index"], 1);
    assert_eq!(json["chain"][0]["proof"], 1);
    assert_eq!(json["chain"][0]["previous_hash"], "0");

    let response = server.get("/is_valid").await;
    let json: Value = response.json();
    assert_eq!(json["is_valid"], true);
}

#[tokio::test]
async fn transaction_then_mine() {
    let (server, state) = test_server(fast());

    let response = server
        .post("/add_transaction")
        .json(&json!({"sender": "alice", "receiver": "bob", "amount": 42}))
        .await;
    assert_eq!(response.status_code(), 201);
    let json: Value = response.json();
    assert_eq!(json["message"], "This transaction will be added to Block 2");
    assert_eq!(json["index"], 2);

    let response = server.get("/mine_block").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["message"], "Congratulations, you just mined a block!");
    assert_eq!(json["index"], 2);
    assert_eq!(json["proof"], 308);
    assert_eq!(
        json["transactions"],
        json!([{"sender": "alice", "receiver": "bob", "amount": 42}])
    );

    let response = server.get("/get_chain").await;
    let json: Value = response.json();
    assert_eq!(json["length"], 2);

    let response = server.get("/is_valid").await;
    let json: Value = response.json();
    assert_eq!(json["is_valid"], true);

    assert!(state.engine.lock().await.pending().is_empty());
}

#[tokio::test]
async fn transaction_with_missing_field_is_rejected() {
    let (server, state) = test_server(fast());

    let response = server
        .post("/add_transaction")
        .json(&json!({"sender": "alice", "amount": 42}))
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert_eq!(json["error"], "Some elements of the transaction are missing!");

    assert!(state.engine.lock().await.pending().is_empty());
}

#[tokio::test]
async fn mining_reward_is_included() {
    let mut config = fast();
    config.reward = Some(ledger_core::MiningReward {
        sender: "test-node".into(),
        receiver: "Tim".into(),
        amount: 1u64.into(),
    });
    let (server, _state) = test_server(config);

    let response = server.get("/mine_block").await;
    let json: Value = response.json();
    assert_eq!(
        json["transactions"],
        json!([{"sender": "test-node", "receiver": "Tim", "amount": 1}])
    );
}

#[tokio::test]
async fn exhausted_search_is_service_unavailable() {
    let mut config = EngineConfig::default();
    config.max_iterations = Some(10);
    let (server, state) = test_server(config);

    let response = server.get("/mine_block").await;
    assert_eq!(response.status_code(), 503);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("no proof found"));
    assert_eq!(state.engine.lock().await.len(), 1);
}

#[tokio::test]
async fn cancelled_search_is_service_unavailable() {
    let (server, state) = test_server(fast());
    state.cancel.cancel();

    let response = server.get("/mine_block").await;
    assert_eq!(response.status_code(), 503);
}

#[tokio::test]
async fn connect_node_validates_and_deduplicates() {
    let (server, state) = test_server(fast());

    let response = server.post("/connect_node").json(&json!({})).await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert_eq!(json["error"], "No nodes in request to add to network");

    let response = server
        .post("/connect_node")
        .json(&json!({"nodes": ["http://127.0.0.1:5002", "http://127.0.0.1:5001", "127.0.0.1:5001"]}))
        .await;
    assert_eq!(response.status_code(), 201);
    let json: Value = response.json();
    assert_eq!(json["message"], "Successfully added nodes to network");
    assert_eq!(json["total_nodes"], json!(["127.0.0.1:5001", "127.0.0.1:5002"]));

    let response = server
        .post("/connect_node")
        .json(&json!({"nodes": ["http://127.0.0.1:5003", "http://bad host"]}))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(state.engine.lock().await.peers().len(), 2);

    let response = server
        .post("/connect_node")
        .json(&json!({"nodes": ["https://127.0.0.1:8443"]}))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(state.engine.lock().await.peers().len(), 2);
}

#[tokio::test]
async fn replace_chain_without_reachable_peers() {
    let (server, state) = test_server(fast());

    let response = server.get("/replace_chain").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["chain_was_replaced"], false);
    assert_eq!(json["chain"].as_array().unwrap().len(), 1);

    // nothing listens on port 1
    state.engine.lock().await.add_peer("127.0.0.1:1").unwrap();
    let response = server.get("/replace_chain").await;
    let json: Value = response.json();
    assert_eq!(json["chain_was_replaced"], false);
}
