//! End-to-end tests against a mock upstream RPC node.
//!
//! A local axum server answers JSON-RPC with canned Solana-shaped payloads;
//! the gateway under test is pointed at it and driven through the public
//! HTTP surface.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use solux_core::config::AppConfig;
use solux_core::Gateway;

const ADDRESS: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
const SIGNATURE: &str = "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW";

/// Shared state for the mock node: a slot counter so repeated `getSlot`
/// calls observably differ when the cache is not serving them.
#[derive(Default)]
struct MockNode {
    slot_calls: AtomicU64,
}

fn block_fixture() -> Value {
    let tx = |signature: &str, fee: u64, compute: u64, err: Value| {
        json!({
            "meta": {
                "err": err,
                "fee": fee,
                "computeUnitsConsumed": compute,
                "preBalances": [1_000_000u64, 0u64],
                "postBalances": [1_000_000u64 - fee, 0u64],
                "logMessages": []
            },
            "transaction": {
                "signatures": [signature],
                "message": {
                    "header": {
                        "numRequiredSignatures": 1,
                        "numReadonlySignedAccounts": 0,
                        "numReadonlyUnsignedAccounts": 1
                    },
                    "accountKeys": ["payerKey", "11111111111111111111111111111111"],
                    "instructions": [{"programIdIndex": 1, "accounts": [0], "data": ""}]
                }
            }
        })
    };

    json!({
        "blockhash": "mockBlockhash",
        "previousBlockhash": "mockPrevHash",
        "parentSlot": 12344,
        "blockTime": 1700000000,
        "blockHeight": 11900,
        "transactions": [
            tx("txA", 5000, 200, Value::Null),
            tx("txB", 7000, 300, Value::Null),
            tx("txC", 1000, 100, json!({"InstructionError": [0, {"Custom": 1}]})),
        ],
        "rewards": []
    })
}

fn failed_transaction_fixture() -> Value {
    json!({
        "slot": 12345,
        "blockTime": 1700000000,
        "meta": {
            "err": {"InstructionError": [0, {"Custom": 6000}]},
            "fee": 5000,
            "computeUnitsConsumed": 400,
            "preBalances": [10_000u64],
            "postBalances": [5_000u64],
            "logMessages": ["Program failed to complete"]
        },
        "transaction": {
            "signatures": [SIGNATURE],
            "message": {
                "recentBlockhash": "mockBlockhash",
                "header": {
                    "numRequiredSignatures": 1,
                    "numReadonlySignedAccounts": 0,
                    "numReadonlyUnsignedAccounts": 0
                },
                "accountKeys": ["payerKey"],
                "instructions": []
            }
        }
    })
}

fn token_accounts_fixture() -> Value {
    let account = |pubkey: &str, mint: &str, amount: &str, ui: f64| {
        json!({
            "pubkey": pubkey,
            "account": {"data": {"parsed": {"info": {
                "mint": mint,
                "state": "initialized",
                "tokenAmount": {
                    "amount": amount,
                    "decimals": 6,
                    "uiAmount": ui,
                    "uiAmountString": ui.to_string()
                }
            }}}}
        })
    };

    json!({"context": {"slot": 1}, "value": [
        account("tokenAcc1", "mintWithBalance", "2500000", 2.5),
        account("tokenAcc2", "mintZeroBalance", "0", 0.0),
    ]})
}

async fn mock_rpc(State(node): State<Arc<MockNode>>, Json(request): Json<Value>) -> Json<Value> {
    let method = request["method"].as_str().unwrap_or_default();
    let id = request["id"].clone();

    let result = match method {
        "getSlot" => json!(250_000_000 + node.slot_calls.fetch_add(1, Ordering::SeqCst)),
        "getEpochInfo" => json!({
            "epoch": 600,
            "slotIndex": 1000,
            "slotsInEpoch": 432000,
            "absoluteSlot": 250_000_000u64,
            "blockHeight": 230_000_000u64
        }),
        "getSupply" => json!({"context": {"slot": 1}, "value": {
            "total": 580_000_000_000_000_000u64,
            "circulating": 460_000_000_000_000_000u64,
            "nonCirculating": 120_000_000_000_000_000u64
        }}),
        "getRecentPerformanceSamples" => {
            json!([{"numTransactions": 150000, "samplePeriodSecs": 60}])
        }
        "getVoteAccounts" => json!({
            "current": [{"votePubkey": "v1"}, {"votePubkey": "v2"}],
            "delinquent": []
        }),
        "getBlock" => block_fixture(),
        "getBlocks" => json!([]),
        "getTransaction" => {
            let signature = request["params"][0].as_str().unwrap_or_default();
            if signature == SIGNATURE {
                failed_transaction_fixture()
            } else {
                Value::Null
            }
        }
        "getTokenAccountsByOwner" => token_accounts_fixture(),
        "getSignaturesForAddress" => json!([]),
        "getBalance" => json!({"context": {"slot": 1}, "value": 2_000_000_000u64}),
        "getAccountInfo" => json!({"context": {"slot": 1}, "value": {
            "lamports": 2_000_000_000u64,
            "owner": "11111111111111111111111111111111",
            "executable": false,
            "rentEpoch": 361,
            "data": ["", "base64"]
        }}),
        _ => Value::Null,
    };

    Json(json!({"jsonrpc": "2.0", "result": result, "id": id}))
}

/// Starts the mock node on an ephemeral port and returns its URL.
async fn spawn_mock_node() -> String {
    let node = Arc::new(MockNode::default());
    let app = Router::new().route("/", post(mock_rpc)).with_state(node);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("ephemeral bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock node serve");
    });

    format!("http://{addr}")
}

async fn gateway_app(upstream_url: &str, volatile_ttl_seconds: u64) -> Router {
    let mut config = AppConfig::default();
    config.networks.mainnet_url = upstream_url.to_string();
    config.networks.devnet_url = upstream_url.to_string();
    config.cache.volatile_ttl_seconds = volatile_ttl_seconds;

    let gateway = Arc::new(Gateway::new(config).expect("gateway must build"));
    server::router::create_router(gateway)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.expect("body");
    (parts.status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn block_metrics_sum_transaction_meta() {
    let upstream = spawn_mock_node().await;
    let app = gateway_app(&upstream, 15).await;

    let (status, body) = get_json(&app, "/api/v1/mainnet/blocks/12345").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let metrics = &body["data"]["metrics"];
    assert_eq!(metrics["transactionCount"], 3);
    assert_eq!(metrics["successfulTransactions"], 2);
    assert_eq!(metrics["failedTransactions"], 1);
    assert_eq!(metrics["totalFees"], 13000);

    // Cache-Control advertises the finalized TTL class.
    assert_eq!(body["data"]["slot"], 12345);
}

#[tokio::test]
async fn failed_transaction_reports_failure_status() {
    let upstream = spawn_mock_node().await;
    let app = gateway_app(&upstream, 15).await;

    let (status, body) =
        get_json(&app, &format!("/api/v1/mainnet/transactions/{SIGNATURE}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "failure");
    assert_eq!(body["data"]["fee"], 5000);
    assert!(body["data"]["error"]["err"].is_object());
}

#[tokio::test]
async fn unknown_transaction_is_404() {
    let upstream = spawn_mock_node().await;
    let app = gateway_app(&upstream, 15).await;

    // Base58 and plausible, but the mock node knows no such signature.
    let (status, body) = get_json(
        &app,
        "/api/v1/mainnet/transactions/1111111111111111111111111111111111111111111111111111111111111111111111111111111111111111",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "TRANSACTION_NOT_FOUND");
}

#[tokio::test]
async fn zero_balance_tokens_excluded_unless_requested() {
    let upstream = spawn_mock_node().await;
    let app = gateway_app(&upstream, 15).await;

    let (status, body) = get_json(
        &app,
        &format!("/api/v1/mainnet/addresses/{ADDRESS}/tokens?includeZeroBalance=false"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let fungible = body["data"]["tokens"]["fungible"].as_array().expect("fungible list");
    assert_eq!(fungible.len(), 1);
    assert_eq!(fungible[0]["mint"], "mintWithBalance");

    let (_, body) = get_json(
        &app,
        &format!("/api/v1/mainnet/addresses/{ADDRESS}/tokens?includeZeroBalance=true"),
    )
    .await;
    let fungible = body["data"]["tokens"]["fungible"].as_array().expect("fungible list");
    assert_eq!(fungible.len(), 2);
}

#[tokio::test]
async fn network_stats_served_from_cache_within_ttl() {
    let upstream = spawn_mock_node().await;
    let app = gateway_app(&upstream, 1).await;

    let (_, first) = get_json(&app, "/api/v1/mainnet/network/stats").await;
    let (_, second) = get_json(&app, "/api/v1/mainnet/network/stats").await;
    // Identical payloads, including lastUpdated: the second request never
    // reached the upstream.
    assert_eq!(first["data"], second["data"]);

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    let (_, third) = get_json(&app, "/api/v1/mainnet/network/stats").await;
    // The mock node advances its slot per call, so a refetch is visible.
    assert_ne!(
        first["data"]["currentSlot"], third["data"]["currentSlot"],
        "expired entry must trigger a refetch"
    );
}

#[tokio::test]
async fn address_detail_round_trip() {
    let upstream = spawn_mock_node().await;
    let app = gateway_app(&upstream, 15).await;

    let (status, body) = get_json(&app, &format!("/api/v1/mainnet/addresses/{ADDRESS}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["exists"], true);
    assert_eq!(body["data"]["type"], "wallet");
    assert_eq!(body["data"]["account"]["lamports"], 2_000_000_000u64);
}

#[tokio::test]
async fn search_auto_detects_block_slots() {
    let upstream = spawn_mock_node().await;
    let app = gateway_app(&upstream, 15).await;

    let (status, body) = get_json(&app, "/api/v1/mainnet/search?q=12345").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], "block");
    assert_eq!(body["data"]["results"][0]["summary"]["blockhash"], "mockBlockhash");
}

#[tokio::test]
async fn envelope_shape_is_uniform() {
    let upstream = spawn_mock_node().await;
    let app = gateway_app(&upstream, 15).await;

    let (_, ok_body) = get_json(&app, "/api/v1/mainnet/network/stats").await;
    assert_eq!(ok_body["success"], true);
    assert!(ok_body["timestamp"].is_string());

    let (_, err_body) = get_json(&app, "/api/v1/mainnet/blocks/notaslot").await;
    assert_eq!(err_body["success"], false);
    assert!(err_body["timestamp"].is_string());
    assert!(err_body["error"]["code"].is_string());
}
