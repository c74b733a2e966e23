//! Integration tests for the network collaborators.
//!
//! These tests run the Esplora, Monero wallet RPC and CoinGecko clients
//! against mock HTTP servers.
//!
//! ```bash
//! cargo test -p coinacceptor-lib --features http-executor --test executor_integration
//! ```
//!
//! The `*_real` tests are marked `#[ignore]` and hit public mainnet APIs:
//!
//! ```bash
//! cargo test -p coinacceptor-lib --features http-executor esplora_real -- --ignored
//! ```

#![cfg(feature = "http-executor")]

use std::sync::Arc;

use coinacceptor_lib::executors::{
    CoinGeckoConfig, CoinGeckoPriceFeed, EsploraConfig, EsploraUnspentSource, MoneroRpcConfig,
    MoneroRpcConnector,
};
use coinacceptor_lib::ports::{
    PriceFeed, SubaddressIndex, UnspentSource, WalletConnection, WalletConnector, WalletPort,
};
use coinacceptor_lib::{AcceptorConfig, AcceptorError, Currency, PaymentAcceptor, PaymentRequest};
use wiremock::{
    matchers::{body_partial_json, header_exists, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const ADDRESS: &str = "16jCrzcXo2PxadrQiQwUgwrmEwDGQYBwZq";
const IDENTITY: &str = "cab41de5-ad64-446d-9ab4-6dc794162bfc";

// ============================================================================
// Esplora
// ============================================================================

async fn mount_utxos(server: &MockServer, body: serde_json::Value, tip: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/address/{}/utxo", ADDRESS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blocks/tip/height"))
        .respond_with(ResponseTemplate::new(200).set_body_string(tip.to_string()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_esplora_list_unspent_mock() {
    let mock_server = MockServer::start().await;
    mount_utxos(
        &mock_server,
        serde_json::json!([
            {"txid": "deep", "vout": 0, "value": 10721,
             "status": {"confirmed": true, "block_height": 800000}},
            {"txid": "fresh", "vout": 1, "value": 10721,
             "status": {"confirmed": true, "block_height": 800009}},
            {"txid": "mempool", "vout": 0, "value": 20000,
             "status": {"confirmed": false}}
        ]),
        800_009,
    )
    .await;

    let source = EsploraUnspentSource::new(EsploraConfig::new(mock_server.uri())).unwrap();
    let utxos = source.list_unspent(ADDRESS).await.unwrap();

    assert_eq!(utxos.len(), 3);
    assert_eq!((utxos[0].txid.as_str(), utxos[0].confirmations), ("deep", 10));
    assert_eq!((utxos[1].txid.as_str(), utxos[1].confirmations), ("fresh", 1));
    assert_eq!((utxos[2].txid.as_str(), utxos[2].confirmations), ("mempool", 0));
}

#[tokio::test]
async fn test_esplora_payment_skips_deep_output() {
    let mock_server = MockServer::start().await;
    mount_utxos(
        &mock_server,
        serde_json::json!([
            {"txid": "deep", "vout": 0, "value": 10721,
             "status": {"confirmed": true, "block_height": 800000}},
            {"txid": "fresh", "vout": 1, "value": 10721,
             "status": {"confirmed": true, "block_height": 800009}}
        ]),
        800_009,
    )
    .await;

    let source = EsploraUnspentSource::new(EsploraConfig::new(mock_server.uri())).unwrap();
    let acceptor = PaymentAcceptor::new(AcceptorConfig::default())
        .unwrap()
        .with_unspent_source(Currency::Btc, Arc::new(source));
    let request = PaymentRequest::atomic(Currency::Btc, IDENTITY, [10_000]).with_address(ADDRESS);

    let result = acceptor.pay(&request).await.unwrap();
    assert_eq!(result.txid.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_esplora_error_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/address/bad/utxo"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid Bitcoin address"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/address/busy/utxo"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/address/down/utxo"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let source = EsploraUnspentSource::new(EsploraConfig::new(mock_server.uri())).unwrap();

    let err = source.list_unspent("bad").await.unwrap_err();
    assert!(matches!(err, AcceptorError::InvalidData { .. }));

    let err = source.list_unspent("busy").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.retry_after_ms(), Some(5000));

    let err = source.list_unspent("down").await.unwrap_err();
    assert!(matches!(err, AcceptorError::Internal(ref msg) if msg.contains("maintenance")));
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_esplora_real_mainnet() {
    let source = EsploraUnspentSource::blockstream_mainnet().unwrap();
    let tip = source.tip_height().await.unwrap();
    assert!(tip > 800_000);
}

// ============================================================================
// Monero wallet RPC
// ============================================================================

fn wallet_connection(server: &MockServer) -> WalletConnection {
    let address = server.address();
    WalletConnection::new(address.ip().to_string(), address.port(), "monero", "password")
}

#[tokio::test]
async fn test_monero_rpc_subaddress_payment_mock() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/json_rpc"))
        .and(header_exists("authorization"))
        .and(body_partial_json(serde_json::json!({
            "method": "get_address",
            "params": {"account_index": 0, "address_index": [79]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "0", "jsonrpc": "2.0",
            "result": {
                "address": "4primary",
                "addresses": [{"address": "8sub79", "address_index": 79, "label": "", "used": false}]
            }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/json_rpc"))
        .and(body_partial_json(serde_json::json!({"method": "get_height"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "0", "jsonrpc": "2.0", "result": {"height": 3000000}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/json_rpc"))
        .and(body_partial_json(serde_json::json!({
            "method": "get_transfers",
            "params": {
                "in": true,
                "account_index": 0,
                "subaddr_indices": [79],
                "filter_by_height": true,
                "min_height": 2999279
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "0", "jsonrpc": "2.0",
            "result": {"in": [
                {"txid": "before-window", "amount": 250000000000u64, "height": 2999279,
                 "subaddr_index": {"major": 0, "minor": 79}},
                {"txid": "small", "amount": 1000, "height": 2999900,
                 "subaddr_index": {"major": 0, "minor": 79}},
                {"txid": "exact", "amount": 250000000000u64, "height": 2999950,
                 "subaddr_index": {"major": 0, "minor": 79}}
            ]}
        })))
        .mount(&mock_server)
        .await;

    let acceptor = PaymentAcceptor::new(AcceptorConfig::default())
        .unwrap()
        .with_wallet_connector(Arc::new(MoneroRpcConnector::new(MoneroRpcConfig::default())));
    let request = PaymentRequest::atomic(Currency::Xmr, IDENTITY, [250_000_000_000])
        .with_wallet(wallet_connection(&mock_server));

    let result = acceptor.pay(&request).await.unwrap();
    assert_eq!(result.address, "8sub79");
    assert_eq!(result.txid.as_deref(), Some("exact"));
    assert_eq!(result.uri, "monero:8sub79?tx_amount=0.250000000000");
}

#[tokio::test]
async fn test_monero_rpc_creates_missing_subaddress() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/json_rpc"))
        .and(body_partial_json(serde_json::json!({"method": "get_address"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "0", "jsonrpc": "2.0",
            "error": {"code": -15, "message": "Address index is out of bound"}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/json_rpc"))
        .and(body_partial_json(serde_json::json!({"method": "get_address"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "0", "jsonrpc": "2.0",
            "result": {
                "address": "4primary",
                "addresses": [{"address": "8sub3", "address_index": 3}]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // the wallet already has indices 0 and 1
    for created in [2, 3] {
        Mock::given(method("POST"))
            .and(path("/json_rpc"))
            .and(body_partial_json(serde_json::json!({
                "method": "create_address",
                "params": {"account_index": 0}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "0", "jsonrpc": "2.0",
                "result": {"address": format!("8sub{}", created), "address_index": created}
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let wallet = MoneroRpcConnector::default()
        .connect(&wallet_connection(&mock_server))
        .unwrap();
    let address = wallet
        .address_at(SubaddressIndex { major: 0, minor: 3 })
        .await
        .unwrap();
    assert_eq!(address, "8sub3");
}

#[tokio::test]
async fn test_monero_rpc_error_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/json_rpc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "0", "jsonrpc": "2.0",
            "error": {"code": -13, "message": "No wallet file"}
        })))
        .mount(&mock_server)
        .await;

    let wallet = MoneroRpcConnector::default()
        .connect(&wallet_connection(&mock_server))
        .unwrap();

    let err = wallet.height().await.unwrap_err();
    assert!(matches!(err, AcceptorError::Rpc { code: -13, .. }));

    let err = wallet
        .address_at(SubaddressIndex { major: 0, minor: 1 })
        .await
        .unwrap_err();
    assert!(matches!(err, AcceptorError::Rpc { .. }));
}

#[tokio::test]
async fn test_monero_rpc_rejected_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/json_rpc"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let wallet = MoneroRpcConnector::default()
        .connect(&wallet_connection(&mock_server))
        .unwrap();
    let err = wallet.height().await.unwrap_err();
    assert!(matches!(err, AcceptorError::ConnectionFailed { .. }));
}

// ============================================================================
// CoinGecko
// ============================================================================

#[tokio::test]
async fn test_coingecko_price_mock() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .and(query_param("ids", "monero"))
        .and(query_param("vs_currencies", "usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "monero": {"usd": 162.5}
        })))
        .mount(&mock_server)
        .await;

    let feed = CoinGeckoPriceFeed::new(CoinGeckoConfig::new(mock_server.uri())).unwrap();
    let samples = feed.price_samples(Currency::Xmr).await.unwrap();
    assert_eq!(samples.current, 162.5);
    assert_eq!(samples.previous, 162.5);
}

#[tokio::test]
async fn test_coingecko_missing_coin() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let feed = CoinGeckoPriceFeed::new(CoinGeckoConfig::new(mock_server.uri())).unwrap();
    let err = feed.price_samples(Currency::Bsv).await.unwrap_err();
    assert!(matches!(err, AcceptorError::NotFound { .. }));
}
