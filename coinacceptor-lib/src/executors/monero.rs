//! Monero wallet RPC client.
//!
//! Speaks JSON-RPC 2.0 to `monero-wallet-rpc` over `POST /json_rpc`. A new
//! client is built for every payment check from the caller's
//! [`WalletConnection`]; hosts ending in `.onion` are reached through the
//! configured SOCKS proxy.
//!
//! Credentials are sent as HTTP basic auth. Wallets started with
//! `--rpc-login` expect digest auth, so put them behind a proxy that
//! translates, or run them with `--disable-rpc-login` on a private network.
//!
//! Subaddresses past the wallet's current count are created on demand with
//! `create_address`, so a fresh wallet serves every derived index.
//!
//! `get_transfers` treats `min_height` as exclusive. [`WalletPort`] takes an
//! inclusive lower bound, so the request is sent one block lower.
//!
//! # Example
//!
//! ```rust,ignore
//! use coinacceptor_lib::executors::{MoneroRpcConfig, MoneroRpcConnector};
//! use coinacceptor_lib::ports::{WalletConnection, WalletConnector};
//!
//! let connector = MoneroRpcConnector::new(MoneroRpcConfig::default());
//! let wallet = connector.connect(&WalletConnection::new("127.0.0.1", 18082, "monero", "secret"))?;
//! println!("wallet height {}", wallet.height().await?);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
#[cfg(feature = "http-executor")]
use std::time::Duration;

use super::config::MoneroRpcConfig;
use crate::ports::{IncomingTransfer, SubaddressIndex, WalletConnection, WalletConnector, WalletPort};
use crate::{AcceptorError, Result};

/// `WALLET_RPC_ERROR_CODE_ADDRESS_INDEX_OUT_OF_BOUNDS`
const ADDRESS_INDEX_OUT_OF_BOUNDS: i64 = -15;

/// JSON-RPC client for one wallet.
pub struct MoneroWalletRpc {
    connection: WalletConnection,
    #[cfg_attr(not(feature = "http-executor"), allow(dead_code))]
    timeout_secs: u64,
    #[cfg(feature = "http-executor")]
    client: reqwest::Client,
}

impl MoneroWalletRpc {
    /// Create a client for `connection`.
    #[cfg(feature = "http-executor")]
    pub fn new(connection: WalletConnection, config: &MoneroRpcConfig) -> Result<Self> {
        connection.validate()?;

        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if connection.is_onion() {
            let proxy = reqwest::Proxy::all(&config.socks_proxy).map_err(|e| {
                AcceptorError::invalid_data("socks_proxy", format!("{}: {}", config.socks_proxy, e))
            })?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| AcceptorError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            connection,
            timeout_secs: config.timeout_secs,
            client,
        })
    }

    /// Create a client for `connection` (stub when feature disabled).
    #[cfg(not(feature = "http-executor"))]
    pub fn new(connection: WalletConnection, config: &MoneroRpcConfig) -> Result<Self> {
        connection.validate()?;
        Ok(Self {
            connection,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn connection(&self) -> &WalletConnection {
        &self.connection
    }

    /// Call a JSON-RPC method and decode its `result`.
    #[cfg(feature = "http-executor")]
    async fn call<P, T>(&self, method: &str, params: P) -> Result<T>
    where
        P: Serialize + Send,
        T: for<'de> Deserialize<'de>,
    {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: "0",
            method,
            params,
        };

        let response = self
            .client
            .post(self.connection.rpc_url())
            .basic_auth(&self.connection.user, Some(&self.connection.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.map_status_error(status.as_u16(), &error_text));
        }

        let envelope: RpcResponse<T> = response.json().await.map_err(|e| {
            AcceptorError::Serialization(format!("Failed to parse wallet RPC response: {}", e))
        })?;
        envelope.into_result(method)
    }

    /// Call a JSON-RPC method (stub when feature disabled).
    #[cfg(not(feature = "http-executor"))]
    async fn call<P, T>(&self, _method: &str, _params: P) -> Result<T>
    where
        P: Serialize + Send,
        T: for<'de> Deserialize<'de>,
    {
        Err(AcceptorError::Unimplemented(
            "Monero wallet RPC client not compiled - enable the 'http-executor' feature",
        ))
    }

    /// Map HTTP status codes to AcceptorError.
    #[cfg(feature = "http-executor")]
    fn map_status_error(&self, status: u16, error_text: &str) -> AcceptorError {
        match status {
            401 | 403 => AcceptorError::ConnectionFailed {
                target: self.connection.rpc_url(),
                reason: "wallet rejected credentials".to_string(),
            },
            404 => AcceptorError::NotFound {
                resource_type: "wallet RPC endpoint".to_string(),
                identifier: self.connection.rpc_url(),
            },
            429 => AcceptorError::RateLimited {
                retry_after_ms: 5000,
            },
            500..=599 => AcceptorError::Internal(format!(
                "Wallet RPC server error ({}): {}",
                status, error_text
            )),
            _ => AcceptorError::Transport(format!(
                "Wallet RPC request failed ({}): {}",
                status, error_text
            )),
        }
    }

    /// Map reqwest errors to AcceptorError.
    #[cfg(feature = "http-executor")]
    fn map_reqwest_error(&self, e: reqwest::Error) -> AcceptorError {
        if e.is_timeout() {
            AcceptorError::ConnectionTimeout {
                operation: "wallet RPC request".to_string(),
                timeout_ms: self.timeout_secs * 1000,
            }
        } else if e.is_connect() {
            AcceptorError::ConnectionFailed {
                target: self.connection.rpc_url(),
                reason: e.to_string(),
            }
        } else {
            AcceptorError::Transport(format!("Wallet RPC request failed: {}", e))
        }
    }
}

#[async_trait]
impl WalletPort for MoneroWalletRpc {
    async fn height(&self) -> Result<u64> {
        let result: HeightResult = self.call("get_height", serde_json::json!({})).await?;
        Ok(result.height)
    }

    async fn address_at(&self, index: SubaddressIndex) -> Result<String> {
        match self.get_address(index).await {
            Err(AcceptorError::Rpc { code, .. }) if code == ADDRESS_INDEX_OUT_OF_BOUNDS => {
                self.create_addresses_through(index).await?;
                self.get_address(index).await
            }
            other => other,
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(host = %self.connection.host)))]
    async fn list_incoming(
        &self,
        index: SubaddressIndex,
        min_height: u64,
    ) -> Result<Vec<IncomingTransfer>> {
        let result: TransfersResult = self
            .call("get_transfers", transfers_params(index, min_height))
            .await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(count = result.incoming.len(), "listed incoming transfers");

        Ok(result
            .incoming
            .into_iter()
            // the wallet may ignore subaddr_indices on old versions
            .filter(|t| t.subaddr_index.map_or(true, |i| i == index))
            .filter(|t| t.height >= min_height)
            .map(|t| IncomingTransfer::confirmed(t.txid, t.amount, t.height))
            .collect())
    }
}

impl MoneroWalletRpc {
    async fn get_address(&self, index: SubaddressIndex) -> Result<String> {
        let result: AddressResult = self
            .call(
                "get_address",
                serde_json::json!({
                    "account_index": index.major,
                    "address_index": [index.minor],
                }),
            )
            .await?;

        result
            .addresses
            .into_iter()
            .find(|entry| entry.address_index == index.minor)
            .map(|entry| entry.address)
            .ok_or_else(|| AcceptorError::NotFound {
                resource_type: "subaddress".to_string(),
                identifier: format!("{}/{}", index.major, index.minor),
            })
    }

    /// Create subaddresses in `index.major` until `index.minor` exists.
    async fn create_addresses_through(&self, index: SubaddressIndex) -> Result<()> {
        for _ in 0..=index.minor {
            let created: CreatedAddress = self
                .call(
                    "create_address",
                    serde_json::json!({ "account_index": index.major }),
                )
                .await?;

            #[cfg(feature = "tracing")]
            tracing::debug!(created = created.address_index, wanted = index.minor, "created subaddress");

            if created.address_index >= index.minor {
                break;
            }
        }
        Ok(())
    }
}

/// `get_transfers` parameters for transfers mined at or above `min_height`.
fn transfers_params(index: SubaddressIndex, min_height: u64) -> serde_json::Value {
    serde_json::json!({
        "in": true,
        "account_index": index.major,
        "subaddr_indices": [index.minor],
        "filter_by_height": min_height > 0,
        "min_height": min_height.saturating_sub(1),
    })
}

/// Opens a [`MoneroWalletRpc`] per payment check.
#[derive(Clone, Debug, Default)]
pub struct MoneroRpcConnector {
    config: MoneroRpcConfig,
}

impl MoneroRpcConnector {
    pub fn new(config: MoneroRpcConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MoneroRpcConfig {
        &self.config
    }
}

impl WalletConnector for MoneroRpcConnector {
    fn connect(&self, connection: &WalletConnection) -> Result<Box<dyn WalletPort>> {
        Ok(Box::new(MoneroWalletRpc::new(
            connection.clone(),
            &self.config,
        )?))
    }
}

#[cfg_attr(not(feature = "http-executor"), allow(dead_code))]
#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: P,
}

#[cfg_attr(not(feature = "http-executor"), allow(dead_code))]
#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[cfg_attr(not(feature = "http-executor"), allow(dead_code))]
#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[cfg_attr(not(feature = "http-executor"), allow(dead_code))]
impl<T> RpcResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if let Some(error) = self.error {
            return Err(AcceptorError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result.ok_or_else(|| {
            AcceptorError::Serialization(format!("{} response has neither result nor error", method))
        })
    }
}

#[derive(Debug, Deserialize)]
struct HeightResult {
    height: u64,
}

#[derive(Deserialize)]
struct AddressResult {
    #[serde(default)]
    addresses: Vec<AddressEntry>,
}

#[derive(Deserialize)]
struct AddressEntry {
    address: String,
    address_index: u32,
}

#[derive(Deserialize)]
struct CreatedAddress {
    address_index: u32,
}

#[derive(Deserialize)]
struct TransfersResult {
    #[serde(rename = "in", default)]
    incoming: Vec<TransferEntry>,
}

#[derive(Deserialize)]
struct TransferEntry {
    txid: String,
    amount: u64,
    height: u64,
    subaddr_index: Option<SubaddressIndex>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestFixtures;

    #[test]
    fn test_rpc_error_maps_to_rpc() {
        let envelope: RpcResponse<HeightResult> = serde_json::from_str(
            r#"{"id": "0", "jsonrpc": "2.0", "error": {"code": -13, "message": "No wallet file"}}"#,
        )
        .unwrap();
        let err = envelope.into_result("get_height").unwrap_err();
        assert!(matches!(err, AcceptorError::Rpc { code: -13, ref message } if message == "No wallet file"));
    }

    #[test]
    fn test_transfers_parsing() {
        let envelope: RpcResponse<TransfersResult> = serde_json::from_str(
            r#"{"id": "0", "jsonrpc": "2.0", "result": {"in": [
                {"txid": "ab", "amount": 1000000000000, "height": 3000000,
                 "subaddr_index": {"major": 0, "minor": 79}, "type": "in"}
            ]}}"#,
        )
        .unwrap();
        let result = envelope.into_result("get_transfers").unwrap();
        assert_eq!(result.incoming.len(), 1);
        assert_eq!(result.incoming[0].amount, 1_000_000_000_000);

        let empty: RpcResponse<TransfersResult> =
            serde_json::from_str(r#"{"id": "0", "jsonrpc": "2.0", "result": {}}"#).unwrap();
        assert!(empty.into_result("get_transfers").unwrap().incoming.is_empty());
    }

    #[test]
    fn test_transfers_params_shift_to_exclusive_bound() {
        let index = SubaddressIndex { major: 0, minor: 79 };
        let params = transfers_params(index, 2_999_280);
        assert_eq!(params["min_height"], 2_999_279);
        assert_eq!(params["filter_by_height"], true);
        assert_eq!(params["subaddr_indices"], serde_json::json!([79]));

        let params = transfers_params(index, 0);
        assert_eq!(params["min_height"], 0);
        assert_eq!(params["filter_by_height"], false);
    }

    #[test]
    fn test_connector_rejects_bad_connection() {
        let connector = MoneroRpcConnector::default();
        let bad = WalletConnection::new("http://wallet", 18082, "u", "p");
        let err = connector.connect(&bad).err().unwrap();
        assert!(matches!(err, AcceptorError::InvalidWalletConnection(_)));
    }

    #[test]
    fn test_connector_accepts_onion() {
        let connector = MoneroRpcConnector::default();
        assert!(connector.connect(&TestFixtures::onion_wallet_connection()).is_ok());
    }
}
