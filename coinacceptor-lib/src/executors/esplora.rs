//! Esplora explorer API unspent source.
//!
//! Connects to Esplora-compatible APIs (Blockstream, mempool.space) to list
//! the unspent outputs at a shared receiving address.
//!
//! # Feature Flags
//!
//! This module requires the `http-executor` feature flag to be enabled for actual
//! HTTP requests. Without it, all requests return an `Unimplemented` error.
//!
//! # Example
//!
//! ```rust,ignore
//! use coinacceptor_lib::executors::EsploraUnspentSource;
//! use coinacceptor_lib::ports::UnspentSource;
//!
//! let source = EsploraUnspentSource::blockstream_mainnet()?;
//! for utxo in source.list_unspent("16jCrzcXo2PxadrQiQwUgwrmEwDGQYBwZq").await? {
//!     println!("{} {} sats, {} confirmations", utxo.txid, utxo.amount, utxo.confirmations);
//! }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
#[cfg(feature = "http-executor")]
use std::time::Duration;

use super::config::EsploraConfig;
use crate::ports::{CandidateTransaction, UnspentSource};
use crate::Result;
#[cfg(feature = "http-executor")]
use crate::AcceptorError;

/// Esplora API client listing unspent outputs.
pub struct EsploraUnspentSource {
    config: EsploraConfig,
    #[cfg(feature = "http-executor")]
    client: reqwest::Client,
}

impl EsploraUnspentSource {
    /// Create a new Esplora source with the given configuration.
    #[cfg(feature = "http-executor")]
    pub fn new(config: EsploraConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AcceptorError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create a new Esplora source with the given configuration (stub when feature disabled).
    #[cfg(not(feature = "http-executor"))]
    pub fn new(config: EsploraConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// Create a source for Blockstream mainnet.
    pub fn blockstream_mainnet() -> Result<Self> {
        Self::new(EsploraConfig::blockstream_mainnet())
    }

    /// Create a source for mempool.space mainnet.
    pub fn mempool_mainnet() -> Result<Self> {
        Self::new(EsploraConfig::mempool_mainnet())
    }

    /// Get the configuration.
    pub fn config(&self) -> &EsploraConfig {
        &self.config
    }

    /// Build the full URL for an API endpoint.
    #[cfg(any(feature = "http-executor", test))]
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Make a GET request to the API.
    #[cfg(feature = "http-executor")]
    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let url = self.url(path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.map_status_error(status.as_u16(), &error_text));
        }

        response.json::<T>().await.map_err(|e| {
            AcceptorError::Serialization(format!("Failed to parse Esplora response: {}", e))
        })
    }

    /// Make a GET request to the API (stub when feature disabled).
    #[cfg(not(feature = "http-executor"))]
    async fn get<T: for<'de> Deserialize<'de>>(&self, _path: &str) -> Result<T> {
        Err(crate::AcceptorError::Unimplemented(
            "Esplora HTTP client not compiled - enable the 'http-executor' feature",
        ))
    }

    /// Map HTTP status codes to AcceptorError.
    #[cfg(feature = "http-executor")]
    fn map_status_error(&self, status: u16, error_text: &str) -> AcceptorError {
        match status {
            400 => AcceptorError::InvalidData {
                field: "address".to_string(),
                reason: error_text.to_string(),
            },
            404 => AcceptorError::NotFound {
                resource_type: "Esplora resource".to_string(),
                identifier: error_text.to_string(),
            },
            429 => AcceptorError::RateLimited {
                retry_after_ms: 5000,
            },
            500..=599 => AcceptorError::Internal(format!(
                "Esplora server error ({}): {}",
                status, error_text
            )),
            _ => AcceptorError::Transport(format!(
                "Esplora request failed ({}): {}",
                status, error_text
            )),
        }
    }

    /// Map reqwest errors to AcceptorError.
    #[cfg(feature = "http-executor")]
    fn map_reqwest_error(&self, e: reqwest::Error) -> AcceptorError {
        if e.is_timeout() {
            AcceptorError::ConnectionTimeout {
                operation: "Esplora request".to_string(),
                timeout_ms: self.config.timeout_secs * 1000,
            }
        } else if e.is_connect() {
            AcceptorError::ConnectionFailed {
                target: self.config.api_url.clone(),
                reason: e.to_string(),
            }
        } else {
            AcceptorError::Transport(format!("Esplora request failed: {}", e))
        }
    }

    /// Get the current chain tip height.
    pub async fn tip_height(&self) -> Result<u64> {
        self.get("blocks/tip/height").await
    }

    /// Get the raw UTXO list for an address.
    pub async fn address_utxos(&self, address: &str) -> Result<Vec<Utxo>> {
        self.get(&format!("address/{}/utxo", address)).await
    }
}

#[async_trait]
impl UnspentSource for EsploraUnspentSource {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(api = %self.config.api_url)))]
    async fn list_unspent(&self, address: &str) -> Result<Vec<CandidateTransaction>> {
        let utxos = self.address_utxos(address).await?;

        // The tip is only needed once something has confirmed.
        let tip = if utxos.iter().any(|u| u.status.confirmed) {
            Some(self.tip_height().await?)
        } else {
            None
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(count = utxos.len(), ?tip, "listed unspent outputs");

        Ok(utxos
            .into_iter()
            .map(|utxo| {
                let confirmations = match (tip, utxo.status.block_height) {
                    (Some(tip), Some(height)) if utxo.status.confirmed => utxo.confirmations(tip, height),
                    _ => 0,
                };
                CandidateTransaction::new(utxo.txid, utxo.value, confirmations)
            })
            .collect())
    }
}

/// Unspent output as returned by Esplora.
#[derive(Clone, Debug, Deserialize)]
pub struct Utxo {
    /// Transaction ID.
    pub txid: String,
    /// Output index.
    pub vout: u32,
    /// Value in satoshis.
    pub value: u64,
    /// Confirmation status.
    pub status: TxStatus,
}

impl Utxo {
    /// Confirmations at `tip` for an output mined at `height`.
    fn confirmations(&self, tip: u64, height: u64) -> u64 {
        tip.saturating_sub(height) + 1
    }
}

/// Transaction status.
#[derive(Clone, Debug, Deserialize)]
pub struct TxStatus {
    /// Whether the transaction is confirmed.
    pub confirmed: bool,
    /// Block height if confirmed.
    pub block_height: Option<u64>,
}
