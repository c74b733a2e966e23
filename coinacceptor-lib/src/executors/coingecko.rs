//! CoinGecko spot price feed.
//!
//! CoinGecko only serves a spot price, so both samples of the returned
//! [`PriceSamples`] carry the same value and the window collapses to one
//! amount. Callers holding an earlier rate should pass it explicitly.

use std::collections::HashMap;

use async_trait::async_trait;
#[cfg(feature = "http-executor")]
use std::time::Duration;

use super::config::CoinGeckoConfig;
use crate::currency::Currency;
use crate::ports::PriceFeed;
use crate::pricing::PriceSamples;
use crate::{AcceptorError, Result};

/// CoinGecko coin id for a currency.
pub fn coin_id(currency: Currency) -> &'static str {
    match currency {
        Currency::Btc => "bitcoin",
        Currency::Bch => "bitcoin-cash",
        Currency::Bsv => "bitcoin-cash-sv",
        Currency::Xmr => "monero",
    }
}

/// Price feed backed by the CoinGecko `simple/price` endpoint.
pub struct CoinGeckoPriceFeed {
    config: CoinGeckoConfig,
    #[cfg(feature = "http-executor")]
    client: reqwest::Client,
}

impl CoinGeckoPriceFeed {
    #[cfg(feature = "http-executor")]
    pub fn new(config: CoinGeckoConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AcceptorError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    #[cfg(not(feature = "http-executor"))]
    pub fn new(config: CoinGeckoConfig) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn config(&self) -> &CoinGeckoConfig {
        &self.config
    }

    #[cfg(any(feature = "http-executor", test))]
    fn price_path(&self, currency: Currency) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.config.api_url.trim_end_matches('/'),
            coin_id(currency),
            self.config.fiat
        )
    }

    #[cfg(feature = "http-executor")]
    async fn fetch(&self, currency: Currency) -> Result<HashMap<String, HashMap<String, f64>>> {
        let response = self
            .client
            .get(self.price_path(currency))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AcceptorError::ConnectionTimeout {
                        operation: "price request".to_string(),
                        timeout_ms: self.config.timeout_secs * 1000,
                    }
                } else if e.is_connect() {
                    AcceptorError::ConnectionFailed {
                        target: self.config.api_url.clone(),
                        reason: e.to_string(),
                    }
                } else {
                    AcceptorError::Transport(format!("Price request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => AcceptorError::RateLimited {
                    retry_after_ms: 60_000,
                },
                code @ 500..=599 => {
                    AcceptorError::Internal(format!("Price server error ({}): {}", code, error_text))
                }
                code => AcceptorError::Transport(format!(
                    "Price request failed ({}): {}",
                    code, error_text
                )),
            });
        }

        response.json().await.map_err(|e| {
            AcceptorError::Serialization(format!("Failed to parse price response: {}", e))
        })
    }

    #[cfg(not(feature = "http-executor"))]
    async fn fetch(&self, _currency: Currency) -> Result<HashMap<String, HashMap<String, f64>>> {
        Err(AcceptorError::Unimplemented(
            "CoinGecko HTTP client not compiled - enable the 'http-executor' feature",
        ))
    }
}

/// Pull one price out of a `simple/price` body.
fn extract_price(
    body: &HashMap<String, HashMap<String, f64>>,
    currency: Currency,
    fiat: &str,
) -> Result<f64> {
    body.get(coin_id(currency))
        .and_then(|quotes| quotes.get(fiat))
        .copied()
        .ok_or_else(|| AcceptorError::NotFound {
            resource_type: "price".to_string(),
            identifier: format!("{}/{}", coin_id(currency), fiat),
        })
}

#[async_trait]
impl PriceFeed for CoinGeckoPriceFeed {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    async fn price_samples(&self, currency: Currency) -> Result<PriceSamples> {
        let body = self.fetch(currency).await?;
        let samples = PriceSamples::single(extract_price(&body, currency, &self.config.fiat)?);
        samples.validate()?;
        Ok(samples)
    }
}
