//! Configuration types for the network collaborators.

use serde::{Deserialize, Serialize};

use crate::currency::Currency;

fn default_timeout() -> u64 {
    30
}

/// Configuration for an Esplora-compatible explorer API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EsploraConfig {
    /// API base URL (e.g., `https://blockstream.info/api`).
    pub api_url: String,

    /// Currency the explorer indexes.
    #[serde(default = "default_esplora_currency")]
    pub currency: Currency,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_esplora_currency() -> Currency {
    Currency::Btc
}

impl EsploraConfig {
    /// Create a new Esplora configuration for Bitcoin.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            currency: default_esplora_currency(),
            timeout_secs: default_timeout(),
        }
    }

    /// Create config for Blockstream mainnet.
    pub fn blockstream_mainnet() -> Self {
        Self::new("https://blockstream.info/api")
    }

    /// Create config for Blockstream testnet.
    pub fn blockstream_testnet() -> Self {
        Self::new("https://blockstream.info/testnet/api")
    }

    /// Create config for mempool.space mainnet.
    pub fn mempool_mainnet() -> Self {
        Self::new("https://mempool.space/api")
    }

    /// Set the indexed currency.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Settings applied to every Monero wallet RPC connection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoneroRpcConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_monero_timeout")]
    pub timeout_secs: u64,

    /// Proxy used for `.onion` wallet hosts.
    #[serde(default = "default_socks_proxy")]
    pub socks_proxy: String,
}

fn default_monero_timeout() -> u64 {
    60 // wallet RPC over Tor is slow
}

fn default_socks_proxy() -> String {
    "socks5h://127.0.0.1:9050".to_string()
}

impl Default for MoneroRpcConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_monero_timeout(),
            socks_proxy: default_socks_proxy(),
        }
    }
}

impl MoneroRpcConfig {
    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the SOCKS proxy used for hidden service hosts.
    pub fn with_socks_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.socks_proxy = proxy.into();
        self
    }
}

/// Configuration for the CoinGecko price API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoinGeckoConfig {
    /// API base URL.
    #[serde(default = "default_coingecko_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Fiat currency prices are quoted in.
    #[serde(default = "default_fiat")]
    pub fiat: String,
}

fn default_coingecko_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_fiat() -> String {
    "usd".to_string()
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            api_url: default_coingecko_url(),
            timeout_secs: default_timeout(),
            fiat: default_fiat(),
        }
    }
}

impl CoinGeckoConfig {
    /// Create a configuration against a custom base URL.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Set the quote currency.
    pub fn with_fiat(mut self, fiat: impl Into<String>) -> Self {
        self.fiat = fiat.into().to_ascii_lowercase();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
