//! Network collaborators.
//!
//! HTTP implementations of the [`ports`](crate::ports) traits:
//!
//! - **Esplora** - unspent outputs for BTC (and any Esplora-compatible BCH/BSV indexer)
//! - **Monero wallet RPC** - subaddress lookups and incoming transfers
//! - **CoinGecko** - spot fiat prices
//!
//! ## Feature Flags
//!
//! The `http-executor` feature flag must be enabled for actual HTTP requests:
//!
//! ```toml
//! [dependencies]
//! coinacceptor-lib = { version = "0.9", features = ["http-executor"] }
//! ```
//!
//! Without it every type still constructs, but each call returns
//! [`AcceptorError::Unimplemented`](crate::AcceptorError::Unimplemented).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use coinacceptor_lib::executors::*;
//! use coinacceptor_lib::{AcceptorConfig, Currency, PaymentAcceptor};
//!
//! let acceptor = PaymentAcceptor::new(AcceptorConfig::default())?
//!     .with_unspent_source(Currency::Btc, Arc::new(EsploraUnspentSource::blockstream_mainnet()?))
//!     .with_wallet_connector(Arc::new(MoneroRpcConnector::new(MoneroRpcConfig::default())))
//!     .with_price_feed(Arc::new(CoinGeckoPriceFeed::new(CoinGeckoConfig::default())?));
//! ```

mod coingecko;
mod config;
mod esplora;
mod monero;

pub use coingecko::{coin_id, CoinGeckoPriceFeed};
pub use config::{CoinGeckoConfig, EsploraConfig, MoneroRpcConfig};
pub use esplora::{EsploraUnspentSource, TxStatus, Utxo};
pub use monero::{MoneroRpcConnector, MoneroWalletRpc};
