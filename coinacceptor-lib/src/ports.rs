//! Collaborator capabilities.
//!
//! The engine never talks to the network itself. Explorers, wallet RPC
//! daemons and price feeds are reached through these narrow traits, so any
//! backend (or an in-memory fake) can be plugged in.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::pricing::PriceSamples;
use crate::{AcceptorError, Result};

/// An output observed at a shared receiving address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTransaction {
    /// Transaction ID.
    pub txid: String,
    /// Value in atomic units.
    pub amount: u64,
    /// Blocks mined on top of the containing block; 0 while in the mempool.
    pub confirmations: u64,
}

impl CandidateTransaction {
    pub fn new(txid: impl Into<String>, amount: u64, confirmations: u64) -> Self {
        Self {
            txid: txid.into(),
            amount,
            confirmations,
        }
    }
}

/// A transfer received on a wallet subaddress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingTransfer {
    /// Transaction ID.
    pub txid: String,
    /// Value in atomic units.
    pub amount: u64,
    /// Height of the containing block, if mined.
    pub height: Option<u64>,
    /// Whether the transfer is in a block.
    pub confirmed: bool,
}

impl IncomingTransfer {
    /// A transfer mined at `height`.
    pub fn confirmed(txid: impl Into<String>, amount: u64, height: u64) -> Self {
        Self {
            txid: txid.into(),
            amount,
            height: Some(height),
            confirmed: true,
        }
    }

    /// A transfer still in the pool.
    pub fn pending(txid: impl Into<String>, amount: u64) -> Self {
        Self {
            txid: txid.into(),
            amount,
            height: None,
            confirmed: false,
        }
    }
}

/// Major/minor index of a wallet subaddress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubaddressIndex {
    /// Account index.
    pub major: u32,
    /// Address index within the account.
    pub minor: u32,
}

/// Connection details for a wallet RPC service.
///
/// Hosts ending in `.onion` are reached through a local SOCKS proxy.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConnection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl WalletConnection {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
        }
    }

    /// Whether the host is a Tor hidden service.
    pub fn is_onion(&self) -> bool {
        self.host.trim_end_matches('.').ends_with(".onion")
    }

    /// Check the descriptor is usable before any connection is attempted.
    pub fn validate(&self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(AcceptorError::InvalidWalletConnection(
                "host must not be empty".into(),
            ));
        }
        if host.contains("://") || host.contains('/') || host.contains(char::is_whitespace) {
            return Err(AcceptorError::InvalidWalletConnection(format!(
                "host must be a bare hostname, got {:?}",
                self.host
            )));
        }
        if self.port == 0 {
            return Err(AcceptorError::InvalidWalletConnection(
                "port must not be zero".into(),
            ));
        }
        Ok(())
    }

    /// JSON-RPC endpoint for this connection.
    pub fn rpc_url(&self) -> String {
        format!("http://{}:{}/json_rpc", self.host.trim(), self.port)
    }
}

impl fmt::Debug for WalletConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of unspent outputs for address-based currencies.
#[async_trait]
pub trait UnspentSource: Send + Sync {
    /// List unspent outputs at `address`, in the backend's own order.
    async fn list_unspent(&self, address: &str) -> Result<Vec<CandidateTransaction>>;
}

/// Wallet RPC capability used for subaddress payments.
#[async_trait]
pub trait WalletPort: Send + Sync {
    /// Current wallet height (chain length, one past the tip).
    async fn height(&self) -> Result<u64>;

    /// Address at the given subaddress index.
    async fn address_at(&self, index: SubaddressIndex) -> Result<String>;

    /// Incoming transfers to `index` mined at or above `min_height`.
    async fn list_incoming(
        &self,
        index: SubaddressIndex,
        min_height: u64,
    ) -> Result<Vec<IncomingTransfer>>;
}

/// Opens a [`WalletPort`] from a per-request connection descriptor.
pub trait WalletConnector: Send + Sync {
    fn connect(&self, connection: &WalletConnection) -> Result<Box<dyn WalletPort>>;
}

/// Fiat price source.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current and previous fiat-per-coin prices for `currency`.
    async fn price_samples(&self, currency: Currency) -> Result<PriceSamples>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_connection_validation() {
        assert!(WalletConnection::new("127.0.0.1", 18082, "user", "pass")
            .validate()
            .is_ok());

        let cases = [
            WalletConnection::new("", 18082, "u", "p"),
            WalletConnection::new("http://wallet", 18082, "u", "p"),
            WalletConnection::new("wallet host", 18082, "u", "p"),
            WalletConnection::new("wallet", 0, "u", "p"),
        ];
        for conn in cases {
            let err = conn.validate().unwrap_err();
            assert!(err.is_input_error(), "{:?}", conn);
        }
    }

    #[test]
    fn test_onion_detection() {
        let onion = WalletConnection::new("abcdefghijklmnop.onion", 18082, "u", "p");
        assert!(onion.is_onion());
        let clear = WalletConnection::new("wallet.example.com", 18082, "u", "p");
        assert!(!clear.is_onion());
        assert_eq!(clear.rpc_url(), "http://wallet.example.com:18082/json_rpc");
    }

    #[test]
    fn test_debug_hides_password() {
        let conn = WalletConnection::new("wallet", 18082, "monero", "hunter2");
        let debug = format!("{:?}", conn);
        assert!(debug.contains("monero"));
        assert!(!debug.contains("hunter2"));
    }
}
