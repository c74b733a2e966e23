//! In-memory collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::currency::Currency;
use crate::ports::{
    CandidateTransaction, IncomingTransfer, PriceFeed, SubaddressIndex, UnspentSource,
    WalletConnection, WalletConnector, WalletPort,
};
use crate::pricing::PriceSamples;
use crate::{AcceptorError, Result};

/// Unspent source backed by a map of address to outputs.
#[derive(Default)]
pub struct MockUnspentSource {
    unspents: RwLock<HashMap<String, Vec<CandidateTransaction>>>,
    failure: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl MockUnspentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an output to `address`, after any already present.
    pub fn add(&self, address: &str, candidate: CandidateTransaction) {
        self.unspents
            .write()
            .unwrap()
            .entry(address.to_string())
            .or_default()
            .push(candidate);
    }

    /// Make every subsequent call fail with a transport error.
    pub fn fail_with(&self, message: &str) {
        *self.failure.write().unwrap() = Some(message.to_string());
    }

    /// Number of `list_unspent` calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UnspentSource for MockUnspentSource {
    async fn list_unspent(&self, address: &str) -> Result<Vec<CandidateTransaction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.read().unwrap().clone() {
            return Err(AcceptorError::Transport(message));
        }
        Ok(self
            .unspents
            .read()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct WalletState {
    height: u64,
    transfers: HashMap<SubaddressIndex, Vec<IncomingTransfer>>,
    last_min_height: Option<u64>,
    failure: Option<String>,
}

/// Wallet with a fixed height and per-subaddress transfers.
///
/// Clones share state, so a test can keep a handle to a wallet handed out by
/// [`MockWalletConnector`].
#[derive(Clone, Default)]
pub struct MockWallet {
    state: Arc<RwLock<WalletState>>,
    calls: Arc<AtomicUsize>,
}

impl MockWallet {
    pub fn new(height: u64) -> Self {
        let wallet = Self::default();
        wallet.state.write().unwrap().height = height;
        wallet
    }

    /// Deterministic fake address for an index.
    pub fn address_for(index: SubaddressIndex) -> String {
        format!("8mock{}x{}", index.major, index.minor)
    }

    pub fn add_transfer(&self, index: SubaddressIndex, transfer: IncomingTransfer) {
        self.state
            .write()
            .unwrap()
            .transfers
            .entry(index)
            .or_default()
            .push(transfer);
    }

    /// Make every subsequent call fail with an RPC error.
    pub fn fail_with(&self, message: &str) {
        self.state.write().unwrap().failure = Some(message.to_string());
    }

    /// `min_height` passed to the last `list_incoming` call.
    pub fn last_min_height(&self) -> Option<u64> {
        self.state.read().unwrap().last_min_height
    }

    /// Number of RPC calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.state.read().unwrap().failure {
            Some(message) => Err(AcceptorError::Rpc {
                code: -1,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WalletPort for MockWallet {
    async fn height(&self) -> Result<u64> {
        self.begin_call()?;
        Ok(self.state.read().unwrap().height)
    }

    async fn address_at(&self, index: SubaddressIndex) -> Result<String> {
        self.begin_call()?;
        Ok(Self::address_for(index))
    }

    async fn list_incoming(
        &self,
        index: SubaddressIndex,
        min_height: u64,
    ) -> Result<Vec<IncomingTransfer>> {
        self.begin_call()?;
        let mut state = self.state.write().unwrap();
        state.last_min_height = Some(min_height);
        Ok(state.transfers.get(&index).cloned().unwrap_or_default())
    }
}

/// Connector that hands out clones of one [`MockWallet`].
#[derive(Default)]
pub struct MockWalletConnector {
    wallet: MockWallet,
    connections: RwLock<Vec<WalletConnection>>,
}

impl MockWalletConnector {
    pub fn new(wallet: MockWallet) -> Self {
        Self {
            wallet,
            connections: RwLock::new(Vec::new()),
        }
    }

    /// Connections requested so far.
    pub fn connections(&self) -> Vec<WalletConnection> {
        self.connections.read().unwrap().clone()
    }
}

impl WalletConnector for MockWalletConnector {
    fn connect(&self, connection: &WalletConnection) -> Result<Box<dyn WalletPort>> {
        self.connections.write().unwrap().push(connection.clone());
        Ok(Box::new(self.wallet.clone()))
    }
}

/// Price feed returning fixed samples.
pub struct FixedPriceFeed {
    samples: HashMap<Currency, PriceSamples>,
    calls: AtomicUsize,
}

impl FixedPriceFeed {
    pub fn new() -> Self {
        Self {
            samples: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_price(mut self, currency: Currency, samples: PriceSamples) -> Self {
        self.samples.insert(currency, samples);
        self
    }

    /// Number of `price_samples` calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FixedPriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceFeed for FixedPriceFeed {
    async fn price_samples(&self, currency: Currency) -> Result<PriceSamples> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.samples
            .get(&currency)
            .copied()
            .ok_or_else(|| AcceptorError::NotFound {
                resource_type: "price".to_string(),
                identifier: currency.to_string(),
            })
    }
}
