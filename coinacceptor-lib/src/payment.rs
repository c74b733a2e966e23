//! Payment orchestration.
//!
//! [`PaymentAcceptor`] validates a [`PaymentRequest`], resolves fiat amounts
//! through the price window, dispatches to the matcher for the currency and
//! returns a [`PaymentResult`] with a wallet deep link.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use coinacceptor_lib::prelude::*;
//! use coinacceptor_lib::executors::{EsploraConfig, EsploraUnspentSource};
//!
//! let acceptor = PaymentAcceptor::new(AcceptorConfig::default())?
//!     .with_unspent_source(Currency::Btc, Arc::new(EsploraUnspentSource::blockstream_mainnet()?));
//!
//! let request = PaymentRequest::atomic(Currency::Btc, order_id, [10_000])
//!     .with_address("16jCrzcXo2PxadrQiQwUgwrmEwDGQYBwZq")
//!     .with_excluded(claimed_txids);
//!
//! let result = acceptor.pay(&request).await?;
//! if let Some(txid) = &result.txid {
//!     // claim txid atomically before fulfilling the order
//! } else {
//!     println!("pay {}", result.uri);
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::AcceptorConfig;
use crate::currency::{Currency, Settlement};
use crate::matcher::{
    expected_amounts, find_payment, find_subaddress_payment, AmountQuery, ConfirmationRange,
};
use crate::ports::{
    PriceFeed, SubaddressIndex, UnspentSource, WalletConnection, WalletConnector,
};
use crate::pricing::{windowed_amounts, PriceSamples};
use crate::uri::payment_uri;
use crate::{AcceptorError, Result};

/// How the requested amount is expressed.
#[derive(Clone, Debug, PartialEq)]
pub enum Denomination {
    /// Atomic amounts to try, in priority order.
    Atomic(Vec<u64>),
    /// A fiat price in cents, converted at payment time.
    Fiat {
        cents: u64,
        /// Price samples to convert with. Fetched from the price feed when absent.
        prices: Option<PriceSamples>,
    },
}

/// One payment check.
///
/// Built fresh for every call. The caller owns the list of transaction ids
/// it has already claimed and must pass it every time.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentRequest {
    pub currency: Currency,
    /// Caller-chosen identity, unique per payment (an order UUID, say).
    pub identity: String,
    pub denomination: Denomination,
    /// Shared receiving address. Must be absent for subaddress currencies.
    pub address: Option<String>,
    /// Transaction ids already claimed by the caller.
    pub excluded_txids: Vec<String>,
    /// Wallet RPC connection, required for subaddress currencies.
    pub wallet: Option<WalletConnection>,
    /// Overrides the configured confirmation window.
    pub confirmations: Option<ConfirmationRange>,
}

impl PaymentRequest {
    fn new(currency: Currency, identity: impl Into<String>, denomination: Denomination) -> Self {
        Self {
            currency,
            identity: identity.into(),
            denomination,
            address: None,
            excluded_txids: Vec::new(),
            wallet: None,
            confirmations: None,
        }
    }

    /// Request for fixed atomic amount(s).
    pub fn atomic(
        currency: Currency,
        identity: impl Into<String>,
        amounts: impl IntoIterator<Item = u64>,
    ) -> Self {
        Self::new(
            currency,
            identity,
            Denomination::Atomic(amounts.into_iter().collect()),
        )
    }

    /// Request for a fiat amount in cents.
    pub fn fiat(currency: Currency, identity: impl Into<String>, cents: u64) -> Self {
        Self::new(
            currency,
            identity,
            Denomination::Fiat {
                cents,
                prices: None,
            },
        )
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_wallet(mut self, wallet: WalletConnection) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_excluded<I, S>(mut self, txids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_txids = txids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_confirmations(mut self, confirmations: ConfirmationRange) -> Self {
        self.confirmations = Some(confirmations);
        self
    }

    /// Supply price samples for a fiat request. No effect on atomic requests.
    pub fn with_prices(mut self, samples: PriceSamples) -> Self {
        if let Denomination::Fiat { prices, .. } = &mut self.denomination {
            *prices = Some(samples);
        }
        self
    }
}

/// Fiat conversion details for a fiat-denominated request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FiatQuote {
    /// Cents requested.
    pub cents: u64,
    /// Cents actually being asked for after the floor.
    pub final_fiat_cents: u64,
    /// Whether the network floor raised either amount.
    pub floored: bool,
    /// Samples the conversion used.
    pub prices: PriceSamples,
    /// Unpadded amounts that were tried.
    pub targets: Vec<u64>,
}

/// Outcome of a payment check.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaymentResult {
    pub currency: Currency,
    /// Address the payer should send to.
    pub address: String,
    /// Amount received, or the amount to keep asking for.
    pub amount: u64,
    /// Matching transaction. `None` means the payment has not arrived yet.
    pub txid: Option<String>,
    /// Wallet deep link for `amount` to `address`.
    pub uri: String,
    /// Derived subaddress index, for subaddress currencies.
    pub subaddress_index: Option<SubaddressIndex>,
    /// Fiat conversion details, for fiat requests.
    pub fiat: Option<FiatQuote>,
}

impl PaymentResult {
    pub fn is_paid(&self) -> bool {
        self.txid.is_some()
    }
}

/// Stateless payment checker.
///
/// Holds configuration and collaborators only; every call is independent.
/// Two concurrent checks may both report the same transaction, so callers
/// must claim a returned txid atomically before acting on it.
pub struct PaymentAcceptor {
    config: AcceptorConfig,
    unspent_sources: HashMap<Currency, Arc<dyn UnspentSource>>,
    wallet_connector: Option<Arc<dyn WalletConnector>>,
    price_feed: Option<Arc<dyn PriceFeed>>,
}

impl PaymentAcceptor {
    /// Create an acceptor with no collaborators attached.
    pub fn new(config: AcceptorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            unspent_sources: HashMap::new(),
            wallet_connector: None,
            price_feed: None,
        })
    }

    /// Attach the unspent source used for an address-based currency.
    pub fn with_unspent_source(mut self, currency: Currency, source: Arc<dyn UnspentSource>) -> Self {
        self.unspent_sources.insert(currency, source);
        self
    }

    /// Attach the connector used to open wallet RPC sessions.
    pub fn with_wallet_connector(mut self, connector: Arc<dyn WalletConnector>) -> Self {
        self.wallet_connector = Some(connector);
        self
    }

    /// Attach the price feed used when fiat requests carry no samples.
    pub fn with_price_feed(mut self, feed: Arc<dyn PriceFeed>) -> Self {
        self.price_feed = Some(feed);
        self
    }

    pub fn config(&self) -> &AcceptorConfig {
        &self.config
    }

    /// Parse a currency tag and check this deployment accepts it.
    pub fn validate_currency(&self, tag: &str) -> Result<Currency> {
        let currency: Currency = tag.parse()?;
        self.ensure_accepted(currency)?;
        Ok(currency)
    }

    fn ensure_accepted(&self, currency: Currency) -> Result<()> {
        if self.config.accepts(currency) {
            Ok(())
        } else {
            Err(AcceptorError::UnsupportedCurrency(currency.to_string()))
        }
    }

    /// Check a request without contacting any collaborator.
    pub fn validate(&self, request: &PaymentRequest) -> Result<()> {
        self.ensure_accepted(request.currency)?;

        if request.identity.is_empty() {
            return Err(AcceptorError::invalid_data("identity", "must not be empty"));
        }

        match &request.denomination {
            Denomination::Atomic(amounts) if amounts.is_empty() => {
                return Err(AcceptorError::invalid_data(
                    "amounts",
                    "at least one target amount is required",
                ));
            }
            Denomination::Atomic(_) => {}
            Denomination::Fiat { prices: Some(prices), .. } => prices.validate()?,
            Denomination::Fiat { prices: None, .. } => {
                if self.price_feed.is_none() {
                    return Err(AcceptorError::BackendNotConfigured(request.currency));
                }
            }
        }

        if let Some(confirmations) = &request.confirmations {
            confirmations.validate()?;
        }

        match request.currency.settlement() {
            Settlement::Subaddress => {
                if request.address.is_some() {
                    return Err(AcceptorError::invalid_data(
                        "address",
                        format!(
                            "must be absent for {}, the address is derived per payment",
                            request.currency
                        ),
                    ));
                }
                request
                    .wallet
                    .as_ref()
                    .ok_or_else(|| {
                        AcceptorError::InvalidWalletConnection(format!(
                            "required for {}",
                            request.currency
                        ))
                    })?
                    .validate()?;
                if self.wallet_connector.is_none() {
                    return Err(AcceptorError::BackendNotConfigured(request.currency));
                }
            }
            Settlement::SecurityCode => {
                match request.address.as_deref().map(str::trim) {
                    Some(address) if !address.is_empty() => {}
                    _ => {
                        return Err(AcceptorError::invalid_data(
                            "address",
                            format!("required for {}", request.currency),
                        ))
                    }
                }
                if let Denomination::Atomic(amounts) = &request.denomination {
                    // padding overflow
                    expected_amounts(amounts, &request.identity, self.config.security_modulus)?;
                }
                if !self.unspent_sources.contains_key(&request.currency) {
                    return Err(AcceptorError::BackendNotConfigured(request.currency));
                }
            }
        }

        Ok(())
    }

    /// Resolve the unpadded target amounts, converting fiat if needed.
    async fn resolve_targets(
        &self,
        request: &PaymentRequest,
    ) -> Result<(Vec<u64>, Option<FiatQuote>)> {
        match &request.denomination {
            Denomination::Atomic(amounts) => Ok((amounts.clone(), None)),
            Denomination::Fiat { cents, prices } => {
                let prices = match prices {
                    Some(prices) => *prices,
                    None => {
                        let feed = self
                            .price_feed
                            .as_ref()
                            .ok_or(AcceptorError::BackendNotConfigured(request.currency))?;
                        feed.price_samples(request.currency).await?
                    }
                };
                let window = windowed_amounts(*cents, prices, request.currency)?;
                let targets = window.targets();
                let quote = FiatQuote {
                    cents: *cents,
                    final_fiat_cents: window.final_fiat_cents,
                    floored: window.floored,
                    prices,
                    targets: targets.clone(),
                };
                Ok((targets, Some(quote)))
            }
        }
    }

    /// Check whether the payment described by `request` has arrived.
    ///
    /// Input errors are returned before any collaborator is contacted.
    /// Collaborator failures are returned unchanged; a payment that has not
    /// arrived is a normal result with `txid == None`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, request), fields(currency = %request.currency)))]
    pub async fn pay(&self, request: &PaymentRequest) -> Result<PaymentResult> {
        self.validate(request)?;

        let (targets, fiat) = self.resolve_targets(request).await?;
        let currency = request.currency;

        let (address, amount, txid, subaddress_index) = match currency.settlement() {
            Settlement::SecurityCode => {
                let address = request
                    .address
                    .as_deref()
                    .map(str::trim)
                    .ok_or_else(|| AcceptorError::invalid_data("address", "missing"))?;
                let source = self
                    .unspent_sources
                    .get(&currency)
                    .ok_or(AcceptorError::BackendNotConfigured(currency))?;

                let candidates = source.list_unspent(address).await?;
                let matched = find_payment(
                    &candidates,
                    &AmountQuery {
                        identity: &request.identity,
                        targets: &targets,
                        confirmations: request.confirmations.unwrap_or(self.config.confirmations),
                        excluded: &request.excluded_txids,
                        security_modulus: self.config.security_modulus,
                    },
                )?;
                (address.to_string(), matched.amount, matched.txid, None)
            }
            Settlement::Subaddress => {
                let connection = request.wallet.as_ref().ok_or_else(|| {
                    AcceptorError::InvalidWalletConnection(format!("required for {}", currency))
                })?;
                let connector = self
                    .wallet_connector
                    .as_ref()
                    .ok_or(AcceptorError::BackendNotConfigured(currency))?;

                let wallet = connector.connect(connection)?;
                let matched = find_subaddress_payment(
                    wallet.as_ref(),
                    &request.identity,
                    &targets,
                    &request.excluded_txids,
                    self.config.subaddress_lookback_blocks,
                )
                .await?;
                (matched.address, matched.amount, matched.txid, Some(matched.index))
            }
        };

        #[cfg(feature = "tracing")]
        match &txid {
            Some(txid) => tracing::debug!(%txid, amount, "payment matched"),
            None => tracing::debug!(amount, "payment not found"),
        }

        let uri = payment_uri(currency, &address, amount);
        Ok(PaymentResult {
            currency,
            address,
            amount,
            txid,
            uri,
            subaddress_index,
            fiat,
        })
    }

    /// Check a fiat-denominated payment.
    ///
    /// Same as [`pay`](Self::pay) but rejects atomic requests, so the result
    /// always carries a [`FiatQuote`].
    pub async fn pay_fiat(&self, request: &PaymentRequest) -> Result<PaymentResult> {
        if !matches!(request.denomination, Denomination::Fiat { .. }) {
            return Err(AcceptorError::invalid_data(
                "denomination",
                "expected a fiat amount in cents",
            ));
        }
        self.pay(request).await
    }
}
