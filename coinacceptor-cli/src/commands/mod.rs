//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::Args;
use coinacceptor_lib::executors::{
    CoinGeckoConfig, CoinGeckoPriceFeed, EsploraConfig, EsploraUnspentSource, MoneroRpcConfig,
    MoneroRpcConnector,
};
use coinacceptor_lib::matcher::ConfirmationRange;
use coinacceptor_lib::ports::{PriceFeed, WalletConnection};
use coinacceptor_lib::{AcceptorConfig, AcceptorError, Currency, PaymentAcceptor, Settlement};

use crate::ui;

pub mod check;
pub mod code;
pub mod quote;
pub mod uri;

/// Network backends. Every option can also be set from the environment.
#[derive(Args, Clone, Debug)]
pub struct BackendArgs {
    /// Esplora API for BTC
    #[arg(
        long,
        global = true,
        env = "COINACCEPTOR_ESPLORA_URL",
        default_value = "https://blockstream.info/api"
    )]
    pub esplora_url: String,

    /// Esplora-compatible API for BCH
    #[arg(long, global = true, env = "COINACCEPTOR_BCH_ESPLORA_URL")]
    pub bch_esplora_url: Option<String>,

    /// Esplora-compatible API for BSV
    #[arg(long, global = true, env = "COINACCEPTOR_BSV_ESPLORA_URL")]
    pub bsv_esplora_url: Option<String>,

    /// CoinGecko API base URL
    #[arg(
        long,
        global = true,
        env = "COINACCEPTOR_COINGECKO_URL",
        default_value = "https://api.coingecko.com/api/v3"
    )]
    pub coingecko_url: String,

    /// Fiat currency prices are quoted in
    #[arg(long, global = true, env = "COINACCEPTOR_FIAT", default_value = "usd")]
    pub fiat: String,

    /// SOCKS proxy for .onion wallet hosts
    #[arg(
        long,
        global = true,
        env = "COINACCEPTOR_SOCKS_PROXY",
        default_value = "socks5h://127.0.0.1:9050"
    )]
    pub socks_proxy: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "COINACCEPTOR_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,
}

/// Monero wallet RPC connection.
#[derive(Args, Clone, Debug)]
pub struct WalletArgs {
    /// Wallet RPC host (required for xmr)
    #[arg(long, env = "COINACCEPTOR_WALLET_HOST")]
    pub wallet_host: Option<String>,

    /// Wallet RPC port
    #[arg(long, env = "COINACCEPTOR_WALLET_PORT", default_value_t = 18082)]
    pub wallet_port: u16,

    /// Wallet RPC user
    #[arg(long, env = "COINACCEPTOR_WALLET_USER", default_value = "monero")]
    pub wallet_user: String,

    /// Wallet RPC password (prompted for when omitted on a terminal)
    #[arg(long, env = "COINACCEPTOR_WALLET_PASSWORD", hide_env_values = true)]
    pub wallet_password: Option<String>,
}

impl WalletArgs {
    /// Build the connection descriptor, prompting for the password if needed.
    pub fn connection(&self) -> Result<Option<WalletConnection>> {
        let Some(host) = &self.wallet_host else {
            return Ok(None);
        };
        let password = match &self.wallet_password {
            Some(password) => password.clone(),
            None if ui::is_interactive() => ui::password("Wallet RPC password")?,
            None => String::new(),
        };
        Ok(Some(WalletConnection::new(
            host.clone(),
            self.wallet_port,
            self.wallet_user.clone(),
            password,
        )))
    }
}

/// What a payment check looks for.
#[derive(Args, Clone, Debug)]
pub struct TargetArgs {
    /// Currency tag (btc, bch, bsv, xmr)
    #[arg(short, long)]
    pub currency: String,

    /// Shared receiving address (not used for xmr)
    #[arg(short, long)]
    pub address: Option<String>,

    /// Payment identity, unique per order
    #[arg(short, long)]
    pub identity: String,

    /// Transaction id already claimed; repeat for several
    #[arg(long = "exclude")]
    pub excluded: Vec<String>,

    /// Minimum confirmations (defaults to the configured window)
    #[arg(long)]
    pub min_confirmations: Option<u64>,

    /// Maximum confirmations (defaults to the configured window)
    #[arg(long)]
    pub max_confirmations: Option<u64>,

    /// Render the payment URI as a QR code when unpaid
    #[arg(long)]
    pub qr: bool,

    #[command(flatten)]
    pub wallet: WalletArgs,
}

impl TargetArgs {
    /// Confirmation window override, if either bound was given.
    pub fn confirmations(&self, config: &AcceptorConfig) -> Option<ConfirmationRange> {
        if self.min_confirmations.is_none() && self.max_confirmations.is_none() {
            return None;
        }
        Some(ConfirmationRange::new(
            self.min_confirmations.unwrap_or(config.confirmations.min),
            self.max_confirmations.unwrap_or(config.confirmations.max),
        ))
    }
}

/// Shared state for every command.
pub struct Context {
    pub config: AcceptorConfig,
    pub backends: BackendArgs,
    pub json: bool,
}

impl Context {
    /// Load the acceptor configuration, falling back to defaults.
    pub fn load(
        config_path: Option<&Path>,
        backends: BackendArgs,
        json: bool,
    ) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                AcceptorConfig::from_json(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => AcceptorConfig::default(),
        };
        tracing::debug!(?config, "loaded configuration");

        Ok(Self {
            config,
            backends,
            json,
        })
    }

    /// Parse a currency tag and check the configuration enables it.
    pub fn currency(&self, tag: &str) -> Result<Currency> {
        let currency = coinacceptor_lib::validate_currency(tag)?;
        if !self.config.accepts(currency) {
            return Err(AcceptorError::UnsupportedCurrency(currency.to_string()).into());
        }
        Ok(currency)
    }

    fn esplora_url(&self, currency: Currency) -> Option<&str> {
        match currency {
            Currency::Btc => Some(&self.backends.esplora_url),
            Currency::Bch => self.backends.bch_esplora_url.as_deref(),
            Currency::Bsv => self.backends.bsv_esplora_url.as_deref(),
            Currency::Xmr => None,
        }
    }

    pub fn price_feed(&self) -> Result<CoinGeckoPriceFeed> {
        Ok(CoinGeckoPriceFeed::new(
            CoinGeckoConfig::new(&self.backends.coingecko_url)
                .with_fiat(&self.backends.fiat)
                .with_timeout(self.backends.timeout),
        )?)
    }

    /// Build an acceptor wired to every configured backend.
    pub fn acceptor(&self) -> Result<PaymentAcceptor> {
        let mut acceptor = PaymentAcceptor::new(self.config.clone())?;

        for currency in self.config.currencies.iter().copied() {
            if currency.settlement() != Settlement::SecurityCode {
                continue;
            }
            if let Some(url) = self.esplora_url(currency) {
                let source = EsploraUnspentSource::new(
                    EsploraConfig::new(url)
                        .with_currency(currency)
                        .with_timeout(self.backends.timeout),
                )?;
                acceptor = acceptor.with_unspent_source(currency, Arc::new(source));
            }
        }

        let feed: Arc<dyn PriceFeed> = Arc::new(self.price_feed()?);
        Ok(acceptor
            .with_wallet_connector(Arc::new(MoneroRpcConnector::new(
                MoneroRpcConfig::default()
                    .with_socks_proxy(&self.backends.socks_proxy)
                    .with_timeout(self.backends.timeout.max(60)),
            )))
            .with_price_feed(feed))
    }
}

/// Reject price flags that make no sense without a current price.
pub fn price_samples(
    price: Option<f64>,
    previous_price: Option<f64>,
) -> Result<Option<coinacceptor_lib::pricing::PriceSamples>> {
    use coinacceptor_lib::pricing::PriceSamples;

    match (price, previous_price) {
        (Some(current), previous) => {
            let samples = PriceSamples::new(current, previous.unwrap_or(current));
            samples.validate()?;
            Ok(Some(samples))
        }
        (None, Some(_)) => bail!("--previous-price requires --price"),
        (None, None) => Ok(None),
    }
}
