//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::matcher::ConfirmationRange;
use crate::security_code::DEFAULT_SECURITY_MODULUS;
use crate::{AcceptorError, Result};

/// Settings shared by every payment check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcceptorConfig {
    /// Security codes fall in `0..security_modulus`.
    #[serde(default = "default_security_modulus")]
    pub security_modulus: u64,

    /// Default confirmation window for address-based currencies.
    #[serde(default)]
    pub confirmations: ConfirmationRange,

    /// How many blocks back subaddress transfers are searched.
    #[serde(default = "default_lookback")]
    pub subaddress_lookback_blocks: u64,

    /// Currencies this deployment accepts.
    #[serde(default = "default_currencies")]
    pub currencies: Vec<Currency>,
}

fn default_security_modulus() -> u64 {
    DEFAULT_SECURITY_MODULUS
}

fn default_lookback() -> u64 {
    720 // about a day of 2 minute blocks
}

fn default_currencies() -> Vec<Currency> {
    Currency::ALL.to_vec()
}

impl Default for AcceptorConfig {
    fn default() -> Self {
        Self {
            security_modulus: default_security_modulus(),
            confirmations: ConfirmationRange::default(),
            subaddress_lookback_blocks: default_lookback(),
            currencies: default_currencies(),
        }
    }
}

impl AcceptorConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Restrict accepted currencies.
    pub fn with_currencies(mut self, currencies: impl IntoIterator<Item = Currency>) -> Self {
        self.currencies = currencies.into_iter().collect();
        self
    }

    /// Set the security code modulus.
    pub fn with_security_modulus(mut self, modulus: u64) -> Self {
        self.security_modulus = modulus;
        self
    }

    /// Set the default confirmation window.
    pub fn with_confirmations(mut self, confirmations: ConfirmationRange) -> Self {
        self.confirmations = confirmations;
        self
    }

    /// Set the subaddress lookback in blocks.
    pub fn with_lookback(mut self, blocks: u64) -> Self {
        self.subaddress_lookback_blocks = blocks;
        self
    }

    pub fn accepts(&self, currency: Currency) -> bool {
        self.currencies.contains(&currency)
    }

    pub fn validate(&self) -> Result<()> {
        if self.security_modulus == 0 {
            return Err(AcceptorError::invalid_data(
                "security_modulus",
                "must be greater than zero",
            ));
        }
        self.confirmations.validate()?;
        if self.currencies.is_empty() {
            return Err(AcceptorError::invalid_data(
                "currencies",
                "at least one currency must be enabled",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AcceptorConfig::default();
        assert_eq!(config.security_modulus, 1000);
        assert_eq!(config.confirmations, ConfirmationRange::new(0, 6));
        assert_eq!(config.subaddress_lookback_blocks, 720);
        assert!(Currency::ALL.iter().all(|c| config.accepts(*c)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_partial_json() {
        let config =
            AcceptorConfig::from_json(r#"{"currencies": ["btc", "xmr"], "security_modulus": 500}"#)
                .unwrap();
        assert_eq!(config.security_modulus, 500);
        assert!(config.accepts(Currency::Btc));
        assert!(!config.accepts(Currency::Bch));
        assert_eq!(config.subaddress_lookback_blocks, 720);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(AcceptorConfig::from_json(r#"{"security_modulus": 0}"#).is_err());
        assert!(AcceptorConfig::from_json(r#"{"currencies": []}"#).is_err());
        assert!(AcceptorConfig::from_json(r#"{"confirmations": {"min": 7, "max": 6}}"#).is_err());
        assert!(AcceptorConfig::from_json(r#"{"currencies": ["doge"]}"#).is_err());
    }

    #[test]
    fn test_builders() {
        let config = AcceptorConfig::default()
            .with_currencies([Currency::Xmr])
            .with_security_modulus(10)
            .with_confirmations(ConfirmationRange::new(1, 3))
            .with_lookback(30);
        assert_eq!(config.currencies, vec![Currency::Xmr]);
        assert_eq!(config.security_modulus, 10);
        assert_eq!(config.confirmations.max, 3);
        assert_eq!(config.subaddress_lookback_blocks, 30);
    }
}
