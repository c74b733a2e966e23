//! Supported currencies and their fixed per-network parameters.
//!
//! The set is closed: three satoshi-denominated chains settled by amount
//! padding on a shared address, and Monero settled by per-payment
//! subaddresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AcceptorError, Result};

/// Minimum payment accepted on the satoshi chains. Some clients refuse to
/// send less than this.
pub const SATOSHI_FLOOR: u64 = 10_000;

/// Minimum payment accepted for Monero, in piconero (0.0001 XMR).
pub const PICONERO_FLOOR: u64 = 100_000_000;

/// A currency this crate knows how to accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Bitcoin.
    Btc,
    /// Bitcoin Cash.
    Bch,
    /// Bitcoin SV.
    Bsv,
    /// Monero.
    Xmr,
}

/// How payments in a currency are told apart from one another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// Shared address, amount padded with a per-payment security code.
    SecurityCode,
    /// One deterministic subaddress per payment, exact amount.
    Subaddress,
}

impl Currency {
    /// Every supported currency, in tag order.
    pub const ALL: [Currency; 4] = [Currency::Btc, Currency::Bch, Currency::Bsv, Currency::Xmr];

    /// Human readable list of accepted tags.
    pub const ALL_TAGS: &'static str = "btc, bch, bsv, xmr";

    /// Lowercase ticker tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Btc => "btc",
            Self::Bch => "bch",
            Self::Bsv => "bsv",
            Self::Xmr => "xmr",
        }
    }

    /// Number of decimal places in one whole coin.
    pub fn decimals(&self) -> u32 {
        match self {
            Self::Btc | Self::Bch | Self::Bsv => 8,
            Self::Xmr => 12,
        }
    }

    /// Atomic units (satoshis, piconero) in one whole coin.
    pub fn atomic_units_per_coin(&self) -> u64 {
        match self {
            Self::Btc | Self::Bch | Self::Bsv => 100_000_000,
            Self::Xmr => 1_000_000_000_000,
        }
    }

    /// Smallest amount worth asking a payer for.
    pub fn network_floor(&self) -> u64 {
        match self {
            Self::Btc | Self::Bch | Self::Bsv => SATOSHI_FLOOR,
            Self::Xmr => PICONERO_FLOOR,
        }
    }

    /// Scheme used in wallet deep links.
    pub fn uri_scheme(&self) -> &'static str {
        match self {
            Self::Btc => "bitcoin",
            Self::Bch => "bitcoincash",
            Self::Bsv => "bitcoinsv",
            Self::Xmr => "monero",
        }
    }

    /// Query parameter carrying the amount in wallet deep links.
    pub fn uri_amount_param(&self) -> &'static str {
        match self {
            Self::Xmr => "tx_amount",
            _ => "amount",
        }
    }

    pub fn settlement(&self) -> Settlement {
        match self {
            Self::Xmr => Settlement::Subaddress,
            _ => Settlement::SecurityCode,
        }
    }

    /// Render an atomic amount as a decimal string at fixed precision.
    ///
    /// ```
    /// use coinacceptor_lib::Currency;
    ///
    /// assert_eq!(Currency::Btc.format_amount(10_721), "0.00010721");
    /// assert_eq!(Currency::Xmr.format_amount(1_500_000_000_000), "1.500000000000");
    /// ```
    pub fn format_amount(&self, atomic: u64) -> String {
        let per_coin = self.atomic_units_per_coin();
        format!(
            "{}.{:0width$}",
            atomic / per_coin,
            atomic % per_coin,
            width = self.decimals() as usize
        )
    }

    /// Parse a decimal coin amount back into atomic units.
    ///
    /// Rejects more fractional digits than the currency carries.
    pub fn parse_amount(&self, text: &str) -> Result<u64> {
        let invalid = |reason: &str| AcceptorError::invalid_data("amount", reason);
        let (whole, frac) = text.split_once('.').unwrap_or((text, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty"));
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a decimal number"));
        }
        let decimals = self.decimals() as usize;
        if frac.len() > decimals {
            return Err(invalid("too many decimal places"));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("out of range"))?
        };
        let frac_units: u64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<width$}", frac, width = decimals)
                .parse()
                .map_err(|_| invalid("out of range"))?
        };

        whole
            .checked_mul(self.atomic_units_per_coin())
            .and_then(|w| w.checked_add(frac_units))
            .ok_or_else(|| invalid("out of range"))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = AcceptorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "btc" => Ok(Self::Btc),
            "bch" => Ok(Self::Bch),
            "bsv" => Ok(Self::Bsv),
            "xmr" => Ok(Self::Xmr),
            _ => Err(AcceptorError::UnsupportedCurrency(s.to_string())),
        }
    }
}

/// Validate a currency tag and return its typed form.
///
/// ```
/// use coinacceptor_lib::{validate_currency, Currency};
///
/// assert_eq!(validate_currency("btc").unwrap(), Currency::Btc);
/// assert!(validate_currency("doge").is_err());
/// ```
pub fn validate_currency(tag: &str) -> Result<Currency> {
    tag.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_currency() {
        for currency in Currency::ALL {
            assert_eq!(validate_currency(currency.as_str()).unwrap(), currency);
        }
        assert_eq!(validate_currency("XMR").unwrap(), Currency::Xmr);

        let err = validate_currency("eth").unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_settlement() {
        assert_eq!(Currency::Btc.settlement(), Settlement::SecurityCode);
        assert_eq!(Currency::Bsv.settlement(), Settlement::SecurityCode);
        assert_eq!(Currency::Xmr.settlement(), Settlement::Subaddress);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(Currency::Btc.format_amount(0), "0.00000000");
        assert_eq!(Currency::Bch.format_amount(123_456_789), "1.23456789");
        assert_eq!(Currency::Xmr.format_amount(1), "0.000000000001");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(Currency::Btc.parse_amount("0.00010721").unwrap(), 10_721);
        assert_eq!(Currency::Btc.parse_amount("1").unwrap(), 100_000_000);
        assert_eq!(Currency::Btc.parse_amount(".5").unwrap(), 50_000_000);
        assert_eq!(Currency::Xmr.parse_amount("0.5").unwrap(), 500_000_000_000);
        assert!(Currency::Btc.parse_amount("0.000000001").is_err());
        assert!(Currency::Btc.parse_amount("1e5").is_err());
        assert!(Currency::Btc.parse_amount("").is_err());
        assert!(Currency::Btc.parse_amount("-1").is_err());
    }

    #[test]
    fn test_serde_tags() {
        let json = serde_json::to_string(&Currency::Bch).unwrap();
        assert_eq!(json, "\"bch\"");
        let parsed: Currency = serde_json::from_str("\"xmr\"").unwrap();
        assert_eq!(parsed, Currency::Xmr);
    }
}
