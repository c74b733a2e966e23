//! Wallet deep links.
//!
//! Two formats are produced and understood:
//! - `<scheme>:<address>?amount=<coins>` for the satoshi chains, with the
//!   amount at 8 decimal places (`bitcoin`, `bitcoincash`, `bitcoinsv`).
//! - `monero:<address>?tx_amount=<coins>` with the amount at 12 places.
//!
//! # Examples
//!
//! ```rust
//! use coinacceptor_lib::uri::{payment_uri, parse_payment_uri};
//! use coinacceptor_lib::Currency;
//!
//! let uri = payment_uri(Currency::Btc, "16jCrzcXo2PxadrQiQwUgwrmEwDGQYBwZq", 10_721);
//! assert_eq!(uri, "bitcoin:16jCrzcXo2PxadrQiQwUgwrmEwDGQYBwZq?amount=0.00010721");
//!
//! let parsed = parse_payment_uri(&uri).unwrap();
//! assert_eq!(parsed.amount, Some(10_721));
//! ```

use serde::Serialize;

use crate::currency::Currency;
use crate::{AcceptorError, Result};

/// A parsed wallet deep link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentUri {
    pub currency: Currency,
    /// Address without the scheme prefix.
    pub address: String,
    /// Requested amount in atomic units, if present.
    pub amount: Option<u64>,
}

/// Strip a leading `<scheme>:` that some address encodings (cashaddr) carry.
fn strip_scheme<'a>(address: &'a str, scheme: &str) -> &'a str {
    match address.split_once(':') {
        Some((prefix, rest)) if prefix.eq_ignore_ascii_case(scheme) => rest,
        _ => address,
    }
}

/// Build the deep link for paying `amount` atomic units to `address`.
pub fn payment_uri(currency: Currency, address: &str, amount: u64) -> String {
    let scheme = currency.uri_scheme();
    format!(
        "{}:{}?{}={}",
        scheme,
        strip_scheme(address.trim(), scheme),
        currency.uri_amount_param(),
        currency.format_amount(amount)
    )
}

/// Parse a deep link produced by [`payment_uri`] or a compatible wallet.
///
/// Unknown query parameters are ignored.
///
/// # Errors
///
/// Returns an error if the scheme is unknown, the address is empty or the
/// amount is not a valid decimal for the currency.
pub fn parse_payment_uri(uri: &str) -> Result<PaymentUri> {
    let uri = uri.trim();
    let (scheme, rest) = uri
        .split_once(':')
        .ok_or_else(|| AcceptorError::invalid_data("uri", "missing scheme"))?;

    let currency = Currency::ALL
        .into_iter()
        .find(|c| c.uri_scheme().eq_ignore_ascii_case(scheme))
        .ok_or_else(|| AcceptorError::invalid_data("uri", format!("unknown scheme {:?}", scheme)))?;

    let rest = rest.split('#').next().unwrap_or(rest);
    let (address, query) = rest.split_once('?').unwrap_or((rest, ""));
    if address.is_empty() {
        return Err(AcceptorError::invalid_data("uri", "missing address"));
    }

    let mut amount = None;
    for param in query.split('&') {
        if let Some((key, value)) = param.split_once('=') {
            if key == currency.uri_amount_param() {
                amount = Some(currency.parse_amount(value)?);
            }
        }
    }

    Ok(PaymentUri {
        currency,
        address: address.to_string(),
        amount,
    })
}
