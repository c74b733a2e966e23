//! Coin acceptor library.
//!
//! Decides whether a specific payment has arrived without keeping any
//! per-invoice state. Address-based currencies (BTC, BCH, BSV) share one
//! receiving address and tell payments apart by a small security code added
//! to the requested amount. Monero derives a subaddress from the payment
//! identity instead.
//!
//! The engine never touches the network directly. Explorers, wallet RPC and
//! price feeds are plugged in through the traits in [`ports`]; HTTP
//! implementations live in [`executors`] behind the `http-executor` feature.
//!
//! # Example
//!
//! ```
//! use coinacceptor_lib::matcher::{find_payment, AmountQuery, ConfirmationRange};
//! use coinacceptor_lib::ports::CandidateTransaction;
//!
//! let candidates = vec![CandidateTransaction::new("txid", 10_721, 1)];
//! let found = find_payment(
//!     &candidates,
//!     &AmountQuery {
//!         identity: "cab41de5-ad64-446d-9ab4-6dc794162bfc",
//!         targets: &[10_000],
//!         confirmations: ConfirmationRange::default(),
//!         excluded: &[],
//!         security_modulus: 1000,
//!     },
//! )
//! .unwrap();
//! assert_eq!(found.txid.as_deref(), Some("txid"));
//! ```

pub mod config;
pub mod currency;
pub mod errors;
pub mod executors;
pub mod matcher;
pub mod payment;
pub mod ports;
pub mod prelude;
pub mod pricing;
pub mod security_code;
pub mod uri;

/// In-memory collaborators for payment testing.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::AcceptorConfig;
pub use currency::{validate_currency, Currency, Settlement};
pub use errors::{AcceptorError, AcceptorErrorCode};
pub use payment::{Denomination, PaymentAcceptor, PaymentRequest, PaymentResult};
pub use uri::{parse_payment_uri, payment_uri, PaymentUri};

/// Common result alias for acceptor operations.
pub type Result<T> = std::result::Result<T, AcceptorError>;
