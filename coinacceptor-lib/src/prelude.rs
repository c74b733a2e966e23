//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use coinacceptor_lib::prelude::*;
//! ```

// Core types
pub use crate::config::AcceptorConfig;
pub use crate::currency::{validate_currency, Currency};
pub use crate::payment::{
    Denomination, FiatQuote, PaymentAcceptor, PaymentRequest, PaymentResult,
};

// Error handling
pub use crate::errors::{AcceptorError, AcceptorErrorCode};
pub use crate::Result;

// Collaborator traits
pub use crate::ports::{
    CandidateTransaction, IncomingTransfer, PriceFeed, SubaddressIndex, UnspentSource,
    WalletConnection, WalletConnector, WalletPort,
};

// Matching
pub use crate::matcher::{ConfirmationRange, MAX_CONFIRMATIONS};
pub use crate::pricing::PriceSamples;

// URIs
pub use crate::uri::{parse_payment_uri, payment_uri, PaymentUri};
