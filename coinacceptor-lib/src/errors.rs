//! Error types for payment acceptance.
//!
//! Errors fall into two groups. Input errors are raised before any
//! collaborator is contacted and are never worth retrying. Collaborator
//! errors (explorer, wallet RPC, price feed) are passed through to the
//! caller unchanged so it can apply its own backoff.
//!
//! A payment that has not arrived yet is *not* an error; see
//! [`crate::payment::PaymentResult`].

use std::fmt;

use crate::currency::Currency;

/// Numeric error codes for FFI and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AcceptorErrorCode {
    /// Feature not compiled in
    Unimplemented = 1000,
    /// Transport/network layer error
    Transport = 2000,
    /// Connection failed
    ConnectionFailed = 2001,
    /// Connection timeout
    ConnectionTimeout = 2002,
    /// Remote resource not found
    NotFound = 4000,
    /// Currency tag not supported by this deployment
    UnsupportedCurrency = 4001,
    /// No collaborator registered for the currency
    BackendNotConfigured = 4002,
    /// Invalid request/data
    InvalidData = 5000,
    /// Wallet connection descriptor is missing or malformed
    InvalidWalletConnection = 5001,
    /// Serialization error
    Serialization = 5002,
    /// Wallet RPC returned an error object
    Rpc = 6000,
    /// Rate limited
    RateLimited = 8000,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Error type for every fallible operation in this crate.
#[derive(Debug)]
pub enum AcceptorError {
    /// HTTP client was not compiled in.
    Unimplemented(&'static str),

    /// Transport/network layer error.
    Transport(String),

    /// Connection failed.
    ConnectionFailed {
        /// Target endpoint or service
        target: String,
        /// Underlying error message
        reason: String,
    },

    /// Connection timeout.
    ConnectionTimeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Remote resource not found.
    NotFound {
        /// Type of resource (e.g., "address", "Esplora resource")
        resource_type: String,
        /// Resource identifier
        identifier: String,
    },

    /// Currency tag is unknown or disabled in this deployment.
    UnsupportedCurrency(String),

    /// No unspent source or wallet connector was registered for the currency.
    BackendNotConfigured(Currency),

    /// Invalid data provided.
    InvalidData {
        /// Field or parameter name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Wallet connection descriptor is missing or malformed.
    InvalidWalletConnection(String),

    /// Serialization/deserialization error.
    Serialization(String),

    /// The wallet RPC answered with a JSON-RPC error object.
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// JSON-RPC error message
        message: String,
    },

    /// Rate limited, should retry after delay.
    RateLimited {
        /// Suggested retry delay in milliseconds
        retry_after_ms: u64,
    },

    /// Internal/unexpected error.
    Internal(String),
}

impl AcceptorError {
    /// Get the error code.
    pub fn code(&self) -> AcceptorErrorCode {
        match self {
            Self::Unimplemented(_) => AcceptorErrorCode::Unimplemented,
            Self::Transport(_) => AcceptorErrorCode::Transport,
            Self::ConnectionFailed { .. } => AcceptorErrorCode::ConnectionFailed,
            Self::ConnectionTimeout { .. } => AcceptorErrorCode::ConnectionTimeout,
            Self::NotFound { .. } => AcceptorErrorCode::NotFound,
            Self::UnsupportedCurrency(_) => AcceptorErrorCode::UnsupportedCurrency,
            Self::BackendNotConfigured(_) => AcceptorErrorCode::BackendNotConfigured,
            Self::InvalidData { .. } => AcceptorErrorCode::InvalidData,
            Self::InvalidWalletConnection(_) => AcceptorErrorCode::InvalidWalletConnection,
            Self::Serialization(_) => AcceptorErrorCode::Serialization,
            Self::Rpc { .. } => AcceptorErrorCode::Rpc,
            Self::RateLimited { .. } => AcceptorErrorCode::RateLimited,
            Self::Internal(_) => AcceptorErrorCode::Internal,
        }
    }

    /// Returns true for errors raised from request validation, before any I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedCurrency(_)
                | Self::BackendNotConfigured(_)
                | Self::InvalidData { .. }
                | Self::InvalidWalletConnection(_)
        )
    }

    /// Returns true if this error is potentially recoverable by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::ConnectionFailed { .. }
                | Self::ConnectionTimeout { .. }
                | Self::RateLimited { .. }
        )
    }

    /// Returns a suggested retry delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            Self::ConnectionTimeout { .. } => Some(1000),
            Self::ConnectionFailed { .. } => Some(2000),
            Self::Transport(_) => Some(1000),
            _ => None,
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AcceptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unimplemented(label) => write!(f, "{} is not implemented", label),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::ConnectionFailed { target, reason } => {
                write!(f, "connection to {} failed: {}", target, reason)
            }
            Self::ConnectionTimeout {
                operation,
                timeout_ms,
            } => {
                write!(f, "{} timed out after {}ms", operation, timeout_ms)
            }
            Self::NotFound {
                resource_type,
                identifier,
            } => {
                write!(f, "{} not found: {}", resource_type, identifier)
            }
            Self::UnsupportedCurrency(tag) => {
                write!(f, "currency must be one of: {} (got {:?})", Currency::ALL_TAGS, tag)
            }
            Self::BackendNotConfigured(currency) => {
                write!(f, "no backend configured for {}", currency)
            }
            Self::InvalidData { field, reason } => {
                write!(f, "invalid {}: {}", field, reason)
            }
            Self::InvalidWalletConnection(msg) => {
                write!(f, "invalid wallet connection: {}", msg)
            }
            Self::Serialization(msg) => write!(f, "serialization error: {}", msg),
            Self::Rpc { code, message } => {
                write!(f, "wallet rpc error {}: {}", code, message)
            }
            Self::RateLimited { retry_after_ms } => {
                write!(f, "rate limited, retry after {}ms", retry_after_ms)
            }
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for AcceptorError {}

impl From<serde_json::Error> for AcceptorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
