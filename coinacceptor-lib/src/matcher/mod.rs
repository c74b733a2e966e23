//! Payment matchers.
//!
//! - [`amount`] scans a shared address for an amount padded with the
//!   payment's security code.
//! - [`subaddress`] looks for an exact amount on a subaddress derived from
//!   the payment identity.
//!
//! Neither matcher keeps state between calls. Transaction ids the caller has
//! already claimed are passed in on every call and are never returned.

pub mod amount;
pub mod subaddress;

use serde::{Deserialize, Serialize};

use crate::{AcceptorError, Result};

pub use amount::{expected_amounts, find_payment, AmountMatch, AmountQuery};
pub use subaddress::{
    find_subaddress_payment, subaddress_index, SubaddressMatch, MINOR_INDEX_RANGE,
};

/// Default upper confirmation bound.
pub const MAX_CONFIRMATIONS: u64 = 6;

/// Inclusive window of accepted confirmation counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRange {
    pub min: u64,
    pub max: u64,
}

impl ConfirmationRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, confirmations: u64) -> bool {
        (self.min..=self.max).contains(&confirmations)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(AcceptorError::invalid_data(
                "confirmations",
                format!("min ({}) is greater than max ({})", self.min, self.max),
            ));
        }
        Ok(())
    }
}

impl Default for ConfirmationRange {
    fn default() -> Self {
        Self::new(0, MAX_CONFIRMATIONS)
    }
}

/// True if `txid` appears in the caller's claimed list.
pub(crate) fn is_excluded(excluded: &[String], txid: &str) -> bool {
    excluded.iter().any(|claimed| claimed == txid)
}
