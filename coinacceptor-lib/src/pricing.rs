//! Fiat to crypto conversion across a price crossover window.
//!
//! Price feeds update on a schedule. A payer who was quoted just before an
//! update will send an amount computed from the older price, so every fiat
//! amount is converted against two samples ("current" and "previous") and
//! both results are accepted.

use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::{AcceptorError, Result};

/// Two recent fiat-per-coin prices.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSamples {
    /// Most recent price.
    pub current: f64,
    /// Price from the previous tick.
    pub previous: f64,
}

impl PriceSamples {
    pub fn new(current: f64, previous: f64) -> Self {
        Self { current, previous }
    }

    /// Both samples at the same price, for feeds that only expose a spot rate.
    pub fn single(price: f64) -> Self {
        Self::new(price, price)
    }

    /// Check both samples are finite and positive.
    pub fn validate(&self) -> Result<()> {
        for (field, price) in [("current_price", self.current), ("previous_price", self.previous)] {
            if !price.is_finite() || price <= 0.0 {
                return Err(AcceptorError::invalid_data(
                    field,
                    format!("must be a positive number, got {}", price),
                ));
            }
        }
        Ok(())
    }
}

/// Candidate amounts for one fiat-denominated payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PriceWindow {
    /// Amount at the current price, in atomic units.
    pub first: u64,
    /// Amount at the previous price, in atomic units.
    pub second: u64,
    /// Whether either amount was raised to the network floor.
    pub floored: bool,
    /// Fiat value of `first`, in cents. Differs from the request only when
    /// the floor raised `first`.
    pub final_fiat_cents: u64,
}

impl PriceWindow {
    /// Amounts to watch for, in order. Collapses to one entry when both
    /// samples land on the same amount.
    pub fn targets(&self) -> Vec<u64> {
        if self.first == self.second {
            vec![self.first]
        } else {
            vec![self.first, self.second]
        }
    }
}

/// Atomic units bought by one fiat cent at `price` fiat per coin.
///
/// Truncates toward zero.
pub fn atomic_units_per_cent(price: f64, currency: Currency) -> u64 {
    (1.0 / price * currency.atomic_units_per_coin() as f64 / 100.0) as u64
}

/// Fiat value of `atomic` units at `price`, rounded up to a whole cent.
fn fiat_value_cents(atomic: u64, price: f64, currency: Currency) -> u64 {
    (atomic as f64 * price * 100.0 / currency.atomic_units_per_coin() as f64).ceil() as u64
}

/// Convert `fiat_cents` against both price samples and apply the floor.
///
/// Fails when a price is so high that one cent buys less than one atomic
/// unit, since every amount would then be quoted at the floor.
///
/// Each amount is floored independently. Skipping the second conversion when
/// the first one is floored would risk missing a payment made at the older,
/// higher price.
///
/// # Example
///
/// ```
/// use coinacceptor_lib::pricing::{windowed_amounts, PriceSamples};
/// use coinacceptor_lib::Currency;
///
/// let window = windowed_amounts(100, PriceSamples::new(10_000.0, 10_001.0), Currency::Btc).unwrap();
/// assert_eq!(window.targets(), vec![10_000]);
/// assert!(window.floored);
/// ```
pub fn windowed_amounts(
    fiat_cents: u64,
    prices: PriceSamples,
    currency: Currency,
) -> Result<PriceWindow> {
    prices.validate()?;

    let floor = currency.network_floor();
    let convert = |price: f64| -> Result<u64> {
        let per_cent = atomic_units_per_cent(price, currency);
        if per_cent == 0 {
            return Err(AcceptorError::invalid_data(
                "price",
                format!("{} is too high to price {} in cents", price, currency),
            ));
        }
        per_cent.checked_mul(fiat_cents).ok_or_else(|| {
            AcceptorError::invalid_data("fiat_cents", "converted amount overflows")
        })
    };

    let first_raw = convert(prices.current)?;
    let second_raw = convert(prices.previous)?;

    let first = first_raw.max(floor);
    let second = second_raw.max(floor);
    let floored = first_raw < floor || second_raw < floor;

    let final_fiat_cents = if first_raw < floor {
        fiat_value_cents(first, prices.current, currency)
    } else {
        fiat_cents
    };

    Ok(PriceWindow {
        first,
        second,
        floored,
        final_fiat_cents,
    })
}
