//! Money helpers.
//!
//! Amounts are `rust_decimal::Decimal` values carried at a fixed scale of two
//! fractional digits. Prices are validated on the way in; totals are derived
//! by [`line_total`] and [`sum`] and never accepted from clients.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Number of fractional digits kept for every stored amount.
pub const SCALE: u32 = 2;

/// Exclusive upper bound for a catalog price (eight integer digits).
pub const MAX_PRICE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Exclusive upper bound for an order total (ten integer digits).
pub const MAX_TOTAL: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Validate a catalog price: non-negative, below [`MAX_PRICE`], at most two
/// decimal places.
///
/// The returned value is rescaled to [`SCALE`] so `10` and `10.00` compare and
/// serialise identically.
pub fn validate_price(price: Decimal) -> DomainResult<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DomainError::validation("price must not be negative"));
    }
    if price >= MAX_PRICE {
        return Err(DomainError::validation(format!("price must be below {MAX_PRICE}")));
    }
    let normalized = price.normalize();
    if normalized.scale() > SCALE {
        return Err(DomainError::validation(format!(
            "price must have at most {SCALE} decimal places"
        )));
    }
    Ok(at_scale(normalized))
}

/// `unit_price × quantity`, at [`SCALE`].
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    at_scale(unit_price * Decimal::from(quantity))
}

/// Sum of amounts, at [`SCALE`]. An empty iterator sums to `0.00`.
pub fn sum<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    at_scale(amounts.into_iter().fold(Decimal::ZERO, |acc, a| acc + a))
}

fn at_scale(value: Decimal) -> Decimal {
    let mut v = value.round_dp(SCALE);
    v.rescale(SCALE);
    v
}
