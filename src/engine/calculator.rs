//! Discount Calculator
//!
//! Pure computation of the discount amount a campaign grants against a value.
//! Uses rust_decimal for precise calculations, stores as f64.

use rust_decimal::prelude::*;

use crate::db::models::Campaign;

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round a monetary figure to currency precision
pub fn round_currency(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Compute the discount a campaign grants against `value`.
///
/// The cap order is a correctness contract; reordering changes results:
/// 1. base amount from the discount mode (percentage preferred when a legacy
///    row carries both),
/// 2. cap to `max_discount_amount` when configured,
/// 3. cap to the remaining budget of the campaign snapshot,
/// 4. cap to `value` itself,
/// 5. round to currency precision.
///
/// Returns 0 when no discount mode is configured or a cap collapses the
/// amount; a zero result is a valid outcome and callers re-check `> 0`.
pub fn compute_discount(campaign: &Campaign, value: f64) -> f64 {
    let value_dec = to_decimal(value);

    let mut amount = if let Some(pct) = campaign.discount_percentage {
        value_dec * to_decimal(pct) / Decimal::ONE_HUNDRED
    } else if let Some(flat) = campaign.discount_flat {
        to_decimal(flat)
    } else {
        Decimal::ZERO
    };

    if let Some(cap) = campaign.max_discount_amount {
        amount = amount.min(to_decimal(cap));
    }

    let remaining = to_decimal(campaign.total_budget) - to_decimal(campaign.used_budget);
    amount = amount.min(remaining);

    amount = amount.min(value_dec);

    to_f64(amount.max(Decimal::ZERO))
}
