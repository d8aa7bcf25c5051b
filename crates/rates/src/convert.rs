//! Decimal-exact conversion helpers on top of reconciled rates and PPP
//! factors.
//!
//! These are the pure arithmetic steps the route handlers apply to the
//! core's outputs: nominal conversion, and the cost-of-living adjustment
//! that re-expresses a converted amount in purchasing-power terms.

use rust_decimal::Decimal;

use crate::models::{PppFactor, ReconciledRate};
use crate::rounding;

/// Convert an amount with a reconciled rate, rounded to the quote
/// currency's minor units.
pub fn convert_amount(amount: Decimal, fx: &ReconciledRate) -> Decimal {
    rounding::round_amount(amount * fx.rate, fx.quote.as_str())
}

/// Adjust a converted amount into a cost-of-living-equivalent amount:
/// `converted * source.value / target.value`, rounded to the target
/// currency's minor units.
///
/// Returns `None` when the target factor is zero, which only happens on
/// degenerate source data.
pub fn cost_of_living_adjust(
    converted: Decimal,
    source_ppp: &PppFactor,
    target_ppp: &PppFactor,
    currency: &str,
) -> Option<Decimal> {
    (converted * source_ppp.value)
        .checked_div(target_ppp.value)
        .map(|adjusted| rounding::round_amount(adjusted, currency))
}
