//! Currency-aware money rounding.
//!
//! Final amounts are rounded half-up to the currency's minor-unit count.
//! All arithmetic stays in `Decimal`; binary floats would drift at cent
//! level on large amounts.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places for a currency's smallest denomination.
///
/// Unknown currencies default to 2.
pub fn minor_units(currency: &str) -> u32 {
    match currency {
        // Three-decimal currencies (mils)
        "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
        // Zero-decimal currencies
        "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF"
        | "UGX" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
        _ => 2,
    }
}

/// Round an amount to the currency's minor units, half-up.
pub fn round_amount(amount: Decimal, currency: &str) -> Decimal {
    amount.round_dp_with_strategy(minor_units(currency), RoundingStrategy::MidpointAwayFromZero)
}
