//! Core data types shared across the crate.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::FxError;

/// A validated ISO 4217 currency code: exactly three ASCII letters, stored
/// uppercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse and normalize a currency code.
    ///
    /// Codes arrive pre-normalized from the route-handler layer, but this is
    /// a reusable library so the format is re-validated here.
    pub fn parse(code: &str) -> Result<Self, FxError> {
        parse_alpha3(code)
            .map(Self)
            .ok_or_else(|| FxError::InvalidCode {
                code: code.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A validated ISO 3166-1 alpha-3 country code, stored uppercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn parse(code: &str) -> Result<Self, FxError> {
        parse_alpha3(code)
            .map(Self)
            .ok_or_else(|| FxError::InvalidCode {
                code: code.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn parse_alpha3(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    Some(code.to_ascii_uppercase())
}

/// One provider's answer for an ordered currency pair.
/// Immutable once constructed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateQuote {
    /// Spot rate for the pair
    pub rate: Decimal,

    /// Calendar date the provider last updated the rate
    pub as_of: NaiveDate,

    /// Source of the quote (FRANKFURTER, EXCHANGE_RATE_API, etc.)
    pub source: String,
}

/// The reconciliation engine's output for one pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconciledRate {
    /// Base currency (converted from)
    pub base: CurrencyCode,

    /// Quote currency (converted to)
    pub quote: CurrencyCode,

    /// The chosen rate
    pub rate: Decimal,

    /// As-of date of the chosen quote
    pub as_of: NaiveDate,

    /// Provider the chosen quote came from
    pub source: String,

    /// True when the as-of date is older than the current business date
    pub stale: bool,

    /// Cross-provider spread, `(max - min) / mean * 100`.
    /// Present only when two or more providers answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divergence_pct: Option<Decimal>,
}

impl ReconciledRate {
    /// The identity result for `base == quote`: rate exactly 1, never
    /// fetched from a provider, never stale.
    pub fn identity(code: CurrencyCode, as_of: NaiveDate) -> Self {
        Self {
            base: code.clone(),
            quote: code,
            rate: Decimal::ONE,
            as_of,
            source: "IDENTITY".to_string(),
            stale: false,
            divergence_pct: None,
        }
    }
}

/// Annual purchasing-power-parity conversion factor for one country.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PppFactor {
    /// Year of the observation
    pub year: i32,

    /// The PPP conversion factor
    pub value: Decimal,
}

/// One raw entry of a provider's PPP time series. The value is null for
/// years the source has not published yet.
#[derive(Clone, Debug)]
pub struct PppObservation {
    pub year: i32,
    pub value: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_code_normalizes_case() {
        let code = CurrencyCode::parse("usd").unwrap();
        assert_eq!(code.as_str(), "USD");
    }

    #[test]
    fn test_currency_code_rejects_wrong_length() {
        assert!(CurrencyCode::parse("US").is_err());
        assert!(CurrencyCode::parse("USDX").is_err());
        assert!(CurrencyCode::parse("").is_err());
    }

    #[test]
    fn test_currency_code_rejects_non_letters() {
        assert!(CurrencyCode::parse("U$D").is_err());
        assert!(CurrencyCode::parse("U1D").is_err());
    }

    #[test]
    fn test_country_code_parse() {
        let code = CountryCode::parse("deu").unwrap();
        assert_eq!(code.as_str(), "DEU");
        assert!(CountryCode::parse("DE").is_err());
    }

    #[test]
    fn test_identity_rate() {
        let usd = CurrencyCode::parse("USD").unwrap();
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let rate = ReconciledRate::identity(usd.clone(), as_of);

        assert_eq!(rate.base, usd);
        assert_eq!(rate.quote, usd);
        assert_eq!(rate.rate, dec!(1));
        assert!(!rate.stale);
        assert!(rate.divergence_pct.is_none());
        assert_eq!(rate.source, "IDENTITY");
    }

    #[test]
    fn test_reconciled_rate_serialization() {
        let rate = ReconciledRate {
            base: CurrencyCode::parse("USD").unwrap(),
            quote: CurrencyCode::parse("EUR").unwrap(),
            rate: dec!(0.92),
            as_of: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            source: "FRANKFURTER".to_string(),
            stale: false,
            divergence_pct: None,
        };

        let json = serde_json::to_value(&rate).unwrap();
        assert_eq!(json["base"], "USD");
        assert_eq!(json["quote"], "EUR");
        assert_eq!(json["as_of"], "2025-06-02");
        // Absent divergence is omitted, not serialized as null
        assert!(json.get("divergence_pct").is_none());
    }

    #[test]
    fn test_currency_code_deserialization_validates() {
        let ok: CurrencyCode = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(ok.as_str(), "EUR");

        let bad: Result<CurrencyCode, _> = serde_json::from_str("\"EURO\"");
        assert!(bad.is_err());
    }
}
