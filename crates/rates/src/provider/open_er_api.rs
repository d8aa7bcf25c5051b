//! ExchangeRate-API provider (open.er-api.com).
//!
//! Keyless endpoint that returns the full rate table for a base currency
//! in one call, with an RFC 2822 last-update timestamp instead of a plain
//! date.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::FxError;
use crate::models::{CurrencyCode, RateQuote};
use crate::provider::RateProvider;

const BASE_URL: &str = "https://open.er-api.com/v6/latest";
const PROVIDER_ID: &str = "EXCHANGE_RATE_API";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct OpenErApiProvider {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    time_last_update_utc: Option<String>,
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

impl OpenErApiProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Parse the provider's RFC 2822 update timestamp into a calendar date.
    fn parse_update_date(raw: &str) -> Option<NaiveDate> {
        DateTime::parse_from_rfc2822(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    }
}

impl Default for OpenErApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateProvider for OpenErApiProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_rate(
        &self,
        base: &CurrencyCode,
        quote: &CurrencyCode,
    ) -> Result<RateQuote, FxError> {
        let url = format!("{}/{}", BASE_URL, base);
        debug!("ExchangeRate-API request: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FxError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                FxError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let body: LatestResponse =
            response.json().await.map_err(|e| FxError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse response: {}", e),
            })?;

        // The API reports business errors in-band with a 200 status
        if body.result.as_deref() != Some("success") {
            return Err(FxError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: body.error_type.unwrap_or_else(|| "unknown".to_string()),
            });
        }

        let rate = body
            .rates
            .get(quote.as_str())
            .copied()
            .ok_or_else(|| FxError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("missing rate for {}", quote),
            })?;

        let as_of = body
            .time_last_update_utc
            .as_deref()
            .and_then(Self::parse_update_date)
            .unwrap_or_else(|| Utc::now().date_naive());

        Ok(RateQuote {
            rate,
            as_of,
            source: PROVIDER_ID.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_provider_id() {
        let provider = OpenErApiProvider::new();
        assert_eq!(provider.id(), "EXCHANGE_RATE_API");
    }

    #[test]
    fn test_parse_update_date() {
        let date = OpenErApiProvider::parse_update_date("Mon, 02 Jun 2025 00:02:31 +0000");
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 2));
    }

    #[test]
    fn test_parse_update_date_invalid() {
        assert!(OpenErApiProvider::parse_update_date("not a date").is_none());
        assert!(OpenErApiProvider::parse_update_date("2025-06-02").is_none());
    }

    #[test]
    fn test_success_response_parsing() {
        let json = r#"{
            "result": "success",
            "time_last_update_utc": "Mon, 02 Jun 2025 00:02:31 +0000",
            "rates": { "EUR": 0.9217, "JPY": 155.12 }
        }"#;

        let response: LatestResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.result.as_deref(), Some("success"));
        assert_eq!(response.rates.get("JPY").copied(), Some(dec!(155.12)));
    }

    #[test]
    fn test_error_response_parsing() {
        let json = r#"{ "result": "error", "error-type": "unsupported-code" }"#;
        let response: LatestResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.result.as_deref(), Some("error"));
        assert_eq!(response.error_type.as_deref(), Some("unsupported-code"));
    }
}
