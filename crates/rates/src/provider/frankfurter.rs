//! Frankfurter rate provider (ECB reference rates).
//!
//! Free, keyless API. Publishes once per business day, so weekend
//! requests return Friday's rates with Friday's date.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::FxError;
use crate::models::{CurrencyCode, RateQuote};
use crate::provider::RateProvider;

const BASE_URL: &str = "https://api.frankfurter.app";
const PROVIDER_ID: &str = "FRANKFURTER";

/// Per-request deadline; a slow provider must not hang the whole fan-out.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct FrankfurterProvider {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    date: Option<NaiveDate>,
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_rate(
        &self,
        base: &CurrencyCode,
        quote: &CurrencyCode,
    ) -> Result<RateQuote, FxError> {
        let url = format!("{}/latest?from={}&to={}", BASE_URL, base, quote);
        debug!("Frankfurter request: {}", url);

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

        let rate = body
            .rates
            .get(quote.as_str())
            .copied()
            .ok_or_else(|| FxError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("missing rate for {}", quote),
            })?;

        let as_of = body.date.unwrap_or_else(|| Utc::now().date_naive());

        Ok(RateQuote {
            rate,
            as_of,
            source: PROVIDER_ID.to_string(),
        })
    }
}
