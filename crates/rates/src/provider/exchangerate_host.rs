//! exchangerate.host provider.
//!
//! Lowest-priority source; same shape as Frankfurter but aggregated from
//! multiple upstreams.

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

const BASE_URL: &str = "https://api.exchangerate.host";
const PROVIDER_ID: &str = "EXCHANGERATE_HOST";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ExchangerateHostProvider {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    date: Option<NaiveDate>,
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

impl ExchangerateHostProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

impl Default for ExchangerateHostProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateProvider for ExchangerateHostProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_rate(
        &self,
        base: &CurrencyCode,
        quote: &CurrencyCode,
    ) -> Result<RateQuote, FxError> {
        let url = format!("{}/latest?base={}&symbols={}", BASE_URL, base, quote);
        debug!("exchangerate.host request: {}", url);

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
