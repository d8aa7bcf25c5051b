//! World Bank PPP provider.
//!
//! Fetches the `PA.NUS.PPPC.RF` indicator series (PPP conversion factor,
//! private consumption) for a country. The payload is a two-element JSON
//! array: pagination metadata, then the entries. Recent years are null
//! until the Bank publishes them.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::FxError;
use crate::models::{CountryCode, PppObservation};
use crate::provider::PppProvider;

const BASE_URL: &str = "https://api.worldbank.org/v2";
const INDICATOR: &str = "PA.NUS.PPPC.RF";
const PROVIDER_ID: &str = "WORLD_BANK";

/// Enough rows to span the indicator's full history.
const PER_PAGE: u32 = 60;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct WorldBankProvider {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    /// Observation year as a string, e.g. "2022"
    date: String,
    value: Option<Decimal>,
}

impl WorldBankProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Extract observations from the two-element response array.
    ///
    /// Entries whose year fails to parse are dropped rather than failing
    /// the whole series.
    fn parse_series(body: &serde_json::Value) -> Result<Vec<PppObservation>, FxError> {
        let entries: Vec<SeriesEntry> = match body.get(1) {
            Some(raw) if !raw.is_null() => {
                serde_json::from_value(raw.clone()).map_err(|e| FxError::PppFetchFailed {
                    message: format!("Failed to parse series: {}", e),
                })?
            }
            _ => Vec::new(),
        };

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let year = entry.date.parse::<i32>().ok()?;
                Some(PppObservation {
                    year,
                    value: entry.value,
                })
            })
            .collect())
    }
}

impl Default for WorldBankProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PppProvider for WorldBankProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_series(
        &self,
        country: &CountryCode,
    ) -> Result<Vec<PppObservation>, FxError> {
        let url = format!(
            "{}/country/{}/indicator/{}?format=json&per_page={}",
            BASE_URL, country, INDICATOR, PER_PAGE
        );
        debug!("World Bank request: {}", url);

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| FxError::PppFetchFailed {
                    message: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::PppFetchFailed {
                message: format!("HTTP {}", status),
            });
        }

        let body: serde_json::Value =
            response.json().await.map_err(|e| FxError::PppFetchFailed {
                message: format!("Failed to parse response: {}", e),
            })?;

        Self::parse_series(&body)
    }
}
