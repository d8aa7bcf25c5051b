//! Purchasing-power-parity lookup.
//!
//! Single-provider annual-factor fetch behind a long-lived cache. PPP data
//! moves once a year, so the TTL is 30 days and there is no retry layer:
//! a failed attempt propagates immediately.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::cache::TtlCache;
use crate::errors::FxError;
use crate::models::{CountryCode, PppFactor};
use crate::provider::PppProvider;

/// 30 days.
const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const DEFAULT_CACHE_CAPACITY: usize = 256;

/// PPP factor lookup service.
pub struct PppService {
    provider: Arc<dyn PppProvider>,
    cache: TtlCache<String, PppFactor>,
    ttl: Duration,
}

impl PppService {
    pub fn new(provider: Arc<dyn PppProvider>) -> Self {
        Self::with_config(provider, DEFAULT_TTL, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_config(provider: Arc<dyn PppProvider>, ttl: Duration, capacity: usize) -> Self {
        Self {
            provider,
            cache: TtlCache::with_capacity(capacity),
            ttl,
        }
    }

    /// The most recent published PPP factor for a country.
    ///
    /// Scans the series for the maximum year carrying a non-null value;
    /// ordering of the upstream series is not assumed. Fails with
    /// [`FxError::NoPppValue`] when every entry is null.
    pub async fn get_ppp(&self, country: &str) -> Result<PppFactor, FxError> {
        let country = CountryCode::parse(country)?;
        let key = format!("ppp:{}", country);

        if let Some(hit) = self.cache.get(&key) {
            debug!("cache hit for {}", key);
            return Ok(hit);
        }

        let series = self.provider.fetch_series(&country).await?;

        let factor = series
            .iter()
            .filter_map(|obs| obs.value.map(|value| (obs.year, value)))
            .max_by_key(|(year, _)| *year)
            .map(|(year, value)| PppFactor { year, value })
            .ok_or_else(|| FxError::NoPppValue {
                country: country.to_string(),
            })?;

        info!(
            "ppp {}: {} ({}) from {}",
            country,
            factor.value,
            factor.year,
            self.provider.id()
        );

        self.cache.insert(key, factor.clone(), self.ttl);
        Ok(factor)
    }
}
