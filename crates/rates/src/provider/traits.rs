//! Provider trait definitions.
//!
//! Adapters are stateless and independent: a failure in one never prevents
//! the others from being tried. The reconciliation engine treats the
//! configured list as an ordered set, so new sources are added by
//! implementing [`RateProvider`] without touching the merge algorithm.

use async_trait::async_trait;

use crate::errors::FxError;
use crate::models::{CountryCode, CurrencyCode, PppObservation, RateQuote};

/// A spot-rate source for ordered currency pairs.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Unique identifier, a constant like "FRANKFURTER".
    /// Used for logging and as the `source` on returned quotes.
    fn id(&self) -> &'static str;

    /// Fetch the current spot rate for `base`/`quote`.
    ///
    /// Fails with a typed error on non-success HTTP status, malformed
    /// payload, a missing rate for the quote currency, or a
    /// provider-reported business error. When the payload omits an as-of
    /// date the adapter substitutes the current UTC calendar date.
    async fn fetch_rate(
        &self,
        base: &CurrencyCode,
        quote: &CurrencyCode,
    ) -> Result<RateQuote, FxError>;
}

/// An annual PPP conversion-factor series source.
#[async_trait]
pub trait PppProvider: Send + Sync {
    /// Unique identifier, a constant like "WORLD_BANK".
    fn id(&self) -> &'static str;

    /// Fetch the annual series for a country. Entries carry a null value
    /// for years the source has not published.
    async fn fetch_series(&self, country: &CountryCode)
        -> Result<Vec<PppObservation>, FxError>;
}
