//! Cambio Rates Crate
//!
//! Rate-acquisition core for the Cambio currency-conversion backend.
//! Queries multiple independent, unreliable external rate providers,
//! reconciles their answers, decides which to trust, caches the decision
//! for a bounded window and retries transient total failures, all in
//! exact decimal arithmetic.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  Route handlers  | --> |  RateReconciler  |  (cache, fan-out, merge)
//! +------------------+     +------------------+
//!          |                        |
//!          |                        v
//!          |               +------------------+
//!          |               |   RateProvider   |  (Frankfurter, ER-API, ...)
//!          |               +------------------+
//!          v
//! +------------------+     +------------------+
//! |    PppService    | --> |   PppProvider    |  (World Bank)
//! +------------------+     +------------------+
//! ```
//!
//! # Core Operations
//!
//! - [`RateReconciler::reconcile`] - authoritative rate for a currency pair
//! - [`PppService::get_ppp`] - most recent annual PPP factor for a country
//! - [`rounding::round_amount`] - minor-unit rounding for final amounts
//! - [`convert`] - nominal conversion and cost-of-living adjustment helpers
//!
//! Providers are an ordered, extensible set: implement
//! [`provider::RateProvider`] and pass it in the configured list. Earlier
//! providers have higher priority for tie-breaking.

pub mod cache;
pub mod calendar;
pub mod convert;
pub mod errors;
pub mod models;
pub mod ppp;
pub mod provider;
pub mod reconcile;
pub mod retry;
pub mod rounding;

// Re-export the public surface
pub use cache::TtlCache;
pub use convert::{convert_amount, cost_of_living_adjust};
pub use errors::FxError;
pub use models::{
    CountryCode, CurrencyCode, PppFactor, PppObservation, RateQuote, ReconciledRate,
};
pub use ppp::PppService;
pub use provider::{
    default_providers, ExchangerateHostProvider, FrankfurterProvider, OpenErApiProvider,
    PppProvider, RateProvider, WorldBankProvider,
};
pub use reconcile::{RateReconciler, ReconcilerConfig};
pub use retry::RetryPolicy;
pub use rounding::{minor_units, round_amount};
