//! Rate and PPP provider abstractions and implementations.
//!
//! Each adapter normalizes one external source into the common
//! [`RateQuote`](crate::models::RateQuote) shape or a typed failure. The
//! reconciliation engine only sees the traits; configured order defines
//! provider priority.

mod traits;

pub mod exchangerate_host;
pub mod frankfurter;
pub mod open_er_api;
pub mod world_bank;

use std::sync::Arc;

pub use exchangerate_host::ExchangerateHostProvider;
pub use frankfurter::FrankfurterProvider;
pub use open_er_api::OpenErApiProvider;
pub use traits::{PppProvider, RateProvider};
pub use world_bank::WorldBankProvider;

/// The production rate providers, in priority order.
///
/// First configured wins ties, so the most trusted source goes first.
pub fn default_providers() -> Vec<Arc<dyn RateProvider>> {
    vec![
        Arc::new(FrankfurterProvider::new()),
        Arc::new(OpenErApiProvider::new()),
        Arc::new(ExchangerateHostProvider::new()),
    ]
}
