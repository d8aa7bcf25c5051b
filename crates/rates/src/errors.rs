//! Error types for the rate-acquisition core.
//!
//! Everything below the reconciliation and PPP lookup boundary is caught and
//! converted into one of these variants; nothing else crosses the public
//! operations.

use thiserror::Error;

/// Errors produced by the FX and PPP services.
#[derive(Error, Debug)]
pub enum FxError {
    /// A currency or country code failed validation.
    /// Codes must be exactly three ASCII letters. Not retried.
    #[error("Invalid code: {code}")]
    InvalidCode {
        /// The offending code, as received
        code: String,
    },

    /// A single provider failed: non-success HTTP status, malformed payload,
    /// missing rate for the requested quote currency, or a provider-reported
    /// business error. Swallowed by the reconciliation engine; the provider
    /// is excluded from the candidate set and the next one is still tried.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// A provider request exceeded its per-call deadline.
    /// Treated like any other provider failure: excluded, not propagated.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// No provider produced a usable quote for the pair after a full
    /// fan-out. The only retryable condition; surfaced after the retry
    /// budget is exhausted.
    #[error("All providers failed for {base}/{quote}")]
    AllProvidersFailed {
        /// Base currency of the requested pair
        base: String,
        /// Quote currency of the requested pair
        quote: String,
    },

    /// The PPP series for the country contained no non-null entry.
    #[error("No PPP value for {country}")]
    NoPppValue {
        /// The country whose series was empty
        country: String,
    },

    /// Transport or HTTP failure while fetching PPP data.
    /// Not retried; PPP data is annual and a failed lookup is not
    /// time-sensitive.
    #[error("PPP fetch failed: {message}")]
    PppFetchFailed {
        /// Description of the failure
        message: String,
    },
}

impl FxError {
    /// Whether the retry controller should re-run the whole reconciliation
    /// attempt for this error.
    ///
    /// Only a transient all-providers-down condition qualifies: a result
    /// assembled from partial failures is still valid and is returned
    /// without retry, and validation errors are terminal.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::AllProvidersFailed { .. })
    }
}
