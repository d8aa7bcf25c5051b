//! Rate reconciliation engine.
//!
//! Queries every configured provider concurrently, merges the answers in
//! configured priority order, computes cross-provider divergence, selects
//! the authoritative quote and memoizes the decision per business date.
//! A transient all-providers-down condition is retried with exponential
//! backoff; everything else returns on the first attempt.

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use tokio::time::sleep;

use crate::cache::TtlCache;
use crate::calendar;
use crate::errors::FxError;
use crate::models::{CurrencyCode, RateQuote, ReconciledRate};
use crate::provider::RateProvider;
use crate::retry::RetryPolicy;

/// How long a reconciled rate stays fresh. Midpoint of the acceptable
/// 60-300 second window.
const DEFAULT_TTL: Duration = Duration::from_secs(180);

/// Default bound on live cache entries.
const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Divergence (in percent) above which the newest quote wins over
/// priority order.
fn divergence_threshold() -> Decimal {
    Decimal::new(5, 1) // 0.5
}

/// Reconciliation engine configuration.
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Cache TTL for reconciled rates.
    pub ttl: Duration,
    /// Maximum live entries in the rate cache.
    pub cache_capacity: usize,
    /// Backoff schedule for all-providers-down retries.
    pub retry: RetryPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            retry: RetryPolicy::default(),
        }
    }
}

/// Multi-provider rate reconciler.
///
/// Owns its cache; construct once and share. Providers are tried on every
/// attempt and failures only narrow the candidate set.
pub struct RateReconciler {
    providers: Vec<Arc<dyn RateProvider>>,
    cache: TtlCache<String, ReconciledRate>,
    config: ReconcilerConfig,
}

impl RateReconciler {
    /// Create a reconciler with default TTL and retry settings.
    ///
    /// Provider order is priority order: earlier providers win ties.
    pub fn new(providers: Vec<Arc<dyn RateProvider>>) -> Self {
        Self::with_config(providers, ReconcilerConfig::default())
    }

    pub fn with_config(providers: Vec<Arc<dyn RateProvider>>, config: ReconcilerConfig) -> Self {
        let cache = TtlCache::with_capacity(config.cache_capacity);
        Self {
            providers,
            cache,
            config,
        }
    }

    /// Reconcile the current rate for an ordered currency pair.
    ///
    /// Identity pairs short-circuit to rate 1 without touching the cache
    /// or any provider. Fails only with [`FxError::InvalidCode`] or, after
    /// the retry budget, [`FxError::AllProvidersFailed`].
    pub async fn reconcile(&self, base: &str, quote: &str) -> Result<ReconciledRate, FxError> {
        let base = CurrencyCode::parse(base)?;
        let quote = CurrencyCode::parse(quote)?;

        let business_date = calendar::current_business_date();

        if base == quote {
            return Ok(ReconciledRate::identity(base, business_date));
        }

        let key = format!("{}/{}:{}", base, quote, business_date);
        if let Some(hit) = self.cache.get(&key) {
            debug!("cache hit for {}", key);
            return Ok(hit);
        }

        let mut retries = 0;
        loop {
            match self.attempt(&base, &quote, business_date).await {
                Ok(rate) => {
                    self.cache.insert(key, rate.clone(), self.config.ttl);
                    return Ok(rate);
                }
                Err(e) if e.retryable() && retries < self.config.retry.max_retries => {
                    let wait = self.config.retry.delay(retries);
                    warn!(
                        "reconcile {}/{} attempt {} failed ({}); retrying in {:?}",
                        base,
                        quote,
                        retries + 1,
                        e,
                        wait
                    );
                    sleep(wait).await;
                    retries += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One full fan-out, merge and selection pass.
    async fn attempt(
        &self,
        base: &CurrencyCode,
        quote: &CurrencyCode,
        business_date: chrono::NaiveDate,
    ) -> Result<ReconciledRate, FxError> {
        // join_all yields results in provider-list order regardless of
        // completion order, which the tie-break rules depend on.
        let fetches = self.providers.iter().map(|p| p.fetch_rate(base, quote));
        let results = future::join_all(fetches).await;

        let mut candidates: Vec<RateQuote> = Vec::with_capacity(self.providers.len());
        for (provider, result) in self.providers.iter().zip(results) {
            match result {
                Ok(q) => {
                    debug!(
                        "provider {} quoted {}/{} = {} (as of {})",
                        provider.id(),
                        base,
                        quote,
                        q.rate,
                        q.as_of
                    );
                    candidates.push(q);
                }
                Err(e) => {
                    warn!("provider {} excluded from {}/{}: {}", provider.id(), base, quote, e);
                }
            }
        }

        if candidates.is_empty() {
            return Err(FxError::AllProvidersFailed {
                base: base.to_string(),
                quote: quote.to_string(),
            });
        }

        let divergence_pct = divergence_pct(&candidates);
        let chosen = select_candidate(&candidates, divergence_pct);
        let stale = chosen.as_of < business_date;

        info!(
            "reconciled {}/{}: rate {} from {} (as of {}, divergence {:?}, stale {})",
            base, quote, chosen.rate, chosen.source, chosen.as_of, divergence_pct, stale
        );

        Ok(ReconciledRate {
            base: base.clone(),
            quote: quote.clone(),
            rate: chosen.rate,
            as_of: chosen.as_of,
            source: chosen.source.clone(),
            stale,
            divergence_pct,
        })
    }
}

/// Cross-provider spread: `(max - min) / mean * 100` over the successful
/// candidates. Undefined for fewer than two.
fn divergence_pct(candidates: &[RateQuote]) -> Option<Decimal> {
    if candidates.len() < 2 {
        return None;
    }

    let mut min = candidates[0].rate;
    let mut max = candidates[0].rate;
    let mut sum = Decimal::ZERO;
    for candidate in candidates {
        min = min.min(candidate.rate);
        max = max.max(candidate.rate);
        sum += candidate.rate;
    }

    let mean = sum / Decimal::from(candidates.len() as u64);
    if mean.is_zero() {
        return Some(Decimal::ZERO);
    }

    Some((max - min) / mean * Decimal::ONE_HUNDRED)
}

/// Pick the authoritative quote.
///
/// Material disagreement (divergence above the threshold) prefers the
/// most recently updated provider; ties and agreement fall back to the
/// first configured provider that answered.
fn select_candidate(candidates: &[RateQuote], divergence_pct: Option<Decimal>) -> &RateQuote {
    match divergence_pct {
        Some(d) if d > divergence_threshold() => {
            let mut best = &candidates[0];
            for candidate in &candidates[1..] {
                // Strictly greater: on equal dates the earlier-configured
                // provider keeps the win
                if candidate.as_of > best.as_of {
                    best = candidate;
                }
            }
            best
        }
        _ => &candidates[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        id: &'static str,
        quote: Option<RateQuote>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn succeeding(id: &'static str, rate: Decimal, as_of: NaiveDate) -> Arc<Self> {
            Arc::new(Self {
                id,
                quote: Some(RateQuote {
                    rate,
                    as_of,
                    source: id.to_string(),
                }),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(id: &'static str) -> Arc<Self> {
            Arc::new(Self {
                id,
                quote: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn fetch_rate(
            &self,
            _base: &CurrencyCode,
            _quote: &CurrencyCode,
        ) -> Result<RateQuote, FxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.quote {
                Some(q) => Ok(q.clone()),
                None => Err(FxError::ProviderError {
                    provider: self.id.to_string(),
                    message: "provider down".to_string(),
                }),
            }
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            factor: 2,
        }
    }

    fn config_with(ttl: Duration) -> ReconcilerConfig {
        ReconcilerConfig {
            ttl,
            cache_capacity: 16,
            retry: fast_retry(),
        }
    }

    fn today() -> NaiveDate {
        calendar::current_business_date()
    }

    #[tokio::test]
    async fn test_identity_pair_skips_providers() {
        let provider = MockProvider::succeeding("A", dec!(2), today());
        let reconciler = RateReconciler::new(vec![provider.clone() as Arc<dyn RateProvider>]);

        let result = reconciler.reconcile("USD", "usd").await.unwrap();
        assert_eq!(result.rate, dec!(1));
        assert!(!result.stale);
        assert_eq!(result.source, "IDENTITY");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_code_is_rejected() {
        let reconciler = RateReconciler::new(vec![]);
        let result = reconciler.reconcile("US", "EUR").await;
        assert!(matches!(result, Err(FxError::InvalidCode { .. })));
    }

    #[tokio::test]
    async fn test_single_candidate_has_no_divergence() {
        let provider = MockProvider::succeeding("A", dec!(0.92), today());
        let reconciler = RateReconciler::new(vec![provider.clone() as Arc<dyn RateProvider>]);

        let result = reconciler.reconcile("USD", "EUR").await.unwrap();
        assert_eq!(result.rate, dec!(0.92));
        assert_eq!(result.source, "A");
        assert!(result.divergence_pct.is_none());
    }

    #[tokio::test]
    async fn test_divergence_formula_over_successful_candidates_only() {
        let date = today();
        let a = MockProvider::succeeding("A", dec!(1.0), date);
        let b = MockProvider::failing("B");
        let c = MockProvider::succeeding("C", dec!(1.001), date);
        let reconciler = RateReconciler::new(vec![a as Arc<dyn RateProvider>, b, c]);

        let result = reconciler.reconcile("USD", "EUR").await.unwrap();
        // (1.001 - 1.0) / 1.0005 * 100, failed provider excluded
        let expected = (dec!(1.001) - dec!(1.0)) / dec!(1.0005) * dec!(100);
        assert_eq!(result.divergence_pct, Some(expected));
        // Divergence under threshold: first successful wins
        assert_eq!(result.source, "A");
    }

    #[tokio::test]
    async fn test_material_divergence_prefers_newest_as_of() {
        let date = today();
        let older = date - chrono::Days::new(1);
        let a = MockProvider::succeeding("A", dec!(1.0), older);
        let b = MockProvider::succeeding("B", dec!(1.1), date);
        let reconciler = RateReconciler::new(vec![a as Arc<dyn RateProvider>, b]);

        let result = reconciler.reconcile("USD", "EUR").await.unwrap();
        assert_eq!(result.source, "B");
        assert_eq!(result.rate, dec!(1.1));
        assert_eq!(result.as_of, date);
    }

    #[tokio::test]
    async fn test_divergence_tie_on_date_keeps_priority_order() {
        let date = today();
        let a = MockProvider::succeeding("A", dec!(1.0), date);
        let b = MockProvider::succeeding("B", dec!(1.1), date);
        let reconciler = RateReconciler::new(vec![a as Arc<dyn RateProvider>, b]);

        let result = reconciler.reconcile("USD", "EUR").await.unwrap();
        // Rates diverge materially but dates tie: first configured wins
        assert_eq!(result.source, "A");
    }

    #[tokio::test]
    async fn test_small_divergence_keeps_first_successful() {
        let date = today();
        let newer_low_priority =
            MockProvider::succeeding("B", dec!(1.0001), date);
        let a = MockProvider::succeeding("A", dec!(1.0), date - chrono::Days::new(1));
        let reconciler = RateReconciler::new(vec![a as Arc<dyn RateProvider>, newer_low_priority]);

        let result = reconciler.reconcile("USD", "EUR").await.unwrap();
        // Divergence is well under 0.5, so the newer date does not matter
        assert_eq!(result.source, "A");
    }

    #[tokio::test]
    async fn test_stale_flag_set_from_business_date() {
        let stale_date = today() - chrono::Days::new(3);
        let provider = MockProvider::succeeding("A", dec!(0.9), stale_date);
        let reconciler = RateReconciler::new(vec![provider as Arc<dyn RateProvider>]);

        let result = reconciler.reconcile("USD", "EUR").await.unwrap();
        assert!(result.stale);
        assert_eq!(result.as_of, stale_date);
    }

    #[tokio::test]
    async fn test_cache_hit_issues_no_provider_calls() {
        let provider = MockProvider::succeeding("A", dec!(0.92), today());
        let reconciler = RateReconciler::with_config(
            vec![provider.clone() as Arc<dyn RateProvider>],
            config_with(Duration::from_secs(60)),
        );

        let first = reconciler.reconcile("USD", "EUR").await.unwrap();
        let second = reconciler.reconcile("USD", "EUR").await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(first.rate, second.rate);
        assert_eq!(first.source, second.source);
    }

    #[tokio::test]
    async fn test_expired_cache_entry_triggers_fresh_fetch() {
        let provider = MockProvider::succeeding("A", dec!(0.92), today());
        let reconciler =
            RateReconciler::with_config(vec![provider.clone() as Arc<dyn RateProvider>], config_with(Duration::ZERO));

        reconciler.reconcile("USD", "EUR").await.unwrap();
        reconciler.reconcile("USD", "EUR").await.unwrap();

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_is_not_retried() {
        let a = MockProvider::failing("A");
        let b = MockProvider::succeeding("B", dec!(0.92), today());
        let reconciler = RateReconciler::with_config(
            vec![a.clone() as Arc<dyn RateProvider>, b.clone()],
            config_with(Duration::from_secs(60)),
        );

        let result = reconciler.reconcile("USD", "EUR").await.unwrap();
        assert_eq!(result.source, "B");
        // One attempt only: a partial result is valid as-is
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_providers_failed_retries_full_fanout() {
        let a = MockProvider::failing("A");
        let b = MockProvider::failing("B");
        let reconciler = RateReconciler::with_config(
            vec![a.clone() as Arc<dyn RateProvider>, b.clone()],
            config_with(Duration::from_secs(60)),
        );

        let result = reconciler.reconcile("USD", "EUR").await;
        assert!(matches!(
            result,
            Err(FxError::AllProvidersFailed { .. })
        ));
        // 3 total attempts, each re-querying every provider
        assert_eq!(a.calls(), 3);
        assert_eq!(b.calls(), 3);
    }

    #[test]
    fn test_divergence_pct_undefined_for_single_candidate() {
        let candidates = vec![RateQuote {
            rate: dec!(1.0),
            as_of: today(),
            source: "A".to_string(),
        }];
        assert!(divergence_pct(&candidates).is_none());
    }

    #[test]
    fn test_divergence_pct_exact() {
        let date = today();
        let candidates = vec![
            RateQuote {
                rate: dec!(1.0),
                as_of: date,
                source: "A".to_string(),
            },
            RateQuote {
                rate: dec!(1.1),
                as_of: date,
                source: "B".to_string(),
            },
        ];

        // (1.1 - 1.0) / 1.05 * 100
        let expected = dec!(0.1) / dec!(1.05) * dec!(100);
        assert_eq!(divergence_pct(&candidates), Some(expected));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let date = today();
        let candidates = vec![
            RateQuote {
                rate: dec!(1.0),
                as_of: date - chrono::Days::new(1),
                source: "A".to_string(),
            },
            RateQuote {
                rate: dec!(1.2),
                as_of: date,
                source: "B".to_string(),
            },
        ];

        // Exactly at the threshold the priority rule still applies
        let chosen = select_candidate(&candidates, Some(dec!(0.5)));
        assert_eq!(chosen.source, "A");

        let chosen = select_candidate(&candidates, Some(dec!(0.50001)));
        assert_eq!(chosen.source, "B");
    }
}
