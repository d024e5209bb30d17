//! Candidate-by-candidate geocode resolution.
//!
//! Candidates are tried strictly in order, one lookup at a time, so a
//! high-confidence hit can stop iteration before the remaining candidates
//! cost a provider call. Dropping the returned future abandons any lookup
//! in flight.

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use super::cache::{CacheEntry, CacheKey, ResolutionCache};
use super::client::GeocodeProvider;
use super::confidence;
use super::types::{GeocodeRequest, LatLng, ScoredResult};
use crate::config::ResolverConfig;

pub struct GeocodeResolver {
    provider: Arc<dyn GeocodeProvider>,
    cache: Arc<ResolutionCache>,
    config: ResolverConfig,
}

impl GeocodeResolver {
    /// Resolver backed by the process-wide cache and default thresholds.
    pub fn new(provider: Arc<dyn GeocodeProvider>) -> Self {
        Self {
            provider,
            cache: ResolutionCache::global(),
            config: ResolverConfig::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResolutionCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// Best scored result across `candidates`, or `None` if nothing was found.
    ///
    /// Never fails: lookup errors, timeouts and empty result sets are logged
    /// and the next candidate is tried.
    pub async fn resolve(&self, candidates: &[String], reference: Option<LatLng>) -> Option<ScoredResult> {
        let resolution_id = Uuid::new_v4();
        let span = tracing::info_span!("resolve", %resolution_id, candidates = candidates.len());
        self.resolve_candidates(candidates, reference)
            .instrument(span)
            .await
    }

    async fn resolve_candidates(&self, candidates: &[String], reference: Option<LatLng>) -> Option<ScoredResult> {
        let first = candidates.first()?;
        let mut best: Option<ScoredResult> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let key = CacheKey::new(candidate, reference);
            match self.cache.get(&key) {
                Some(CacheEntry::Found(result)) => {
                    tracing::debug!(candidate = %candidate, confidence = result.confidence, "Cache hit");
                    if index == 0 {
                        return Some(result);
                    }
                    keep_better(&mut best, result);
                    break;
                }
                Some(CacheEntry::NotFound) => {
                    tracing::debug!(candidate = %candidate, "Cache hit (not found), skipping");
                    continue;
                }
                None => {}
            }

            let Some(result) = self.lookup(candidate, reference).await else {
                continue;
            };
            self.cache.insert(key, CacheEntry::Found(result.clone()));

            let confidence = result.confidence;
            keep_better(&mut best, result);

            if confidence > self.config.early_exit_threshold {
                tracing::debug!(candidate = %candidate, confidence, "Early exit on high confidence");
                break;
            }
        }

        match &best {
            Some(result) => {
                self.cache
                    .insert(CacheKey::new(first, reference), CacheEntry::Found(result.clone()));
                tracing::info!(
                    candidate = %result.candidate,
                    formatted = %result.response.formatted_address,
                    confidence = result.confidence,
                    "Resolved"
                );
            }
            None => tracing::info!("No candidate produced a result"),
        }
        best
    }

    /// One provider lookup, scored. Definitive empty answers are cached as
    /// not found; failures are only logged.
    async fn lookup(&self, candidate: &str, reference: Option<LatLng>) -> Option<ScoredResult> {
        let mut request = GeocodeRequest::new(candidate);
        if let Some(location) = reference {
            request = request.with_bias(location, self.config.search_radius_m);
        }

        let outcome = tokio::time::timeout(self.config.lookup_timeout(), self.provider.geocode(&request)).await;
        let responses = match outcome {
            Ok(Ok(responses)) => responses,
            Ok(Err(e)) => {
                tracing::warn!(candidate = %candidate, error = %e, "Geocode lookup failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    candidate = %candidate,
                    timeout_secs = self.config.lookup_timeout_secs,
                    "Geocode lookup timed out"
                );
                return None;
            }
        };

        let Some(top) = responses.into_iter().next() else {
            tracing::debug!(candidate = %candidate, "No results");
            self.cache
                .insert(CacheKey::new(candidate, reference), CacheEntry::NotFound);
            return None;
        };

        let confidence = confidence::score(&top, candidate, reference);
        tracing::debug!(
            candidate = %candidate,
            formatted = %top.formatted_address,
            confidence,
            "Scored result"
        );
        Some(ScoredResult {
            candidate: candidate.to_string(),
            response: top,
            confidence,
        })
    }
}

/// Strict `>`: on equal confidence the result already held wins.
fn keep_better(best: &mut Option<ScoredResult>, result: ScoredResult) {
    if best.as_ref().map_or(true, |b| result.confidence > b.confidence) {
        *best = Some(result);
    }
}
