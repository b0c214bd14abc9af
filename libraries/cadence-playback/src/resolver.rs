//! Track resolution
//!
//! Fetches metadata for a requested track and tags every request with a
//! generation number. Only completions carrying the latest generation may
//! touch player state; anything older was superseded by a newer request and
//! is dropped.

use crate::types::FallbackPolicy;
use cadence_core::{Catalog, CatalogResult, TrackId, TrackMetadata};
use futures_util::future::{BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;

/// Why a track switch was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchReason {
    /// Explicit user action (play list, next, previous, jump)
    User,

    /// The device finished the previous track
    TrackEnded,

    /// An earlier candidate failed to load
    Fallback,
}

/// One step of a track switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub id: TrackId,
    pub autoplay: bool,
    pub policy: FallbackPolicy,
    pub reason: SwitchReason,

    /// Zero-based attempt within the current fallback pass
    pub attempt: usize,

    /// Attempts allowed before the pass is given up
    pub budget: usize,
}

impl LoadRequest {
    pub fn new(id: TrackId, autoplay: bool, policy: FallbackPolicy, reason: SwitchReason) -> Self {
        Self {
            id,
            autoplay,
            policy,
            reason,
            attempt: 0,
            budget: 1,
        }
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget.max(1);
        self
    }

    /// Next attempt of the same pass, targeting `id`
    ///
    /// Returns `None` once the budget is spent.
    pub fn retry_with(&self, id: TrackId) -> Option<Self> {
        let attempt = self.attempt + 1;
        (attempt < self.budget).then(|| Self {
            id,
            autoplay: self.autoplay,
            policy: self.policy,
            reason: SwitchReason::Fallback,
            attempt,
            budget: self.budget,
        })
    }
}

/// Metadata fetcher with last-request-wins bookkeeping
pub struct TrackResolver {
    catalog: Arc<dyn Catalog>,
    generation: u64,
}

impl TrackResolver {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            generation: 0,
        }
    }

    /// Start a new request, superseding every earlier one
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Whether `generation` is still the latest request
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn fetch(&self, id: &TrackId) -> BoxFuture<'static, CatalogResult<TrackMetadata>> {
        let catalog = Arc::clone(&self.catalog);
        let id = id.clone();
        async move { catalog.fetch_track(&id).await }.boxed()
    }
}

impl fmt::Debug for TrackResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackResolver")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cadence_core::CatalogError;

    struct OneTrack;

    #[async_trait]
    impl Catalog for OneTrack {
        async fn fetch_track(&self, id: &TrackId) -> CatalogResult<TrackMetadata> {
            if id.as_str() == "1" {
                Ok(TrackMetadata::new("1", "Only"))
            } else {
                Err(CatalogError::NotFound(id.clone()))
            }
        }
    }

    #[test]
    fn newer_request_supersedes_older() {
        let mut resolver = TrackResolver::new(Arc::new(OneTrack));
        let first = resolver.begin();
        let second = resolver.begin();

        assert!(!resolver.is_current(first));
        assert!(resolver.is_current(second));
    }

    #[test]
    fn retry_stops_at_budget() {
        let request = LoadRequest::new(
            TrackId::from("a"),
            true,
            FallbackPolicy::AdvanceToNext,
            SwitchReason::User,
        )
        .with_budget(2);

        let retry = request.retry_with(TrackId::from("b")).unwrap();
        assert_eq!(retry.attempt, 1);
        assert_eq!(retry.reason, SwitchReason::Fallback);
        assert!(retry.retry_with(TrackId::from("c")).is_none());
    }

    #[test]
    fn zero_budget_still_allows_one_attempt() {
        let request = LoadRequest::new(
            TrackId::from("a"),
            false,
            FallbackPolicy::RevertToPrevious,
            SwitchReason::User,
        )
        .with_budget(0);
        assert_eq!(request.budget, 1);
        assert!(request.retry_with(TrackId::from("b")).is_none());
    }

    #[tokio::test]
    async fn fetch_reports_not_found() {
        let resolver = TrackResolver::new(Arc::new(OneTrack));
        assert_eq!(
            resolver.fetch(&TrackId::from("1")).await.unwrap().name,
            "Only"
        );
        assert!(matches!(
            resolver.fetch(&TrackId::from("2")).await,
            Err(CatalogError::NotFound(_))
        ));
    }
}
