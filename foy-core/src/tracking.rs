use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::repository::{AdRepository, EventSink};
use foy_shared::models::events::{AdEventType, AdTrackedEvent};

/// Result reported to callers of the tracking surface. `success` is false only
/// when the backing store failed; an unknown ad id still counts as success.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TrackOutcome {
    pub success: bool,
}

/// Records impressions and clicks. Errors stop here: they are logged and
/// turned into `success: false`, never propagated and never retried.
#[derive(Clone)]
pub struct EventTracker {
    repo: Arc<dyn AdRepository>,
    sink: Option<Arc<dyn EventSink>>,
}

impl EventTracker {
    pub fn new(repo: Arc<dyn AdRepository>) -> Self {
        Self { repo, sink: None }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub async fn record_impression(&self, ad_id: &str) -> TrackOutcome {
        self.record(ad_id, AdEventType::Impression).await
    }

    pub async fn record_click(&self, ad_id: &str) -> TrackOutcome {
        self.record(ad_id, AdEventType::Click).await
    }

    pub async fn record(&self, ad_id: &str, event: AdEventType) -> TrackOutcome {
        match self.repo.record_event(ad_id, event).await {
            Ok(true) => {
                if let Some(sink) = &self.sink {
                    let tracked = AdTrackedEvent::new(ad_id, event);
                    if let Err(e) = sink.publish_tracked(&tracked).await {
                        warn!("Failed to publish {} event for ad {}: {}", event, ad_id, e);
                    }
                }
                TrackOutcome { success: true }
            }
            Ok(false) => {
                debug!("Ignoring {} for unknown ad {}", event, ad_id);
                TrackOutcome { success: true }
            }
            Err(e) => {
                warn!("Failed to record {} for ad {}: {}", event, ad_id, e);
                TrackOutcome { success: false }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad::{Ad, AdStatus};
    use crate::placement::PlacementRequest;
    use crate::repository::RepoResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingRepo {
        known: Vec<String>,
        counts: Mutex<HashMap<(String, AdEventType), u64>>,
        fail: bool,
    }

    #[async_trait]
    impl AdRepository for CountingRepo {
        async fn placement_ads(&self, _request: &PlacementRequest) -> RepoResult<Vec<Ad>> {
            Ok(vec![])
        }

        async fn record_event(&self, ad_id: &str, event: AdEventType) -> RepoResult<bool> {
            if self.fail {
                return Err("connection refused".into());
            }
            if !self.known.iter().any(|k| k == ad_id) {
                return Ok(false);
            }
            *self.counts.lock().unwrap().entry((ad_id.to_string(), event)).or_default() += 1;
            Ok(true)
        }

        async fn get_ad(&self, _id: &str) -> RepoResult<Option<Ad>> {
            Ok(None)
        }

        async fn list_ads(&self, _status: Option<AdStatus>) -> RepoResult<Vec<Ad>> {
            Ok(vec![])
        }

        async fn create_ad(&self, _ad: &Ad) -> RepoResult<()> {
            Ok(())
        }

        async fn update_status(&self, _id: &str, _status: AdStatus) -> RepoResult<bool> {
            Ok(false)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<AdTrackedEvent>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn publish_tracked(&self, event: &AdTrackedEvent) -> RepoResult<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_unknown_ad_still_succeeds() {
        let tracker = EventTracker::new(Arc::new(CountingRepo::default()));
        assert!(tracker.record_impression("missing").await.success);
        assert!(tracker.record_click("missing").await.success);
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let repo = CountingRepo { fail: true, ..Default::default() };
        let tracker = EventTracker::new(Arc::new(repo));
        assert_eq!(tracker.record_click("a").await, TrackOutcome { success: false });
    }

    #[tokio::test]
    async fn test_sink_only_sees_recorded_events() {
        let repo = Arc::new(CountingRepo { known: vec!["a".into()], ..Default::default() });
        let sink = Arc::new(RecordingSink::default());
        let tracker = EventTracker::new(repo.clone()).with_sink(sink.clone());

        tracker.record_impression("a").await;
        tracker.record_impression("ghost").await;
        tracker.record_click("a").await;

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AdEventType::Impression);
        assert_eq!(events[1].event_type, AdEventType::Click);
        assert_eq!(repo.counts.lock().unwrap()[&("a".to_string(), AdEventType::Click)], 1);
    }
}
