use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::ad::{Ad, AdStatus, AdSubmission};
use crate::mode::ModeSwitch;
use crate::placement::PlacementRequest;
use crate::repository::{AdRepository, EventSink, RepoResult};
use crate::tracking::{EventTracker, TrackOutcome};
use crate::{CoreError, CoreResult};
use foy_shared::models::events::AdEventType;

/// Routes ad calls to the demo or live repository according to the mode
/// flag. Callers get the same contract from either side.
#[derive(Clone)]
pub struct AdGateway {
    demo: Arc<dyn AdRepository>,
    live: Arc<dyn AdRepository>,
    mode: ModeSwitch,
    live_sink: Option<Arc<dyn EventSink>>,
}

impl AdGateway {
    pub fn new(demo: Arc<dyn AdRepository>, live: Arc<dyn AdRepository>, mode: ModeSwitch) -> Self {
        Self { demo, live, mode, live_sink: None }
    }

    /// Tracking events of the live repository are forwarded to `sink`.
    pub fn with_live_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.live_sink = Some(sink);
        self
    }

    pub fn mode(&self) -> &ModeSwitch {
        &self.mode
    }

    /// A mode store failure falls back to demo mode.
    pub async fn is_demo(&self) -> bool {
        match self.mode.is_demo_mode().await {
            Ok(demo) => demo,
            Err(e) => {
                warn!("Mode store unavailable, serving demo inventory: {}", e);
                true
            }
        }
    }

    async fn repository(&self) -> Arc<dyn AdRepository> {
        if self.is_demo().await {
            self.demo.clone()
        } else {
            self.live.clone()
        }
    }

    async fn tracker(&self) -> EventTracker {
        if self.is_demo().await {
            EventTracker::new(self.demo.clone())
        } else {
            let tracker = EventTracker::new(self.live.clone());
            match &self.live_sink {
                Some(sink) => tracker.with_sink(sink.clone()),
                None => tracker,
            }
        }
    }

    /// Ads for a placement, or the repository error for callers that want to
    /// count failures before degrading.
    pub async fn try_placement_ads(&self, request: &PlacementRequest) -> RepoResult<Vec<Ad>> {
        self.repository().await.placement_ads(request).await
    }

    /// Ads for a placement. A failing repository yields an empty list.
    pub async fn placement_ads(&self, request: &PlacementRequest) -> Vec<Ad> {
        match self.try_placement_ads(request).await {
            Ok(ads) => ads,
            Err(e) => {
                error!("Ad selection failed for placement {}: {}", request.placement, e);
                Vec::new()
            }
        }
    }

    pub async fn track_impression(&self, ad_id: &str) -> TrackOutcome {
        self.tracker().await.record_impression(ad_id).await
    }

    pub async fn track_click(&self, ad_id: &str) -> TrackOutcome {
        self.tracker().await.record_click(ad_id).await
    }

    pub async fn track(&self, ad_id: &str, event: AdEventType) -> TrackOutcome {
        self.tracker().await.record(ad_id, event).await
    }

    /// Detached tracking; the caller does not wait for the store.
    pub fn spawn_track(&self, ad_id: String, event: AdEventType) -> JoinHandle<TrackOutcome> {
        let gateway = self.clone();
        tokio::spawn(async move { gateway.track(&ad_id, event).await })
    }

    pub async fn get_ad(&self, id: &str) -> CoreResult<Option<Ad>> {
        self.repository().await.get_ad(id).await.map_err(internal)
    }

    pub async fn list_ads(&self, status: Option<AdStatus>) -> CoreResult<Vec<Ad>> {
        self.repository().await.list_ads(status).await.map_err(internal)
    }

    /// Store a new advertiser submission as a pending ad.
    pub async fn submit_ad(&self, submission: AdSubmission) -> CoreResult<Ad> {
        let ad = submission.into_ad()?;
        self.repository().await.create_ad(&ad).await.map_err(internal)?;
        Ok(ad)
    }

    /// Apply an admin moderation decision.
    pub async fn moderate(&self, id: &str, next: AdStatus) -> CoreResult<Ad> {
        let repo = self.repository().await;
        let mut ad = repo
            .get_ad(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::NotFound(format!("ad {}", id)))?;

        ad.transition_to(next)?;

        if !repo.update_status(id, next).await.map_err(internal)? {
            return Err(CoreError::NotFound(format!("ad {}", id)));
        }
        Ok(ad)
    }
}

fn internal(e: Box<dyn std::error::Error + Send + Sync>) -> CoreError {
    CoreError::InternalError(e.to_string())
}
