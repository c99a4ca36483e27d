use async_trait::async_trait;
use uuid::Uuid;

use crate::ad::{Ad, AdStatus};
use crate::payment::{PaymentRecord, PaymentStatus};
use crate::placement::PlacementRequest;
use foy_shared::models::events::{AdEventType, AdTrackedEvent};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Repository trait for ad inventory access. The demo fixture store and the
/// live database implement it with identical semantics.
#[async_trait]
pub trait AdRepository: Send + Sync {
    /// Active ads for the placement, filtered and truncated, in insertion order.
    async fn placement_ads(&self, request: &PlacementRequest) -> RepoResult<Vec<Ad>>;

    /// Increment the counter for `event`. Returns false when the ad is unknown.
    async fn record_event(&self, ad_id: &str, event: AdEventType) -> RepoResult<bool>;

    async fn get_ad(&self, id: &str) -> RepoResult<Option<Ad>>;

    async fn list_ads(&self, status: Option<AdStatus>) -> RepoResult<Vec<Ad>>;

    async fn create_ad(&self, ad: &Ad) -> RepoResult<()>;

    /// Overwrite the status. Returns false when the ad is unknown.
    async fn update_status(&self, id: &str, status: AdStatus) -> RepoResult<bool>;
}

/// Persistence for the demo/live flag.
#[async_trait]
pub trait ModeStore: Send + Sync {
    async fn load_mode(&self) -> RepoResult<Option<bool>>;

    async fn store_mode(&self, demo: bool) -> RepoResult<()>;
}

/// Downstream stream of tracking events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish_tracked(&self, event: &AdTrackedEvent) -> RepoResult<()>;
}

/// Repository trait for campaign payments.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create_payment(&self, payment: &PaymentRecord) -> RepoResult<()>;

    async fn get_payment(&self, id: Uuid) -> RepoResult<Option<PaymentRecord>>;

    /// Moves a pending payment to `status`. Returns false when the payment is
    /// unknown or already settled.
    async fn settle_payment(&self, id: Uuid, status: PaymentStatus) -> RepoResult<bool>;
}

/// Fixed-window request counter keyed by caller.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one hit on `key`. True while the current window holds at most
    /// `limit` hits; the window starts at the first hit and is never extended.
    async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RepoResult<bool>;
}
