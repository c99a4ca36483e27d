pub mod ad;
pub mod placement;
pub mod repository;
pub mod tracking;
pub mod mode;
pub mod gateway;
pub mod payment;

pub use ad::{Ad, AdFormat, AdMetrics, AdStatus, PlaceSummary, Targeting};
pub use gateway::AdGateway;
pub use mode::ModeSwitch;
pub use placement::{PlacementRequest, DEFAULT_PLACEMENT_LIMIT, MAX_PLACEMENT_LIMIT};
pub use tracking::{EventTracker, TrackOutcome};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: AdStatus, to: AdStatus },
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
