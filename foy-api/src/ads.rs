use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use foy_core::ad::{Ad, AdSubmission};
use foy_core::placement::{PlacementFilters, PlacementRequest};
use foy_core::TrackOutcome;
use foy_shared::models::events::AdEventType;

use crate::error::AppError;
use crate::middleware::rate_limit_middleware;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    #[serde(rename = "type")]
    pub event_type: AdEventType,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let tracking = Router::new()
        .route("/api/ads/{id}/track", post(track_event))
        .route("/api/ads/{id}/click", get(click_through))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware));

    Router::new()
        .route("/api/ads", post(submit_ad))
        .route("/api/ads/placement/{placement}", get(placement_ads))
        .merge(tracking)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/ads/placement/:placement
/// Ads for one slot. Backend failures answer with an empty list.
pub async fn placement_ads(
    State(state): State<AppState>,
    Path(placement): Path<String>,
    Query(filters): Query<PlacementFilters>,
) -> Result<Json<Vec<Ad>>, AppError> {
    let request = PlacementRequest::from_filters(placement, filters)?;

    let ads = match state.gateway.try_placement_ads(&request).await {
        Ok(ads) => ads,
        Err(e) => {
            state.metrics.fetch_failures.inc();
            tracing::error!("Ad selection failed for placement {}: {}", request.placement, e);
            Vec::new()
        }
    };

    state
        .metrics
        .ads_served
        .with_label_values(&[request.placement.as_str()])
        .inc_by(ads.len() as u64);

    Ok(Json(ads))
}

/// POST /api/ads/:id/track
pub async fn track_event(
    State(state): State<AppState>,
    Path(ad_id): Path<String>,
    Json(req): Json<TrackRequest>,
) -> Json<TrackOutcome> {
    state.metrics.ad_events.with_label_values(&[req.event_type.as_str()]).inc();
    Json(state.gateway.track(&ad_id, req.event_type).await)
}

/// GET /api/ads/:id/click
/// Redirects to the ad's CTA right away; the click is recorded in the background.
pub async fn click_through(
    State(state): State<AppState>,
    Path(ad_id): Path<String>,
) -> Response {
    let cta_url = match state.gateway.get_ad(&ad_id).await {
        Ok(ad) => ad.and_then(|a| a.cta_url),
        Err(e) => {
            tracing::warn!("Could not resolve CTA for ad {}: {}", ad_id, e);
            None
        }
    };

    let location = cta_url.and_then(|url| match HeaderValue::from_str(&url) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ad {} has a CTA that is not a valid Location: {:?}", ad_id, url);
            None
        }
    });

    state.metrics.ad_events.with_label_values(&[AdEventType::Click.as_str()]).inc();
    let _ = state.gateway.spawn_track(ad_id, AdEventType::Click);

    match location {
        Some(location) => (
            StatusCode::SEE_OTHER,
            [
                (header::LOCATION, location),
                (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
            ],
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// POST /api/ads
/// Advertiser submission; the ad waits in `pending` for moderation.
pub async fn submit_ad(
    State(state): State<AppState>,
    Json(submission): Json<AdSubmission>,
) -> Result<(StatusCode, Json<Ad>), AppError> {
    let ad = state.gateway.submit_ad(submission).await?;
    tracing::info!("Ad {} submitted for moderation", ad.id);
    Ok((StatusCode::CREATED, Json(ad)))
}
