use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::Deserialize;

use foy_core::ad::{Ad, AdStatus};

use crate::error::AppError;
use crate::middleware::{admin_auth_middleware, AdminClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAdsQuery {
    pub status: Option<AdStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AdStatus,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/ads", get(list_ads))
        .route("/api/admin/ads/{id}/status", patch(update_ad_status))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

/// GET /api/admin/ads?status=pending
pub async fn list_ads(
    State(state): State<AppState>,
    Query(query): Query<ListAdsQuery>,
) -> Result<Json<Vec<Ad>>, AppError> {
    Ok(Json(state.gateway.list_ads(query.status).await?))
}

/// PATCH /api/admin/ads/:id/status
pub async fn update_ad_status(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(ad_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Ad>, AppError> {
    let ad = state.gateway.moderate(&ad_id, req.status).await?;
    tracing::info!("Ad {} moved to {} by {}", ad_id, req.status, claims.sub);
    Ok(Json(ad))
}
