use axum::{
    extract::State,
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::{admin_auth_middleware, AdminClaims};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeBody {
    pub demo: bool,
}

/// Reading the mode is public; switching it affects every client, so the
/// switches sit behind admin auth.
pub fn routes(state: AppState) -> Router<AppState> {
    let admin = middleware::from_fn_with_state(state, admin_auth_middleware);

    Router::new()
        .route(
            "/api/mode",
            get(get_mode).merge(put(set_mode).route_layer(admin.clone())),
        )
        .route("/api/mode/toggle", post(toggle_mode).route_layer(admin))
}

/// GET /api/mode
/// Initializes the flag to the default on first use.
pub async fn get_mode(State(state): State<AppState>) -> Result<Json<ModeBody>, AppError> {
    let demo = state.gateway.mode().is_demo_mode().await.map_err(AppError::internal)?;
    Ok(Json(ModeBody { demo }))
}

/// PUT /api/mode
pub async fn set_mode(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Json(body): Json<ModeBody>,
) -> Result<Json<ModeBody>, AppError> {
    state.gateway.mode().set(body.demo).await.map_err(AppError::internal)?;
    tracing::info!("Demo mode set to {} by {}", body.demo, claims.sub);
    Ok(Json(body))
}

/// POST /api/mode/toggle
pub async fn toggle_mode(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
) -> Result<Json<ModeBody>, AppError> {
    let demo = state.gateway.mode().toggle().await.map_err(AppError::internal)?;
    tracing::info!("Demo mode toggled to {} by {}", demo, claims.sub);
    Ok(Json(ModeBody { demo }))
}
