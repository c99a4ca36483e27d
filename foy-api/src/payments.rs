use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use foy_core::payment::{PaymentProvider, PaymentRecord, PaymentStatus, PaymentVerifier, VerificationOutcome};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount_xof: i64,
    pub provider: PaymentProvider,
    pub payer_phone: Option<String>,
}

/// Final status pushed by the payment provider.
#[derive(Debug, Deserialize)]
pub struct PaymentWebhook {
    pub payment_id: Uuid,
    pub status: PaymentStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/ads/{id}/payments", post(create_payment))
        .route("/api/payments/webhook", post(handle_payment_webhook))
        .route("/api/payments/{id}", get(get_payment))
        .route("/api/payments/{id}/verify", get(verify_payment))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/ads/:id/payments
/// Campaign payments settle against the live inventory only.
pub async fn create_payment(
    State(state): State<AppState>,
    Path(ad_id): Path<String>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentRecord>), AppError> {
    if state.gateway.is_demo().await {
        return Err(AppError::ConflictError("Payments are unavailable in demo mode".to_string()));
    }

    state
        .gateway
        .get_ad(&ad_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("ad {}", ad_id)))?;

    let payment = PaymentRecord::new(&ad_id, req.amount_xof, req.provider, req.payer_phone)?;
    state.payments.create_payment(&payment).await.map_err(AppError::internal)?;

    tracing::info!(
        "Payment {} created for ad {} ({} XOF via {}, payer {:?})",
        payment.id, ad_id, payment.amount_xof, payment.provider.as_str(), payment.payer_phone
    );
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /api/payments/:id
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentRecord>, AppError> {
    let payment = state
        .payments
        .get_payment(payment_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFoundError(format!("payment {}", payment_id)))?;
    Ok(Json(payment))
}

/// POST /api/payments/webhook
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<PaymentWebhook>,
) -> Result<StatusCode, AppError> {
    tracing::info!("Received payment webhook: {} -> {}", payload.payment_id, payload.status.as_str());

    if !payload.status.is_terminal() {
        return Err(AppError::ValidationError("Webhook must carry a final payment status".to_string()));
    }

    let settled = state
        .payments
        .settle_payment(payload.payment_id, payload.status)
        .await
        .map_err(AppError::internal)?;
    if settled {
        return Ok(StatusCode::OK);
    }

    // Nothing moved: unknown id, a redelivery, or a conflicting late status.
    let current = state
        .payments
        .get_payment(payload.payment_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFoundError(format!("payment {}", payload.payment_id)))?;

    if current.status == payload.status {
        tracing::debug!("Duplicate webhook for payment {}", payload.payment_id);
        return Ok(StatusCode::OK);
    }
    tracing::warn!(
        "Ignoring {} for payment {} already settled as {}",
        payload.status.as_str(), payload.payment_id, current.status.as_str()
    );
    Err(AppError::ConflictError(format!(
        "payment {} is already {}",
        payload.payment_id,
        current.status.as_str()
    )))
}

/// GET /api/payments/:id/verify
/// Holds the request while polling; answers `still_pending` once the attempt cap is hit.
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<VerificationOutcome>, AppError> {
    let verifier = PaymentVerifier::new(state.payments.clone(), state.payment_policy);
    Ok(Json(verifier.verify(payment_id).await?))
}
