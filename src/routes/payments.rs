//! Payment gateway callback.
//!
//! Replaces the old synchronous always-success simulation: the gateway
//! confirms asynchronously and the payment row walks its own state machine.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::payment::PaymentStatus;
use crate::error::ApiError;
use crate::events::{self, Event};
use crate::models::Payment;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GatewayCallbackRequest {
    pub transaction_id: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct GatewayCallbackResponse {
    pub message: String,
    pub status: PaymentStatus,
}

pub async fn gateway_callback(
    State(s): State<AppState>,
    Json(req): Json<GatewayCallbackRequest>,
) -> Result<Json<GatewayCallbackResponse>, ApiError> {
    let new_status: PaymentStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::InvalidStatus(req.status.clone()))?;

    let mut tx = s.db.begin().await?;
    let payment = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE transaction_id = $1 FOR UPDATE",
    )
    .bind(&req.transaction_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound("payment"))?;

    let current: PaymentStatus = payment.payment_status.parse().map_err(|_| {
        ApiError::Internal(format!(
            "payment {} has corrupt status",
            payment.payment_id
        ))
    })?;
    if !current.can_transition(new_status) {
        return Err(ApiError::Conflict(format!(
            "cannot transition payment from {current} to {new_status}"
        )));
    }

    sqlx::query(
        "UPDATE payments SET payment_status = $1, payment_date = NOW() WHERE payment_id = $2",
    )
    .bind(new_status.as_str())
    .bind(payment.payment_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(transaction_id = %req.transaction_id, from = %current, to = %new_status, "payment updated");
    events::publish(
        &s.nats,
        "payments.updated",
        &Event::PaymentUpdated { transaction_id: req.transaction_id, status: new_status },
    )
    .await;

    Ok(Json(GatewayCallbackResponse { message: "payment updated".into(), status: new_status }))
}
