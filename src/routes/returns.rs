//! Returns workflow: per-line-item return requests and admin status updates.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::domain::returns::{refund_amount, ReturnStatus};
use crate::error::ApiError;
use crate::events::{self, Event};
use crate::models::Return;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReturnRequest {
    pub order_item_id: Uuid,
    #[validate(length(min = 1, message = "return_reason is required"))]
    pub return_reason: String,
    pub return_description: Option<String>,
}

#[derive(Serialize)]
pub struct CreateReturnResponse {
    pub return_id: Uuid,
    pub refund_amount: Decimal,
}

#[derive(FromRow)]
struct ReturnSource {
    order_id: Uuid,
    user_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    item_status: String,
}

pub async fn create_return(
    State(s): State<AppState>,
    Json(req): Json<CreateReturnRequest>,
) -> Result<(StatusCode, Json<CreateReturnResponse>), ApiError> {
    req.validate()?;

    let mut tx = s.db.begin().await?;
    let source = sqlx::query_as::<_, ReturnSource>(
        "SELECT oi.order_id, o.user_id, oi.quantity, oi.unit_price, oi.item_status \
         FROM order_items oi \
         JOIN orders o ON o.order_id = oi.order_id \
         WHERE oi.order_item_id = $1",
    )
    .bind(req.order_item_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound("order item"))?;

    // Only fulfilled items can be sent back.
    if source.item_status != "Delivered" {
        return Err(ApiError::Validation("item has not been delivered".into()));
    }

    let refund = refund_amount(source.unit_price, source.quantity);
    let return_id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO returns (return_id, order_id, order_item_id, user_id, return_reason, \
                              return_description, return_status, refund_amount) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(return_id)
    .bind(source.order_id)
    .bind(req.order_item_id)
    .bind(source.user_id)
    .bind(&req.return_reason)
    .bind(req.return_description.as_deref())
    .bind(ReturnStatus::Requested.as_str())
    .bind(refund)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    events::publish(
        &s.nats,
        "returns.requested",
        &Event::ReturnRequested { return_id, order_item_id: req.order_item_id },
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(CreateReturnResponse { return_id, refund_amount: refund }),
    ))
}

pub async fn get_return(
    State(s): State<AppState>,
    Path(return_id): Path<Uuid>,
) -> Result<Json<Return>, ApiError> {
    sqlx::query_as::<_, Return>("SELECT * FROM returns WHERE return_id = $1")
        .bind(return_id)
        .fetch_optional(&s.db)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("return"))
}

pub async fn list_user_returns(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Return>>, ApiError> {
    let returns = sqlx::query_as::<_, Return>(
        "SELECT * FROM returns WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(returns))
}

#[derive(Debug, Deserialize)]
pub struct UpdateReturnStatusRequest {
    pub status: String,
    pub admin_notes: Option<String>,
    pub pickup_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct UpdateReturnStatusResponse {
    pub message: String,
    pub status: ReturnStatus,
}

/// Transitions are permissive by design; only the status string is checked.
pub async fn update_return_status(
    State(s): State<AppState>,
    Path(return_id): Path<Uuid>,
    Json(req): Json<UpdateReturnStatusRequest>,
) -> Result<Json<UpdateReturnStatusResponse>, ApiError> {
    let status: ReturnStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::InvalidStatus(req.status.clone()))?;

    let result = sqlx::query(
        "UPDATE returns SET return_status = $1, \
                admin_notes = COALESCE($2, admin_notes), \
                pickup_date = COALESCE($3, pickup_date), \
                updated_at = NOW() \
         WHERE return_id = $4",
    )
    .bind(status.as_str())
    .bind(req.admin_notes.as_deref())
    .bind(req.pickup_date)
    .bind(return_id)
    .execute(&s.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("return"));
    }

    Ok(Json(UpdateReturnStatusResponse { message: "return status updated".into(), status }))
}
