//! Admin endpoints: order status transitions, delivery tracking, and the
//! combined confirm flow.
//!
//! Status cascades run inside one transaction: the order row, its line items,
//! the delivery record and (where applicable) payment, stock and loyalty all
//! move together or not at all.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::order::{DeliveryStatus, OrderStatus};
use crate::domain::payment::{PaymentMode, PaymentStatus};
use crate::error::ApiError;
use crate::events::{self, Event};
use crate::models::Order;
use crate::AppState;

const DEFAULT_COURIER: &str = "BlueDart";
const DELIVERY_LEAD_DAYS: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize, FromRow)]
pub struct AdminOrderSummary {
    pub order_id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub order_status: String,
    pub payment_mode: String,
    pub created_at: chrono::DateTime<Utc>,
    pub delivery_status: Option<String>,
    pub tracking_number: Option<String>,
    pub item_count: i64,
}

pub async fn list_orders(
    State(s): State<AppState>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<AdminOrderSummary>>, ApiError> {
    let status = match params.status {
        Some(raw) => Some(
            raw.parse::<OrderStatus>()
                .map_err(|_| ApiError::InvalidStatus(raw))?,
        ),
        None => None,
    };
    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    let orders = sqlx::query_as::<_, AdminOrderSummary>(
        "SELECT o.order_id, o.order_number, o.user_id, o.total_amount, o.order_status, \
                o.payment_mode, o.created_at, d.delivery_status, d.tracking_number, \
                (SELECT COUNT(*) FROM order_items oi WHERE oi.order_id = o.order_id) AS item_count \
         FROM orders o \
         LEFT JOIN delivery d ON d.order_id = o.order_id \
         WHERE ($1::text IS NULL OR o.order_status = $1) \
         ORDER BY o.created_at DESC \
         LIMIT $2",
    )
    .bind(status.map(|st| st.as_str()))
    .bind(limit)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct UpdateStatusResponse {
    pub message: String,
    pub status: OrderStatus,
}

pub async fn update_order_status(
    State(s): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, ApiError> {
    // Rejected before any mutation.
    let new_status: OrderStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::InvalidStatus(req.status.clone()))?;

    let mut tx = s.db.begin().await?;
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("order"))?;
    let current: OrderStatus = order
        .order_status
        .parse()
        .map_err(|_| ApiError::Internal(format!("order {order_id} has corrupt status")))?;

    if !current.can_transition(new_status) {
        return Err(ApiError::InvalidTransition { from: current, to: new_status });
    }

    let update = match new_status {
        OrderStatus::Confirmed => {
            "UPDATE orders SET order_status = $1, confirmed_at = NOW(), \
             order_notes = COALESCE($2, order_notes), updated_at = NOW() WHERE order_id = $3"
        }
        OrderStatus::Shipped => {
            "UPDATE orders SET order_status = $1, shipped_at = NOW(), \
             order_notes = COALESCE($2, order_notes), updated_at = NOW() WHERE order_id = $3"
        }
        OrderStatus::Delivered => {
            "UPDATE orders SET order_status = $1, delivered_at = NOW(), \
             order_notes = COALESCE($2, order_notes), updated_at = NOW() WHERE order_id = $3"
        }
        OrderStatus::Cancelled => {
            "UPDATE orders SET order_status = $1, cancelled_at = NOW(), \
             order_notes = COALESCE($2, order_notes), updated_at = NOW() WHERE order_id = $3"
        }
        _ => {
            "UPDATE orders SET order_status = $1, \
             order_notes = COALESCE($2, order_notes), updated_at = NOW() WHERE order_id = $3"
        }
    };
    sqlx::query(update)
        .bind(new_status.as_str())
        .bind(req.notes.as_deref())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE order_items SET item_status = $1 WHERE order_id = $2")
        .bind(new_status.item_status())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    match new_status {
        OrderStatus::Confirmed => {
            ensure_payment_captured(&mut tx, &order).await?;
        }
        OrderStatus::Shipped => {
            sqlx::query(
                "UPDATE delivery SET delivery_status = 'InTransit', shipped_date = NOW(), \
                 updated_at = NOW() WHERE order_id = $1",
            )
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        }
        OrderStatus::Delivered => {
            sqlx::query(
                "UPDATE delivery SET delivery_status = 'Delivered', \
                 actual_delivery_date = CURRENT_DATE, updated_at = NOW() WHERE order_id = $1",
            )
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
            // Loyalty accrues one point per 100 of order value on completion.
            let points = (order.total_amount / Decimal::from(100))
                .floor()
                .to_i32()
                .unwrap_or(0);
            if points > 0 {
                sqlx::query(
                    "UPDATE users SET loyalty_points = loyalty_points + $1, updated_at = NOW() \
                     WHERE user_id = $2",
                )
                .bind(points)
                .bind(order.user_id)
                .execute(&mut *tx)
                .await?;
            }
        }
        OrderStatus::Cancelled => {
            if current.restores_stock_on_cancel() {
                sqlx::query(
                    "UPDATE products p SET stock_quantity = p.stock_quantity + oi.quantity, \
                            updated_at = NOW() \
                     FROM order_items oi \
                     WHERE oi.order_id = $1 AND oi.product_id = p.product_id",
                )
                .bind(order_id)
                .execute(&mut *tx)
                .await?;
            }
        }
        _ => {}
    }

    tx.commit().await?;

    tracing::info!(%order_id, from = %current, to = %new_status, "order status updated");
    events::publish(
        &s.nats,
        "orders.status",
        &Event::OrderStatusChanged { order_id, from: current, to: new_status },
    )
    .await;

    Ok(Json(UpdateStatusResponse {
        message: "order status updated".into(),
        status: new_status,
    }))
}

/// Prepaid orders confirmed without a payment record get one lazily.
async fn ensure_payment_captured(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &Order,
) -> Result<(), ApiError> {
    if order.payment_mode != PaymentMode::Prepaid.as_str() || order.payment_id.is_some() {
        return Ok(());
    }
    let payment_id = Uuid::now_v7();
    let transaction_id = format!(
        "TXN{}{}",
        Utc::now().timestamp_millis(),
        order.order_number.trim_start_matches("ORD-")
    );
    sqlx::query(
        "INSERT INTO payments (payment_id, user_id, transaction_id, payment_method, \
                               amount, payment_status) \
         VALUES ($1, $2, $3, 'UPI', $4, $5)",
    )
    .bind(payment_id)
    .bind(order.user_id)
    .bind(&transaction_id)
    .bind(order.total_amount)
    .bind(PaymentStatus::Captured.as_str())
    .execute(&mut **tx)
    .await?;
    sqlx::query("UPDATE orders SET payment_id = $1 WHERE order_id = $2")
        .bind(payment_id)
        .bind(order.order_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeliveryRequest {
    pub tracking_number: Option<String>,
    pub courier_partner: Option<String>,
    pub delivery_status: Option<String>,
    pub estimated_delivery_date: Option<NaiveDate>,
}

pub async fn update_delivery(
    State(s): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateDeliveryRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = match req.delivery_status {
        Some(raw) => Some(
            raw.parse::<DeliveryStatus>()
                .map_err(|_| ApiError::InvalidStatus(raw))?,
        ),
        None => None,
    };

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM orders WHERE order_id = $1)",
    )
    .bind(order_id)
    .fetch_one(&s.db)
    .await?;
    if !exists {
        return Err(ApiError::NotFound("order"));
    }

    // Partial upsert: absent fields keep their stored values; status changes
    // stamp the matching dates.
    sqlx::query(
        "INSERT INTO delivery (delivery_id, order_id, tracking_number, courier_partner, \
                               delivery_status, estimated_delivery_date) \
         VALUES ($1, $2, $3, $4, COALESCE($5::text, 'Pending'), $6) \
         ON CONFLICT (order_id) DO UPDATE SET \
             tracking_number = COALESCE(EXCLUDED.tracking_number, delivery.tracking_number), \
             courier_partner = COALESCE(EXCLUDED.courier_partner, delivery.courier_partner), \
             delivery_status = COALESCE($5::text, delivery.delivery_status), \
             estimated_delivery_date = COALESCE(EXCLUDED.estimated_delivery_date, \
                                                delivery.estimated_delivery_date), \
             out_for_delivery_date = CASE WHEN $5::text = 'OutForDelivery' THEN NOW() \
                                          ELSE delivery.out_for_delivery_date END, \
             actual_delivery_date = CASE WHEN $5::text = 'Delivered' THEN CURRENT_DATE \
                                         ELSE delivery.actual_delivery_date END, \
             updated_at = NOW()",
    )
    .bind(Uuid::now_v7())
    .bind(order_id)
    .bind(req.tracking_number.as_deref())
    .bind(req.courier_partner.as_deref())
    .bind(status.map(|st| st.as_str()))
    .bind(req.estimated_delivery_date)
    .execute(&s.db)
    .await?;

    Ok(Json(serde_json::json!({ "message": "delivery information updated" })))
}

#[derive(Serialize)]
pub struct ConfirmOrderResponse {
    pub message: String,
    pub tracking_number: String,
    pub estimated_delivery: NaiveDate,
}

/// Combined confirm: payment fallback, Confirmed transition and a delivery
/// record with tracking, in one transaction.
pub async fn confirm_order(
    State(s): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ConfirmOrderResponse>, ApiError> {
    let mut tx = s.db.begin().await?;
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("order"))?;
    let current: OrderStatus = order
        .order_status
        .parse()
        .map_err(|_| ApiError::Internal(format!("order {order_id} has corrupt status")))?;
    if !current.can_transition(OrderStatus::Confirmed) {
        return Err(ApiError::InvalidTransition { from: current, to: OrderStatus::Confirmed });
    }

    ensure_payment_captured(&mut tx, &order).await?;

    sqlx::query(
        "UPDATE orders SET order_status = 'Confirmed', confirmed_at = NOW(), updated_at = NOW() \
         WHERE order_id = $1",
    )
    .bind(order_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("UPDATE order_items SET item_status = 'Confirmed' WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    let tracking_number = format!(
        "TRK{}{}",
        Utc::now().timestamp_millis(),
        order.order_number.trim_start_matches("ORD-")
    );
    let estimated = Utc::now().date_naive() + Duration::days(DELIVERY_LEAD_DAYS);
    sqlx::query(
        "INSERT INTO delivery (delivery_id, order_id, tracking_number, courier_partner, \
                               shipping_method, delivery_status, estimated_delivery_date) \
         VALUES ($1, $2, $3, $4, 'Standard', 'Pending', $5) \
         ON CONFLICT (order_id) DO UPDATE SET \
             tracking_number = EXCLUDED.tracking_number, \
             courier_partner = EXCLUDED.courier_partner, \
             updated_at = NOW()",
    )
    .bind(Uuid::now_v7())
    .bind(order_id)
    .bind(&tracking_number)
    .bind(DEFAULT_COURIER)
    .bind(estimated)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    events::publish(
        &s.nats,
        "orders.status",
        &Event::OrderStatusChanged { order_id, from: current, to: OrderStatus::Confirmed },
    )
    .await;

    Ok(Json(ConfirmOrderResponse {
        message: "order confirmed".into(),
        tracking_number,
        estimated_delivery: estimated,
    }))
}
