//! Order placement and order reads.
//!
//! Placement is a single transaction: stock re-validation (with product rows
//! locked), coupon evaluation, totals, order + items + stock decrement,
//! payment shell, delivery shell, cart clear and coupon redemption commit or
//! roll back together.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::coupon;
use crate::domain::order::OrderStatus;
use crate::domain::payment::{PaymentMode, PaymentStatus};
use crate::domain::pricing;
use crate::error::ApiError;
use crate::events::{self, Event};
use crate::models::{Delivery, Order, OrderItem};
use crate::routes::coupons::{terms_from, COUPON_LOOKUP};
use crate::AppState;

/// Days from placement to the estimated delivery date.
const DELIVERY_LEAD_DAYS: i64 = 5;

/// Product rows are locked in product_id order so concurrent placements over
/// overlapping carts acquire locks in the same sequence and cannot deadlock.
const PLACEMENT_LINES_SQL: &str =
    "SELECT ci.product_id, ci.quantity, ci.price_at_addition, \
            p.product_name, p.stock_quantity \
     FROM cart_items ci \
     JOIN products p ON p.product_id = ci.product_id \
     WHERE ci.cart_id = $1 \
     ORDER BY ci.product_id \
     FOR UPDATE OF p";

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: Uuid,
    pub shipping_address_id: Uuid,
    pub billing_address_id: Uuid,
    pub payment_mode: PaymentMode,
    pub coupon_code: Option<String>,
}

#[derive(Serialize)]
pub struct PlaceOrderResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub total_amount: Decimal,
}

#[derive(FromRow)]
struct PlacementLine {
    product_id: Uuid,
    quantity: i32,
    price_at_addition: Decimal,
    product_name: String,
    stock_quantity: i32,
}

pub async fn place_order(
    State(s): State<AppState>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), ApiError> {
    let mut tx = s.db.begin().await?;

    // 1. Load the cart; an absent cart is an empty cart.
    let cart_id = sqlx::query_scalar::<_, Uuid>("SELECT cart_id FROM cart WHERE user_id = $1")
        .bind(req.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::Validation("cart is empty".into()))?;

    // Product rows are locked for the rest of the transaction so two
    // concurrent placements cannot over-sell the same stock.
    let lines = sqlx::query_as::<_, PlacementLine>(PLACEMENT_LINES_SQL)
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;

    if lines.is_empty() {
        return Err(ApiError::Validation("cart is empty".into()));
    }

    // 2. Re-validate stock; it may have moved since add-to-cart.
    for line in &lines {
        if line.quantity > line.stock_quantity {
            return Err(ApiError::Conflict(format!(
                "insufficient stock for {}",
                line.product_name
            )));
        }
    }

    for address_id in [req.shipping_address_id, req.billing_address_id] {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM addresses WHERE address_id = $1 AND user_id = $2)",
        )
        .bind(address_id)
        .bind(req.user_id)
        .fetch_one(&mut *tx)
        .await?;
        if !owned {
            return Err(ApiError::NotFound("address"));
        }
    }

    let subtotal = lines.iter().fold(Decimal::ZERO, |acc, l| {
        acc + l.price_at_addition * Decimal::from(l.quantity)
    });

    // 3. Coupon evaluation; the coupon row is locked so the usage counter
    //    cannot race past its limit.
    let mut discount = Decimal::ZERO;
    let mut applied_coupon: Option<Uuid> = None;
    if let Some(code) = req.coupon_code.as_deref().filter(|c| !c.is_empty()) {
        let lookup = format!("{COUPON_LOOKUP} FOR UPDATE");
        let coupon_row = sqlx::query_as::<_, crate::models::Coupon>(&lookup)
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::Validation("invalid coupon code".into()))?;
        let redemptions =
            crate::routes::coupons::user_redemptions(&mut *tx, coupon_row.coupon_id, req.user_id)
                .await?;
        let terms = terms_from(&coupon_row, redemptions)?;
        discount = coupon::evaluate(&terms, subtotal)
            .map_err(|r| ApiError::Validation(r.to_string()))?;
        applied_coupon = Some(coupon_row.coupon_id);
    }

    // 4. Totals; an Active membership with free delivery waives the fee.
    let free_delivery = sqlx::query_scalar::<_, bool>(
        "SELECT mp.free_delivery \
         FROM user_membership um \
         JOIN membership_plans mp ON mp.plan_id = um.plan_id \
         WHERE um.user_id = $1 AND um.membership_status = 'Active' \
           AND um.end_date >= CURRENT_DATE",
    )
    .bind(req.user_id)
    .fetch_optional(&mut *tx)
    .await?
    .unwrap_or(false);
    let totals = pricing::order_totals(subtotal, discount, free_delivery);

    // 5. Order, items, stock decrements.
    let order_id = Uuid::now_v7();
    let order_number = format!("ORD-{:08}", rand::random::<u32>() % 100_000_000);
    sqlx::query(
        "INSERT INTO orders (order_id, order_number, user_id, shipping_address_id, \
                             billing_address_id, payment_mode, subtotal, discount_amount, \
                             shipping_fee, tax_amount, total_amount, order_status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(order_id)
    .bind(&order_number)
    .bind(req.user_id)
    .bind(req.shipping_address_id)
    .bind(req.billing_address_id)
    .bind(req.payment_mode.as_str())
    .bind(totals.subtotal)
    .bind(totals.discount)
    .bind(totals.shipping)
    .bind(totals.tax)
    .bind(totals.total)
    .bind(OrderStatus::Pending.as_str())
    .execute(&mut *tx)
    .await?;

    for line in &lines {
        sqlx::query(
            "INSERT INTO order_items (order_item_id, order_id, product_id, product_name, \
                                      quantity, unit_price, item_status) \
             VALUES ($1, $2, $3, $4, $5, $6, 'Pending')",
        )
        .bind(Uuid::now_v7())
        .bind(order_id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(line.price_at_addition)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity - $1, updated_at = NOW() \
             WHERE product_id = $2",
        )
        .bind(line.quantity)
        .bind(line.product_id)
        .execute(&mut *tx)
        .await?;
    }

    // 6. Prepaid orders get an Initiated payment; the gateway callback
    //    captures or fails it later.
    if req.payment_mode == PaymentMode::Prepaid {
        let payment_id = Uuid::now_v7();
        let transaction_id = format!(
            "TXN{}{}",
            Utc::now().timestamp_millis(),
            order_number.trim_start_matches("ORD-")
        );
        sqlx::query(
            "INSERT INTO payments (payment_id, user_id, transaction_id, payment_method, \
                                   amount, payment_status) \
             VALUES ($1, $2, $3, 'UPI', $4, $5)",
        )
        .bind(payment_id)
        .bind(req.user_id)
        .bind(&transaction_id)
        .bind(totals.total)
        .bind(PaymentStatus::Initiated.as_str())
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE orders SET payment_id = $1 WHERE order_id = $2")
            .bind(payment_id)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
    }

    // 7. Delivery shell.
    let estimated: NaiveDate = Utc::now().date_naive() + Duration::days(DELIVERY_LEAD_DAYS);
    sqlx::query(
        "INSERT INTO delivery (delivery_id, order_id, delivery_status, estimated_delivery_date) \
         VALUES ($1, $2, 'Pending', $3)",
    )
    .bind(Uuid::now_v7())
    .bind(order_id)
    .bind(estimated)
    .execute(&mut *tx)
    .await?;

    // 8. Clear the cart.
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;

    // 9. Redeem the coupon.
    if let Some(coupon_id) = applied_coupon {
        sqlx::query("UPDATE coupons SET usage_count = usage_count + 1 WHERE coupon_id = $1")
            .bind(coupon_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO coupon_usage (coupon_usage_id, coupon_id, user_id, order_id) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::now_v7())
        .bind(coupon_id)
        .bind(req.user_id)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(%order_id, %order_number, total = %totals.total, "order placed");
    events::publish(
        &s.nats,
        "orders.placed",
        &Event::OrderPlaced {
            order_id,
            order_number: order_number.clone(),
            user_id: req.user_id,
            total_amount: totals.total,
        },
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse { order_id, order_number, total_amount: totals.total }),
    ))
}

#[derive(Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub delivery: Option<Delivery>,
}

pub async fn get_order(
    State(s): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("order"))?;

    let items =
        sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&s.db)
            .await?;

    let delivery = sqlx::query_as::<_, Delivery>("SELECT * FROM delivery WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(&s.db)
        .await?;

    Ok(Json(OrderDetailResponse { order, items, delivery }))
}

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
}

#[derive(Serialize, FromRow)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub order_number: String,
    pub total_amount: Decimal,
    pub order_status: String,
    pub payment_mode: String,
    pub created_at: chrono::DateTime<Utc>,
    pub delivery_status: Option<String>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub tracking_number: Option<String>,
    pub item_count: i64,
}

pub async fn list_user_orders(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    let status = match params.status {
        Some(raw) => Some(
            raw.parse::<OrderStatus>()
                .map_err(|_| ApiError::InvalidStatus(raw))?,
        ),
        None => None,
    };
    let orders = sqlx::query_as::<_, OrderSummary>(
        "SELECT o.order_id, o.order_number, o.total_amount, o.order_status, o.payment_mode, \
                o.created_at, d.delivery_status, d.estimated_delivery_date, d.tracking_number, \
                (SELECT COUNT(*) FROM order_items oi WHERE oi.order_id = o.order_id) AS item_count \
         FROM orders o \
         LEFT JOIN delivery d ON d.order_id = o.order_id \
         WHERE o.user_id = $1 AND ($2::text IS NULL OR o.order_status = $2) \
         ORDER BY o.created_at DESC",
    )
    .bind(user_id)
    .bind(status.map(|st| st.as_str()))
    .fetch_all(&s.db)
    .await?;
    Ok(Json(orders))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_locks_products_in_deterministic_order() {
        // Without a stable ordering, two placements over overlapping carts
        // can take product row locks in opposite sequences and deadlock.
        let order_by = PLACEMENT_LINES_SQL
            .find("ORDER BY ci.product_id")
            .expect("locking query must order by product_id");
        let for_update = PLACEMENT_LINES_SQL
            .find("FOR UPDATE OF p")
            .expect("locking query must lock product rows");
        assert!(order_by < for_update);
    }
}
