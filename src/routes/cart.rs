//! Cart endpoints: per-user persisted cart with price-locked lines.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::cart::{subtotal, CartLine};
use crate::error::ApiError;
use crate::models::{CartItemView, Product};
use crate::AppState;

/// One active cart per user, created lazily on first access.
pub(crate) async fn get_or_create_cart(
    db: &sqlx::PgPool,
    user_id: Uuid,
) -> Result<Uuid, sqlx::Error> {
    if let Some(id) = sqlx::query_scalar::<_, Uuid>("SELECT cart_id FROM cart WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?
    {
        return Ok(id);
    }
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO cart (cart_id, user_id) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
         RETURNING cart_id",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .fetch_one(db)
    .await
}

#[derive(Serialize)]
pub struct CartItemResponse {
    #[serde(flatten)]
    pub item: CartItemView,
    pub in_stock: bool,
    pub total: Decimal,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub cart_id: Uuid,
    pub items: Vec<CartItemResponse>,
    pub subtotal: Decimal,
    pub item_count: usize,
}

pub async fn get_cart(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart_id = get_or_create_cart(&s.db, user_id).await?;
    let items = sqlx::query_as::<_, CartItemView>(
        "SELECT ci.cart_item_id, ci.product_id, ci.quantity, ci.price_at_addition, \
                p.product_name, p.brand, p.selling_price AS current_price, p.stock_quantity \
         FROM cart_items ci \
         JOIN products p ON p.product_id = ci.product_id \
         WHERE ci.cart_id = $1 \
         ORDER BY ci.created_at",
    )
    .bind(cart_id)
    .fetch_all(&s.db)
    .await?;

    let lines: Vec<CartLine> = items
        .iter()
        .map(|i| CartLine { quantity: i.quantity, price_at_addition: i.price_at_addition })
        .collect();
    let subtotal = subtotal(&lines);
    let item_count = items.len();
    let items = items
        .into_iter()
        .map(|item| {
            let total = item.price_at_addition * Decimal::from(item.quantity);
            // Availability is computed at read time, never cached.
            let in_stock = item.stock_quantity > 0;
            CartItemResponse { item, in_stock, total }
        })
        .collect();

    Ok(Json(CartResponse { cart_id, items, subtotal, item_count }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Serialize)]
pub struct AddItemResponse {
    pub cart_item_id: Uuid,
}

pub async fn add_item(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<AddItemResponse>), ApiError> {
    req.validate()?;
    let cart_id = get_or_create_cart(&s.db, user_id).await?;

    let product = sqlx::query_as::<_, Product>(
        "SELECT product_id, product_name, brand, selling_price, stock_quantity, status \
         FROM products WHERE product_id = $1",
    )
    .bind(req.product_id)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("product"))?;

    if product.stock_quantity < req.quantity {
        return Err(ApiError::Conflict(format!(
            "insufficient stock for {}",
            product.product_name
        )));
    }

    // Adding an existing product merges quantities and re-stamps the locked
    // price to the current selling price.
    let cart_item_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO cart_items (cart_item_id, cart_id, product_id, quantity, price_at_addition) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (cart_id, product_id) DO UPDATE SET \
             quantity = cart_items.quantity + EXCLUDED.quantity, \
             price_at_addition = EXCLUDED.price_at_addition \
         RETURNING cart_item_id",
    )
    .bind(Uuid::now_v7())
    .bind(cart_id)
    .bind(req.product_id)
    .bind(req.quantity)
    .bind(product.selling_price)
    .fetch_one(&s.db)
    .await?;

    Ok((StatusCode::CREATED, Json(AddItemResponse { cart_item_id })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(range(min = 1, message = "quantity must be greater than 0"))]
    pub quantity: i32,
}

pub async fn update_item(
    State(s): State<AppState>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<StatusCode, ApiError> {
    req.validate()?;

    let row = sqlx::query_as::<_, (i32, String)>(
        "SELECT p.stock_quantity, p.product_name \
         FROM cart_items ci \
         JOIN cart c ON c.cart_id = ci.cart_id \
         JOIN products p ON p.product_id = ci.product_id \
         WHERE ci.cart_item_id = $1 AND c.user_id = $2",
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("cart item"))?;

    if row.0 < req.quantity {
        return Err(ApiError::Conflict(format!("insufficient stock for {}", row.1)));
    }

    sqlx::query("UPDATE cart_items SET quantity = $1 WHERE cart_item_id = $2")
        .bind(req.quantity)
        .bind(item_id)
        .execute(&s.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_item(
    State(s): State<AppState>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    sqlx::query(
        "DELETE FROM cart_items USING cart \
         WHERE cart_items.cart_id = cart.cart_id \
           AND cart_items.cart_item_id = $1 AND cart.user_id = $2",
    )
    .bind(item_id)
    .bind(user_id)
    .execute(&s.db)
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Idempotent: clearing an already-empty cart succeeds.
pub async fn clear_cart(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let cart_id = get_or_create_cart(&s.db, user_id).await?;
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&s.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
