//! HTTP routing.

use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod admin;
pub mod cart;
pub mod coupons;
pub mod membership;
pub mod orders;
pub mod payments;
pub mod returns;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "shopveda" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/cart/:user_id", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/v1/cart/:user_id/items", post(cart::add_item))
        .route(
            "/api/v1/cart/:user_id/items/:item_id",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/api/v1/orders", post(orders::place_order))
        .route("/api/v1/orders/:id", get(orders::get_order))
        .route("/api/v1/orders/user/:user_id", get(orders::list_user_orders))
        .route("/api/v1/admin/orders", get(admin::list_orders))
        .route("/api/v1/admin/orders/:order_id/status", put(admin::update_order_status))
        .route("/api/v1/admin/orders/:order_id/delivery", put(admin::update_delivery))
        .route("/api/v1/admin/orders/:order_id/confirm", post(admin::confirm_order))
        .route("/api/v1/payments/callback", post(payments::gateway_callback))
        .route("/api/v1/returns", post(returns::create_return))
        .route("/api/v1/returns/:id", get(returns::get_return))
        .route("/api/v1/returns/user/:user_id", get(returns::list_user_returns))
        .route("/api/v1/returns/:id/status", put(returns::update_return_status))
        .route("/api/v1/membership/plans", get(membership::list_plans))
        .route("/api/v1/membership/user/:user_id", get(membership::get_user_membership))
        .route("/api/v1/membership/subscribe", post(membership::subscribe))
        .route("/api/v1/membership/cancel/:user_id", put(membership::cancel))
        .route("/api/v1/membership/:id/extend", put(membership::extend))
        .route("/api/v1/membership/:id/verify", post(membership::verify))
        .route("/api/v1/coupons", get(coupons::list_coupons))
        .route("/api/v1/coupons/validate", post(coupons::validate_coupon))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
