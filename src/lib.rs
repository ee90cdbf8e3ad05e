//! Shopveda: self-hosted marketplace order management service.
//!
//! The core is the order lifecycle: cart aggregation with price-locked
//! lines, coupon evaluation, an atomic placement transaction, a guarded
//! order status state machine with cascading delivery/payment/stock
//! effects, a returns workflow and membership entitlements. Everything
//! authoritative lives in Postgres; the service holds no in-memory state
//! across requests.

pub mod domain;
pub mod error;
pub mod events;
pub mod models;
pub mod routes;

pub use routes::router;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
}
