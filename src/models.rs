//! Database row types (sqlx `FromRow`).
//!
//! Status columns are stored as text and parsed into the `domain` enums at
//! the point of use; rows carry them verbatim.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub product_name: String,
    pub brand: Option<String>,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub status: String,
}

/// Cart line joined with live product data for the read view.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItemView {
    pub cart_item_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price_at_addition: Decimal,
    pub product_name: String,
    pub brand: Option<String>,
    pub current_price: Decimal,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Coupon {
    pub coupon_id: Uuid,
    pub coupon_code: String,
    pub coupon_name: String,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub min_order_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub usage_limit_per_user: Option<i32>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub order_id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub payment_mode: String,
    pub payment_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_fee: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub order_status: String,
    pub order_notes: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub item_status: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Delivery {
    pub delivery_id: Uuid,
    pub order_id: Uuid,
    pub tracking_number: Option<String>,
    pub courier_partner: Option<String>,
    pub shipping_method: String,
    pub delivery_status: String,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub out_for_delivery_date: Option<DateTime<Utc>>,
    pub actual_delivery_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub payment_id: Uuid,
    pub user_id: Uuid,
    pub transaction_id: String,
    pub payment_method: String,
    pub amount: Decimal,
    pub payment_status: String,
    pub payment_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Return {
    pub return_id: Uuid,
    pub order_id: Uuid,
    pub order_item_id: Uuid,
    pub user_id: Uuid,
    pub return_reason: String,
    pub return_description: Option<String>,
    pub return_status: String,
    pub refund_amount: Decimal,
    pub pickup_date: Option<NaiveDate>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MembershipPlan {
    pub plan_id: Uuid,
    pub plan_name: String,
    pub plan_type: String,
    pub plan_description: Option<String>,
    pub monthly_price: Decimal,
    pub annual_price: Decimal,
    pub discount_percentage: Decimal,
    pub free_delivery: bool,
    pub cashback_percentage: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Membership {
    pub membership_id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount_paid: Decimal,
    pub membership_status: String,
    pub payment_method: String,
}
