//! Coupon listing and validation endpoints.

use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::coupon::{self, CouponTerms, DiscountType};
use crate::error::ApiError;
use crate::models::Coupon;
use crate::AppState;

pub(crate) const COUPON_LOOKUP: &str =
    "SELECT coupon_id, coupon_code, coupon_name, discount_type, discount_value, \
            max_discount_amount, min_order_amount, usage_limit, usage_count, usage_limit_per_user \
     FROM coupons \
     WHERE coupon_code = $1 AND is_active = TRUE AND NOW() BETWEEN start_date AND end_date";

pub(crate) fn terms_from(coupon: &Coupon, user_redemptions: i64) -> Result<CouponTerms, ApiError> {
    let discount_type = DiscountType::parse(&coupon.discount_type).ok_or_else(|| {
        ApiError::Internal(format!(
            "coupon {} has unknown discount type {}",
            coupon.coupon_code, coupon.discount_type
        ))
    })?;
    Ok(CouponTerms {
        discount_type,
        discount_value: coupon.discount_value,
        max_discount_amount: coupon.max_discount_amount,
        min_order_amount: coupon.min_order_amount,
        usage_limit: coupon.usage_limit,
        usage_count: coupon.usage_count,
        usage_limit_per_user: coupon.usage_limit_per_user,
        user_redemptions,
    })
}

pub(crate) async fn user_redemptions(
    executor: impl sqlx::PgExecutor<'_>,
    coupon_id: Uuid,
    user_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM coupon_usage WHERE coupon_id = $1 AND user_id = $2")
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
}

pub async fn list_coupons(State(s): State<AppState>) -> Result<Json<Vec<Coupon>>, ApiError> {
    let coupons = sqlx::query_as::<_, Coupon>(
        "SELECT coupon_id, coupon_code, coupon_name, discount_type, discount_value, \
                max_discount_amount, min_order_amount, usage_limit, usage_count, usage_limit_per_user \
         FROM coupons \
         WHERE is_active = TRUE \
           AND NOW() BETWEEN start_date AND end_date \
           AND (usage_limit IS NULL OR usage_count < usage_limit) \
         ORDER BY discount_value DESC",
    )
    .fetch_all(&s.db)
    .await?;
    Ok(Json(coupons))
}

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub coupon_code: String,
    pub user_id: Uuid,
    pub subtotal: Decimal,
}

#[derive(Serialize)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    pub discount: Decimal,
    pub coupon_code: String,
    pub coupon_name: String,
}

pub async fn validate_coupon(
    State(s): State<AppState>,
    Json(req): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, ApiError> {
    let coupon = sqlx::query_as::<_, Coupon>(COUPON_LOOKUP)
        .bind(&req.coupon_code)
        .fetch_optional(&s.db)
        .await?
        .ok_or_else(|| ApiError::Validation("invalid coupon code".into()))?;

    let redemptions = user_redemptions(&s.db, coupon.coupon_id, req.user_id).await?;
    let terms = terms_from(&coupon, redemptions)?;
    let discount = coupon::evaluate(&terms, req.subtotal)
        .map_err(|r| ApiError::Validation(r.to_string()))?;

    Ok(Json(ValidateCouponResponse {
        valid: true,
        discount,
        coupon_code: coupon.coupon_code,
        coupon_name: coupon.coupon_name,
    }))
}
