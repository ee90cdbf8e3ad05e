//! Membership lifecycle: subscribe (upsert-style reactivation), cancel,
//! extend, verify, plus plan reads.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::domain::membership::{BillingCycle, MembershipStatus};
use crate::error::ApiError;
use crate::models::{Membership, MembershipPlan};
use crate::AppState;

pub async fn list_plans(State(s): State<AppState>) -> Result<Json<Vec<MembershipPlan>>, ApiError> {
    let plans = sqlx::query_as::<_, MembershipPlan>(
        "SELECT plan_id, plan_name, plan_type, plan_description, monthly_price, annual_price, \
                discount_percentage, free_delivery, cashback_percentage \
         FROM membership_plans \
         WHERE is_active = TRUE \
         ORDER BY monthly_price",
    )
    .fetch_all(&s.db)
    .await?;
    Ok(Json(plans))
}

#[derive(Serialize, FromRow)]
pub struct MembershipDetail {
    pub membership_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount_paid: Decimal,
    pub membership_status: String,
    pub plan_name: String,
    pub plan_type: String,
    pub discount_percentage: Decimal,
    pub free_delivery: bool,
    pub cashback_percentage: Decimal,
}

#[derive(Serialize)]
pub struct UserMembershipResponse {
    pub membership: Option<MembershipDetail>,
}

pub async fn get_user_membership(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserMembershipResponse>, ApiError> {
    let membership = sqlx::query_as::<_, MembershipDetail>(
        "SELECT um.membership_id, um.plan_id, um.start_date, um.end_date, um.amount_paid, \
                um.membership_status, mp.plan_name, mp.plan_type, mp.discount_percentage, \
                mp.free_delivery, mp.cashback_percentage \
         FROM user_membership um \
         JOIN membership_plans mp ON mp.plan_id = um.plan_id \
         WHERE um.user_id = $1 AND um.membership_status = 'Active' \
         ORDER BY um.start_date DESC \
         LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(&s.db)
    .await?;
    Ok(Json(UserMembershipResponse { membership }))
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub billing_cycle: BillingCycle,
}

#[derive(Serialize)]
pub struct SubscribeResponse {
    pub membership_id: Uuid,
    pub message: String,
    pub amount: Decimal,
}

pub async fn subscribe(
    State(s): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscribeResponse>), ApiError> {
    let plan = sqlx::query_as::<_, MembershipPlan>(
        "SELECT plan_id, plan_name, plan_type, plan_description, monthly_price, annual_price, \
                discount_percentage, free_delivery, cashback_percentage \
         FROM membership_plans WHERE plan_id = $1 AND is_active = TRUE",
    )
    .bind(req.plan_id)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("membership plan"))?;

    let amount = req.billing_cycle.amount(plan.monthly_price, plan.annual_price);
    let start = Utc::now().date_naive();
    let end = start + Duration::days(req.billing_cycle.duration_days());

    let mut tx = s.db.begin().await?;
    let existing = sqlx::query_as::<_, Membership>(
        "SELECT membership_id, user_id, plan_id, start_date, end_date, amount_paid, \
                membership_status, payment_method \
         FROM user_membership WHERE user_id = $1 FOR UPDATE",
    )
    .bind(req.user_id)
    .fetch_optional(&mut *tx)
    .await?;

    // A user has at most one membership row: re-subscribing overwrites it
    // whatever its prior status (reactivation or upgrade), resetting dates.
    let (status_code, membership_id, message) = match existing {
        Some(m) => {
            sqlx::query(
                "UPDATE user_membership SET plan_id = $1, amount_paid = $2, start_date = $3, \
                        end_date = $4, membership_status = 'Active', payment_method = 'Online', \
                        updated_at = NOW() \
                 WHERE membership_id = $5",
            )
            .bind(req.plan_id)
            .bind(amount)
            .bind(start)
            .bind(end)
            .bind(m.membership_id)
            .execute(&mut *tx)
            .await?;
            let message = if m.membership_status == MembershipStatus::Active.as_str() {
                "membership upgraded"
            } else {
                "membership reactivated"
            };
            (StatusCode::OK, m.membership_id, message)
        }
        None => {
            let membership_id = Uuid::now_v7();
            sqlx::query(
                "INSERT INTO user_membership (membership_id, user_id, plan_id, start_date, \
                        end_date, amount_paid, membership_status, payment_method) \
                 VALUES ($1, $2, $3, $4, $5, $6, 'Active', 'Online')",
            )
            .bind(membership_id)
            .bind(req.user_id)
            .bind(req.plan_id)
            .bind(start)
            .bind(end)
            .bind(amount)
            .execute(&mut *tx)
            .await?;
            (StatusCode::CREATED, membership_id, "membership activated")
        }
    };
    tx.commit().await?;

    Ok((
        status_code,
        Json(SubscribeResponse { membership_id, message: message.into(), amount }),
    ))
}

/// No-op unless the membership is currently Active.
pub async fn cancel(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query(
        "UPDATE user_membership SET membership_status = 'Cancelled', updated_at = NOW() \
         WHERE user_id = $1 AND membership_status = 'Active'",
    )
    .bind(user_id)
    .execute(&s.db)
    .await?;
    Ok(Json(serde_json::json!({ "message": "membership cancelled" })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExtendRequest {
    // Bounded so the i32 bind below can never truncate.
    #[validate(range(min = 1, max = 3650, message = "days must be between 1 and 3650"))]
    pub days: i64,
}

pub async fn extend(
    State(s): State<AppState>,
    Path(membership_id): Path<Uuid>,
    Json(req): Json<ExtendRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()?;
    let result = sqlx::query(
        "UPDATE user_membership SET end_date = end_date + $1, updated_at = NOW() \
         WHERE membership_id = $2",
    )
    .bind(req.days as i32)
    .bind(membership_id)
    .execute(&s.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("membership"));
    }
    Ok(Json(serde_json::json!({
        "message": format!("membership extended by {} days", req.days)
    })))
}

/// Unconditionally reactivates: used for manual verification and for
/// reinstating Suspended or Expired memberships.
pub async fn verify(
    State(s): State<AppState>,
    Path(membership_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query(
        "UPDATE user_membership SET membership_status = 'Active', updated_at = NOW() \
         WHERE membership_id = $1",
    )
    .bind(membership_id)
    .execute(&s.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("membership"));
    }
    Ok(Json(serde_json::json!({ "message": "membership verified and activated" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_days_must_fit_the_date_arithmetic() {
        assert!(ExtendRequest { days: 30 }.validate().is_ok());
        assert!(ExtendRequest { days: 3650 }.validate().is_ok());
        assert!(ExtendRequest { days: 0 }.validate().is_err());
        // Values past the cap are rejected before the i32 cast, so the bound
        // day count always stays positive.
        assert!(ExtendRequest { days: 2_147_483_648 }.validate().is_err());
        assert!(ExtendRequest { days: i64::MAX }.validate().is_err());
    }
}

