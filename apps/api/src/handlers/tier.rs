//! Loyalty tiers and per-user discounts.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use stockroom_core::Tier;
use tracing::info;

use super::ApiJson;
use crate::auth::AdminClaims;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTierRequest {
    pub name: String,
    pub min_spend_cents: i64,
    pub discount_percent: i64,
}

#[derive(Debug, Serialize)]
pub struct DiscountResponse {
    pub user_id: String,
    pub discount_percent: u32,
}

/// GET /discount/{id}
pub async fn discount_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ApiJson<DiscountResponse>> {
    let discount_percent = state.tiers().discount_for_user(&user_id).await?;
    Ok(ApiJson(DiscountResponse {
        user_id,
        discount_percent,
    }))
}

/// POST /tierlist (admin)
///
/// 409 when a tier already uses the threshold.
pub async fn create_tier(
    State(state): State<AppState>,
    AdminClaims(admin): AdminClaims,
    ApiJson(req): ApiJson<CreateTierRequest>,
) -> ApiResult<(StatusCode, ApiJson<Tier>)> {
    let tier = state
        .tiers()
        .create_tier(&req.name, req.min_spend_cents, req.discount_percent)
        .await?;

    info!(admin = %admin.sub, tier_id = %tier.id, "Tier added by admin");
    Ok((StatusCode::CREATED, ApiJson(tier)))
}

/// GET /tierlist
pub async fn list_tiers(State(state): State<AppState>) -> ApiJson<Vec<Tier>> {
    ApiJson(state.tiers().list().await)
}
