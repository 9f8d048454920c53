use axum::extract::{Path, State};
use serde::Deserialize;
use stockroom_core::{CoreError, User};

use super::ApiJson;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateTierRequest {
    pub user_id: String,
}

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<ApiJson<Vec<User>>> {
    Ok(ApiJson(state.db.users().list().await?))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiJson<User>> {
    let user = state
        .db
        .users()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::UserNotFound(id))?;
    Ok(ApiJson(user))
}

/// PUT /users/update
///
/// Re-derives the user's tier from their cumulative spend.
pub async fn update_user_tier(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateTierRequest>,
) -> ApiResult<ApiJson<User>> {
    Ok(ApiJson(state.tiers().recompute_user_tier(&req.user_id).await?))
}
