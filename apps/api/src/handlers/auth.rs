//! Registration and login.

use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use stockroom_core::validation::{validate_email, validate_name, validate_password};
use stockroom_core::{Money, User, UserRole};
use stockroom_db::NewUser;
use tracing::{info, warn};

use super::ApiJson;
use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

/// POST /register
///
/// Creates a customer on the entry tier. 409 when the email is taken.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, ApiJson<User>)> {
    validate_name("name", &req.name)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let entry_tier = state.tiers().resolve(Money::zero()).await;
    let user = state
        .db
        .users()
        .create(&NewUser {
            name: req.name,
            email: req.email,
            password_hash: hash_password(&req.password)?,
            role: UserRole::Customer,
            tier_id: entry_tier.id,
        })
        .await?;

    info!(id = %user.id, "User registered");
    Ok((StatusCode::CREATED, ApiJson(user)))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<ApiJson<LoginResponse>> {
    let credentials = state.db.users().credentials_by_email(&req.email).await?;

    let user = match credentials {
        Some(c) if verify_password(&req.password, &c.password_hash) => c.user,
        _ => {
            warn!("Failed login attempt");
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    let token = state.jwt.issue(&user)?;
    info!(id = %user.id, role = user.role.as_str(), "User logged in");

    Ok(ApiJson(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.access_lifetime_secs(),
        user,
    }))
}
