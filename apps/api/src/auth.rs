//! Authentication module.
//!
//! Password hashing (argon2), JWT access tokens, and the extractors that
//! guard admin routes.
//!
//! ```text
//!   POST /login ──► verify_password ──► JwtManager::issue ──► { token }
//!
//!   Authorization: Bearer <token>
//!        │
//!        ▼
//!   AuthClaims   (any valid token)          401 otherwise
//!   AdminClaims  (valid token, role=admin)  403 for other roles
//! ```

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use stockroom_core::{User, UserRole};
use stockroom_db::{Database, NewUser};
use tracing::info;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, access_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    /// Issues an access token for `user`.
    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to generate token");
            ApiError::internal("Failed to generate token")
        })
    }

    /// Validates and decodes a token.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to hash password");
            ApiError::internal("Failed to hash password")
        })?;

    Ok(hash.to_string())
}

/// False for a wrong password and for a stored value that is not an
/// argon2 hash (such as the seeded demo account's `!`).
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Extractors
// =============================================================================

/// Claims of a request carrying any valid access token.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Expected a bearer token"))?;

        Ok(AuthClaims(state.jwt.validate(token)?))
    }
}

/// Claims of a request made by an admin.
#[derive(Debug, Clone)]
pub struct AdminClaims(pub Claims);

impl FromRequestParts<AppState> for AdminClaims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthClaims(claims) = AuthClaims::from_request_parts(parts, state).await?;
        if claims.role != UserRole::Admin {
            tracing::warn!(user_id = %claims.sub, "Non-admin token on admin route");
            return Err(ApiError::forbidden("Admin role required"));
        }
        Ok(AdminClaims(claims))
    }
}

// =============================================================================
// Admin bootstrap
// =============================================================================

/// Creates the configured admin account when no admin exists.
///
/// Returns the new admin, or `None` if one was already present.
pub async fn ensure_admin(db: &Database, config: &ApiConfig, tier_id: &str) -> ApiResult<Option<User>> {
    if db.users().count_admins().await? > 0 {
        return Ok(None);
    }

    let admin = db
        .users()
        .create(&NewUser {
            name: config.admin_name.clone(),
            email: config.admin_email.clone(),
            password_hash: hash_password(&config.admin_password)?,
            role: UserRole::Admin,
            tier_id: tier_id.to_string(),
        })
        .await?;

    info!(id = %admin.id, email = %admin.email, "Initial admin account created");
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::BASELINE_TIER_ID;

    fn user(role: UserRole) -> User {
        User {
            id: "u-1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role,
            cumulative_spend_cents: 0,
            tier_id: BASELINE_TIER_ID.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let token = manager.issue(&user(UserRole::Admin)).unwrap();

        let claims = manager.validate(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = JwtManager::new("secret-a".into(), 3600)
            .issue(&user(UserRole::Customer))
            .unwrap();

        let err = JwtManager::new("secret-b".into(), 3600).validate(&token).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Unauthorized);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("anything", "!"));
    }

    #[tokio::test]
    async fn test_ensure_admin_runs_once() {
        let db = Database::new(stockroom_db::DbConfig::in_memory()).await.unwrap();
        let config = ApiConfig::for_tests();

        let admin = ensure_admin(&db, &config, BASELINE_TIER_ID).await.unwrap().unwrap();
        assert!(admin.is_admin());
        assert!(ensure_admin(&db, &config, BASELINE_TIER_ID).await.unwrap().is_none());
        assert_eq!(db.users().count_admins().await.unwrap(), 1);
    }
}
