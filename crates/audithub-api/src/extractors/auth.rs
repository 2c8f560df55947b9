//! `AuthUser` extractor — pulls the bearer token from the Authorization
//! header, verifies it, and injects the caller's identity.
//!
//! Token issuance belongs to the identity service; the claims arrive
//! with the plan tier already resolved by the billing gateway, so the
//! pipeline treats both role and plan as opaque inputs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use audithub_core::config::auth::AuthConfig;
use audithub_core::error::AppError;
use audithub_entity::user::{PlanTier, UserRole};

use crate::error::ApiError;
use crate::state::AppState;

/// Claims carried in an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Role.
    pub role: UserRole,
    /// Resolved subscription plan.
    pub plan: PlanTier,
    /// Expiry (seconds since epoch).
    pub exp: u64,
}

/// Verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish()
    }
}

impl TokenVerifier {
    /// Create a verifier from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if !config.issuer.is_empty() {
            validation.set_issuer(&[&config.issuer]);
        }
        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decode and validate an access token.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AppError> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::authentication(format!("Invalid access token: {e}")))
    }
}

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The caller's user id.
    pub user_id: Uuid,
    /// The caller's role.
    pub role: UserRole,
    /// The caller's resolved plan tier.
    pub plan: PlanTier,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;

        let claims = state.token_verifier.verify(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            plan: claims.plan,
        })
    }
}
