//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use audithub_entity::audit::{AuditStatus, Platform};

/// Create audit request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAuditRequest {
    /// Target platform.
    pub platform: Platform,
    /// Target username.
    #[validate(
        length(min = 1, max = 50, message = "Username must be between 1 and 50 characters"),
        custom(function = validate_username_charset)
    )]
    pub username: String,
}

/// Query parameters for the audit list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAuditsParams {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page (capped server-side).
    pub limit: Option<u64>,
    /// Restrict to one platform.
    pub platform: Option<Platform>,
    /// Restrict to one status.
    pub status: Option<AuditStatus>,
}

/// Usernames are restricted to `[A-Za-z0-9._-]`.
fn validate_username_charset(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset")
            .with_message("Username contains invalid characters".into()))
    }
}
