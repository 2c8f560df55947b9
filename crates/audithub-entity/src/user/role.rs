//! User roles for authorization checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular user.
    User,
    /// Administrator; may read queue statistics.
    Admin,
}

impl UserRole {
    /// Whether the role grants admin endpoints.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}
