//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// JWT verification settings.
///
/// AuditHub does not issue tokens; it verifies bearer tokens minted by the
/// identity service. The claims carry the resolved plan tier and role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to verify access tokens.
    pub jwt_secret: String,
    /// Expected token issuer. Empty disables issuer validation.
    #[serde(default)]
    pub issuer: String,
}
