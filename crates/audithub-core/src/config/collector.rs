//! Profile collector configuration.

use serde::{Deserialize, Serialize};

/// Profile collector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Collector provider: `"fixture"` for the file-backed development
    /// provider, `"none"` to register no collectors.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Upper bound in seconds for a single profile collection call.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Path to the fixture profiles file (fixture provider only).
    #[serde(default = "default_fixture_path")]
    pub fixture_path: String,
}

fn default_provider() -> String {
    "none".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_fixture_path() -> String {
    "./data/fixtures/profiles.json".to_string()
}
