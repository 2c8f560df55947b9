//! Notifier configuration.

use serde::{Deserialize, Serialize};

/// Completion notifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Whether report-ready notifications are sent at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}
