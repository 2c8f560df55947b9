//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background job worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent job processing tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in seconds between job queue polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum delivery attempts per job.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// Base delay in seconds for exponential retry backoff.
    #[serde(default = "default_backoff_base")]
    pub backoff_base_seconds: u64,
    /// Interval in seconds between heartbeats for a running job.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Seconds without a heartbeat after which a running job is
    /// considered stalled and redelivered.
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout_seconds: u64,
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_poll_interval() -> u64 {
    1
}

fn default_max_attempts() -> i32 {
    3
}

fn default_backoff_base() -> u64 {
    2
}

fn default_heartbeat_interval() -> u64 {
    15
}

fn default_stall_timeout() -> u64 {
    120
}
