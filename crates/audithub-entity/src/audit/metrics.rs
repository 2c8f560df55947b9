//! Collected profile metrics.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Aggregated metrics for an audited profile.
///
/// Zero-valued until the audit completes successfully.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditMetrics {
    /// Follower count.
    pub followers: i64,
    /// Following count.
    pub following: i64,
    /// Total post count reported by the profile.
    pub posts_count: i64,
    /// Average likes over the sampled posts, rounded to the nearest integer.
    pub avg_likes: i64,
    /// Average comments over the sampled posts, rounded to the nearest integer.
    pub avg_comments: i64,
    /// Engagement rate in percent, rounded to 2 decimals.
    pub engagement_rate: f64,
}
