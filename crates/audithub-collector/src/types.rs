//! Raw data returned by profile collectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw profile data as observed on the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileData {
    /// Username as reported by the platform.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Follower count.
    pub followers: i64,
    /// Following count.
    pub following: i64,
    /// Total post count.
    pub posts: i64,
    /// Profile picture URL.
    pub profile_picture: String,
    /// Profile biography text.
    pub bio: String,
    /// Whether the profile carries a verified badge.
    pub verified: bool,
}

/// Metrics for a single recent post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostData {
    /// Like count.
    pub likes: i64,
    /// Comment count.
    pub comments: i64,
    /// View count, where the platform exposes one.
    pub views: Option<i64>,
    /// When the post was published.
    pub posted_at: DateTime<Utc>,
}
