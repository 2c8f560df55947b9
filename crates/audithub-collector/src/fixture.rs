//! File-backed fixture collector for development and testing.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing;

use audithub_core::error::AppError;

use crate::error::CollectionError;
use crate::registry::ProfileCollector;
use crate::types::{PostData, ProfileData};

/// One canned profile entry in the fixture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureProfile {
    /// Profile data served for this username.
    pub profile: ProfileData,
    /// Recent post sample served for this username.
    #[serde(default)]
    pub posts: Vec<PostData>,
}

/// Collector that serves canned profiles from a JSON file keyed by
/// username. Unknown usernames yield `NotFoundOrPrivate`, matching what
/// a real collector reports for missing or private profiles.
#[derive(Debug)]
pub struct FixtureCollector {
    profiles: HashMap<String, FixtureProfile>,
}

impl FixtureCollector {
    /// Load fixtures from a JSON file of `{ username: { profile, posts } }`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::configuration(format!(
                "Failed to read fixture file '{}': {e}",
                path.display()
            ))
        })?;
        let profiles: HashMap<String, FixtureProfile> = serde_json::from_str(&raw)?;

        tracing::info!(
            "Loaded {} fixture profile(s) from '{}'",
            profiles.len(),
            path.display()
        );
        Ok(Self { profiles })
    }

    /// Build a collector from in-memory entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, FixtureProfile)>) -> Self {
        Self {
            profiles: entries.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ProfileCollector for FixtureCollector {
    async fn fetch_profile(
        &self,
        username: &str,
    ) -> Result<(ProfileData, Vec<PostData>), CollectionError> {
        match self.profiles.get(username) {
            Some(entry) => Ok((entry.profile.clone(), entry.posts.clone())),
            None => Err(CollectionError::NotFoundOrPrivate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_entry() -> FixtureProfile {
        FixtureProfile {
            profile: ProfileData {
                username: "validuser".to_string(),
                display_name: "Valid User".to_string(),
                followers: 1000,
                following: 2000,
                posts: 12,
                profile_picture: String::new(),
                bio: "Travel and food".to_string(),
                verified: false,
            },
            posts: vec![PostData {
                likes: 5,
                comments: 0,
                views: None,
                posted_at: Utc::now(),
            }],
        }
    }

    #[tokio::test]
    async fn known_username_is_served() {
        let collector =
            FixtureCollector::from_entries([("validuser".to_string(), sample_entry())]);
        let (profile, posts) = collector.fetch_profile("validuser").await.unwrap();
        assert_eq!(profile.followers, 1000);
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn unknown_username_is_not_found() {
        let collector = FixtureCollector::from_entries([]);
        let err = collector.fetch_profile("ghost").await.unwrap_err();
        assert!(matches!(err, CollectionError::NotFoundOrPrivate));
    }
}
