//! Supported social-media platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Social-media platform an audit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "platform", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Instagram.
    Instagram,
    /// TikTok.
    Tiktok,
    /// YouTube.
    Youtube,
}

impl Platform {
    /// Return the platform as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::Youtube => "youtube",
        }
    }

    /// Canonical public profile URL for a username on this platform.
    pub fn profile_url(&self, username: &str) -> String {
        match self {
            Self::Instagram => format!("https://www.instagram.com/{username}/"),
            Self::Tiktok => format!("https://www.tiktok.com/@{username}"),
            Self::Youtube => format!("https://www.youtube.com/@{username}"),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instagram" => Ok(Self::Instagram),
            "tiktok" => Ok(Self::Tiktok),
            "youtube" => Ok(Self::Youtube),
            other => Err(format!("Unknown platform: {other}")),
        }
    }
}
