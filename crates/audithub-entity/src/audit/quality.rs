//! Quality analysis results: scores and red flags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete, named quality concern attached to an audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedFlag {
    /// Which concern this flag names.
    pub kind: RedFlagKind,
    /// How serious the concern is.
    pub severity: FlagSeverity,
    /// Human-readable explanation.
    pub description: String,
}

/// Known red flag kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlagKind {
    /// Following outnumbers followers on a small account.
    SuspiciousFollowRatio,
    /// Engagement rate too low for the audience size.
    LowEngagement,
    /// Engagement rate implausibly high for the audience size.
    SuspiciousHighEngagement,
    /// Bio missing or too short.
    IncompleteProfile,
    /// Per-post engagement varies wildly.
    InconsistentEngagement,
}

impl RedFlagKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuspiciousFollowRatio => "suspicious_follow_ratio",
            Self::LowEngagement => "low_engagement",
            Self::SuspiciousHighEngagement => "suspicious_high_engagement",
            Self::IncompleteProfile => "incomplete_profile",
            Self::InconsistentEngagement => "inconsistent_engagement",
        }
    }
}

impl fmt::Display for RedFlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity level of a red flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagSeverity {
    /// Minor concern.
    Low,
    /// Moderate concern.
    Medium,
    /// Serious concern.
    High,
}

/// Quality scores derived from collected metrics.
///
/// All scores are in `[0, 100]`. The flag list is ordered by evaluation
/// order and never null (empty is valid).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityAnalysis {
    /// Overall profile quality score.
    pub overall_score: i32,
    /// Estimated authenticity of the audience and activity.
    pub authenticity_score: i32,
    /// Quality of per-post engagement patterns.
    pub engagement_quality: i32,
    /// Estimated audience quality.
    pub audience_quality: i32,
    /// Red flags raised during analysis, in evaluation order.
    pub red_flags: Vec<RedFlag>,
}

impl QualityAnalysis {
    /// Count flags at the given severity.
    pub fn count_by_severity(&self, severity: FlagSeverity) -> usize {
        self.red_flags
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}
