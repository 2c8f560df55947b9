//! Score engine: turns raw profile and post metrics into quality scores
//! and red flags.
//!
//! Pure and deterministic — no I/O, no state, no partial results. All
//! scores land in `[0, 100]` and the flag list is never null.

use audithub_collector::types::{PostData, ProfileData};
use audithub_entity::audit::{
    AuditMetrics, FlagSeverity, QualityAnalysis, RedFlag, RedFlagKind,
};

/// Penalty applied for a suspicious follow ratio.
const PENALTY_FOLLOW_RATIO: i32 = 15;
/// Penalty applied for low engagement on a large account.
const PENALTY_LOW_ENGAGEMENT: i32 = 25;
/// Penalty applied for implausibly high engagement.
const PENALTY_HIGH_ENGAGEMENT: i32 = 20;
/// Penalty applied for a missing or too-short bio.
const PENALTY_INCOMPLETE_PROFILE: i32 = 10;
/// Penalty applied for inconsistent per-post engagement.
const PENALTY_INCONSISTENT: i32 = 15;

/// Compute aggregated metrics from a profile and its recent post sample.
///
/// Averages are rounded to the nearest integer. The engagement rate is
/// `(avg_likes + avg_comments) / followers × 100`, rounded to 2 decimals,
/// and 0 when the profile has no followers or the sample is empty.
pub fn compute_metrics(profile: &ProfileData, posts: &[PostData]) -> AuditMetrics {
    if posts.is_empty() {
        return AuditMetrics {
            followers: profile.followers,
            following: profile.following,
            posts_count: profile.posts,
            avg_likes: 0,
            avg_comments: 0,
            engagement_rate: 0.0,
        };
    }

    let total_likes: i64 = posts.iter().map(|p| p.likes).sum();
    let total_comments: i64 = posts.iter().map(|p| p.comments).sum();
    let avg_likes = (total_likes as f64 / posts.len() as f64).round() as i64;
    let avg_comments = (total_comments as f64 / posts.len() as f64).round() as i64;

    let engagement_rate = if profile.followers > 0 {
        let rate = (avg_likes + avg_comments) as f64 / profile.followers as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    } else {
        0.0
    };

    AuditMetrics {
        followers: profile.followers,
        following: profile.following,
        posts_count: profile.posts,
        avg_likes,
        avg_comments,
        engagement_rate,
    }
}

/// Analyze profile quality, producing all four scores and the flag list.
///
/// Every rule is evaluated independently; penalties sum and the result
/// is clamped to `[0, 100]`.
pub fn analyze_quality(
    profile: &ProfileData,
    metrics: &AuditMetrics,
    posts: &[PostData],
) -> QualityAnalysis {
    let mut overall: i32 = 100;
    let mut red_flags: Vec<RedFlag> = Vec::new();

    if metrics.following > metrics.followers && metrics.followers < 10_000 {
        overall -= PENALTY_FOLLOW_RATIO;
        red_flags.push(RedFlag {
            kind: RedFlagKind::SuspiciousFollowRatio,
            severity: FlagSeverity::Medium,
            description: "Following/follower ratio may indicate inauthentic growth".to_string(),
        });
    }

    if metrics.engagement_rate < 1.0 && metrics.followers > 10_000 {
        overall -= PENALTY_LOW_ENGAGEMENT;
        red_flags.push(RedFlag {
            kind: RedFlagKind::LowEngagement,
            severity: FlagSeverity::High,
            description: format!(
                "Very low engagement rate ({}%) for this audience size",
                metrics.engagement_rate
            ),
        });
    }

    // Mutually exclusive with the low-engagement rule by construction of
    // thresholds, but evaluated independently all the same.
    if metrics.engagement_rate > 15.0 && metrics.followers > 50_000 {
        overall -= PENALTY_HIGH_ENGAGEMENT;
        red_flags.push(RedFlag {
            kind: RedFlagKind::SuspiciousHighEngagement,
            severity: FlagSeverity::High,
            description: format!(
                "Abnormally high engagement rate ({}%), possible purchased engagement",
                metrics.engagement_rate
            ),
        });
    }

    if profile.bio.chars().count() < 10 {
        overall -= PENALTY_INCOMPLETE_PROFILE;
        red_flags.push(RedFlag {
            kind: RedFlagKind::IncompleteProfile,
            severity: FlagSeverity::Low,
            description: "Bio missing or incomplete".to_string(),
        });
    }

    if !posts.is_empty() {
        let likes: Vec<i64> = posts.iter().map(|p| p.likes).collect();
        if coefficient_of_variation(&likes) > 80.0 {
            overall -= PENALTY_INCONSISTENT;
            red_flags.push(RedFlag {
                kind: RedFlagKind::InconsistentEngagement,
                severity: FlagSeverity::Medium,
                description: "Highly irregular engagement across posts".to_string(),
            });
        }
    }

    let overall_score = overall.clamp(0, 100);
    let authenticity_score = (overall_score - 5 * red_flags.len() as i32).max(0);
    let engagement_quality = engagement_quality(metrics, posts);
    let high_flags = red_flags
        .iter()
        .filter(|f| f.severity == FlagSeverity::High)
        .count() as i32;
    let audience_quality = (100 - 20 * high_flags).max(0);

    QualityAnalysis {
        overall_score,
        authenticity_score,
        engagement_quality,
        audience_quality,
        red_flags,
    }
}

/// Engagement quality sub-score, computed over the post sample.
fn engagement_quality(metrics: &AuditMetrics, posts: &[PostData]) -> i32 {
    let mut quality: i32 = 100;

    if posts.len() > 3 {
        let likes: Vec<i64> = posts.iter().map(|p| p.likes).collect();
        if coefficient_of_variation(&likes) > 70.0 {
            quality -= 20;
        }
    }

    if metrics.avg_likes > 0 {
        let comment_ratio = metrics.avg_comments as f64 / metrics.avg_likes as f64;
        if comment_ratio < 0.01 {
            quality -= 15;
        }
        if comment_ratio > 0.3 {
            quality -= 10;
        }
    }

    quality.max(0)
}

/// Population coefficient of variation in percent: stddev / mean × 100.
///
/// 0 when the sample has fewer than two values or a non-positive mean.
fn coefficient_of_variation(values: &[i64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<i64>() as f64 / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt() / mean * 100.0
}
