//! Subscription plan tiers and the quotas/priorities they grant.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::status::JobPriority;

/// Subscription plan tier, resolved by the billing gateway before a
/// request reaches the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Free tier.
    Free,
    /// Starter tier.
    Starter,
    /// Pro tier.
    Pro,
    /// Enterprise tier.
    Enterprise,
}

impl PlanTier {
    /// Monthly audit quota for this tier. `None` means unbounded.
    pub fn monthly_audit_limit(&self) -> Option<i64> {
        match self {
            Self::Free => Some(50),
            Self::Starter => Some(500),
            Self::Pro => Some(2000),
            Self::Enterprise => None,
        }
    }

    /// Whether the tier receives premium treatment.
    pub fn is_premium(&self) -> bool {
        matches!(self, Self::Pro | Self::Enterprise)
    }

    /// Queue priority class granted to this tier's audit jobs.
    pub fn queue_priority(&self) -> JobPriority {
        if self.is_premium() {
            JobPriority::Elevated
        } else {
            JobPriority::Normal
        }
    }

    /// Return the tier as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_match_plan_table() {
        assert_eq!(PlanTier::Free.monthly_audit_limit(), Some(50));
        assert_eq!(PlanTier::Starter.monthly_audit_limit(), Some(500));
        assert_eq!(PlanTier::Pro.monthly_audit_limit(), Some(2000));
        assert_eq!(PlanTier::Enterprise.monthly_audit_limit(), None);
    }

    #[test]
    fn premium_tiers_get_elevated_priority() {
        assert_eq!(PlanTier::Free.queue_priority(), JobPriority::Normal);
        assert_eq!(PlanTier::Starter.queue_priority(), JobPriority::Normal);
        assert_eq!(PlanTier::Pro.queue_priority(), JobPriority::Elevated);
        assert_eq!(PlanTier::Enterprise.queue_priority(), JobPriority::Elevated);
    }
}
