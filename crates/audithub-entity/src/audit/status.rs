//! Audit status enumeration and transition rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an audit record.
///
/// Transitions are monotonic: `pending → in_progress → {completed | failed}`.
/// Terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// Accepted and queued, not yet picked up by a worker.
    Pending,
    /// A worker is currently processing the audit.
    InProgress,
    /// Processing finished and results are populated.
    Completed,
    /// Processing failed; `error` carries the reason.
    Failed,
}

impl AuditStatus {
    /// Check if the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check whether a transition to `next` is permitted.
    pub fn can_transition_to(&self, next: AuditStatus) -> bool {
        match self {
            Self::Pending => matches!(next, Self::InProgress | Self::Failed),
            Self::InProgress => matches!(next, Self::Completed | Self::Failed),
            Self::Completed | Self::Failed => false,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_absorbing() {
        for terminal in [AuditStatus::Completed, AuditStatus::Failed] {
            for next in [
                AuditStatus::Pending,
                AuditStatus::InProgress,
                AuditStatus::Completed,
                AuditStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn pending_cannot_complete_directly() {
        assert!(!AuditStatus::Pending.can_transition_to(AuditStatus::Completed));
        assert!(AuditStatus::Pending.can_transition_to(AuditStatus::InProgress));
        assert!(AuditStatus::Pending.can_transition_to(AuditStatus::Failed));
    }

    #[test]
    fn in_progress_reaches_both_terminals() {
        assert!(AuditStatus::InProgress.can_transition_to(AuditStatus::Completed));
        assert!(AuditStatus::InProgress.can_transition_to(AuditStatus::Failed));
        assert!(!AuditStatus::InProgress.can_transition_to(AuditStatus::Pending));
    }
}
