//! Audit record entity: model, status, platform, metrics, and quality analysis.

pub mod metrics;
pub mod model;
pub mod platform;
pub mod quality;
pub mod status;

pub use metrics::AuditMetrics;
pub use model::{AuditRecord, AuditStatusView, InfluencerProfile, NewAudit};
pub use platform::Platform;
pub use quality::{FlagSeverity, QualityAnalysis, RedFlag, RedFlagKind};
pub use status::AuditStatus;
