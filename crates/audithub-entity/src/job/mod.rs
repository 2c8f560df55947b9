//! Queue job entity: model, status, priority, and typed payloads.

pub mod model;
pub mod payload;
pub mod status;

pub use model::{Job, NewJob, QueueCounts};
pub use payload::JobPayload;
pub use status::{JobPriority, JobStatus};
