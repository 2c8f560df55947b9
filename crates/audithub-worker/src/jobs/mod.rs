//! Job handler implementations.

pub mod audit;
pub mod maintenance;

pub use audit::AuditJobHandler;
pub use maintenance::{QueueCleanupHandler, UsageResetHandler};
