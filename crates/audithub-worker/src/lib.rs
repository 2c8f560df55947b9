//! # audithub-worker
//!
//! Background job processing for AuditHub:
//! - A priority-aware, durable [`queue::JobQueue`] with retry/backoff and
//!   stall redelivery
//! - A [`runner::WorkerRunner`] that polls for and executes claimed jobs
//! - A [`executor::JobExecutor`] that dispatches jobs to the correct handler
//! - The audit processing handler and scheduled maintenance handlers

pub mod events;
pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use queue::JobQueue;
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
