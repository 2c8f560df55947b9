//! Collection error taxonomy.

use thiserror::Error;

use audithub_entity::audit::Platform;

/// Failure modes of a profile collection attempt.
///
/// The pipeline never retries a collection call directly; retry is the
/// queue's responsibility acting on the job as a whole. `Unsupported`
/// is terminal immediately.
#[derive(Debug, Clone, Error)]
pub enum CollectionError {
    /// The profile does not exist or is private.
    #[error("Profile not found or private")]
    NotFoundOrPrivate,

    /// The collection call exceeded its bounded timeout.
    #[error("Profile collection timed out")]
    Timeout,

    /// The upstream platform blocked or rate-limited the collector.
    #[error("Upstream platform blocked the collection request")]
    UpstreamBlocked,

    /// No collector is registered for the platform.
    #[error("Platform not supported: {0}")]
    Unsupported(Platform),
}

impl CollectionError {
    /// Whether the queue should retry the surrounding job.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}
