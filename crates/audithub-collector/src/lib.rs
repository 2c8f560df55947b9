//! # audithub-collector
//!
//! The profile collection capability consumed by the audit pipeline:
//! the [`ProfileCollector`] contract, a per-platform [`CollectorRegistry`]
//! that enforces a bounded timeout, and a file-backed fixture provider
//! for development and testing.
//!
//! Production collectors (browser automation, official APIs) are external
//! integrations; the pipeline only depends on the contract defined here.

pub mod error;
pub mod fixture;
pub mod registry;
pub mod types;

pub use error::CollectionError;
pub use fixture::FixtureCollector;
pub use registry::{CollectorRegistry, ProfileCollector};
pub use types::{PostData, ProfileData};
