//! Error types for geofleet operations.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FleetError>;

/// All failure modes surfaced by the registry.
///
/// Write-path cache failures never appear here: the in-memory state is
/// authoritative, so the manager logs them and carries on. Read-path cache
/// failures do surface (`Cache`, `CacheTimeout`) when the cache was the
/// explicitly requested index.
#[derive(Debug, Error)]
pub enum FleetError {
    /// The location lies outside the configured service area; the quadtree
    /// refused it and the write was rolled back.
    #[error("location ({lat}, {lng}) is outside the service area")]
    OutOfBounds { lat: f64, lng: f64 },

    /// An update or removal referenced an id that is not in the registry.
    #[error("driver not found: {0}")]
    DriverNotFound(String),

    /// `search` was asked for an index this build does not know about.
    #[error("unknown index type: {0}")]
    UnknownIndex(String),

    /// The Redis index was requested but the cache is not enabled.
    #[error("redis index requested but the cache backend is disabled")]
    CacheDisabled,

    /// The cache backend failed while it was the chosen read path.
    #[error("cache backend unavailable: {0}")]
    Cache(#[from] redis::RedisError),

    /// A cache call exceeded its per-call timeout.
    #[error("cache operation timed out after {0:?}")]
    CacheTimeout(Duration),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
