//! Registry configuration.
//!
//! Defaults describe a single city-scale deployment (the original launch
//! region, Mumbai). The cache settings are read from the environment in
//! deployments (`REDIS_ADDR`, `USE_REDIS`); everything else is set in code
//! or deserialized from JSON.

use crate::error::{FleetError, Result};
use crate::geo::BoundingBox;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Configuration for a [`DriverManager`](crate::manager::DriverManager).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Service area; the quadtree root box and the grid reference box.
    #[serde(default = "Config::default_bounds")]
    pub bounds: BoundingBox,

    /// Grid cell edge length in kilometers.
    #[serde(default = "Config::default_cell_size_km")]
    pub cell_size_km: f64,

    /// Cache-partition name registered for `bounds`.
    #[serde(default = "Config::default_home_region")]
    pub home_region: String,

    /// Address of the external cache.
    #[serde(default = "Config::default_redis_addr")]
    pub redis_addr: String,

    #[serde(default)]
    pub redis_password: Option<String>,

    /// Redis logical database selector.
    #[serde(default)]
    pub redis_db: i64,

    /// Whether the external cache backend is enabled.
    #[serde(default)]
    pub use_redis: bool,

    /// Time-to-live for cached driver metadata entries.
    #[serde(default = "Config::default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    /// Per-call timeout for cache operations.
    #[serde(default = "Config::default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,
}

impl Config {
    fn default_bounds() -> BoundingBox {
        BoundingBox::new(18.5204, 19.0760, 72.8777, 72.9982)
    }

    const fn default_cell_size_km() -> f64 {
        0.5
    }

    fn default_home_region() -> String {
        "mumbai".to_string()
    }

    fn default_redis_addr() -> String {
        "localhost:6379".to_string()
    }

    const fn default_cache_ttl_seconds() -> u64 {
        30 * 60
    }

    const fn default_cache_timeout_ms() -> u64 {
        2_000
    }

    /// Build a configuration from defaults plus the `REDIS_ADDR` and
    /// `USE_REDIS` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = env::var("REDIS_ADDR") {
            if !addr.is_empty() {
                config.redis_addr = addr;
            }
        }
        config.use_redis = env::var("USE_REDIS").map(|v| v == "true").unwrap_or(false);
        config
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_cell_size_km(mut self, cell_size_km: f64) -> Self {
        self.cell_size_km = cell_size_km;
        self
    }

    pub fn with_home_region(mut self, name: impl Into<String>) -> Self {
        self.home_region = name.into();
        self
    }

    pub fn with_redis(mut self, addr: impl Into<String>) -> Self {
        self.redis_addr = addr.into();
        self.use_redis = true;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.cell_size_km.is_finite() || self.cell_size_km <= 0.0 {
            return Err(FleetError::InvalidConfig(format!(
                "cell size must be a positive number of kilometers, got {}",
                self.cell_size_km
            )));
        }
        if self.bounds.min_lat() >= self.bounds.max_lat()
            || self.bounds.min_lng() >= self.bounds.max_lng()
        {
            return Err(FleetError::InvalidConfig(
                "bounds must span a non-empty area".to_string(),
            ));
        }
        if self.home_region.is_empty() {
            return Err(FleetError::InvalidConfig(
                "home region name must not be empty".to_string(),
            ));
        }
        if self.cache_timeout_ms == 0 {
            return Err(FleetError::InvalidConfig(
                "cache timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bounds: Self::default_bounds(),
            cell_size_km: Self::default_cell_size_km(),
            home_region: Self::default_home_region(),
            redis_addr: Self::default_redis_addr(),
            redis_password: None,
            redis_db: 0,
            use_redis: false,
            cache_ttl_seconds: Self::default_cache_ttl_seconds(),
            cache_timeout_ms: Self::default_cache_timeout_ms(),
        }
    }
}
