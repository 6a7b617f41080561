//! The driver manager: canonical entity table plus index orchestration.
//!
//! All mutations go through the table's writer lock; reads take the shared
//! lock. The indexes lock internally and are only ever touched while the
//! manager holds its own lock, never the other way around. Cache I/O runs
//! after the manager lock is released: the in-memory commit is
//! authoritative, and a cache write that fails is logged and swallowed.

use crate::cache::{CacheStats, GeoCache};
use crate::config::Config;
use crate::error::{FleetError, Result};
use crate::geo::haversine_km;
use crate::grid::{GridIndex, GridStats};
use crate::model::{Driver, DriverStatus, DriverWithDistance, IndexedDriver, Location};
use crate::quadtree::QuadTree;
use crate::region::{default_regions, RegionRouter};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::str::FromStr;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

/// Which backend answers a radius query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Quadtree,
    Grid,
    Redis,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quadtree => "quadtree",
            Self::Grid => "grid",
            Self::Redis => "redis",
        }
    }
}

impl FromStr for IndexKind {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "quadtree" => Ok(Self::Quadtree),
            "grid" => Ok(Self::Grid),
            "redis" => Ok(Self::Redis),
            other => Err(FleetError::UnknownIndex(other.to_string())),
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{duration:?}"))
}

/// Result count and wall-clock duration of one index's run over a query.
#[derive(Debug, Clone, Serialize)]
pub struct IndexTiming {
    pub count: usize,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
}

/// Side-by-side timings of the same query on every enabled index.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub quadtree: IndexTiming,
    pub grid: IndexTiming,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<IndexTiming>,
}

/// Registry-wide totals.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub total_drivers: usize,
    pub available_drivers: usize,
    pub busy_drivers: usize,
    pub offline_drivers: usize,
    pub grid_stats: GridStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_stats: Option<CacheStats>,
}

/// Canonical driver table plus the indexes kept consistent with it.
pub struct DriverManager {
    drivers: RwLock<FxHashMap<String, Driver>>,
    quadtree: QuadTree,
    grid: GridIndex,
    router: RegionRouter,
    cache: Option<GeoCache>,
    home_region: String,
}

impl DriverManager {
    /// Build a manager from the configuration, connecting to the cache when
    /// it is enabled. The home region covers the configured bounds; the
    /// fixed city table is registered after it.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let cache = if config.use_redis {
            Some(
                GeoCache::connect(
                    &config.redis_addr,
                    config.redis_password.as_deref(),
                    config.redis_db,
                    config.cache_ttl(),
                    config.cache_timeout(),
                )
                .await?,
            )
        } else {
            None
        };

        let router = RegionRouter::new();
        router.register(config.home_region.clone(), config.bounds.clone());
        for (name, bbox) in default_regions() {
            router.register(name, bbox);
        }

        Ok(Self {
            drivers: RwLock::new(FxHashMap::default()),
            quadtree: QuadTree::new(config.bounds.clone()),
            grid: GridIndex::new(config.bounds.clone(), config.cell_size_km),
            router,
            cache,
            home_region: config.home_region,
        })
    }

    fn region_for(&self, lat: f64, lng: f64) -> String {
        self.router
            .locate(lat, lng)
            .unwrap_or_else(|| self.home_region.clone())
    }

    /// Add a driver, upserting on a duplicate id: the prior entry is
    /// removed from both indexes (at its prior location) before the new
    /// record goes in. A location outside the service area is refused by
    /// the quadtree and the whole write is rolled back.
    pub async fn add_driver(&self, mut driver: Driver) -> Result<()> {
        driver.updated_at = SystemTime::now();
        let entry = IndexedDriver::from(&driver);

        {
            let mut drivers = self.drivers.write();
            let prior = drivers.insert(driver.id.clone(), driver.clone());
            if let Some(old) = &prior {
                self.quadtree.remove(&old.id);
                self.grid.remove(&old.id, old.location.lat, old.location.lng);
            }

            if !self.quadtree.insert(&entry) {
                // Roll back: restore the displaced record (and its index
                // entries) or clear the fresh one.
                match prior {
                    Some(old) => {
                        let old_entry = IndexedDriver::from(&old);
                        self.quadtree.insert(&old_entry);
                        self.grid.insert(&old_entry);
                        drivers.insert(old.id.clone(), old);
                    }
                    None => {
                        drivers.remove(&driver.id);
                    }
                }
                return Err(FleetError::OutOfBounds {
                    lat: entry.lat,
                    lng: entry.lng,
                });
            }
            self.grid.insert(&entry);
        }

        if let Some(cache) = &self.cache {
            let region = self.region_for(entry.lat, entry.lng);
            if let Err(err) = cache.add_driver(&driver, &region).await {
                warn!(driver = %driver.id, %err, "cache write failed; in-memory state is authoritative");
            }
        }

        debug!(driver = %driver.id, "driver added");
        Ok(())
    }

    /// Move a driver. Index entries are removed at the *prior* location
    /// (the grid's cell key depends on it) and re-filed at the new one. A
    /// new location outside the service area restores the prior position
    /// and fails.
    pub async fn update_location(&self, id: &str, lat: f64, lng: f64) -> Result<()> {
        {
            let mut drivers = self.drivers.write();
            let driver = drivers
                .get_mut(id)
                .ok_or_else(|| FleetError::DriverNotFound(id.to_string()))?;

            let old = driver.location;
            self.quadtree.remove(id);
            self.grid.remove(id, old.lat, old.lng);

            if !self.quadtree.insert(&IndexedDriver::new(id, lat, lng)) {
                let old_entry = IndexedDriver::new(id, old.lat, old.lng);
                self.quadtree.insert(&old_entry);
                self.grid.insert(&old_entry);
                return Err(FleetError::OutOfBounds { lat, lng });
            }
            self.grid.insert(&IndexedDriver::new(id, lat, lng));

            driver.location = Location::new(lat, lng);
            driver.updated_at = SystemTime::now();
        }

        if let Some(cache) = &self.cache {
            let region = self.region_for(lat, lng);
            if let Err(err) = cache.update_location(id, &region, lat, lng).await {
                warn!(driver = %id, %err, "cache write failed; in-memory state is authoritative");
            }
        }

        Ok(())
    }

    /// Change a driver's availability. No index is touched: searches filter
    /// status through the canonical table.
    pub fn update_status(&self, id: &str, status: DriverStatus) -> Result<()> {
        let mut drivers = self.drivers.write();
        let driver = drivers
            .get_mut(id)
            .ok_or_else(|| FleetError::DriverNotFound(id.to_string()))?;
        driver.status = status;
        driver.updated_at = SystemTime::now();
        Ok(())
    }

    /// Remove a driver from the table, both indexes, and the cache.
    pub async fn remove_driver(&self, id: &str) -> Result<Driver> {
        let removed = {
            let mut drivers = self.drivers.write();
            let driver = drivers
                .remove(id)
                .ok_or_else(|| FleetError::DriverNotFound(id.to_string()))?;
            self.quadtree.remove(id);
            self.grid.remove(id, driver.location.lat, driver.location.lng);
            driver
        };

        if let Some(cache) = &self.cache {
            let region = self.region_for(removed.location.lat, removed.location.lng);
            if let Err(err) = cache.remove_driver(id, &region).await {
                warn!(driver = %id, %err, "cache write failed; in-memory state is authoritative");
            }
        }

        Ok(removed)
    }

    /// Snapshot of one canonical record.
    pub fn driver(&self, id: &str) -> Option<Driver> {
        self.drivers.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.drivers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.read().is_empty()
    }

    /// Available drivers within `radius_km` of the point, nearest first,
    /// answered by the chosen index.
    ///
    /// Candidates are joined against the canonical table, filtered to
    /// `Available`, and re-checked against the exact haversine distance
    /// even when the backend already guarantees it; that re-check is what
    /// makes all backends return identical result sets.
    pub async fn search(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        index: IndexKind,
    ) -> Result<(Vec<DriverWithDistance>, Duration)> {
        let started = Instant::now();

        let candidate_ids: Vec<String> = match index {
            IndexKind::Quadtree => self
                .quadtree
                .search_radius(lat, lng, radius_km)
                .into_iter()
                .map(|e| e.id)
                .collect(),
            IndexKind::Grid => self
                .grid
                .search_radius(lat, lng, radius_km)
                .into_iter()
                .map(|e| e.id)
                .collect(),
            IndexKind::Redis => {
                let cache = self.cache.as_ref().ok_or(FleetError::CacheDisabled)?;
                let region = self.region_for(lat, lng);
                cache.search_radius(&region, lat, lng, radius_km).await?
            }
        };

        let mut results = {
            let drivers = self.drivers.read();
            let mut results = Vec::with_capacity(candidate_ids.len());
            for id in candidate_ids {
                let Some(driver) = drivers.get(&id) else {
                    continue;
                };
                if driver.status != DriverStatus::Available {
                    continue;
                }
                let distance = haversine_km(lat, lng, driver.location.lat, driver.location.lng);
                if distance <= radius_km {
                    results.push(DriverWithDistance {
                        driver: driver.clone(),
                        distance,
                    });
                }
            }
            results
        };

        results.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        Ok((results, started.elapsed()))
    }

    /// Run the same query against every enabled index, recording count and
    /// wall-clock duration per index. A cache failure drops the redis entry
    /// from the report instead of failing the comparison.
    pub async fn compare(&self, lat: f64, lng: f64, radius_km: f64) -> Result<ComparisonReport> {
        let (results, duration) = self.search(lat, lng, radius_km, IndexKind::Quadtree).await?;
        let quadtree = IndexTiming {
            count: results.len(),
            duration,
        };

        let (results, duration) = self.search(lat, lng, radius_km, IndexKind::Grid).await?;
        let grid = IndexTiming {
            count: results.len(),
            duration,
        };

        let redis = if self.cache.is_some() {
            match self.search(lat, lng, radius_km, IndexKind::Redis).await {
                Ok((results, duration)) => Some(IndexTiming {
                    count: results.len(),
                    duration,
                }),
                Err(err) => {
                    warn!(%err, "cache search failed during comparison");
                    None
                }
            }
        } else {
            None
        };

        Ok(ComparisonReport {
            quadtree,
            grid,
            redis,
        })
    }

    /// Totals by status plus per-index statistics.
    pub async fn stats(&self) -> StatsReport {
        let (total, available, busy, offline) = {
            let drivers = self.drivers.read();
            let mut available = 0;
            let mut busy = 0;
            let mut offline = 0;
            for driver in drivers.values() {
                match driver.status {
                    DriverStatus::Available => available += 1,
                    DriverStatus::Busy => busy += 1,
                    DriverStatus::Offline => offline += 1,
                }
            }
            (drivers.len(), available, busy, offline)
        };

        let redis_stats = match &self.cache {
            Some(cache) => match cache.stats(&self.home_region).await {
                Ok(stats) => Some(stats),
                Err(err) => {
                    warn!(%err, "cache stats unavailable");
                    None
                }
            },
            None => None,
        };

        StatsReport {
            total_drivers: total,
            available_drivers: available,
            busy_drivers: busy,
            offline_drivers: offline,
            grid_stats: self.grid.stats(),
            redis_stats,
        }
    }
}
