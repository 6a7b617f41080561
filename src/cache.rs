//! External geospatial cache adapter backed by Redis.
//!
//! Each region gets a geo set `drivers:{region}`; driver metadata lives in
//! `driver:{id}:meta` as JSON with a TTL. Every call is bounded by the
//! configured per-call timeout. The adapter itself reports every failure;
//! the manager decides the policy (writes are best-effort and logged, reads
//! are fatal when this backend was explicitly requested). Dropping the last
//! handle closes the connection.

use crate::error::{FleetError, Result};
use crate::model::Driver;
use redis::aio::ConnectionManager;
use redis::geo::{Coord, RadiusOptions, RadiusOrder, Unit};
use redis::AsyncCommands;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Counters reported by [`GeoCache::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub region: String,
    pub driver_count: u64,
    pub cache_enabled: bool,
}

/// Handle to the Redis-backed geospatial store.
#[derive(Clone)]
pub struct GeoCache {
    conn: ConnectionManager,
    ttl: Duration,
    timeout: Duration,
}

fn geo_key(region: &str) -> String {
    format!("drivers:{region}")
}

fn meta_key(id: &str) -> String {
    format!("driver:{id}:meta")
}

impl GeoCache {
    /// Connect and verify the server responds to PING.
    pub async fn connect(
        addr: &str,
        password: Option<&str>,
        db: i64,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Self> {
        let url = match password {
            Some(password) => format!("redis://:{password}@{addr}/{db}"),
            None => format!("redis://{addr}/{db}"),
        };
        let client = redis::Client::open(url)?;
        let mut conn = match tokio::time::timeout(timeout, client.get_connection_manager()).await {
            Ok(conn) => conn?,
            Err(_) => return Err(FleetError::CacheTimeout(timeout)),
        };

        let cache = Self {
            conn: conn.clone(),
            ttl,
            timeout,
        };
        let _: String = cache.call(redis::cmd("PING").query_async(&mut conn)).await?;
        info!(addr, "connected to geospatial cache");
        Ok(cache)
    }

    async fn call<T>(&self, fut: impl Future<Output = redis::RedisResult<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(FleetError::CacheTimeout(self.timeout)),
        }
    }

    /// Add a driver to the region's geo set and store its metadata with the
    /// configured TTL.
    pub async fn add_driver(&self, driver: &Driver, region: &str) -> Result<()> {
        let payload = serde_json::to_string(driver)?;
        let mut conn = self.conn.clone();
        let _: i64 = self
            .call(conn.geo_add(
                geo_key(region),
                (
                    Coord::lon_lat(driver.location.lng, driver.location.lat),
                    driver.id.as_str(),
                ),
            ))
            .await?;
        let _: () = self
            .call(conn.set_ex(meta_key(&driver.id), payload, self.ttl.as_secs()))
            .await?;
        Ok(())
    }

    /// Move a driver within the region's geo set (GEOADD upserts).
    pub async fn update_location(&self, id: &str, region: &str, lat: f64, lng: f64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .call(conn.geo_add(geo_key(region), (Coord::lon_lat(lng, lat), id)))
            .await?;
        Ok(())
    }

    /// Drop a driver from the region's geo set and delete its metadata.
    pub async fn remove_driver(&self, id: &str, region: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = self.call(conn.zrem(geo_key(region), id)).await?;
        let _: i64 = self.call(conn.del(meta_key(id))).await?;
        Ok(())
    }

    /// Ids within `radius_km` of the point, nearest first.
    pub async fn search_radius(
        &self,
        region: &str,
        lat: f64,
        lng: f64,
        radius_km: f64,
    ) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let options = RadiusOptions::default().order(RadiusOrder::Asc);
        let ids: Vec<String> = self
            .call(conn.geo_radius(geo_key(region), lng, lat, radius_km, Unit::Kilometers, options))
            .await?;
        Ok(ids)
    }

    pub async fn stats(&self, region: &str) -> Result<CacheStats> {
        let mut conn = self.conn.clone();
        let driver_count: u64 = self.call(conn.zcard(geo_key(region))).await?;
        Ok(CacheStats {
            region: region.to_string(),
            driver_count,
            cache_enabled: true,
        })
    }
}
