//! Record types for the driver registry.
//!
//! The canonical table owns the only full [`Driver`] per id. The in-memory
//! indexes hold lightweight [`IndexedDriver`] entries (id plus the
//! coordinates the entry was filed under), and the manager joins candidates
//! back against the canonical table, so a status change never has to touch
//! an index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// A geographic position in decimal degrees (WGS84 assumed, no datum
/// conversion).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Availability of a driver. Only `Available` drivers are returned by
/// radius searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Available,
    Busy,
    Offline,
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => f.write_str("available"),
            Self::Busy => f.write_str("busy"),
            Self::Offline => f.write_str("offline"),
        }
    }
}

/// A tracked mobile entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub location: Location,
    pub status: DriverStatus,
    #[serde(default)]
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_type: Option<String>,
    #[serde(default = "SystemTime::now")]
    pub updated_at: SystemTime,
}

impl Driver {
    /// Create a driver record stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        location: Location,
        status: DriverStatus,
        rating: f64,
        car_type: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            location,
            status,
            rating,
            car_type,
            updated_at: SystemTime::now(),
        }
    }
}

/// A search result row: the matched driver and its haversine distance from
/// the query point in kilometers.
#[derive(Debug, Clone, Serialize)]
pub struct DriverWithDistance {
    pub driver: Driver,
    pub distance: f64,
}

/// The entry the spatial indexes file for a driver: the id plus the
/// coordinates it was inserted under. Removal from the grid must use the
/// coordinates the entry was filed under, which is why the entry carries
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDriver {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
}

impl IndexedDriver {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
        }
    }
}

impl From<&Driver> for IndexedDriver {
    fn from(driver: &Driver) -> Self {
        Self::new(&driver.id, driver.location.lat, driver.location.lng)
    }
}
