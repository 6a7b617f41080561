//! Live geospatial registry of drivers with comparable radius indexes.
//!
//! The registry keeps a canonical driver table and mirrors every position
//! into a point quadtree and a uniform grid (plus an optional Redis-backed
//! geospatial cache), so the same radius query can be answered, and timed,
//! by each index over identical data.
//!
//! ```rust
//! use geofleet::{BoundingBox, IndexedDriver, QuadTree};
//!
//! let tree = QuadTree::new(BoundingBox::new(18.5, 19.1, 72.8, 73.0));
//! tree.insert(&IndexedDriver::new("d1", 18.95, 72.85));
//! tree.insert(&IndexedDriver::new("d2", 18.97, 72.87));
//!
//! let nearby = tree.search_radius(18.95, 72.85, 5.0);
//! assert_eq!(nearby.len(), 2);
//! ```
//!
//! The full orchestration (status filtering, distance sorting, cache
//! mirroring, cross-index comparison) lives in
//! [`DriverManager`](manager::DriverManager).

pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod grid;
pub mod manager;
pub mod model;
pub mod quadtree;
pub mod region;

pub use cache::{CacheStats, GeoCache};
pub use config::Config;
pub use error::{FleetError, Result};
pub use geo::{haversine_km, km_to_lat_deg, km_to_lng_deg, BoundingBox, EARTH_RADIUS_KM};
pub use grid::{GridIndex, GridStats};
pub use manager::{ComparisonReport, DriverManager, IndexKind, IndexTiming, StatsReport};
pub use model::{Driver, DriverStatus, DriverWithDistance, IndexedDriver, Location};
pub use quadtree::{QuadTree, MAX_CAPACITY, MAX_DEPTH};
pub use region::{Region, RegionRouter};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        BoundingBox, Config, Driver, DriverManager, DriverStatus, DriverWithDistance, FleetError,
        IndexKind, Location, Result,
    };
}
