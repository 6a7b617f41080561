//! Region router: maps a coordinate to a named region.
//!
//! Regions exist only to partition the external cache; membership is
//! advisory. Boxes may overlap, in which case the first registered match
//! wins; callers must not treat the returned name as identity.

use crate::geo::BoundingBox;
use parking_lot::RwLock;

/// A named bounding box.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    pub bbox: BoundingBox,
}

/// Registry of named regions. Writes happen at startup only; lookups take
/// a shared lock.
pub struct RegionRouter {
    regions: RwLock<Vec<Region>>,
}

impl RegionRouter {
    pub fn new() -> Self {
        Self {
            regions: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, name: impl Into<String>, bbox: BoundingBox) {
        self.regions.write().push(Region {
            name: name.into(),
            bbox,
        });
    }

    /// Name of the first registered region containing the point, if any.
    pub fn locate(&self, lat: f64, lng: f64) -> Option<String> {
        self.regions
            .read()
            .iter()
            .find(|region| region.bbox.contains(lat, lng))
            .map(|region| region.name.clone())
    }

    /// Names of all registered regions, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.regions
            .read()
            .iter()
            .map(|region| region.name.clone())
            .collect()
    }
}

impl Default for RegionRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixed city table seeded alongside the configured home region.
pub(crate) fn default_regions() -> [(&'static str, BoundingBox); 4] {
    [
        ("delhi", BoundingBox::new(28.3949, 28.8836, 76.8389, 77.3456)),
        ("bangalore", BoundingBox::new(12.8342, 13.1476, 77.4577, 77.7878)),
        ("hyderabad", BoundingBox::new(17.2403, 17.6868, 78.1636, 78.6569)),
        ("chennai", BoundingBox::new(12.7948, 13.2402, 80.0889, 80.3044)),
    ]
}
