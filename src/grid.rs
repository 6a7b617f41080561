//! Uniform grid index with kilometer-calibrated cells.
//!
//! Cell keys are derived from a latitude step of `s / 111` degrees and a
//! longitude step of `s / (111 · cos lat)` degrees, anchored at the
//! reference box's south-west corner. The longitudinal step depends on the
//! *point's* latitude, so a driver crossing a latitude band can land in a
//! different column at the same longitude. Removal therefore recomputes
//! the key from the coordinates the entry was filed under, which the caller
//! must supply.
//!
//! Locking is two-level: a readers-writer lock on the cell table (creation
//! and lookup) and one per cell on its driver map. The outer lock is taken
//! before the inner one and is never held across blocking work.

use crate::geo::{km_to_lat_deg, km_to_lng_deg, BoundingBox};
use crate::model::IndexedDriver;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::sync::Arc;

/// Grid coordinates of a cell. Rows grow northward from the reference
/// box's `min_lat`, columns eastward from `min_lng`; both can go negative
/// for points outside the reference box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub row: i64,
    pub col: i64,
}

#[derive(Default)]
struct GridCell {
    drivers: RwLock<FxHashMap<String, IndexedDriver>>,
}

/// Counters reported by [`GridIndex::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct GridStats {
    pub total_cells: usize,
    pub total_drivers: usize,
    pub cell_size_km: f64,
}

/// Uniform-cell hash grid supporting insert, remove, and radius scans.
pub struct GridIndex {
    cells: RwLock<FxHashMap<CellKey, Arc<GridCell>>>,
    cell_size_km: f64,
    origin: BoundingBox,
}

impl GridIndex {
    /// Create a grid anchored at `bounds` with cells of `cell_size_km`.
    pub fn new(bounds: BoundingBox, cell_size_km: f64) -> Self {
        Self {
            cells: RwLock::new(FxHashMap::default()),
            cell_size_km,
            origin: bounds,
        }
    }

    /// The cell a point files under. Points exactly on a cell boundary go
    /// to the higher-numbered cell (plain `floor`).
    pub fn cell_key(&self, lat: f64, lng: f64) -> CellKey {
        let lat_step = km_to_lat_deg(self.cell_size_km);
        let lng_step = km_to_lng_deg(self.cell_size_km, lat);
        CellKey {
            row: ((lat - self.origin.min_lat()) / lat_step).floor() as i64,
            col: ((lng - self.origin.min_lng()) / lng_step).floor() as i64,
        }
    }

    /// File an entry under the cell computed from its coordinates, lazily
    /// creating the cell. A duplicate id within the cell is overwritten.
    pub fn insert(&self, entry: &IndexedDriver) {
        let key = self.cell_key(entry.lat, entry.lng);
        let cell = {
            let mut cells = self.cells.write();
            Arc::clone(cells.entry(key).or_default())
        };
        cell.drivers.write().insert(entry.id.clone(), entry.clone());
    }

    /// Remove an entry, recomputing its cell from the *provided* (prior)
    /// coordinates. No-op when the cell or the id is absent.
    pub fn remove(&self, id: &str, old_lat: f64, old_lng: f64) {
        let key = self.cell_key(old_lat, old_lng);
        let cell = self.cells.read().get(&key).cloned();
        if let Some(cell) = cell {
            cell.drivers.write().remove(id);
        }
    }

    /// Candidate entries for a radius query: every entry in the
    /// `(2k+1)²` cell window around the query point, `k = ceil(r / s)`,
    /// deduplicated by id. Callers apply the exact distance filter.
    pub fn search_radius(&self, lat: f64, lng: f64, radius_km: f64) -> Vec<IndexedDriver> {
        let reach = (radius_km / self.cell_size_km).ceil() as i64;
        let center = self.cell_key(lat, lng);

        let mut seen = FxHashSet::default();
        let mut results = Vec::new();
        for row in (center.row - reach)..=(center.row + reach) {
            for col in (center.col - reach)..=(center.col + reach) {
                let cell = self.cells.read().get(&CellKey { row, col }).cloned();
                let Some(cell) = cell else { continue };
                for entry in cell.drivers.read().values() {
                    if seen.insert(entry.id.clone()) {
                        results.push(entry.clone());
                    }
                }
            }
        }
        results
    }

    pub fn stats(&self) -> GridStats {
        let cells = self.cells.read();
        let total_drivers = cells.values().map(|cell| cell.drivers.read().len()).sum();
        GridStats {
            total_cells: cells.len(),
            total_drivers,
            cell_size_km: self.cell_size_km,
        }
    }

    pub fn cell_size_km(&self) -> f64 {
        self.cell_size_km
    }

    pub fn len(&self) -> usize {
        self.stats().total_drivers
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::haversine_km;

    fn grid() -> GridIndex {
        GridIndex::new(BoundingBox::new(18.5, 19.1, 72.8, 73.0), 0.5)
    }

    fn entry(id: &str, lat: f64, lng: f64) -> IndexedDriver {
        IndexedDriver::new(id, lat, lng)
    }

    #[test]
    fn insert_and_find_within_radius() {
        let gi = grid();
        gi.insert(&entry("d1", 18.95, 72.85));
        gi.insert(&entry("d2", 18.96, 72.86));
        gi.insert(&entry("far", 19.05, 72.99));

        let candidates = gi.search_radius(18.95, 72.85, 2.0);
        let ids: Vec<_> = candidates.iter().map(|e| e.id.as_str()).collect();
        assert!(ids.contains(&"d1"));
        assert!(ids.contains(&"d2"));
        assert!(!ids.contains(&"far"));
    }

    #[test]
    fn candidates_are_a_superset_within_the_window() {
        // The window is cell-granular, so candidates may exceed the radius;
        // everything inside the radius must be present.
        let gi = grid();
        for i in 0..50 {
            let lat = 18.90 + (i as f64) * 0.002;
            gi.insert(&entry(&format!("d{i}"), lat, 72.90));
        }
        let candidates = gi.search_radius(18.95, 72.90, 1.0);
        for i in 0..50 {
            let lat = 18.90 + (i as f64) * 0.002;
            if haversine_km(18.95, 72.90, lat, 72.90) <= 1.0 {
                assert!(
                    candidates.iter().any(|e| e.id == format!("d{i}")),
                    "d{i} missing from candidate set"
                );
            }
        }
    }

    #[test]
    fn boundary_point_goes_to_higher_cell() {
        // A 27.75 km cell makes the latitude step exactly 0.25°, so the
        // boundary arithmetic is exact and `floor` sends the boundary point
        // to the higher-numbered row.
        let gi = GridIndex::new(BoundingBox::new(0.0, 10.0, 0.0, 10.0), 27.75);
        let on_boundary = gi.cell_key(0.5, 0.1);
        let just_below = gi.cell_key(0.5 - 1e-9, 0.1);
        assert_eq!(on_boundary.row, just_below.row + 1);
    }

    #[test]
    fn column_depends_on_latitude() {
        let gi = grid();
        // Same longitude, different latitude band: the lng step widens with
        // latitude, so the column differs even at constant lng. The effect
        // is small across a city box, so measure it across a wide band.
        let low = gi.cell_key(18.5, 72.95);
        let high = gi.cell_key(45.0, 72.95);
        assert_ne!(low.col, high.col);
        assert_ne!(low.row, high.row);
    }

    #[test]
    fn remove_uses_the_provided_coordinates() {
        let gi = grid();
        gi.insert(&entry("d1", 18.60, 72.85));

        // Removing with the wrong (new) coordinates must not find the entry.
        gi.remove("d1", 18.95, 72.95);
        assert_eq!(gi.len(), 1);

        gi.remove("d1", 18.60, 72.85);
        assert_eq!(gi.len(), 0);
        assert!(gi.search_radius(18.60, 72.85, 1.0).is_empty());
    }

    #[test]
    fn duplicate_id_overwrites_within_cell() {
        let gi = grid();
        gi.insert(&entry("d1", 18.601, 72.851));
        gi.insert(&entry("d1", 18.6011, 72.8511));
        assert_eq!(gi.len(), 1);
    }

    #[test]
    fn out_of_reference_box_points_are_accepted() {
        // The grid never refuses; rows and columns simply go negative.
        let gi = grid();
        gi.insert(&entry("west", 18.4, 72.7));
        let key = gi.cell_key(18.4, 72.7);
        assert!(key.row < 0);
        assert!(key.col < 0);
        let found = gi.search_radius(18.4, 72.7, 1.0);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn stats_count_cells_and_drivers() {
        let gi = grid();
        gi.insert(&entry("d1", 18.95, 72.85));
        gi.insert(&entry("d2", 18.95, 72.85));
        gi.insert(&entry("d3", 19.05, 72.99));
        let stats = gi.stats();
        assert_eq!(stats.total_drivers, 3);
        assert!(stats.total_cells >= 2);
        assert_eq!(stats.cell_size_km, 0.5);
    }
}
