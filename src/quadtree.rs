//! Point quadtree over driver positions.
//!
//! Nodes split at their box midpoint once a leaf exceeds [`MAX_CAPACITY`]
//! entries, down to [`MAX_DEPTH`] levels; leaves at the depth cap grow
//! unbounded and degrade to a linear scan. Radius queries prune on an
//! equirectangular over-approximation of the radius and accept on exact
//! haversine distance, so the result has no false positives and no false
//! negatives.
//!
//! The whole tree sits behind one readers-writer lock. Coarse, but index
//! operations are bounded CPU work and the workload is read-heavy; sub-tree
//! locking is a permitted optimization that has not been needed.

use crate::geo::{haversine_km, km_to_lat_deg, km_to_lng_deg, BoundingBox};
use crate::model::IndexedDriver;
use parking_lot::RwLock;

/// Leaf capacity before a node subdivides.
pub const MAX_CAPACITY: usize = 50;

/// Maximum subdivision depth; leaves at this depth accept overflow.
pub const MAX_DEPTH: usize = 8;

#[derive(Debug)]
struct QuadNode {
    bounds: BoundingBox,
    depth: usize,
    entries: Vec<IndexedDriver>,
    /// NW, NE, SW, SE once divided.
    children: Option<Box<[QuadNode; 4]>>,
}

impl QuadNode {
    fn new(bounds: BoundingBox, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, entry: &IndexedDriver) -> bool {
        if !self.bounds.contains(entry.lat, entry.lng) {
            return false;
        }

        if self.children.is_none() {
            // Append while under capacity; at the depth cap the leaf is
            // allowed to grow past capacity instead of splitting.
            if self.entries.len() < MAX_CAPACITY || self.depth >= MAX_DEPTH {
                self.entries.push(entry.clone());
                return true;
            }
            self.subdivide();
        }

        self.insert_into_children(entry)
    }

    /// Children are tried in NW, NE, SW, SE order; with inclusive `contains`
    /// on every child box, the first accepting child claims points that sit
    /// exactly on the midpoint line, so an entry lands in at most one leaf.
    fn insert_into_children(&mut self, entry: &IndexedDriver) -> bool {
        let children = self
            .children
            .as_deref_mut()
            .expect("insert_into_children on an undivided node");
        children.iter_mut().any(|child| child.insert(entry))
    }

    fn subdivide(&mut self) {
        let (mid_lat, mid_lng) = self.bounds.center();
        let depth = self.depth + 1;
        let (min_lat, max_lat) = (self.bounds.min_lat(), self.bounds.max_lat());
        let (min_lng, max_lng) = (self.bounds.min_lng(), self.bounds.max_lng());

        self.children = Some(Box::new([
            QuadNode::new(BoundingBox::new(mid_lat, max_lat, min_lng, mid_lng), depth),
            QuadNode::new(BoundingBox::new(mid_lat, max_lat, mid_lng, max_lng), depth),
            QuadNode::new(BoundingBox::new(min_lat, mid_lat, min_lng, mid_lng), depth),
            QuadNode::new(BoundingBox::new(min_lat, mid_lat, mid_lng, max_lng), depth),
        ]));

        let entries = std::mem::take(&mut self.entries);
        for entry in &entries {
            self.insert_into_children(entry);
        }
    }

    fn collect_in_window(&self, window: &BoundingBox, out: &mut Vec<IndexedDriver>) {
        if !self.bounds.intersects(window) {
            return;
        }
        match &self.children {
            None => {
                for entry in &self.entries {
                    if window.contains(entry.lat, entry.lng) {
                        out.push(entry.clone());
                    }
                }
            }
            Some(children) => {
                for child in children.iter() {
                    child.collect_in_window(window, out);
                }
            }
        }
    }

    /// Pre-order search, removing the first occurrence only. Emptied
    /// branches are left in place; the rebuild path reclaims them.
    fn remove(&mut self, id: &str) -> bool {
        match &mut self.children {
            None => {
                if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
                    self.entries.remove(pos);
                    true
                } else {
                    false
                }
            }
            Some(children) => children.iter_mut().any(|child| child.remove(id)),
        }
    }

    fn count(&self) -> usize {
        match &self.children {
            None => self.entries.len(),
            Some(children) => children.iter().map(QuadNode::count).sum(),
        }
    }
}

/// Capacity-and-depth splitting point quadtree with bounding-box pruning.
pub struct QuadTree {
    root: RwLock<QuadNode>,
}

impl QuadTree {
    /// Create a tree covering the given root box. Points outside it are
    /// refused by [`insert`](Self::insert).
    pub fn new(bounds: BoundingBox) -> Self {
        Self {
            root: RwLock::new(QuadNode::new(bounds, 0)),
        }
    }

    /// Insert an entry. Returns `false` iff the location lies outside the
    /// root box.
    pub fn insert(&self, entry: &IndexedDriver) -> bool {
        self.root.write().insert(entry)
    }

    /// Remove the first entry with the given id in pre-order. Returns
    /// whether anything was removed.
    pub fn remove(&self, id: &str) -> bool {
        self.root.write().remove(id)
    }

    /// Every indexed entry within `radius_km` of the query point, by exact
    /// haversine distance.
    pub fn search_radius(&self, lat: f64, lng: f64, radius_km: f64) -> Vec<IndexedDriver> {
        let lat_delta = km_to_lat_deg(radius_km);
        let lng_delta = km_to_lng_deg(radius_km, lat);
        let window = BoundingBox::new(
            lat - lat_delta,
            lat + lat_delta,
            lng - lng_delta,
            lng + lng_delta,
        );

        let mut candidates = Vec::new();
        self.root.read().collect_in_window(&window, &mut candidates);
        candidates.retain(|e| haversine_km(lat, lng, e.lat, e.lng) <= radius_km);
        candidates
    }

    /// Number of entries currently indexed.
    pub fn len(&self) -> usize {
        self.root.read().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The root box this tree covers.
    pub fn bounds(&self) -> BoundingBox {
        self.root.read().bounds.clone()
    }
}
