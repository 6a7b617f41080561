//! Geometry primitives: great-circle distance, km↔degree window sizing, and
//! the bounding box used by both spatial indexes.
//!
//! The km→degree conversions are deliberately simple equirectangular
//! approximations used only to size search windows. Below |lat| < 60° they
//! over-estimate, which is the safe direction: the window may admit false
//! positives, and those are removed by the exact haversine check. Final
//! acceptance is always haversine.

use serde::{Deserialize, Serialize};

/// Earth radius in kilometers for haversine distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers spanned by one degree of latitude (and of longitude at the
/// equator) in the window-sizing approximation.
const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance between two points in kilometers.
///
/// Inputs are decimal degrees; the computation is in radians. The result is
/// non-negative, symmetric, and zero iff the inputs are equal mod 360°.
///
/// # Examples
///
/// ```
/// use geofleet::geo::haversine_km;
///
/// let d = haversine_km(18.9220, 72.8347, 18.9220, 72.8347);
/// assert_eq!(d, 0.0);
/// ```
#[inline]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Degrees of latitude spanned by `km` kilometers.
#[inline]
pub fn km_to_lat_deg(km: f64) -> f64 {
    km / KM_PER_DEGREE
}

/// Degrees of longitude spanned by `km` kilometers at latitude `lat`.
#[inline]
pub fn km_to_lng_deg(km: f64, lat: f64) -> f64 {
    km / (KM_PER_DEGREE * (lat.to_radians()).cos())
}

/// A closed rectangle `[min_lat, max_lat] × [min_lng, max_lng]`.
///
/// Backed by a `geo::Rect` with x = longitude and y = latitude. Containment
/// and intersection are inclusive on all edges. There is no wrap-around
/// across the antimeridian or the poles: the registry assumes bounded
/// city-scale regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    rect: geo::Rect,
}

impl BoundingBox {
    /// Create a bounding box from latitude and longitude extents.
    ///
    /// # Examples
    ///
    /// ```
    /// use geofleet::geo::BoundingBox;
    ///
    /// let mumbai = BoundingBox::new(18.5204, 19.0760, 72.8777, 72.9982);
    /// assert!(mumbai.contains(18.95, 72.90));
    /// ```
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            rect: geo::Rect::new(
                geo::coord! { x: min_lng, y: min_lat },
                geo::coord! { x: max_lng, y: max_lat },
            ),
        }
    }

    pub fn min_lat(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_lat(&self) -> f64 {
        self.rect.max().y
    }

    pub fn min_lng(&self) -> f64 {
        self.rect.min().x
    }

    pub fn max_lng(&self) -> f64 {
        self.rect.max().x
    }

    /// Midpoint `(mid_lat, mid_lng)` of the box.
    pub fn center(&self) -> (f64, f64) {
        let c = self.rect.center();
        (c.y, c.x)
    }

    /// Whether the point lies inside the box, inclusive on all edges.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat() && lat <= self.max_lat() && lng >= self.min_lng() && lng <= self.max_lng()
    }

    /// Whether the two boxes overlap, inclusive: touching edges intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(other.min_lat() > self.max_lat()
            || other.max_lat() < self.min_lat()
            || other.min_lng() > self.max_lng()
            || other.max_lng() < self.min_lng())
    }
}
