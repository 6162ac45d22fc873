//! Polyline representation for leg geometries.
//!
//! Provider-specific encodings (GeoJSON `[lng, lat]` arrays) are decoded at
//! the directions boundary; everything past it works on `GeoPoint`s.

use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, GeoPoint};

/// A leg geometry as an ordered sequence of points. May be empty when the
/// provider found no drivable path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Decodes GeoJSON `[longitude, latitude]` coordinate pairs.
    pub fn from_lng_lat(coordinates: &[[f64; 2]]) -> Self {
        Self {
            points: coordinates
                .iter()
                .map(|[lng, lat]| GeoPoint::new(*lng, *lat))
                .collect(),
        }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }
}
