//! Stitches leg geometries into one growing route.

use crate::geo::{BoundingBox, GeoPoint};
use crate::polyline::Polyline;

/// The accumulated path of one route session.
///
/// Legs are concatenated in the order they are appended; the route only
/// shrinks through [`RouteAccumulator::reset`].
#[derive(Debug, Clone, Default)]
pub struct RouteAccumulator {
    route: Vec<GeoPoint>,
}

impl RouteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.route.clear();
    }

    pub fn append_leg(&mut self, geometry: &Polyline) {
        self.route.extend_from_slice(geometry.points());
    }

    /// Snapshot of the route drawn so far.
    pub fn current(&self) -> &[GeoPoint] {
        &self.route
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.route)
    }

    pub fn len(&self) -> usize {
        self.route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }
}
