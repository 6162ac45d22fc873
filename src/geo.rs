//! Geographic value types shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// A longitude/latitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Builds a point, rejecting non-finite or out-of-range coordinates.
    pub fn checked(longitude: f64, latitude: f64) -> Result<Self, RouteError> {
        let point = Self::new(longitude, latitude);
        point.validate()?;
        Ok(point)
    }

    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(RouteError::degenerate(format!(
                "coordinate out of range: lng={}, lat={}",
                self.longitude, self.latitude
            )))
        }
    }
}

/// Axis-aligned box in degrees. Viewports crossing the antimeridian are not
/// represented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub southwest: GeoPoint,
    pub northeast: GeoPoint,
}

impl BoundingBox {
    pub fn new(southwest: GeoPoint, northeast: GeoPoint) -> Self {
        Self {
            southwest,
            northeast,
        }
    }

    /// Tight box around `points`, or `None` when there are no points.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut southwest = *first;
        let mut northeast = *first;

        for point in iter {
            southwest.longitude = southwest.longitude.min(point.longitude);
            southwest.latitude = southwest.latitude.min(point.latitude);
            northeast.longitude = northeast.longitude.max(point.longitude);
            northeast.latitude = northeast.latitude.max(point.latitude);
        }

        Some(Self {
            southwest,
            northeast,
        })
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.southwest.longitude + self.northeast.longitude) / 2.0,
            (self.southwest.latitude + self.northeast.latitude) / 2.0,
        )
    }
}

/// Search area handed to the solver: a center and the radius that covers the
/// visible map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureArea {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl CaptureArea {
    pub fn new(center: GeoPoint, radius_km: f64) -> Self {
        Self { center, radius_km }
    }
}

/// A stop returned by the solver. The sequence order is the visiting order.
pub type Waypoint = GeoPoint;

/// One origin/destination pair between consecutive waypoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}

impl LegRequest {
    pub fn new(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin,
            destination,
        }
    }
}

/// Legs between consecutive waypoints: `n` waypoints give `n - 1` legs.
pub fn legs(waypoints: &[Waypoint]) -> impl Iterator<Item = LegRequest> + '_ {
    waypoints
        .windows(2)
        .map(|pair| LegRequest::new(pair[0], pair[1]))
}
