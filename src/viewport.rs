//! Search radius derived from the visible map area.

use crate::geo::{BoundingBox, CaptureArea, GeoPoint};
use crate::haversine::distance_km;
use crate::traits::MapSurface;

/// Radius that reaches the farthest visible corner from `center`.
///
/// Returns 0 when there is no viewport yet.
pub fn estimate_radius_km(viewport: Option<&BoundingBox>, center: GeoPoint) -> f64 {
    match viewport {
        Some(bounds) => {
            distance_km(center, bounds.southwest).max(distance_km(center, bounds.northeast))
        }
        None => 0.0,
    }
}

/// Capture area for the surface's current viewport.
pub fn capture_area<M: MapSurface + ?Sized>(surface: &M) -> CaptureArea {
    let bounds = surface.viewport_bounds();
    let center = surface
        .viewport_center()
        .or_else(|| bounds.map(|b| b.center()))
        .unwrap_or(GeoPoint::new(0.0, 0.0));

    CaptureArea::new(center, estimate_radius_km(bounds.as_ref(), center))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> BoundingBox {
        BoundingBox::new(GeoPoint::new(-1.0, 50.0), GeoPoint::new(1.0, 53.0))
    }

    #[test]
    fn test_no_viewport_is_zero() {
        assert_eq!(estimate_radius_km(None, GeoPoint::new(0.0, 51.5)), 0.0);
    }

    #[test]
    fn test_radius_is_farthest_corner() {
        let bounds = viewport();
        let centers = [
            GeoPoint::new(0.0, 51.5),
            GeoPoint::new(-0.9, 50.1),
            GeoPoint::new(0.8, 52.9),
            bounds.southwest,
        ];
        for center in centers {
            let radius = estimate_radius_km(Some(&bounds), center);
            let sw = distance_km(center, bounds.southwest);
            let ne = distance_km(center, bounds.northeast);
            assert!(radius >= 0.0);
            assert_eq!(radius, sw.max(ne));
        }
    }

    #[test]
    fn test_off_center_takes_larger_corner() {
        let bounds = viewport();
        let near_sw = GeoPoint::new(-0.9, 50.1);
        let radius = estimate_radius_km(Some(&bounds), near_sw);
        assert_eq!(radius, distance_km(near_sw, bounds.northeast));
    }
}
