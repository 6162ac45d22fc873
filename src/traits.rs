//! Seams to the pipeline's external collaborators.
//!
//! The solver and directions provider are remote services; the map surface is
//! whatever widget hosts the route. Hosts implement these for their own
//! clients, and tests implement them with in-memory fakes.

use std::future::Future;

use crate::error::RouteError;
use crate::geo::{BoundingBox, CaptureArea, GeoPoint, LegRequest, Waypoint};
use crate::polyline::Polyline;

/// Produces a visiting order for the points of interest around an area.
pub trait WaypointOrderer {
    fn request_order(
        &self,
        area: &CaptureArea,
        starting_point: Option<GeoPoint>,
    ) -> impl Future<Output = Result<Vec<Waypoint>, RouteError>>;
}

/// Produces the driving path for a single leg.
///
/// An empty polyline means "no route found" and is not an error.
pub trait LegDirections {
    fn request_leg(&self, leg: LegRequest) -> impl Future<Output = Result<Polyline, RouteError>>;
}

/// The map widget the route is drawn on.
///
/// Methods take `&self`: map handles are shared with the host UI and manage
/// their own interior state.
pub trait MapSurface {
    /// Visible area, or `None` before the map is initialized.
    fn viewport_bounds(&self) -> Option<BoundingBox>;

    fn viewport_center(&self) -> Option<GeoPoint>;

    /// Replaces the route line layer.
    fn set_route_layer_data(&self, path: &[GeoPoint]);

    fn fit_viewport_to(&self, bounds: BoundingBox, padding_px: u32);

    /// Replaces the waypoint markers.
    fn set_markers(&self, markers: &[GeoPoint]);

    /// Shows a failure the user needs to see, e.g. the solver being down.
    fn show_failure(&self, message: &str);
}

/// Notifications from the map's event source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// The user picked a starting point.
    Clicked(GeoPoint),
    /// The user asked to plan a route for the visible area.
    CaptureRequested,
    /// Pan/zoom finished.
    ViewportSettled,
}

impl MapEvent {
    /// Whether this event starts a new route session. Clicks outside valid
    /// coordinates (e.g. on a wrapped copy of the world) do not.
    pub fn starts_session(&self) -> bool {
        match self {
            MapEvent::Clicked(point) => point.is_valid(),
            MapEvent::CaptureRequested => true,
            MapEvent::ViewportSettled => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_valid_clicks_and_captures_start_sessions() {
        assert!(MapEvent::Clicked(GeoPoint::new(-0.1, 51.5)).starts_session());
        assert!(MapEvent::CaptureRequested.starts_session());
        assert!(!MapEvent::ViewportSettled.starts_session());
        assert!(!MapEvent::Clicked(GeoPoint::new(200.0, 51.5)).starts_session());
        assert!(!MapEvent::Clicked(GeoPoint::new(f64::NAN, 0.0)).starts_session());
    }
}
