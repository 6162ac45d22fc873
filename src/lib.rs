//! route-composer
//!
//! Orders points of interest through a remote solver and reveals the driving
//! route between them leg by leg on an interactive map.

pub mod geo;
pub mod error;
pub mod haversine;
pub mod viewport;
pub mod traits;
pub mod solver;
pub mod directions;
pub mod polyline;
pub mod accumulator;
pub mod animation;
pub mod session;

pub use error::RouteError;
pub use geo::{BoundingBox, CaptureArea, GeoPoint, LegRequest, Waypoint};
