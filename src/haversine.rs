//! Great-circle distance between geographic points.
//!
//! The result feeds the solver's search radius, so it uses the same mean
//! Earth radius as common web-mapping distance helpers.

use crate::geo::GeoPoint;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance between two points in kilometers.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    // Absolute deltas keep the result bit-for-bit symmetric.
    let delta_lat = (b.latitude - a.latitude).abs().to_radians();
    let delta_lng = (b.longitude - a.longitude).abs().to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
