//! HTTP adapter for the waypoint-ordering solver.
//!
//! The solver takes a search center and radius and answers with the points of
//! interest in visiting order. All numbers travel as decimal strings.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RouteError;
use crate::geo::{CaptureArea, GeoPoint, Waypoint};
use crate::traits::WaypointOrderer;

const ENDPOINT: &str = "solver";

#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Full URL of the ordering endpoint.
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/tsp".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolverClient {
    config: SolverConfig,
    client: reqwest::Client,
}

impl SolverClient {
    pub fn new(config: SolverConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl WaypointOrderer for SolverClient {
    async fn request_order(
        &self,
        area: &CaptureArea,
        starting_point: Option<GeoPoint>,
    ) -> Result<Vec<Waypoint>, RouteError> {
        let body = SolverRequest::new(area, starting_point)?;
        debug!(
            lat = %body.lat,
            long = %body.long,
            radius = %body.radius,
            "requesting waypoint order"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| RouteError::transport(ENDPOINT, err))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RouteError::transport(ENDPOINT, err))?;

        let waypoints = parse_ordered_locations(&bytes)?;
        debug!(count = waypoints.len(), "received waypoint order");
        Ok(waypoints)
    }
}

#[derive(Debug, Serialize)]
struct SolverRequest {
    lat: String,
    long: String,
    radius: String,
}

impl SolverRequest {
    /// The search is centered on the starting point when there is one.
    fn new(area: &CaptureArea, starting_point: Option<GeoPoint>) -> Result<Self, RouteError> {
        let center = starting_point.unwrap_or(area.center);
        center.validate()?;
        if !area.radius_km.is_finite() || area.radius_km < 0.0 {
            return Err(RouteError::degenerate(format!(
                "search radius must be a non-negative number, got {}",
                area.radius_km
            )));
        }

        Ok(Self {
            lat: center.latitude.to_string(),
            long: center.longitude.to_string(),
            radius: area.radius_km.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SolverResponse {
    ordered_locations: Vec<WireLocation>,
}

#[derive(Debug, Deserialize)]
struct WireLocation {
    lat: WireNumber,
    long: WireNumber,
}

/// Coordinates are documented as strings; bare JSON numbers are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Text(String),
    Number(f64),
}

impl WireNumber {
    fn parse(&self, field: &str) -> Result<f64, RouteError> {
        let value = match self {
            WireNumber::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                RouteError::malformed(ENDPOINT, format!("{field} is not a number: {text:?}"))
            })?,
            WireNumber::Number(value) => *value,
        };
        Ok(value)
    }
}

fn parse_ordered_locations(body: &[u8]) -> Result<Vec<Waypoint>, RouteError> {
    let response: SolverResponse =
        serde_json::from_slice(body).map_err(|err| RouteError::malformed(ENDPOINT, err.to_string()))?;

    response
        .ordered_locations
        .iter()
        .enumerate()
        .map(|(index, location)| {
            GeoPoint::checked(location.long.parse("long")?, location.lat.parse("lat")?).map_err(|_| {
                RouteError::malformed(ENDPOINT, format!("ordered_locations[{index}] is out of range"))
            })
        })
        .collect()
}
