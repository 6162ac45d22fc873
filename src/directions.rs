//! HTTP adapter for per-leg driving directions.
//!
//! Speaks the OSRM `route` service format, which Mapbox Directions shares:
//! `{base_url}/{profile}/{lng},{lat};{lng},{lat}?geometries=geojson`.

use serde::Deserialize;
use tracing::debug;

use crate::error::RouteError;
use crate::geo::LegRequest;
use crate::polyline::Polyline;
use crate::traits::LegDirections;

const ENDPOINT: &str = "directions";

#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    /// Service prefix up to the profile, e.g. `http://localhost:5000/route/v1`
    /// for OSRM or `https://api.mapbox.com/directions/v5` for Mapbox.
    pub base_url: String,
    pub profile: String,
    /// Appended as `access_token` when set. Not needed for a self-hosted OSRM.
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/route/v1".to_string(),
            profile: "driving".to_string(),
            access_token: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectionsClient {
    config: DirectionsConfig,
    client: reqwest::Client,
}

impl DirectionsClient {
    pub fn new(config: DirectionsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn leg_url(&self, leg: &LegRequest) -> String {
        let mut url = format!(
            "{}/{}/{:.6},{:.6};{:.6},{:.6}?geometries=geojson&overview=full",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            leg.origin.longitude,
            leg.origin.latitude,
            leg.destination.longitude,
            leg.destination.latitude,
        );
        if let Some(token) = &self.config.access_token {
            url.push_str("&access_token=");
            url.push_str(token);
        }
        url
    }
}

impl LegDirections for DirectionsClient {
    async fn request_leg(&self, leg: LegRequest) -> Result<Polyline, RouteError> {
        let response = self
            .client
            .get(self.leg_url(&leg))
            .send()
            .await
            .map_err(|err| RouteError::transport(ENDPOINT, err))?;
        let status_error = response.error_for_status_ref().err();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RouteError::transport(ENDPOINT, err))?;

        if let Some(err) = status_error {
            // OSRM reports unreachable legs as a 400 with code "NoRoute".
            if is_no_route(&bytes) {
                debug!("no route between leg endpoints");
                return Ok(Polyline::default());
            }
            return Err(RouteError::transport(ENDPOINT, err));
        }

        let geometry = parse_first_route(&bytes)?;
        debug!(points = geometry.len(), "received leg geometry");
        Ok(geometry)
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    routes: Vec<RouteChoice>,
}

#[derive(Debug, Deserialize)]
struct RouteChoice {
    geometry: RouteGeometry,
}

#[derive(Debug, Deserialize)]
struct RouteGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
}

fn is_no_route(body: &[u8]) -> bool {
    serde_json::from_slice::<ErrorBody>(body)
        .map(|body| body.code == "NoRoute")
        .unwrap_or(false)
}

/// Geometry of the first route choice. No routes, or a "NoRoute" body
/// without a `routes` field, means an empty leg.
fn parse_first_route(body: &[u8]) -> Result<Polyline, RouteError> {
    let response: RouteResponse = match serde_json::from_slice(body) {
        Ok(response) => response,
        Err(_) if is_no_route(body) => return Ok(Polyline::default()),
        Err(err) => return Err(RouteError::malformed(ENDPOINT, err.to_string())),
    };

    Ok(response
        .routes
        .first()
        .map(|route| Polyline::from_lng_lat(&route.geometry.coordinates))
        .unwrap_or_default())
}
