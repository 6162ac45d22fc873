//! Route sessions and the event-driven driver that runs them.
//!
//! A session is one attempt to order and draw a route for a capture area and
//! starting point. Sessions are numbered by a shared generation counter;
//! beginning a new one makes every older token stale, and stale work is
//! dropped as soon as it is noticed. The driver maps map events onto the
//! `Idle -> AwaitingOrder -> Animating -> (Idle | Cancelled)` lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::animation::{RouteAnimationController, RunOutcome};
use crate::error::RouteError;
use crate::geo::{CaptureArea, GeoPoint, Waypoint};
use crate::traits::{LegDirections, MapEvent, MapSurface, WaypointOrderer};
use crate::viewport::{capture_area, estimate_radius_km};

/// Shared generation counter. Clones observe the same counter.
#[derive(Debug, Clone, Default)]
pub struct SessionGenerations {
    current: Arc<AtomicU64>,
}

impl SessionGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation, invalidating all outstanding tokens.
    pub fn begin(&self) -> SessionToken {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        SessionToken {
            generation,
            current: Arc::clone(&self.current),
        }
    }

    /// Invalidates all outstanding tokens without starting a session.
    pub fn cancel(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct SessionToken {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl SessionToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

/// One ordered waypoint list being drawn, with the index of the next leg.
#[derive(Debug, Clone)]
pub struct RouteSession {
    token: SessionToken,
    waypoints: Vec<Waypoint>,
    cursor: usize,
}

impl RouteSession {
    pub fn new(token: SessionToken, waypoints: Vec<Waypoint>) -> Self {
        Self {
            token,
            waypoints,
            cursor: 0,
        }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn leg_count(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    /// Index of the next leg to apply.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    AwaitingOrder,
    Animating,
    Cancelled,
    /// The solver could not produce an order; shown to the user.
    Failed { reason: String },
}

/// Bounded retry with exponential backoff for solver requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between legs while the route is revealed.
    pub step_delay: Duration,
    /// Padding used when fitting the viewport to the route.
    pub fit_padding_px: u32,
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(500),
            fit_padding_px: 50,
            retry: RetryPolicy::default(),
        }
    }
}

/// Runs route sessions for map events.
pub struct RouteSessionDriver<O, D, M> {
    orderer: O,
    controller: RouteAnimationController<D>,
    surface: M,
    config: SessionConfig,
    generations: SessionGenerations,
    state: SessionState,
    starting_point: Option<GeoPoint>,
    area: Option<CaptureArea>,
}

impl<O, D, M> RouteSessionDriver<O, D, M>
where
    O: WaypointOrderer,
    D: LegDirections,
    M: MapSurface,
{
    pub fn new(orderer: O, directions: D, surface: M, config: SessionConfig) -> Self {
        Self {
            orderer,
            controller: RouteAnimationController::new(directions),
            surface,
            config,
            generations: SessionGenerations::new(),
            state: SessionState::Idle,
            starting_point: None,
            area: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn starting_point(&self) -> Option<GeoPoint> {
        self.starting_point
    }

    /// Search area from the last viewport refresh.
    pub fn area(&self) -> Option<CaptureArea> {
        self.area
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn orderer(&self) -> &O {
        &self.orderer
    }

    pub fn directions(&self) -> &D {
        self.controller.directions()
    }

    pub fn generations(&self) -> &SessionGenerations {
        &self.generations
    }

    /// Applies an event and returns the area to order when it starts a
    /// session.
    pub fn handle_event(&mut self, event: MapEvent) -> Option<CaptureArea> {
        match event {
            MapEvent::ViewportSettled => {
                self.refresh_area();
                None
            }
            MapEvent::Clicked(point) => {
                if !point.is_valid() {
                    warn!(?point, "ignoring click outside valid coordinates");
                    return None;
                }
                info!(
                    longitude = point.longitude,
                    latitude = point.latitude,
                    "starting point selected"
                );
                self.starting_point = Some(point);
                Some(self.refresh_area())
            }
            MapEvent::CaptureRequested => Some(self.refresh_area()),
        }
    }

    /// Invalidates the running session, if any.
    pub fn cancel(&mut self) {
        self.generations.cancel();
        if matches!(self.state, SessionState::AwaitingOrder | SessionState::Animating) {
            self.state = SessionState::Cancelled;
        }
    }

    /// Orders and draws one route, returning the state it settled in.
    pub async fn run_session(&mut self, area: CaptureArea) -> SessionState {
        let token = self.generations.begin();
        let generation = token.generation();
        info!(
            generation,
            radius_km = area.radius_km,
            "route session started"
        );

        self.state = SessionState::AwaitingOrder;
        self.surface.set_route_layer_data(&[]);
        self.surface.set_markers(&[]);

        let waypoints = match self.request_order_with_retry(&area, &token).await {
            Ok(Some(waypoints)) => waypoints,
            Ok(None) => {
                self.state = SessionState::Cancelled;
                return self.state.clone();
            }
            Err(err) => {
                warn!(generation, error = %err, "waypoint ordering failed");
                self.surface
                    .show_failure(&format!("Could not plan a route: {err}"));
                self.state = SessionState::Failed {
                    reason: err.to_string(),
                };
                return self.state.clone();
            }
        };

        let markers: Vec<GeoPoint> = waypoints
            .iter()
            .copied()
            .filter(|waypoint| Some(*waypoint) != self.starting_point)
            .collect();
        self.surface.set_markers(&markers);

        let mut session = RouteSession::new(token, waypoints);
        if session.leg_count() == 0 {
            debug!(
                generation,
                waypoints = session.waypoints().len(),
                "solver returned fewer than two waypoints"
            );
            self.state = SessionState::Idle;
            return self.state.clone();
        }

        self.state = SessionState::Animating;
        let surface = &self.surface;
        let padding = self.config.fit_padding_px;
        let outcome = self
            .controller
            .run(
                &mut session,
                self.config.step_delay,
                |route| surface.set_route_layer_data(route),
                |bounds| surface.fit_viewport_to(bounds, padding),
            )
            .await;

        self.state = match outcome {
            RunOutcome::Cancelled { .. } => SessionState::Cancelled,
            RunOutcome::NothingToDraw | RunOutcome::Completed { .. } => SessionState::Idle,
        };
        self.state.clone()
    }

    /// Processes map events until the channel closes.
    ///
    /// A valid click or a capture that arrives while a session is running
    /// drops that session and starts a new one; invalid clicks are ignored.
    /// Viewport-settled events during a session are folded into a single
    /// refresh once it ends, since fitting the viewport to the route
    /// produces them.
    pub async fn drive(&mut self, events: &mut mpsc::Receiver<MapEvent>) {
        let mut next = events.recv().await;

        while let Some(event) = next.take() {
            let Some(area) = self.handle_event(event) else {
                next = events.recv().await;
                continue;
            };

            let mut closed = false;
            let mut settled = false;
            let preempted = {
                let session = self.run_session(area);
                tokio::pin!(session);
                loop {
                    tokio::select! {
                        biased;
                        _ = &mut session => break None,
                        incoming = events.recv(), if !closed => match incoming {
                            Some(MapEvent::ViewportSettled) => settled = true,
                            Some(event) if event.starts_session() => break Some(event),
                            Some(event) => warn!(?event, "ignoring event during route session"),
                            None => closed = true,
                        },
                    }
                }
            };

            if settled {
                self.refresh_area();
            }

            match preempted {
                Some(event) => {
                    debug!("route session preempted by a new event");
                    self.cancel();
                    next = Some(event);
                }
                None if closed => break,
                None => next = events.recv().await,
            }
        }
    }

    /// Requests the order, retrying transport failures. `Ok(None)` means the
    /// session went stale while waiting.
    async fn request_order_with_retry(
        &self,
        area: &CaptureArea,
        token: &SessionToken,
    ) -> Result<Option<Vec<Waypoint>>, RouteError> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = self.orderer.request_order(area, self.starting_point).await;
            if !token.is_current() {
                return Ok(None);
            }

            match result {
                Ok(waypoints) => return Ok(Some(waypoints)),
                Err(err) if err.is_transport() && attempt < max_attempts => {
                    let backoff = self.config.retry.backoff(attempt);
                    warn!(
                        generation = token.generation(),
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "retrying waypoint order"
                    );
                    tokio::time::sleep(backoff).await;
                    if !token.is_current() {
                        return Ok(None);
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Search area for the current viewport. With a starting point the area
    /// is centered on it, and the radius still reaches the farthest visible
    /// corner from there.
    fn refresh_area(&mut self) -> CaptureArea {
        let area = match self.starting_point {
            Some(start) => CaptureArea::new(
                start,
                estimate_radius_km(self.surface.viewport_bounds().as_ref(), start),
            ),
            None => capture_area(&self.surface),
        };
        debug!(
            longitude = area.center.longitude,
            latitude = area.center.latitude,
            radius_km = area.radius_km,
            "capture area updated"
        );
        self.area = Some(area);
        area
    }
}
