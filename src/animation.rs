//! Leg-by-leg route reveal.
//!
//! The controller fetches one leg at a time, appends it to the accumulated
//! route, hands the route to the renderer, refits the viewport and waits
//! `step_delay` before the next leg. Legs are strictly sequential: the
//! accumulator's append order is the route's path order.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::accumulator::RouteAccumulator;
use crate::geo::{BoundingBox, GeoPoint, legs};
use crate::session::RouteSession;
use crate::traits::LegDirections;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Fewer than two waypoints; nothing was requested or drawn.
    NothingToDraw,
    Completed {
        legs_drawn: usize,
        legs_skipped: usize,
    },
    /// A newer session took over before leg `next_leg` was applied.
    Cancelled { next_leg: usize },
}

#[derive(Debug)]
pub struct RouteAnimationController<D> {
    directions: D,
    accumulator: RouteAccumulator,
}

impl<D: LegDirections> RouteAnimationController<D> {
    pub fn new(directions: D) -> Self {
        Self {
            directions,
            accumulator: RouteAccumulator::new(),
        }
    }

    pub fn directions(&self) -> &D {
        &self.directions
    }

    /// Route accumulated by the most recent run.
    pub fn route(&self) -> &[GeoPoint] {
        self.accumulator.current()
    }

    /// Animates the session's route.
    ///
    /// A failed leg is logged and skipped; the run carries on with a gap in
    /// the path. `on_segment_drawn` fires once per leg, skipped legs
    /// included. Cancellation is checked before each request, after each
    /// response, and before each delay; a response that arrives for a stale
    /// session is dropped without touching the route.
    pub async fn run<S, F>(
        &mut self,
        session: &mut RouteSession,
        step_delay: Duration,
        mut on_segment_drawn: S,
        mut on_fit_bounds: F,
    ) -> RunOutcome
    where
        S: FnMut(&[GeoPoint]),
        F: FnMut(BoundingBox),
    {
        let leg_count = session.leg_count();
        if leg_count == 0 {
            debug!(
                waypoints = session.waypoints().len(),
                "fewer than two waypoints, nothing to draw"
            );
            return RunOutcome::NothingToDraw;
        }

        self.accumulator.reset();
        let generation = session.token().generation();
        let mut legs_skipped = 0;

        let leg_requests: Vec<_> = legs(session.waypoints()).collect();
        for (index, leg) in leg_requests.into_iter().enumerate() {
            session.set_cursor(index);
            if !session.token().is_current() {
                return self.cancelled(generation, index);
            }

            let result = self.directions.request_leg(leg).await;
            if !session.token().is_current() {
                return self.cancelled(generation, index);
            }

            match result {
                Ok(geometry) => {
                    if geometry.is_empty() {
                        debug!(generation, leg = index, "leg has no drivable route");
                    }
                    self.accumulator.append_leg(&geometry);
                }
                Err(err) => {
                    warn!(generation, leg = index, error = %err, "skipping leg");
                    legs_skipped += 1;
                }
            }
            session.set_cursor(index + 1);

            on_segment_drawn(self.accumulator.current());
            if let Some(bounds) = self.accumulator.bounds() {
                on_fit_bounds(bounds);
            }

            if index + 1 < leg_count {
                if !session.token().is_current() {
                    return self.cancelled(generation, index + 1);
                }
                tokio::time::sleep(step_delay).await;
            }
        }

        info!(
            generation,
            legs = leg_count,
            skipped = legs_skipped,
            points = self.accumulator.len(),
            "route drawn"
        );
        RunOutcome::Completed {
            legs_drawn: leg_count - legs_skipped,
            legs_skipped,
        }
    }

    fn cancelled(&self, generation: u64, next_leg: usize) -> RunOutcome {
        debug!(generation, next_leg, "route animation cancelled");
        RunOutcome::Cancelled { next_leg }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::RouteError;
    use crate::geo::LegRequest;
    use crate::polyline::Polyline;
    use crate::session::SessionGenerations;

    /// Returns the straight line between the leg endpoints, or fails legs
    /// whose origin is listed in `failing`.
    #[derive(Default)]
    struct ScriptedDirections {
        requests: RefCell<Vec<LegRequest>>,
        failing: Vec<GeoPoint>,
        empty: Vec<GeoPoint>,
    }

    impl LegDirections for ScriptedDirections {
        async fn request_leg(&self, leg: LegRequest) -> Result<Polyline, RouteError> {
            self.requests.borrow_mut().push(leg);
            if self.failing.contains(&leg.origin) {
                return Err(RouteError::malformed("directions", "scripted failure"));
            }
            if self.empty.contains(&leg.origin) {
                return Ok(Polyline::default());
            }
            Ok(Polyline::new(vec![leg.origin, leg.destination]))
        }
    }

    const A: GeoPoint = GeoPoint::new(0.0, 0.0);
    const B: GeoPoint = GeoPoint::new(1.0, 1.0);
    const C: GeoPoint = GeoPoint::new(2.0, 0.0);

    async fn run_collecting(
        controller: &mut RouteAnimationController<ScriptedDirections>,
        session: &mut RouteSession,
    ) -> (RunOutcome, Vec<Vec<GeoPoint>>, Vec<BoundingBox>) {
        let mut drawn = Vec::new();
        let mut fits = Vec::new();
        let outcome = controller
            .run(
                session,
                Duration::from_millis(500),
                |route| drawn.push(route.to_vec()),
                |bounds| fits.push(bounds),
            )
            .await;
        (outcome, drawn, fits)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fewer_than_two_waypoints_draws_nothing() {
        let generations = SessionGenerations::new();
        let mut controller = RouteAnimationController::new(ScriptedDirections::default());

        for waypoints in [vec![], vec![A]] {
            let mut session = RouteSession::new(generations.begin(), waypoints);
            let (outcome, drawn, fits) = run_collecting(&mut controller, &mut session).await;
            assert_eq!(outcome, RunOutcome::NothingToDraw);
            assert!(drawn.is_empty());
            assert!(fits.is_empty());
        }
        assert!(controller.directions().requests.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_waypoints_draw_two_growing_segments() {
        let generations = SessionGenerations::new();
        let mut controller = RouteAnimationController::new(ScriptedDirections::default());
        let mut session = RouteSession::new(generations.begin(), vec![A, B, C]);

        let (outcome, drawn, fits) = run_collecting(&mut controller, &mut session).await;

        assert_eq!(
            outcome,
            RunOutcome::Completed {
                legs_drawn: 2,
                legs_skipped: 0
            }
        );
        assert_eq!(
            *controller.directions().requests.borrow(),
            vec![LegRequest::new(A, B), LegRequest::new(B, C)]
        );
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[0], vec![A, B]);
        assert!(drawn[1].starts_with(&drawn[0]));
        assert_eq!(drawn[1], vec![A, B, B, C]);
        assert_eq!(fits.len(), 2);
        assert_eq!(fits[1], BoundingBox::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(2.0, 1.0)));
        assert_eq!(session.cursor(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_leg_is_skipped() {
        let generations = SessionGenerations::new();
        let directions = ScriptedDirections {
            failing: vec![B],
            ..Default::default()
        };
        let mut controller = RouteAnimationController::new(directions);
        let mut session = RouteSession::new(generations.begin(), vec![A, B, C]);

        let (outcome, drawn, _) = run_collecting(&mut controller, &mut session).await;

        assert_eq!(
            outcome,
            RunOutcome::Completed {
                legs_drawn: 1,
                legs_skipped: 1
            }
        );
        assert_eq!(drawn, vec![vec![A, B], vec![A, B]]);
        assert_eq!(controller.directions().requests.borrow().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_in_middle_leaves_gap() {
        let d = GeoPoint::new(3.0, 1.0);
        let generations = SessionGenerations::new();
        let directions = ScriptedDirections {
            failing: vec![B],
            ..Default::default()
        };
        let mut controller = RouteAnimationController::new(directions);
        let mut session = RouteSession::new(generations.begin(), vec![A, B, C, d]);

        let (_, drawn, _) = run_collecting(&mut controller, &mut session).await;

        assert_eq!(drawn.last().unwrap(), &vec![A, B, C, d]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_first_leg_skips_fit() {
        let generations = SessionGenerations::new();
        let directions = ScriptedDirections {
            empty: vec![A],
            ..Default::default()
        };
        let mut controller = RouteAnimationController::new(directions);
        let mut session = RouteSession::new(generations.begin(), vec![A, B, C]);

        let (outcome, drawn, fits) = run_collecting(&mut controller, &mut session).await;

        assert_eq!(
            outcome,
            RunOutcome::Completed {
                legs_drawn: 2,
                legs_skipped: 0
            }
        );
        assert_eq!(drawn, vec![vec![], vec![B, C]]);
        assert_eq!(fits.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_paces_legs() {
        let generations = SessionGenerations::new();
        let mut controller = RouteAnimationController::new(ScriptedDirections::default());
        let mut session = RouteSession::new(generations.begin(), vec![A, B, C, A]);

        let started = tokio::time::Instant::now();
        run_collecting(&mut controller, &mut session).await;

        // Three legs, two pauses between them.
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    /// Starts a newer session while a leg request is in flight.
    struct PreemptingDirections {
        generations: SessionGenerations,
        preempt_on: GeoPoint,
    }

    impl LegDirections for PreemptingDirections {
        async fn request_leg(&self, leg: LegRequest) -> Result<Polyline, RouteError> {
            if leg.origin == self.preempt_on {
                self.generations.begin();
            }
            Ok(Polyline::new(vec![leg.origin, leg.destination]))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_leg_never_reaches_renderer() {
        let generations = SessionGenerations::new();
        let mut controller = RouteAnimationController::new(PreemptingDirections {
            generations: generations.clone(),
            preempt_on: B,
        });
        let mut session = RouteSession::new(generations.begin(), vec![A, B, C]);

        let mut drawn = Vec::new();
        let outcome = controller
            .run(
                &mut session,
                Duration::from_millis(500),
                |route| drawn.push(route.to_vec()),
                |_| {},
            )
            .await;

        assert_eq!(outcome, RunOutcome::Cancelled { next_leg: 1 });
        assert_eq!(drawn, vec![vec![A, B]]);
        assert_eq!(controller.route(), &[A, B]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let generations = SessionGenerations::new();
        let mut controller = RouteAnimationController::new(ScriptedDirections::default());
        let mut session = RouteSession::new(generations.begin(), vec![A, B, C]);
        generations.cancel();

        let (outcome, drawn, _) = run_collecting(&mut controller, &mut session).await;

        assert_eq!(outcome, RunOutcome::Cancelled { next_leg: 0 });
        assert!(drawn.is_empty());
        assert!(controller.directions().requests.borrow().is_empty());
    }
}
