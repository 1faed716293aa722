use anyhow::Result;
use geom::{Duration, Time};

use crate::{
    AnimationConfig, CameraOutcome, CameraRequest, LatLng, MapSurface, PolylineID, Route,
    Scheduler, Viewport,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimatorState {
    Idle,
    /// Waiting for the host to finish moving the camera
    Framing,
    Animating,
    /// The camera transition was cancelled, so the animation never starts. Terminal.
    CameraCancelled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Task {
    Tick,
}

/// Draws a trail that grows along the route, one segment at a time, starting over after the last
/// waypoint.
pub struct RouteAnimator {
    route: Route,
    config: AnimationConfig,
    state: AnimatorState,
    scheduler: Scheduler<Task>,

    // Index of the waypoint starting the current segment. Never more than N-2.
    cursor: usize,
    segment_start: Time,
    drawn_path: Vec<LatLng>,
    trail: Option<PolylineID>,
    laps_completed: usize,
    // Set by `stop`, so resuming continues the segment from the same place
    paused_at: Option<Time>,
}

impl RouteAnimator {
    pub fn new(route: Route, config: AnimationConfig) -> Result<Self> {
        config.validate()?;
        let scheduler = Scheduler::new();
        let segment_start = scheduler.now();
        Ok(Self {
            route,
            config,
            state: AnimatorState::Idle,
            scheduler,
            cursor: 0,
            segment_start,
            drawn_path: Vec::new(),
            trail: None,
            laps_completed: 0,
            paused_at: None,
        })
    }

    /// Draws the whole route underneath, then starts the trail at the first waypoint.
    pub fn initialize<S: MapSurface>(&mut self, surface: &mut S) {
        surface.add_polyline(&self.config.route_style, self.route.waypoints());
        self.drawn_path = vec![self.route.waypoints()[0]];
        self.trail = Some(surface.add_polyline(&self.config.trail_style, &self.drawn_path));
    }

    pub fn frame_camera<S: MapSurface>(
        &mut self,
        surface: &mut S,
        viewport: Viewport,
    ) -> Result<()> {
        if self.state != AnimatorState::Idle {
            bail!("Can't frame the camera while {:?}", self.state);
        }
        let request = CameraRequest::frame_route(&self.route, viewport, &self.config);
        info!(
            "Framing {} waypoints with {}px of padding, bearing {:.1}",
            self.route.len(),
            request.padding,
            request.bearing
        );
        self.state = AnimatorState::Framing;
        surface.animate_camera(request);
        Ok(())
    }

    /// The host calls this once its camera transition ends.
    pub fn on_camera_transition(&mut self, outcome: CameraOutcome) {
        if self.state != AnimatorState::Framing {
            warn!(
                "Camera transition reported {:?} while {:?}; ignoring",
                outcome, self.state
            );
            return;
        }
        match outcome {
            CameraOutcome::Finished => {
                info!("Camera framed, starting the animation");
                self.state = AnimatorState::Animating;
                self.start_loop();
            }
            CameraOutcome::Cancelled => {
                warn!("Camera transition was cancelled; the animation won't start");
                self.state = AnimatorState::CameraCancelled;
            }
        }
    }

    /// Starts ticking right away. After `stop`, continues the current segment from where it was
    /// paused. Only works once the camera has been framed.
    pub fn start_loop(&mut self) {
        if self.state != AnimatorState::Animating {
            warn!("Not starting the animation while {:?}", self.state);
            return;
        }
        if self.is_running() {
            return;
        }
        let now = self.scheduler.now();
        match self.paused_at.take() {
            Some(paused_at) => {
                self.segment_start = self.segment_start + (now - paused_at);
            }
            None => {
                self.segment_start = now;
            }
        }
        self.scheduler.post(Task::Tick);
    }

    /// Moves the clock forwards and runs every tick that comes due.
    pub fn advance<S: MapSurface>(&mut self, dt: Duration, surface: &mut S) {
        if dt < Duration::ZERO {
            warn!("Ignoring a negative frame delta of {dt}");
            return;
        }
        // After a long stall, don't catch up on every missed tick
        let max_dt = self.config.segment_duration();
        let dt = if dt > max_dt {
            if self.is_running() {
                warn!("Frame delta of {dt} is too long; only advancing {max_dt}");
            }
            max_dt
        } else {
            dt
        };
        let until = self.scheduler.now() + dt;
        while let Some(task) = self.scheduler.pop_due(until) {
            match task {
                Task::Tick => self.tick(surface),
            }
        }
        self.scheduler.advance_to(until);
    }

    /// One step of the animation: extends the trail to where the marker should be now, then
    /// schedules the next step.
    pub fn tick<S: MapSurface>(&mut self, surface: &mut S) {
        if self.state != AnimatorState::Animating {
            warn!("Ignoring a tick while {:?}", self.state);
            return;
        }
        let now = self.scheduler.now();
        let mut elapsed = now - self.segment_start;
        if elapsed < Duration::ZERO {
            warn!(
                "Clock went backwards by {}; treating it as no time",
                self.segment_start - now
            );
            elapsed = Duration::ZERO;
        }

        let segment = self.route.segment(self.cursor);
        let (pos, t) = segment.position_at(
            elapsed,
            self.config.segment_duration(),
            self.config.clamp_fraction,
        );
        self.drawn_path.push(pos);
        self.redraw(surface);

        if t < 1.0 {
            self.scheduler
                .post_delayed(Task::Tick, self.config.tick_interval());
        } else if self.cursor < self.route.len() - 2 {
            self.cursor += 1;
            debug!(
                "Starting segment {}, bearing {:.1}",
                self.cursor,
                self.route.segment(self.cursor).bearing()
            );
            self.segment_start = now;
            self.scheduler
                .post_delayed(Task::Tick, self.config.tick_interval());
        } else {
            self.laps_completed += 1;
            info!("Finished lap {}", self.laps_completed);
            self.reset(surface);
        }
    }

    /// Clears the trail and starts over from the first waypoint.
    pub fn reset<S: MapSurface>(&mut self, surface: &mut S) {
        if self.state != AnimatorState::Animating {
            warn!("Not resetting the animation while {:?}", self.state);
            return;
        }
        self.paused_at = None;
        self.scheduler.remove_callbacks(&Task::Tick);
        self.drawn_path.clear();
        self.redraw(surface);
        self.segment_start = self.scheduler.now();
        self.cursor = 0;
        self.scheduler
            .post_delayed(Task::Tick, self.config.tick_interval());
    }

    /// Cancels the pending tick. The cursor, trail and segment clock stay as they are, so
    /// `start_loop` picks up again.
    pub fn stop(&mut self) {
        if self.scheduler.remove_callbacks(&Task::Tick) > 0 {
            info!("Stopped the animation on segment {}", self.cursor);
            self.paused_at = Some(self.scheduler.now());
        }
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.has_callbacks(&Task::Tick)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn drawn_path(&self) -> &[LatLng] {
        &self.drawn_path
    }

    pub fn segment_start(&self) -> Time {
        self.segment_start
    }

    pub fn laps_completed(&self) -> usize {
        self.laps_completed
    }

    pub fn now(&self) -> Time {
        self.scheduler.now()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    fn redraw<S: MapSurface>(&self, surface: &mut S) {
        if let Some(id) = self.trail {
            surface.set_polyline_points(id, &self.drawn_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingSurface;

    fn viewport() -> Viewport {
        Viewport {
            width: 1080.0,
            height: 1920.0,
        }
    }

    fn ms(value: f64) -> Duration {
        Duration::seconds(value / 1000.0)
    }

    fn close(a: LatLng, b: LatLng) -> bool {
        (a.lat - b.lat).abs() < 1e-9 && (a.lng - b.lng).abs() < 1e-9
    }

    fn diagonal() -> Route {
        Route::new(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(2.0, 2.0),
        ])
        .unwrap()
    }

    // Through framing, with the first tick not run yet
    fn started(route: Route) -> (RouteAnimator, RecordingSurface) {
        let mut surface = RecordingSurface::new();
        let mut animator = RouteAnimator::new(route, AnimationConfig::default()).unwrap();
        animator.initialize(&mut surface);
        animator.frame_camera(&mut surface, viewport()).unwrap();
        animator.on_camera_transition(CameraOutcome::Finished);
        (animator, surface)
    }

    #[test]
    fn test_initialize_draws_route_and_trail() {
        let mut surface = RecordingSurface::new();
        let route = Route::default_route();
        let mut animator =
            RouteAnimator::new(route.clone(), AnimationConfig::default()).unwrap();
        animator.initialize(&mut surface);

        assert_eq!(surface.polylines.len(), 2);
        assert_eq!(surface.points(PolylineID(0)), route.waypoints());
        assert_eq!(surface.polylines[0].0.width, 15.0);
        assert!(surface.polylines[0].0.geodesic);
        assert_eq!(surface.points(PolylineID(1)), &[route.waypoints()[0]]);
        assert_eq!(animator.state(), AnimatorState::Idle);
        assert!(!animator.is_running());
    }

    #[test]
    fn test_framing() {
        let mut surface = RecordingSurface::new();
        let mut animator =
            RouteAnimator::new(Route::default_route(), AnimationConfig::default()).unwrap();
        animator.initialize(&mut surface);
        animator.frame_camera(&mut surface, viewport()).unwrap();

        assert_eq!(animator.state(), AnimatorState::Framing);
        assert_eq!(surface.camera_requests.len(), 1);
        assert_eq!(surface.camera_requests[0].padding, 108.0);
        // Nothing ticks until the camera is done
        assert!(!animator.is_running());

        // Framing twice is a mistake
        assert!(animator.frame_camera(&mut surface, viewport()).is_err());
    }

    #[test]
    fn test_cancelled_camera_never_animates() {
        let mut surface = RecordingSurface::new();
        let route = diagonal();
        let mut animator =
            RouteAnimator::new(route.clone(), AnimationConfig::default()).unwrap();
        animator.initialize(&mut surface);
        animator.frame_camera(&mut surface, viewport()).unwrap();
        animator.on_camera_transition(CameraOutcome::Cancelled);

        assert_eq!(animator.state(), AnimatorState::CameraCancelled);
        assert!(!animator.is_running());

        animator.advance(Duration::seconds(10.0), &mut surface);
        // A late "finished" doesn't revive it either
        animator.on_camera_transition(CameraOutcome::Finished);
        animator.start_loop();
        animator.reset(&mut surface);
        animator.tick(&mut surface);
        animator.advance(Duration::seconds(10.0), &mut surface);

        assert_eq!(animator.state(), AnimatorState::CameraCancelled);
        assert!(!animator.is_running());
        assert_eq!(animator.drawn_path(), &[route.waypoints()[0]]);
        assert_eq!(surface.points(PolylineID(1)), &[route.waypoints()[0]]);
        assert_eq!(surface.num_updates, 0);
    }

    #[test]
    fn test_first_tick_runs_immediately() {
        let (mut animator, mut surface) = started(diagonal());
        assert_eq!(animator.state(), AnimatorState::Animating);
        assert!(animator.is_running());

        animator.advance(Duration::ZERO, &mut surface);
        // The initial point, plus the first tick at t=0
        assert_eq!(
            animator.drawn_path(),
            &[LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.0)]
        );
        assert_eq!(surface.points(PolylineID(1)), animator.drawn_path());
        assert!(animator.is_running());
    }

    #[test]
    fn test_diagonal_scenario() {
        let (mut animator, mut surface) = started(diagonal());
        let start = animator.now();
        animator.advance(Duration::ZERO, &mut surface);
        assert_eq!(animator.cursor(), 0);

        // 50 ticks of 16ms reach exactly 800ms, ending segment 0 at (1, 1)
        for _ in 0..50 {
            animator.advance(ms(16.0), &mut surface);
        }
        assert!(close(*animator.drawn_path().last().unwrap(), LatLng::new(1.0, 1.0)));
        assert_eq!(animator.cursor(), 1);
        assert!(animator.segment_start() > start);

        // The next tick is the start of segment 1
        animator.advance(ms(16.0), &mut surface);
        let pos = *animator.drawn_path().last().unwrap();
        assert!(pos.lat > 1.0 && pos.lat < 2.0);

        // 49 more ticks end segment 1 at (2, 2), then everything resets
        for _ in 0..48 {
            animator.advance(ms(16.0), &mut surface);
        }
        assert_eq!(animator.cursor(), 1);
        let len_before_reset = animator.drawn_path().len();
        animator.advance(ms(16.0), &mut surface);

        assert_eq!(animator.cursor(), 0);
        assert!(animator.drawn_path().is_empty());
        assert!(surface.points(PolylineID(1)).is_empty());
        assert_eq!(animator.laps_completed(), 1);
        assert!(animator.is_running());
        // 1 initial point + 51 ticks on segment 0 + 49 before the last tick on segment 1
        assert_eq!(len_before_reset, 1 + 51 + 49);
    }

    #[test]
    fn test_segment_ends_on_the_waypoint() {
        let (mut animator, mut surface) = started(diagonal());
        animator.advance(Duration::ZERO, &mut surface);

        let mut endpoints = Vec::new();
        let mut last_cursor = animator.cursor();
        // Stop before the lap ends and the trail is cleared
        for _ in 0..90 {
            animator.advance(ms(16.0), &mut surface);
            if animator.cursor() != last_cursor {
                endpoints.push(*animator.drawn_path().last().unwrap());
                last_cursor = animator.cursor();
            }
        }
        assert!(close(endpoints[0], LatLng::new(1.0, 1.0)));
    }

    #[test]
    fn test_full_lap_resets() {
        let route = Route::default_route();
        let (mut animator, mut surface) = started(route.clone());

        let mut max_cursor = 0;
        let mut max_len = 0;
        let mut lap_seen = false;
        // 10 segments of 800ms is 8 seconds; run a bit longer, in uneven frames
        for i in 0..600 {
            let dt = if i % 3 == 0 { ms(17.0) } else { ms(15.0) };
            animator.advance(dt, &mut surface);
            max_cursor = max_cursor.max(animator.cursor());
            max_len = max_len.max(animator.drawn_path().len());
            assert!(animator.cursor() <= route.len() - 2);
            if animator.laps_completed() == 1 && !lap_seen {
                lap_seen = true;
                assert_eq!(animator.cursor(), 0);
                assert!(animator.drawn_path().len() <= 1);
            }
        }
        assert!(lap_seen);
        assert_eq!(max_cursor, route.len() - 2);
        // Each tick adds one point; one lap is about 500 ticks
        assert!(max_len > 400 && max_len < 700);
        // Only ever one tick waiting
        assert!(animator.is_running());
    }

    #[test]
    fn test_big_frame_runs_every_due_tick() {
        let (mut animator, mut surface) = started(diagonal());
        animator.advance(ms(168.0), &mut surface);
        // The immediate tick, then one every 16ms
        assert_eq!(animator.drawn_path().len(), 1 + 11);
        assert_eq!(animator.now(), animator.segment_start() + ms(168.0));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut animator, mut surface) = started(diagonal());
        for _ in 0..10 {
            animator.advance(ms(16.0), &mut surface);
        }

        animator.stop();
        let cursor = animator.cursor();
        let path = animator.drawn_path().to_vec();
        let segment_start = animator.segment_start();
        assert!(!animator.is_running());

        animator.stop();
        animator.advance(Duration::seconds(5.0), &mut surface);
        assert_eq!(animator.cursor(), cursor);
        assert_eq!(animator.drawn_path(), path.as_slice());
        assert_eq!(animator.segment_start(), segment_start);
        assert!(!animator.is_running());

        // And it picks up again where it paused, without jumping back along the segment
        let before = *path.last().unwrap();
        animator.start_loop();
        animator.advance(Duration::ZERO, &mut surface);
        assert_eq!(animator.drawn_path().len(), path.len() + 1);
        let resumed = *animator.drawn_path().last().unwrap();
        assert!(resumed.lat >= before.lat - 1e-6);
        assert!(resumed.lng >= before.lng - 1e-6);

        animator.advance(ms(16.0), &mut surface);
        let next = *animator.drawn_path().last().unwrap();
        assert!(next.lat > before.lat);
        assert_eq!(animator.cursor(), cursor);
    }

    #[test]
    fn test_start_loop_needs_framing() {
        let mut surface = RecordingSurface::new();
        let mut animator = RouteAnimator::new(diagonal(), AnimationConfig::default()).unwrap();
        animator.initialize(&mut surface);

        animator.start_loop();
        assert_eq!(animator.state(), AnimatorState::Idle);
        assert!(!animator.is_running());

        animator.frame_camera(&mut surface, viewport()).unwrap();
        animator.start_loop();
        animator.reset(&mut surface);
        animator.advance(Duration::seconds(0.1), &mut surface);
        assert_eq!(animator.state(), AnimatorState::Framing);
        assert!(!animator.is_running());
        assert_eq!(surface.num_updates, 0);

        // The camera finishing still starts it
        animator.on_camera_transition(CameraOutcome::Finished);
        assert_eq!(animator.state(), AnimatorState::Animating);
        assert!(animator.is_running());
    }

    #[test]
    fn test_two_waypoint_lap() {
        let route = Route::new(vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)]).unwrap();
        let (mut animator, mut surface) = started(route);
        animator.advance(Duration::ZERO, &mut surface);

        // The only segment is also the last one, so finishing it resets without moving the cursor
        let mut frames = 0;
        while animator.laps_completed() == 0 && frames < 60 {
            animator.advance(ms(16.0), &mut surface);
            assert_eq!(animator.cursor(), 0);
            frames += 1;
        }
        assert!((50..=51).contains(&frames));
        assert_eq!(animator.cursor(), 0);
        assert!(animator.drawn_path().is_empty());
        assert!(surface.points(PolylineID(1)).is_empty());
        assert_eq!(animator.laps_completed(), 1);
        assert_eq!(animator.scheduler.num_pending(), 1);
    }

    #[test]
    fn test_long_stall_is_capped() {
        let (mut animator, mut surface) = started(diagonal());
        let start = animator.now();
        animator.advance(Duration::seconds(60.0), &mut surface);

        // Only one segment's worth of time passes
        assert_eq!(animator.now(), start + Duration::seconds(0.8));
        assert!(animator.drawn_path().len() <= 1 + 51);
        assert_eq!(animator.laps_completed(), 0);
        assert_eq!(animator.scheduler.num_pending(), 1);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = AnimationConfig {
            tick_interval_ms: 0.04,
            ..AnimationConfig::default()
        };
        assert!(RouteAnimator::new(diagonal(), config).is_err());

        let config = AnimationConfig {
            segment_duration_ms: 0.04,
            ..AnimationConfig::default()
        };
        assert!(RouteAnimator::new(diagonal(), config).is_err());
    }

    #[test]
    fn test_reset_keeps_one_pending_tick() {
        let (mut animator, mut surface) = started(diagonal());
        for _ in 0..30 {
            animator.advance(ms(16.0), &mut surface);
        }
        animator.reset(&mut surface);
        animator.reset(&mut surface);
        assert_eq!(animator.cursor(), 0);
        assert!(animator.drawn_path().is_empty());

        // A single tick lands 16ms later, not two
        animator.advance(ms(16.0), &mut surface);
        assert_eq!(animator.drawn_path().len(), 1);
        assert!(close(animator.drawn_path()[0], LatLng::new(0.02, 0.02)));
    }

    #[test]
    fn test_unclamped_overshoots() {
        let config = AnimationConfig {
            clamp_fraction: false,
            tick_interval_ms: 30.0,
            ..AnimationConfig::default()
        };
        let mut surface = RecordingSurface::new();
        let mut animator = RouteAnimator::new(diagonal(), config).unwrap();
        animator.initialize(&mut surface);
        animator.frame_camera(&mut surface, viewport()).unwrap();
        animator.on_camera_transition(CameraOutcome::Finished);

        animator.advance(Duration::ZERO, &mut surface);
        // 27 ticks of 30ms is 810ms, past the end of the first segment
        for _ in 0..27 {
            animator.advance(ms(30.0), &mut surface);
        }
        let last = *animator.drawn_path().last().unwrap();
        assert!(last.lat > 1.0);
        assert_eq!(animator.cursor(), 1);
    }
}
