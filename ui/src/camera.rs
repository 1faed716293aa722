use geom::{Duration, LonLat, Pt2D};
use widgetry::EventCtx;

use animator::{CameraOutcome, CameraRequest};

use crate::App;

// Web map tiles are 256px wide; at zoom 0, one pixel covers this many meters at the equator
const METERS_PER_PIXEL_AT_ZOOM_0: f64 = 156_543.033_92;

/// Pans and zooms the canvas linearly from the requested starting view to one fitting the route.
/// The canvas can't rotate, so the requested bearing is only logged.
pub struct CameraTransition {
    from_center: Pt2D,
    from_zoom: f64,
    to_center: Pt2D,
    to_zoom: f64,
    duration: Duration,
    elapsed: Duration,
    // What we last set, to notice the user moving the camera
    last_set: (f64, f64, f64),
}

impl CameraTransition {
    pub fn new(ctx: &mut EventCtx, app: &App, request: CameraRequest) -> Self {
        info!(
            "Map rotation isn't supported, so ignoring the bearing of {:.1} degrees",
            request.bearing
        );

        let corner1 =
            LonLat::new(request.bounds.min_lon, request.bounds.min_lat).to_pt(&app.gps_bounds);
        let corner2 =
            LonLat::new(request.bounds.max_lon, request.bounds.max_lat).to_pt(&app.gps_bounds);
        let width = (corner2.x() - corner1.x()).abs().max(1.0);
        let height = (corner2.y() - corner1.y()).abs().max(1.0);
        let to_center = Pt2D::new(
            (corner1.x() + corner2.x()) / 2.0,
            (corner1.y() + corner2.y()) / 2.0,
        );
        let available_width = (request.viewport.width - 2.0 * request.padding).max(1.0);
        let available_height = (request.viewport.height - 2.0 * request.padding).max(1.0);
        let to_zoom = (available_width / width).min(available_height / height);

        let from_center = request.target.to_lonlat().to_pt(&app.gps_bounds);
        let meters_per_pixel = METERS_PER_PIXEL_AT_ZOOM_0 * request.target.lat.to_radians().cos()
            / 2.0_f64.powf(request.zoom);
        let from_zoom = 1.0 / meters_per_pixel;

        let mut transition = Self {
            from_center,
            from_zoom,
            to_center,
            to_zoom,
            duration: request.duration,
            elapsed: Duration::ZERO,
            last_set: (0.0, 0.0, 0.0),
        };
        transition.set_camera(ctx, from_center, from_zoom);
        transition
    }

    /// Returns the outcome once the transition is over.
    pub fn step(&mut self, ctx: &mut EventCtx, dt: Duration) -> Option<CameraOutcome> {
        if self.moved_by_user(ctx) {
            return Some(CameraOutcome::Cancelled);
        }

        self.elapsed = self.elapsed + dt;
        let pct = if self.duration <= Duration::ZERO {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };
        let center = Pt2D::new(
            self.from_center.x() + pct * (self.to_center.x() - self.from_center.x()),
            self.from_center.y() + pct * (self.to_center.y() - self.from_center.y()),
        );
        let zoom = self.from_zoom + pct * (self.to_zoom - self.from_zoom);
        self.set_camera(ctx, center, zoom);

        if pct >= 1.0 {
            Some(CameraOutcome::Finished)
        } else {
            None
        }
    }

    fn set_camera(&mut self, ctx: &mut EventCtx, center: Pt2D, zoom: f64) {
        ctx.canvas.cam_zoom = zoom;
        ctx.canvas.cam_x = center.x() * zoom - ctx.canvas.window_width / 2.0;
        ctx.canvas.cam_y = center.y() * zoom - ctx.canvas.window_height / 2.0;
        self.last_set = (ctx.canvas.cam_x, ctx.canvas.cam_y, ctx.canvas.cam_zoom);
    }

    fn moved_by_user(&self, ctx: &EventCtx) -> bool {
        let epsilon = 1e-6;
        (ctx.canvas.cam_x - self.last_set.0).abs() > epsilon
            || (ctx.canvas.cam_y - self.last_set.1).abs() > epsilon
            || (ctx.canvas.cam_zoom - self.last_set.2).abs() > epsilon
    }
}
