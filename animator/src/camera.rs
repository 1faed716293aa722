use geom::{Duration, GPSBounds};

use crate::{AnimationConfig, LatLng, Route};

/// Display metrics, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Asks the host to move the camera so the whole route is visible.
#[derive(Clone, Debug)]
pub struct CameraRequest {
    pub bounds: GPSBounds,
    pub target: LatLng,
    /// Degrees clockwise from north
    pub bearing: f64,
    pub zoom: f64,
    /// Pixels to leave free around the bounds
    pub padding: f64,
    pub viewport: Viewport,
    pub duration: Duration,
}

/// How the host's camera transition ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraOutcome {
    Finished,
    Cancelled,
}

impl CameraRequest {
    pub fn frame_route(route: &Route, viewport: Viewport, config: &AnimationConfig) -> Self {
        let first = route.segment(0);
        Self {
            bounds: route.bounds(),
            target: first.begin,
            bearing: first.bearing() + config.bearing_offset_degrees,
            zoom: config.initial_zoom,
            padding: (viewport.width * config.padding_fraction).floor(),
            viewport,
            duration: config.camera_duration(),
        }
    }
}
