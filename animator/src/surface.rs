use serde::{Deserialize, Serialize};

use crate::{CameraRequest, LatLng};

/// The map the animation draws on. The host owns rendering; the animator only says what to draw.
pub trait MapSurface {
    fn add_polyline(&mut self, style: &PolylineStyle, points: &[LatLng]) -> PolylineID;
    fn set_polyline_points(&mut self, id: PolylineID, points: &[LatLng]);
    /// Starts moving the camera. The host later reports how it went through
    /// `RouteAnimator::on_camera_transition`.
    fn animate_camera(&mut self, request: CameraRequest);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolylineID(pub usize);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolylineStyle {
    /// In pixels
    pub width: f64,
    /// Like "#9E9E9E"
    pub color: String,
    pub geodesic: bool,
}

/// Remembers everything asked of it. Useful for tests and for running without a screen.
#[derive(Default)]
pub struct RecordingSurface {
    pub polylines: Vec<(PolylineStyle, Vec<LatLng>)>,
    pub camera_requests: Vec<CameraRequest>,
    pub num_updates: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self, id: PolylineID) -> &[LatLng] {
        &self.polylines[id.0].1
    }
}

impl MapSurface for RecordingSurface {
    fn add_polyline(&mut self, style: &PolylineStyle, points: &[LatLng]) -> PolylineID {
        self.polylines.push((style.clone(), points.to_vec()));
        PolylineID(self.polylines.len() - 1)
    }

    fn set_polyline_points(&mut self, id: PolylineID, points: &[LatLng]) {
        self.polylines[id.0].1 = points.to_vec();
        self.num_updates += 1;
    }

    fn animate_camera(&mut self, request: CameraRequest) {
        self.camera_requests.push(request);
    }
}
