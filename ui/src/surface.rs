use geom::{Distance, GPSBounds, PolyLine, Pt2D};
use widgetry::{Color, Drawable, EventCtx, GeomBatch};

use animator::{CameraRequest, LatLng, MapSurface, PolylineID, PolylineStyle};

/// Holds what the animator wants drawn, and re-uploads it when something changes.
pub struct MapLayer {
    gps_bounds: GPSBounds,
    polylines: Vec<(PolylineStyle, Vec<LatLng>)>,
    camera_request: Option<CameraRequest>,
    dirty: bool,
}

impl MapLayer {
    pub fn new(gps_bounds: GPSBounds) -> Self {
        Self {
            gps_bounds,
            polylines: Vec::new(),
            camera_request: None,
            dirty: true,
        }
    }

    pub fn take_camera_request(&mut self) -> Option<CameraRequest> {
        self.camera_request.take()
    }

    /// Line widths depend on the zoom, so call this when it changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Only uploads if a polyline changed since last time.
    pub fn maybe_upload(&mut self, ctx: &mut EventCtx) -> Option<Drawable> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.upload(ctx))
    }

    pub fn upload(&self, ctx: &mut EventCtx) -> Drawable {
        let mut batch = GeomBatch::new();
        for (style, points) in &self.polylines {
            let pts: Vec<Pt2D> = points
                .iter()
                .map(|pt| pt.to_lonlat().to_pt(&self.gps_bounds))
                .collect();
            let pts = Pt2D::approx_dedupe(pts, Distance::meters(0.1));
            // The trail starts as a single point, which can't be drawn yet
            if let Ok(pl) = PolyLine::new(pts) {
                // Widths are in pixels, so they depend on the zoom
                let width = Distance::meters(style.width / ctx.canvas.cam_zoom);
                batch.push(Color::hex(&style.color), pl.make_polygons(width));
            }
        }
        ctx.upload(batch)
    }
}

impl MapSurface for MapLayer {
    fn add_polyline(&mut self, style: &PolylineStyle, points: &[LatLng]) -> PolylineID {
        if style.geodesic {
            debug!("Drawing a geodesic polyline as straight lines");
        }
        self.polylines.push((style.clone(), points.to_vec()));
        self.dirty = true;
        PolylineID(self.polylines.len() - 1)
    }

    fn set_polyline_points(&mut self, id: PolylineID, points: &[LatLng]) {
        self.polylines[id.0].1 = points.to_vec();
        self.dirty = true;
    }

    fn animate_camera(&mut self, request: CameraRequest) {
        self.camera_request = Some(request);
    }
}
