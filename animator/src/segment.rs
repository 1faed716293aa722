use geom::{Duration, LonLat};
use serde::{Deserialize, Serialize};

/// A geographic coordinate. Unlike `LonLat`, nothing is rounded, so interpolated points land
/// exactly on the endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn to_lonlat(self) -> LonLat {
        LonLat::new(self.lng, self.lat)
    }
}

/// The path between two consecutive waypoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub begin: LatLng,
    pub end: LatLng,
}

impl Segment {
    /// Returns the position after `elapsed` and the raw fraction used to decide whether the
    /// segment is done. With `clamp`, the position never overshoots `end`; the raw fraction is
    /// returned as-is either way.
    pub fn position_at(
        &self,
        elapsed: Duration,
        segment_duration: Duration,
        clamp: bool,
    ) -> (LatLng, f64) {
        let t = segment_fraction(elapsed, segment_duration);
        let pos = if clamp {
            interpolate(self.begin, self.end, t.clamp(0.0, 1.0))
        } else {
            interpolate(self.begin, self.end, t)
        };
        (pos, t)
    }

    pub fn bearing(&self) -> f64 {
        bearing(self.begin, self.end)
    }
}

/// Linear progress through a segment. Not clamped; anything >= 1 means the segment is done.
pub fn segment_fraction(elapsed: Duration, segment_duration: Duration) -> f64 {
    elapsed / segment_duration
}

pub fn interpolate(begin: LatLng, end: LatLng, t: f64) -> LatLng {
    LatLng {
        lat: t * end.lat + (1.0 - t) * begin.lat,
        lng: t * end.lng + (1.0 - t) * begin.lng,
    }
}

/// The initial great-circle bearing from `from` to `to`, in degrees. 0 is north, 90 is east, and
/// the result is in (-180, 180].
pub fn bearing(from: LatLng, to: LatLng) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();
    let degrees = y.atan2(x).to_degrees();
    if degrees <= -180.0 {
        degrees + 360.0
    } else {
        degrees
    }
}
