use anyhow::Result;
use geojson::{GeoJson, Geometry, Value};
use geom::GPSBounds;

use crate::{LatLng, Segment};

/// An ordered, fixed list of waypoints. Always has at least 2 points, so there's at least one
/// segment to animate.
#[derive(Clone, Debug)]
pub struct Route {
    waypoints: Vec<LatLng>,
}

impl Route {
    pub fn new(waypoints: Vec<LatLng>) -> Result<Self> {
        if waypoints.len() < 2 {
            bail!(
                "A route needs at least 2 waypoints, but only {} given",
                waypoints.len()
            );
        }
        for (idx, pt) in waypoints.iter().enumerate() {
            let (lat, lng) = (pt.lat, pt.lng);
            if !lng.is_finite() || !lat.is_finite() {
                bail!("Waypoint {idx} isn't a finite coordinate: {lat}, {lng}");
            }
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                bail!("Waypoint {idx} is out of range: {lat}, {lng}");
            }
        }
        Ok(Self { waypoints })
    }

    /// The built-in route, used when no route file is given.
    pub fn default_route() -> Self {
        let waypoints = [
            (50.961813797827055, 3.5168474167585373),
            (50.96085423274633, 3.517405651509762),
            (50.96020550146382, 3.5177918896079063),
            (50.95936754348453, 3.518972061574459),
            (50.95877285446026, 3.5199161991477013),
            (50.958179213755905, 3.520646095275879),
            (50.95901719316589, 3.5222768783569336),
            (50.95954430150347, 3.523542881011963),
            (50.95873336312275, 3.5244011878967285),
            (50.95955781702322, 3.525688648223877),
            (50.958855004782116, 3.5269761085510254),
        ]
        .into_iter()
        .map(|(lat, lng)| LatLng::new(lat, lng))
        .collect();
        Self { waypoints }
    }

    pub fn load_geojson(path: &str) -> Result<Self> {
        let raw = fs_err::read_to_string(path)?;
        let route = Self::from_geojson(&raw)?;
        info!("Loaded a route with {} waypoints from {path}", route.len());
        Ok(route)
    }

    /// Takes the first LineString found, or else every Point feature in order.
    pub fn from_geojson(raw: &str) -> Result<Self> {
        let geometries: Vec<Geometry> = match raw.parse::<GeoJson>()? {
            GeoJson::Geometry(geometry) => vec![geometry],
            GeoJson::Feature(feature) => feature.geometry.into_iter().collect(),
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .filter_map(|feature| feature.geometry)
                .collect(),
        };

        let mut points = Vec::new();
        for geometry in geometries {
            match geometry.value {
                Value::LineString(line) => {
                    let waypoints = line
                        .iter()
                        .map(|pos| to_latlng(pos))
                        .collect::<Result<Vec<_>>>()?;
                    return Self::new(waypoints);
                }
                Value::Point(pos) => {
                    points.push(to_latlng(&pos)?);
                }
                _ => {}
            }
        }
        if points.is_empty() {
            bail!("No LineString or Point geometry found");
        }
        Self::new(points)
    }

    pub fn waypoints(&self) -> &[LatLng] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn num_segments(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// Panics if `index` isn't a valid segment; callers keep the cursor in range.
    pub fn segment(&self, index: usize) -> Segment {
        Segment {
            index,
            begin: self.waypoints[index],
            end: self.waypoints[index + 1],
        }
    }

    pub fn bounds(&self) -> GPSBounds {
        let mut bounds = GPSBounds::new();
        for pt in &self.waypoints {
            bounds.update(pt.to_lonlat());
        }
        bounds
    }
}

// GeoJSON positions are [longitude, latitude, ...]
fn to_latlng(pos: &[f64]) -> Result<LatLng> {
    if pos.len() < 2 {
        bail!("Position {:?} doesn't have 2 coordinates", pos);
    }
    Ok(LatLng::new(pos[1], pos[0]))
}
