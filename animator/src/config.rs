use anyhow::Result;
use geom::Duration;
use serde::{Deserialize, Serialize};

use crate::PolylineStyle;

/// Everything tunable about the animation. Every field has a default, so a config file only
/// needs to mention what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// How often the animation steps; 16ms is roughly 60Hz.
    pub tick_interval_ms: f64,
    /// How long the marker takes to cross one segment, regardless of its length.
    pub segment_duration_ms: f64,
    pub camera_duration_ms: f64,
    /// Added to the bearing from the first to the second waypoint when framing the camera.
    pub bearing_offset_degrees: f64,
    pub initial_zoom: f64,
    /// Padding around the framed route, as a fraction of the viewport width.
    pub padding_fraction: f64,
    /// If false, a tick landing after the segment should have finished draws a point past the end
    /// of the segment.
    pub clamp_fraction: bool,
    pub route_style: PolylineStyle,
    pub trail_style: PolylineStyle,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16.0,
            segment_duration_ms: 800.0,
            camera_duration_ms: 500.0,
            bearing_offset_degrees: 20.0,
            initial_zoom: 14.0,
            padding_fraction: 0.1,
            clamp_fraction: true,
            route_style: PolylineStyle {
                width: 15.0,
                color: "#9E9E9E".to_string(),
                geodesic: true,
            },
            trail_style: PolylineStyle {
                width: 10.0,
                color: "#000000".to_string(),
                geodesic: false,
            },
        }
    }
}

impl AnimationConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Anything shorter than a millisecond rounds to no time at all
        for (name, ms) in [
            ("tick_interval_ms", self.tick_interval_ms),
            ("segment_duration_ms", self.segment_duration_ms),
        ] {
            if !(ms >= 1.0) || !ms.is_finite() {
                bail!("{name} must be at least 1ms, not {ms}");
            }
        }
        if self.tick_interval() <= Duration::ZERO || self.segment_duration() <= Duration::ZERO {
            bail!("tick_interval_ms and segment_duration_ms must both be some time");
        }
        if !(self.camera_duration_ms >= 0.0) || !self.camera_duration_ms.is_finite() {
            bail!(
                "camera_duration_ms must be a non-negative number, not {}",
                self.camera_duration_ms
            );
        }
        if !(0.0..0.5).contains(&self.padding_fraction) {
            bail!(
                "padding_fraction must be in [0, 0.5), not {}",
                self.padding_fraction
            );
        }
        for style in [&self.route_style, &self.trail_style] {
            if !is_hex_color(&style.color) {
                bail!("Colors must look like #9E9E9E, not {}", style.color);
            }
            if !(style.width > 0.0) {
                bail!("Line widths must be positive, not {}", style.width);
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::seconds(self.tick_interval_ms / 1000.0)
    }

    pub fn segment_duration(&self) -> Duration {
        Duration::seconds(self.segment_duration_ms / 1000.0)
    }

    pub fn camera_duration(&self) -> Duration {
        Duration::seconds(self.camera_duration_ms / 1000.0)
    }
}

fn is_hex_color(raw: &str) -> bool {
    raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnimationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::seconds(0.016));
        assert_eq!(config.segment_duration(), Duration::seconds(0.8));
        assert_eq!(config.camera_duration(), Duration::seconds(0.5));
    }

    #[test]
    fn test_partial_json() {
        let config =
            AnimationConfig::from_json(r#"{"segment_duration_ms": 400, "clamp_fraction": false}"#)
                .unwrap();
        assert_eq!(config.segment_duration_ms, 400.0);
        assert!(!config.clamp_fraction);
        assert_eq!(config.tick_interval_ms, 16.0);
        assert_eq!(config.route_style.color, "#9E9E9E");
    }

    #[test]
    fn test_invalid() {
        assert!(AnimationConfig::from_json(r#"{"tick_interval_ms": 0}"#).is_err());
        assert!(AnimationConfig::from_json(r#"{"segment_duration_ms": -5}"#).is_err());
        assert!(AnimationConfig::from_json(r#"{"padding_fraction": 0.5}"#).is_err());
        assert!(AnimationConfig::from_json("not json").is_err());
        assert!(AnimationConfig::from_json(
            r##"{"trail_style": {"width": 10, "color": "black", "geodesic": false}}"##
        )
        .is_err());
    }

    #[test]
    fn test_sub_millisecond_durations() {
        // These would round to a zero Duration
        assert!(AnimationConfig::from_json(r#"{"tick_interval_ms": 0.04}"#).is_err());
        assert!(AnimationConfig::from_json(r#"{"segment_duration_ms": 0.04}"#).is_err());
        assert!(AnimationConfig::from_json(r#"{"tick_interval_ms": 0.9}"#).is_err());
        assert!(AnimationConfig::from_json(r#"{"camera_duration_ms": 1e400}"#).is_err());
        assert!(AnimationConfig::from_json(r#"{"tick_interval_ms": 1}"#).is_ok());
    }
}
