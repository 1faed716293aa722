//! Animates a trail along a fixed route of waypoints, one segment at a time, looping forever.
//! Rendering and camera movement belong to the host, through `MapSurface`; time only moves when
//! the host calls `RouteAnimator::advance`.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod animator;
mod camera;
mod config;
mod route;
mod scheduler;
mod segment;
mod surface;

pub use self::animator::{AnimatorState, RouteAnimator};
pub use self::camera::{CameraOutcome, CameraRequest, Viewport};
pub use self::config::AnimationConfig;
pub use self::route::Route;
pub use self::scheduler::Scheduler;
pub use self::segment::{bearing, interpolate, segment_fraction, LatLng, Segment};
pub use self::surface::{MapSurface, PolylineID, PolylineStyle, RecordingSurface};
