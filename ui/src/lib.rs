#[macro_use]
extern crate log;

mod camera;
mod surface;
mod viewer;

use abstutil::Timer;
use anyhow::Result;
use geom::GPSBounds;
use structopt::StructOpt;
use widgetry::{Color, EventCtx, GfxCtx, Settings, SharedAppState};

use animator::{AnimationConfig, Route, RouteAnimator};

#[derive(StructOpt)]
struct Args {
    /// A GeoJSON file with the route, as one LineString or a list of Points. The built-in route is
    /// used if this is missing.
    #[structopt(long)]
    route: Option<String>,
    /// A JSON file overriding some animation settings
    #[structopt(long)]
    config: Option<String>,
}

impl Args {
    // TODO These args only make sense on native, because they read files
    fn load(&self) -> Result<(Route, AnimationConfig)> {
        let route = match self.route {
            Some(ref path) => Route::load_geojson(path)?,
            None => Route::default_route(),
        };
        let config = match self.config {
            Some(ref path) => {
                abstio::maybe_read_json::<AnimationConfig>(path.clone(), &mut Timer::throwaway())?
            }
            None => AnimationConfig::default(),
        };
        Ok((route, config))
    }
}

fn run(settings: Settings) {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());
    let animator = match args
        .load()
        .and_then(|(route, config)| RouteAnimator::new(route, config))
    {
        Ok(animator) => animator,
        Err(err) => {
            error!("Couldn't load the route or config: {err}");
            return;
        }
    };

    widgetry::run(settings, move |ctx| {
        let app = App::new(ctx, animator.route());
        let states = vec![viewer::RouteViewer::new_state(ctx, &app, animator)];
        (app, states)
    });
}

pub fn main() {
    let settings = Settings::new("Route Animator");
    run(settings);
}

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_wasm() {
    run(Settings::new("Route Animator").root_dom_element_id("loading".to_string()));
}

pub struct App {
    gps_bounds: GPSBounds,
}

impl SharedAppState for App {
    fn draw_default(&self, g: &mut GfxCtx) {
        if cfg!(not(target_arch = "wasm32")) {
            g.clear(Color::BLACK);
        }
    }
}

pub type Transition = widgetry::Transition<App>;

impl App {
    pub fn new(ctx: &mut EventCtx, route: &Route) -> Self {
        let gps_bounds = route.bounds();
        let bounds = gps_bounds.to_bounds();
        ctx.canvas.map_dims = (bounds.max_x, bounds.max_y);
        ctx.canvas.center_on_map_pt(bounds.center());

        Self { gps_bounds }
    }
}
