use widgetry::{
    Drawable, EventCtx, GfxCtx, HorizontalAlignment, Key, Line, Outcome, Panel, State, Text,
    UpdateType, VerticalAlignment, Widget,
};

use animator::{AnimatorState, RouteAnimator, Viewport};

use crate::camera::CameraTransition;
use crate::surface::MapLayer;
use crate::{App, Transition};

pub struct RouteViewer {
    panel: Panel,
    animator: RouteAnimator,
    layer: MapLayer,
    camera: Option<CameraTransition>,
    draw: Drawable,
    zoom: f64,
    // (state, running, cursor, laps) as last shown in the panel
    shown: Option<(AnimatorState, bool, usize, usize)>,
}

impl RouteViewer {
    pub fn new_state(
        ctx: &mut EventCtx,
        app: &App,
        mut animator: RouteAnimator,
    ) -> Box<dyn State<App>> {
        let mut layer = MapLayer::new(app.gps_bounds.clone());
        animator.initialize(&mut layer);

        let viewport = Viewport {
            width: ctx.canvas.window_width,
            height: ctx.canvas.window_height,
        };
        if let Err(err) = animator.frame_camera(&mut layer, viewport) {
            error!("Couldn't frame the route: {err}");
        }
        let camera = layer
            .take_camera_request()
            .map(|request| CameraTransition::new(ctx, app, request));

        let mut state = Self {
            panel: Panel::new_builder(Widget::col(vec![
                Line("Route Animator").small_heading().into_widget(ctx),
                Widget::placeholder(ctx, "status"),
                Widget::placeholder(ctx, "controls"),
            ]))
            .aligned(HorizontalAlignment::Left, VerticalAlignment::Top)
            .build(ctx),
            draw: layer.upload(ctx),
            animator,
            layer,
            camera,
            zoom: ctx.canvas.cam_zoom,
            shown: None,
        };
        state.update_panel(ctx);
        Box::new(state)
    }

    fn update_panel(&mut self, ctx: &mut EventCtx) {
        let key = (
            self.animator.state(),
            self.animator.is_running(),
            self.animator.cursor(),
            self.animator.laps_completed(),
        );
        if self.shown == Some(key) {
            return;
        }
        self.shown = Some(key);

        let status = match self.animator.state() {
            AnimatorState::Idle => "Idle",
            AnimatorState::Framing => "Framing the route",
            AnimatorState::Animating => {
                if self.animator.is_running() {
                    "Animating"
                } else {
                    "Paused"
                }
            }
            AnimatorState::CameraCancelled => "Camera cancelled; not animating",
        };
        let status = Text::from_multiline(vec![
            Line(status),
            Line(format!(
                "Segment {} of {}",
                self.animator.cursor() + 1,
                self.animator.route().num_segments()
            )),
            Line(format!("Laps completed: {}", self.animator.laps_completed())),
        ])
        .into_widget(ctx);
        self.panel.replace(ctx, "status", status);

        let controls = if self.animator.state() == AnimatorState::Animating {
            let toggle = if self.animator.is_running() {
                "pause"
            } else {
                "resume"
            };
            Widget::row(vec![
                ctx.style()
                    .btn_outline
                    .text(toggle)
                    .hotkey(Key::Space)
                    .build_def(ctx),
                ctx.style()
                    .btn_outline
                    .text("restart")
                    .hotkey(Key::R)
                    .build_def(ctx),
            ])
        } else {
            Widget::nothing()
        };
        self.panel.replace(ctx, "controls", controls);
    }
}

impl State<App> for RouteViewer {
    fn event(&mut self, ctx: &mut EventCtx, _: &mut App) -> Transition {
        ctx.canvas_movement();

        if let Some(real_dt) = ctx.input.nonblocking_is_update_event() {
            ctx.input.use_update_event();

            if let Some(ref mut camera) = self.camera {
                if let Some(outcome) = camera.step(ctx, real_dt) {
                    self.camera = None;
                    self.animator.on_camera_transition(outcome);
                }
            }
            self.animator.advance(real_dt, &mut self.layer);
        }

        if let Outcome::Clicked(x) = self.panel.event(ctx) {
            match x.as_ref() {
                "pause" => {
                    self.animator.stop();
                }
                "resume" => {
                    self.animator.start_loop();
                }
                "restart" => {
                    info!("Restarting the animation");
                    self.animator.reset(&mut self.layer);
                }
                _ => unreachable!(),
            }
        }

        if ctx.canvas.cam_zoom != self.zoom {
            self.zoom = ctx.canvas.cam_zoom;
            self.layer.mark_dirty();
        }
        if let Some(draw) = self.layer.maybe_upload(ctx) {
            self.draw = draw;
        }
        self.update_panel(ctx);

        if self.camera.is_some() || self.animator.is_running() {
            ctx.request_update(UpdateType::Game);
        }

        Transition::Keep
    }

    fn draw(&self, g: &mut GfxCtx, _: &App) {
        g.redraw(&self.draw);
        self.panel.draw(g);
    }
}
