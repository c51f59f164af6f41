// GUI Controller - Bridges the Slint UI with the solving session
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - Session (job controller, stats and grid)
// - Renderer (display list for the drawing surface)
//
// A Slint Timer is the frame loop. Every tick drains the live unit's queue into the
// session, renders a frame and adjusts the timer interval to the session's frame rate.

use crate::metrics::Metrics;
use crate::models::DisplaySettings;
use crate::render::{DisplayList, DrawCommand, Layout, Renderer, Rgb, TextAlign};
use crate::services::UnitLauncher;
use crate::state::{FrameRate, Session, SessionChange};
use anyhow::{Context, Result};
use slint::{ModelRc, Timer, TimerMode, VecModel};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::{Duration, Instant};

// Include the generated Slint code
slint::include_modules!();

/// GUI Controller that wires up the Slint UI with the session and the frame loop
///
/// Everything here lives on the Slint event loop thread. The session is shared between the
/// input callbacks and the frame tick through `Rc<RefCell<..>>`.
///
/// # Example
/// ```ignore
/// let launcher = ProcessLauncher::new("banana-solver", vec![], runtime.handle().clone(), metrics.clone());
/// let controller = GuiController::new(launcher, &config.display, metrics)?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController<L: UnitLauncher + 'static> {
    /// The Slint UI window
    ui: MainWindow,

    /// The active job, shared with the callbacks and the frame tick
    session: Rc<RefCell<Session<L>>>,

    /// Drives pump-and-render; its interval follows the session's frame rate
    frame_timer: Rc<Timer>,
}

impl<L: UnitLauncher + 'static> GuiController<L> {
    /// Create a new GUI controller
    ///
    /// # Arguments
    /// * `launcher` - Starts a computation unit for each job
    /// * `display` - Layout and frame pacing settings
    /// * `metrics` - Shared session metrics
    pub fn new(launcher: L, display: &DisplaySettings, metrics: Arc<Metrics>) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;

        let session = Rc::new(RefCell::new(Session::new(launcher, Arc::clone(&metrics))));
        let frame_timer = Rc::new(Timer::default());
        let pacing = FramePacing::new(display, Rc::downgrade(&frame_timer));

        ui.set_temperature_label(format_temperature(f64::from(ui.get_temperature())).into());

        Self::setup_callbacks(&ui, &session, &pacing);
        Self::start_frame_loop(&ui, &session, &frame_timer, pacing, display, metrics);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            session,
            frame_timer,
        })
    }

    /// Run the GUI (blocks until window is closed)
    ///
    /// The live unit, if any, is terminated once the event loop returns.
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        let result = self.ui.run();

        self.frame_timer.stop();
        self.session.borrow_mut().shutdown();
        result
    }

    /// Set up Slint UI callbacks
    fn setup_callbacks(ui: &MainWindow, session: &Rc<RefCell<Session<L>>>, pacing: &FramePacing) {
        let session_for_solve = Rc::clone(session);
        let pacing_for_solve = pacing.clone();
        let ui_weak = ui.as_weak();

        ui.on_start_solve(move |letters, temperature| {
            tracing::info!("Solve requested");

            let result = session_for_solve
                .borrow_mut()
                .start_job(&letters, f64::from(temperature));

            let error_message = match result {
                Ok(changes) => {
                    changes.iter().for_each(log_change);
                    String::new()
                }
                Err(e) => format!("Could not start the solver: {}", e),
            };
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_error_message(error_message.into());
            }

            // Switch pacing now so the wait for the unit's ready signal runs at full rate
            pacing_for_solve.apply(session_for_solve.borrow().frame_rate());
        });

        let ui_weak = ui.as_weak();
        ui.on_temperature_changed(move |temperature| {
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_temperature_label(format_temperature(f64::from(temperature)).into());
            }
        });

        // Window close event handler
        let session_for_close = Rc::clone(session);
        ui.window().on_close_requested(move || {
            tracing::info!("Close requested - stopping the live unit");
            session_for_close.borrow_mut().shutdown();
            slint::CloseRequestResponse::HideWindow
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Start the repeating frame timer at the idle rate
    fn start_frame_loop(
        ui: &MainWindow,
        session: &Rc<RefCell<Session<L>>>,
        frame_timer: &Timer,
        pacing: FramePacing,
        display: &DisplaySettings,
        metrics: Arc<Metrics>,
    ) {
        let ui_weak = ui.as_weak();
        let session = Rc::clone(session);
        let mut renderer = Renderer::new(Layout::from_settings(display), viewport_size(ui));
        let items = Rc::new(VecModel::<DrawItem>::default());
        ui.set_items(ModelRc::from(Rc::clone(&items)));

        let interval = pacing.interval(FrameRate::Idle);
        frame_timer.start(TimerMode::Repeated, interval, move || {
            let Some(ui) = ui_weak.upgrade() else {
                return;
            };
            let (list, rate) = {
                let mut session = session.borrow_mut();
                session.pump().iter().for_each(log_change);
                let now = Instant::now();
                let list = renderer.render(&session.view(), viewport_size(&ui), now);
                (list, session.frame_rate())
            };

            ui.set_surface_width(list.width);
            ui.set_surface_height(list.height);
            items.set_vec(draw_items(&list));
            metrics.record_frame();

            pacing.apply(rate);
        });

        tracing::debug!("Frame loop started at {:?} per frame", interval);
    }
}

/// Maps the session's frame rate onto the frame timer's interval
#[derive(Clone)]
struct FramePacing {
    running: Duration,
    idle: Duration,
    current: Rc<Cell<FrameRate>>,
    timer: Weak<Timer>,
}

impl FramePacing {
    fn new(display: &DisplaySettings, timer: Weak<Timer>) -> Self {
        Self {
            running: frame_interval(display.running_fps),
            idle: frame_interval(display.idle_fps),
            current: Rc::new(Cell::new(FrameRate::Idle)),
            timer,
        }
    }

    fn interval(&self, rate: FrameRate) -> Duration {
        match rate {
            FrameRate::Running => self.running,
            FrameRate::Idle => self.idle,
        }
    }

    fn apply(&self, rate: FrameRate) {
        if self.current.get() == rate {
            return;
        }
        self.current.set(rate);

        if let Some(timer) = self.timer.upgrade() {
            tracing::debug!("Frame rate -> {:?}", rate);
            timer.set_interval(self.interval(rate));
        }
    }
}

/// Time between frames for `fps`, treating zero as one frame per second.
pub fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs(1) / fps.max(1)
}

/// Temperature as shown next to the slider: rounded to three decimals, no trailing zeros.
pub fn format_temperature(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    // Avoid "-0" for tiny negative inputs
    format!("{}", rounded + 0.0)
}

fn log_change(change: &SessionChange) {
    match change {
        SessionChange::JobRequested { job, unit } => {
            tracing::info!("Job {} waiting for unit {} to become ready", job, unit);
        }
        SessionChange::JobStarted {
            letters,
            temperature,
        } => {
            tracing::info!(
                "Job started: {} letters at temperature {:.3}",
                letters.len(),
                temperature
            );
        }
        SessionChange::NewBest { score } => {
            tracing::debug!("Best so far: {} remaining", score);
        }
        SessionChange::Solved => tracing::info!("All letters placed"),
        SessionChange::Finished { solved, best_score } => {
            tracing::info!("Job finished: solved={}, remaining={}", solved, best_score);
        }
    }
}

fn viewport_size(ui: &MainWindow) -> (f32, f32) {
    (ui.get_viewport_width(), ui.get_viewport_height())
}

fn color(rgb: Option<Rgb>) -> slint::Color {
    match rgb {
        Some(Rgb(r, g, b)) => slint::Color::from_rgb_u8(r, g, b),
        None => slint::Color::from_argb_u8(0, 0, 0, 0),
    }
}

fn stroke_width(stroke: Option<Rgb>) -> f32 {
    if stroke.is_some() { 1.0 } else { 0.0 }
}

/// Convert a display list into the items the Slint surface draws.
fn draw_items(list: &DisplayList) -> Vec<DrawItem> {
    list.commands
        .iter()
        .map(|command| draw_item(command, list.width, list.height))
        .collect()
}

fn draw_item(command: &DrawCommand, surface_width: f32, surface_height: f32) -> DrawItem {
    match command {
        DrawCommand::Clear(rgb) => DrawItem {
            kind: 0,
            width: surface_width,
            height: surface_height,
            fill: color(Some(*rgb)),
            stroke: color(None),
            ..Default::default()
        },
        DrawCommand::Rect {
            x,
            y,
            width,
            height,
            paint,
        } => DrawItem {
            kind: 0,
            x: *x,
            y: *y,
            width: *width,
            height: *height,
            fill: color(paint.fill),
            stroke: color(paint.stroke),
            stroke_width: stroke_width(paint.stroke),
            ..Default::default()
        },
        DrawCommand::Text {
            x,
            y,
            text,
            size,
            color: rgb,
            align,
        } => {
            // Text is vertically centred on its anchor; give it a box twice the font size tall
            let (box_x, box_width) = match align {
                TextAlign::Left => (*x, (surface_width - x).max(0.0)),
                TextAlign::Center => (x - size, size * 2.0),
            };
            DrawItem {
                kind: 1,
                x: box_x,
                y: y - size,
                width: box_width,
                height: size * 2.0,
                fill: color(Some(*rgb)),
                stroke: color(None),
                text: text.as_str().into(),
                font_size: *size,
                align_center: *align == TextAlign::Center,
                ..Default::default()
            }
        }
        DrawCommand::Line { stroke, .. } => DrawItem {
            kind: 2,
            fill: color(None),
            stroke: color(Some(*stroke)),
            stroke_width: 1.0,
            commands: command.svg_path().unwrap_or_default().into(),
            ..Default::default()
        },
        DrawCommand::Circle { paint, .. }
        | DrawCommand::Arc { paint, .. }
        | DrawCommand::Triangle { paint, .. } => DrawItem {
            kind: 2,
            fill: color(paint.fill),
            stroke: color(paint.stroke),
            stroke_width: stroke_width(paint.stroke),
            commands: command.svg_path().unwrap_or_default().into(),
            ..Default::default()
        },
    }
}
