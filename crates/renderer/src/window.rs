use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{debug, error, trace};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::animation::RotationSeed;
use crate::gpu::GpuContext;
use crate::session::RenderSession;
use crate::types::{Container, ObserverId, ObserverKind, RenderError, RendererConfig};

const DEFAULT_WINDOW_SIZE: (u32, u32) = (1280, 720);
const DEFAULT_TITLE: &str = "Prism";

/// A desktop window standing in for the host container.
///
/// Observers are bookkeeping only: the event loop forwards window events to
/// the session, which ignores the kinds it did not subscribe to.
pub struct WindowContainer {
    window: Arc<Window>,
    observers: HashMap<ObserverId, ObserverKind>,
    next_id: u64,
}

impl WindowContainer {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            observers: HashMap::new(),
            next_id: 0,
        }
    }
}

impl Container for WindowContainer {
    fn client_size(&self) -> (u32, u32) {
        let logical: LogicalSize<f64> = self
            .window
            .inner_size()
            .to_logical(self.window.scale_factor());
        (
            logical.width.round().max(0.0) as u32,
            logical.height.round().max(0.0) as u32,
        )
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    fn observe(&mut self, kind: ObserverKind) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.insert(id, kind);
        debug!(?kind, id = id.0, "window observer attached");
        id
    }

    fn unobserve(&mut self, id: ObserverId) {
        // The window may already be gone; detaching is bookkeeping either way.
        self.observers.remove(&id);
    }
}

/// Runs the prism effect in a native window until it is closed.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Blocks on the winit event loop.
    pub fn run(self) -> Result<()> {
        run_window(self.config)
    }
}

fn run_window(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoopBuilder::new()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let (width, height) = config.window_size.unwrap_or(DEFAULT_WINDOW_SIZE);
    let transparent = config.prism.transparent;
    let window = WindowBuilder::new()
        .with_title(config.title.as_deref().unwrap_or(DEFAULT_TITLE))
        .with_inner_size(LogicalSize::new(width, height))
        .with_transparent(transparent)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create prism window: {err}"))?;
    let window = Arc::new(window);

    let seed = match config.tuning.seed {
        Some(seed) => RotationSeed::from_seed(seed),
        None => RotationSeed::random(),
    };
    debug!(?seed, "rotation seed drawn");

    let surface_window = window.clone();
    let mut session = RenderSession::start(
        WindowContainer::new(window.clone()),
        &config.prism,
        &config.tuning,
        seed,
        Instant::now(),
        move |size| GpuContext::new(surface_window, size, transparent),
    )
    .map_err(|err| anyhow!("failed to start prism session: {err}"))?;
    // A freshly mapped window is on screen; winit only reports later occlusion.
    session.handle_visibility(1.0);

    let mut fatal: Option<RenderError> = None;
    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                session.stop();
                elwt.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                session.stop();
                elwt.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                session.handle_resize(Instant::now());
            }
            WindowEvent::Occluded(occluded) => {
                session.handle_visibility(if occluded { 0.0 } else { 1.0 });
            }
            WindowEvent::CursorMoved { position, .. } => {
                let size = window.inner_size();
                session.handle_pointer_move(
                    position.x,
                    position.y,
                    f64::from(size.width),
                    f64::from(size.height),
                );
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = session.frame(Instant::now()) {
                    error!(error = %err, "fatal render error; closing window");
                    fatal = Some(err);
                    elwt.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            if session.is_stopped() {
                elwt.exit();
                return;
            }
            session.pump(now);
            if session.wants_frame(now) {
                trace!("scheduler: issuing redraw now");
                window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = session.next_wakeup() {
                let ms = deadline.saturating_duration_since(now).as_millis();
                trace!(deadline_ms = ms, "scheduler: waiting until next deadline");
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                trace!("scheduler: idle (no frame requested)");
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    });

    session.stop();
    if let Some(err) = fatal {
        return Err(anyhow!("prism renderer failed: {err}"));
    }
    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
