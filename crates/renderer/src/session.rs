//! Session lifecycle: wires the surface, pipeline, uniforms, animation and
//! sentinel together and guarantees they are released exactly once.

use std::time::Instant;

use prismconfig::{AnimationType, EffectParams, PrismConfig, RenderTuning, MIN_EXTENT};
use tracing::{debug, info, warn};

use crate::animation::{AnimationController, AnimationPhase, PointerState, RotationSeed};
use crate::compile::ProgramSource;
use crate::gpu::{Gpu, UniformState};
use crate::runtime::FrameScheduler;
use crate::sentinel::Sentinel;
use crate::surface::SurfaceManager;
use crate::types::{Container, DrawableSize, ObserverId, ObserverKind, RenderError};

/// One mounted instance of the effect.
///
/// Handlers are no-ops once the session is stopped or the container reports
/// itself disconnected, so late host events are harmless.
pub struct RenderSession<C: Container, G: Gpu> {
    container: C,
    surface: SurfaceManager<G>,
    program: Option<G::Program>,
    geometry: Option<G::Geometry>,
    params: EffectParams,
    uniforms: UniformState,
    animation: AnimationController,
    sentinel: Sentinel,
    scheduler: FrameScheduler,
    pointer: PointerState,
    observers: Vec<(ObserverKind, ObserverId)>,
    started_at: Instant,
    stopped: bool,
}

impl<C: Container, G: Gpu> RenderSession<C, G> {
    /// Brings a session up against `container`.
    ///
    /// `connect` allocates the GPU context for the measured drawable. If any
    /// step fails, everything acquired so far is released before the error is
    /// returned.
    pub fn start<F>(
        mut container: C,
        config: &PrismConfig,
        tuning: &RenderTuning,
        seed: RotationSeed,
        now: Instant,
        connect: F,
    ) -> Result<Self, RenderError>
    where
        F: FnOnce(DrawableSize) -> Result<G, RenderError>,
    {
        let params = config.normalized();
        warn_if_clamped(config, &params);

        let mut surface =
            SurfaceManager::create(&container, tuning.max_device_pixel_ratio, connect)?;
        let (program, geometry) = match build_pipeline(&mut surface) {
            Ok(pair) => pair,
            Err(err) => {
                surface.destroy();
                return Err(err);
            }
        };

        let mut uniforms = UniformState::initialize(&params);
        uniforms.apply_resize(surface.size());

        let mut observers = vec![(
            ObserverKind::Resize,
            container.observe(ObserverKind::Resize),
        )];
        if params.suspend_when_offscreen {
            observers.push((
                ObserverKind::Intersection,
                container.observe(ObserverKind::Intersection),
            ));
        }
        if params.animation == AnimationType::Hover {
            observers.push((ObserverKind::Pointer, container.observe(ObserverKind::Pointer)));
        }

        let mut animation = AnimationController::new(&params, seed);
        let mut scheduler = FrameScheduler::new(tuning.fps_cap());
        // Offscreen-aware sessions wait for the first visibility report.
        if !params.suspend_when_offscreen {
            animation.resume();
            scheduler.request();
        }

        let size = surface.size();
        info!(
            width = size.width,
            height = size.height,
            device_pixel_ratio = size.device_pixel_ratio,
            animation = %params.animation,
            deferred = params.suspend_when_offscreen,
            "prism session started"
        );

        Ok(Self {
            container,
            surface,
            program: Some(program),
            geometry: Some(geometry),
            params,
            uniforms,
            animation,
            sentinel: Sentinel::new(tuning.resize_debounce, tuning.visibility_threshold),
            scheduler,
            pointer: PointerState::default(),
            observers,
            started_at: now,
            stopped: false,
        })
    }

    fn is_live(&self) -> bool {
        !self.stopped && self.container.is_connected()
    }

    /// Container box changed; the drawable follows after the quiet window.
    pub fn handle_resize(&mut self, now: Instant) {
        if self.is_live() {
            self.sentinel.observe_resize(now);
        }
    }

    /// Applies a due debounced resize. Returns true when the drawable changed.
    pub fn pump(&mut self, now: Instant) -> bool {
        if !self.is_live() || !self.sentinel.poll(now) {
            return false;
        }
        self.apply_resize()
    }

    /// Re-measures the container immediately, bypassing the debounce.
    pub fn apply_resize(&mut self) -> bool {
        if !self.is_live() {
            return false;
        }
        let (width, height) = self.container.client_size();
        let ratio = self.container.device_pixel_ratio();
        match self.surface.resize(width, height, ratio) {
            Some(size) => {
                self.uniforms.apply_resize(size);
                true
            }
            None => false,
        }
    }

    /// Intersection ratio of the container with the viewport.
    pub fn handle_visibility(&mut self, ratio: f32) {
        if !self.is_live() || !self.params.suspend_when_offscreen {
            return;
        }
        match self.sentinel.observe_intersection(ratio) {
            Some(true) => {
                if self.animation.resume() {
                    self.scheduler.request();
                }
            }
            Some(false) => {
                if self.animation.suspend() {
                    self.scheduler.cancel();
                }
            }
            None => {}
        }
    }

    /// Pointer position in viewport coordinates; only hover sessions listen.
    pub fn handle_pointer_move(&mut self, x: f64, y: f64, viewport_width: f64, viewport_height: f64) {
        if !self.is_live() || self.params.animation != AnimationType::Hover {
            return;
        }
        self.pointer = PointerState::from_viewport(x, y, viewport_width, viewport_height);
    }

    /// True when the pending frame may be drawn at `now`.
    pub fn wants_frame(&self, now: Instant) -> bool {
        self.is_live() && self.scheduler.ready_for_frame(now)
    }

    /// Earliest instant the host should wake up for a debounce or capped frame.
    pub fn next_wakeup(&self) -> Option<Instant> {
        if !self.is_live() {
            return None;
        }
        match (self.sentinel.deadline(), self.scheduler.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Frame callback: consumes the pending request, advances the animation,
    /// writes the uniforms and issues one draw, then requests the next frame.
    ///
    /// Returns whether a frame was presented. Transient surface errors skip
    /// the frame; fatal errors stop the session.
    pub fn frame(&mut self, now: Instant) -> Result<bool, RenderError> {
        if !self.is_live() || !self.scheduler.take() {
            return Ok(false);
        }
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f32();
        let Some(rotation) = self.animation.tick(elapsed, &self.pointer) else {
            return Ok(false);
        };
        self.uniforms.tick(elapsed, &rotation);

        let (Some(gpu), Some(program), Some(geometry)) = (
            self.surface.gpu_mut(),
            self.program.as_ref(),
            self.geometry.as_ref(),
        ) else {
            return Ok(false);
        };
        let uniforms = self.uniforms.snapshot();
        match gpu.draw(program, geometry, &uniforms) {
            Ok(()) => {
                self.scheduler.mark_rendered(now);
                self.scheduler.request();
                Ok(true)
            }
            Err(err) if !err.is_fatal() => {
                warn!(error = %err, "skipping frame");
                self.scheduler.request();
                Ok(false)
            }
            Err(err) => {
                self.stop();
                Err(err)
            }
        }
    }

    /// Tears the session down. Safe to call repeatedly; returns whether this
    /// call did the work.
    pub fn stop(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.stopped = true;
        // No draw may follow resource release.
        self.scheduler.cancel();
        self.animation.destroy();
        self.sentinel.clear();
        for (kind, id) in self.observers.drain(..) {
            debug!(?kind, "detaching observer");
            self.container.unobserve(id);
        }
        self.program = None;
        self.geometry = None;
        self.surface.destroy();
        info!("prism session stopped");
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn phase(&self) -> AnimationPhase {
        self.animation.phase()
    }

    pub fn animation(&self) -> &AnimationController {
        &self.animation
    }

    pub fn uniforms(&self) -> &UniformState {
        &self.uniforms
    }

    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn drawable_size(&self) -> DrawableSize {
        self.surface.size()
    }

    pub fn surface_generation(&self) -> u64 {
        self.surface.generation()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn is_observing(&self, kind: ObserverKind) -> bool {
        self.observers.iter().any(|(k, _)| *k == kind)
    }

    pub fn frame_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn container(&self) -> &C {
        &self.container
    }
}

impl<C: Container, G: Gpu> Drop for RenderSession<C, G> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_pipeline<G: Gpu>(
    surface: &mut SurfaceManager<G>,
) -> Result<(G::Program, G::Geometry), RenderError> {
    let gpu = surface
        .gpu_mut()
        .ok_or_else(|| RenderError::ContextUnavailable("surface already released".into()))?;
    let program = gpu.compile_program(&ProgramSource::PRISM)?;
    let geometry = gpu.create_geometry()?;
    Ok((program, geometry))
}

fn warn_if_clamped(config: &PrismConfig, params: &EffectParams) {
    for (name, given, used) in [
        ("height", config.height, params.height),
        ("base_width", config.base_width, params.base_width),
        ("scale", config.scale, params.scale),
    ] {
        if given < MIN_EXTENT {
            warn!(field = name, given, used, "non-positive extent clamped");
        }
    }
    if config.inertia != params.inertia {
        warn!(given = config.inertia, used = params.inertia, "inertia adjusted");
    }
}
