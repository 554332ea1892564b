//! Renderer crate for Prism, a raymarched full-screen background effect.
//!
//! The crate glues a native window, the `wgpu` pipeline and the per-frame
//! animation together. The overall flow is:
//!
//! ```text
//!   CLI / prism
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ RenderSession::start ──▶ winit event loop
//!                            │                      │
//!                            │     Sentinel ◀───────┤ resize / occlusion / pointer
//!                            ▼                      ▼
//!                     SurfaceManager         RenderSession::frame
//!                                                   │
//!                      AnimationController::tick ──▶ UniformState::tick ──▶ Gpu::draw
//! ```
//!
//! `RenderSession` owns every resource and releases them in `stop`, cancelling
//! the pending frame before the GPU context goes away. GPU access goes through
//! the [`gpu::Gpu`] trait; [`gpu::GpuContext`] is the `wgpu` implementation.

pub mod animation;
pub mod compile;
pub mod gpu;
pub mod runtime;
pub mod sentinel;
pub mod session;
pub mod surface;
pub mod types;
mod window;

#[cfg(test)]
mod testing;

pub use animation::{
    rotation_matrix, AnimationController, AnimationPhase, Orientation, PointerState, RotationSeed,
};
pub use prismconfig::{AnimationType, EffectParams, Offset, PrismConfig, RenderTuning};
pub use runtime::FrameScheduler;
pub use sentinel::Sentinel;
pub use session::RenderSession;
pub use surface::SurfaceManager;
pub use types::{
    Container, DrawableSize, ObserverId, ObserverKind, RenderError, RendererConfig,
};
pub use window::{Renderer, WindowContainer};
