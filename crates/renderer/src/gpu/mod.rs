//! GPU side of the prism effect.
//!
//! - `context` owns the wgpu instance/device/surface and reconfigures the
//!   swapchain when the drawable is resized.
//! - `pipeline` compiles the GLSL program into a render pipeline with a
//!   single uniform bind group, and holds the full-screen triangle geometry.
//! - `uniforms` mirrors the shader's uniform block and keeps the derived
//!   constants consistent with the last applied size and configuration.
//!
//! The session talks to all of this through the [`Gpu`] trait so the
//! lifecycle logic can be exercised without a device.

mod context;
mod pipeline;
mod uniforms;

pub use context::GpuContext;
pub use pipeline::{FullscreenTriangle, PrismPipeline};
pub use uniforms::{Mat3, PrismUniforms, UniformState, IDENTITY};

use crate::compile::ProgramSource;
use crate::types::RenderError;

/// Operations the session needs from a GPU context.
///
/// Dropping the implementor releases the context.
pub trait Gpu {
    type Program;
    type Geometry;

    /// Re-allocates the drawable at the given physical size.
    fn configure(&mut self, width: u32, height: u32);

    fn compile_program(&mut self, source: &ProgramSource<'_>)
        -> Result<Self::Program, RenderError>;

    fn create_geometry(&mut self) -> Result<Self::Geometry, RenderError>;

    /// Uploads `uniforms` and issues exactly one draw of `geometry`.
    fn draw(
        &mut self,
        program: &Self::Program,
        geometry: &Self::Geometry,
        uniforms: &PrismUniforms,
    ) -> Result<(), RenderError>;
}
