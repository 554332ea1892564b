use prismconfig::{PrismConfig, RenderTuning};

/// Physical dimensions of the drawable plus the pixel ratio used to derive them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableSize {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}

impl DrawableSize {
    /// Scales a logical client box by `device_pixel_ratio`.
    ///
    /// Axes that resolve to zero are replaced by a single pixel so the GPU
    /// never sees a zero-sized allocation.
    pub fn from_client(client_width: u32, client_height: u32, device_pixel_ratio: f64) -> Self {
        let scale = |extent: u32| ((extent as f64 * device_pixel_ratio).round() as u32).max(1);
        Self {
            width: scale(client_width),
            height: scale(client_height),
            device_pixel_ratio,
        }
    }

    pub fn same_extent(&self, other: &DrawableSize) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Host-side event sources a session subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    Resize,
    Intersection,
    Pointer,
}

/// Registration token handed back by [`Container::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// The element the effect renders into.
///
/// Sizes are reported in logical pixels; the session applies the (capped)
/// device pixel ratio itself.
pub trait Container {
    fn client_size(&self) -> (u32, u32);

    fn device_pixel_ratio(&self) -> f64;

    /// False once the host has torn the container down.
    fn is_connected(&self) -> bool {
        true
    }

    fn observe(&mut self, kind: ObserverKind) -> ObserverId;

    fn unobserve(&mut self, id: ObserverId);
}

/// Errors surfaced by the render core.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("GPU context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("drawable surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("GPU device ran out of memory")]
    OutOfMemory,
    #[error("host error: {0}")]
    Host(String),
}

impl RenderError {
    /// Transient surface errors skip a frame; everything else ends the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RenderError::SurfaceUnavailable(_))
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone, Default)]
pub struct RendererConfig {
    /// Initial window size in logical pixels.
    pub window_size: Option<(u32, u32)>,
    /// Window title for the preview window.
    pub title: Option<String>,
    pub prism: PrismConfig,
    pub tuning: RenderTuning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawable_scales_by_pixel_ratio() {
        let size = DrawableSize::from_client(800, 600, 1.5);
        assert_eq!((size.width, size.height), (1200, 900));
    }

    #[test]
    fn zero_axes_become_one_pixel() {
        let size = DrawableSize::from_client(0, 0, 1.0);
        assert_eq!((size.width, size.height), (1, 1));
        let size = DrawableSize::from_client(640, 0, 1.25);
        assert_eq!((size.width, size.height), (800, 1));
    }

    #[test]
    fn transient_errors_are_not_fatal() {
        assert!(!RenderError::SurfaceUnavailable("outdated".into()).is_fatal());
        assert!(RenderError::ShaderCompilation("bad".into()).is_fatal());
        assert!(RenderError::OutOfMemory.is_fatal());
    }
}
