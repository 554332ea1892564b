use tracing::debug;

use crate::gpu::Gpu;
use crate::types::{Container, DrawableSize, RenderError};

/// Owns the GPU context and keeps the drawable sized to its container.
pub struct SurfaceManager<G> {
    gpu: Option<G>,
    size: DrawableSize,
    max_device_pixel_ratio: f64,
    generation: u64,
}

impl<G: Gpu> SurfaceManager<G> {
    /// Measures `container` and hands the resulting drawable size to `connect`,
    /// which allocates the context.
    pub fn create<C, F>(
        container: &C,
        max_device_pixel_ratio: f64,
        connect: F,
    ) -> Result<Self, RenderError>
    where
        C: Container + ?Sized,
        F: FnOnce(DrawableSize) -> Result<G, RenderError>,
    {
        let (width, height) = container.client_size();
        let ratio = capped_ratio(container.device_pixel_ratio(), max_device_pixel_ratio);
        let size = DrawableSize::from_client(width, height, ratio);
        let gpu = connect(size)?;
        debug!(
            width = size.width,
            height = size.height,
            ratio,
            "allocated drawable"
        );
        Ok(Self {
            gpu: Some(gpu),
            size,
            max_device_pixel_ratio,
            generation: 1,
        })
    }

    /// Re-measures to `client_width`x`client_height` logical pixels.
    ///
    /// Returns the new size when the drawable was reallocated, `None` when the
    /// dimensions are unchanged or the surface is already destroyed.
    pub fn resize(
        &mut self,
        client_width: u32,
        client_height: u32,
        device_pixel_ratio: f64,
    ) -> Option<DrawableSize> {
        let gpu = self.gpu.as_mut()?;
        let ratio = capped_ratio(device_pixel_ratio, self.max_device_pixel_ratio);
        let next = DrawableSize::from_client(client_width, client_height, ratio);
        if next.same_extent(&self.size) && next.device_pixel_ratio == self.size.device_pixel_ratio
        {
            return None;
        }
        if !next.same_extent(&self.size) {
            gpu.configure(next.width, next.height);
            self.generation += 1;
            debug!(
                width = next.width,
                height = next.height,
                generation = self.generation,
                "reallocated drawable"
            );
        }
        self.size = next;
        Some(next)
    }

    /// Releases the context. Safe to call repeatedly; returns whether anything
    /// was released by this call.
    pub fn destroy(&mut self) -> bool {
        match self.gpu.take() {
            Some(gpu) => {
                drop(gpu);
                debug!(generation = self.generation, "released drawable");
                true
            }
            None => false,
        }
    }

    pub fn gpu_mut(&mut self) -> Option<&mut G> {
        self.gpu.as_mut()
    }

    pub fn is_alive(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn size(&self) -> DrawableSize {
        self.size
    }

    /// Bumped every time the drawable is (re)allocated.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn capped_ratio(device_pixel_ratio: f64, cap: f64) -> f64 {
    let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    ratio.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeContainer, FakeGpu, GpuLedger};

    fn manager(container: &FakeContainer, ledger: &GpuLedger) -> SurfaceManager<FakeGpu> {
        SurfaceManager::create(container, 1.5, |size| Ok(FakeGpu::new(ledger, size))).unwrap()
    }

    #[test]
    fn create_sizes_to_client_box_with_capped_ratio() {
        let ledger = GpuLedger::default();
        let container = FakeContainer::new(800, 600, 2.0);
        let surface = manager(&container, &ledger);
        assert_eq!(surface.size().width, 1200);
        assert_eq!(surface.size().height, 900);
        assert_eq!(surface.size().device_pixel_ratio, 1.5);
    }

    #[test]
    fn unlaid_out_container_gets_one_pixel_drawable() {
        let ledger = GpuLedger::default();
        let container = FakeContainer::new(0, 0, 1.0);
        let surface = manager(&container, &ledger);
        assert_eq!((surface.size().width, surface.size().height), (1, 1));
    }

    #[test]
    fn resize_is_idempotent_for_unchanged_dimensions() {
        let ledger = GpuLedger::default();
        let container = FakeContainer::new(800, 600, 1.0);
        let mut surface = manager(&container, &ledger);
        assert!(surface.resize(1024, 768, 1.0).is_some());
        let generation = surface.generation();
        assert!(surface.resize(1024, 768, 1.0).is_none());
        assert_eq!(surface.generation(), generation);
        assert_eq!(ledger.configure_calls(), 1);
    }

    #[test]
    fn zero_area_resize_falls_back_to_one_pixel() {
        let ledger = GpuLedger::default();
        let container = FakeContainer::new(800, 600, 1.0);
        let mut surface = manager(&container, &ledger);
        let size = surface.resize(0, 0, 1.0).unwrap();
        assert_eq!((size.width, size.height), (1, 1));
        assert!(surface.is_alive());
    }

    #[test]
    fn destroy_releases_once() {
        let ledger = GpuLedger::default();
        let container = FakeContainer::new(800, 600, 1.0);
        let mut surface = manager(&container, &ledger);
        assert!(surface.destroy());
        assert!(!surface.destroy());
        assert_eq!(ledger.releases(), 1);
        assert!(surface.resize(10, 10, 1.0).is_none());
    }

    #[test]
    fn invalid_pixel_ratio_treated_as_one() {
        assert_eq!(capped_ratio(f64::NAN, 1.5), 1.0);
        assert_eq!(capped_ratio(0.0, 1.5), 1.0);
        assert_eq!(capped_ratio(1.25, 1.5), 1.25);
        assert_eq!(capped_ratio(3.0, 2.0), 2.0);
    }
}
