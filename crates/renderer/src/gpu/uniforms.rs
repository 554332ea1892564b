use bytemuck::{Pod, Zeroable};
use prismconfig::{AnimationType, EffectParams, Offset};

use crate::types::DrawableSize;

/// Column-major 3x3 matrix as produced by [`crate::animation::rotation_matrix`].
pub type Mat3 = [f32; 9];

pub const IDENTITY: Mat3 = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// std140 image of the `PrismParams` uniform block in the fragment shader.
///
/// The `mat3` occupies three `vec4` columns, so `rotation` keeps a padding
/// float per column.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PrismUniforms {
    pub resolution: [f32; 2],
    pub offset_px: [f32; 2],
    pub time: f32,
    pub height: f32,
    pub base_half: f32,
    pub use_base_wobble: i32,
    pub glow: f32,
    pub noise: f32,
    pub saturation: f32,
    pub scale: f32,
    pub hue_shift: f32,
    pub color_freq: f32,
    pub bloom: f32,
    pub center_shift: f32,
    pub inv_base_half: f32,
    pub inv_height: f32,
    pub min_axis: f32,
    pub px_scale: f32,
    pub time_scale: f32,
    pub _padding: [f32; 3],
    pub rotation: [[f32; 4]; 3],
}

fn std140_columns(matrix: &Mat3) -> [[f32; 4]; 3] {
    [
        [matrix[0], matrix[1], matrix[2], 0.0],
        [matrix[3], matrix[4], matrix[5], 0.0],
        [matrix[6], matrix[7], matrix[8], 0.0],
    ]
}

fn pixel_scale(drawable_height: u32, scale: f32) -> f32 {
    1.0 / (drawable_height.max(1) as f32 * 0.1 * scale)
}

/// Uniform values read by the shader every frame.
///
/// Configuration-derived constants are fixed in [`UniformState::initialize`];
/// afterwards only [`UniformState::apply_resize`] and [`UniformState::tick`]
/// mutate the block.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformState {
    scale: f32,
    offset: Offset,
    values: PrismUniforms,
}

impl UniformState {
    pub fn initialize(params: &EffectParams) -> Self {
        let base_half = params.base_half();
        let height = params.height;
        let values = PrismUniforms {
            resolution: [0.0, 0.0],
            offset_px: [0.0, 0.0],
            time: 0.0,
            height,
            base_half,
            use_base_wobble: i32::from(params.animation == AnimationType::Rotate),
            glow: params.glow,
            noise: params.noise,
            saturation: params.saturation,
            scale: params.scale,
            hue_shift: params.hue_shift,
            color_freq: params.color_frequency,
            bloom: params.bloom,
            center_shift: height * 0.25,
            inv_base_half: 1.0 / base_half,
            inv_height: 1.0 / height,
            min_axis: base_half.min(height),
            px_scale: pixel_scale(1, params.scale),
            time_scale: params.time_scale,
            _padding: [0.0; 3],
            rotation: std140_columns(&IDENTITY),
        };
        Self {
            scale: params.scale,
            offset: params.offset,
            values,
        }
    }

    /// Recomputes resolution-dependent values after the drawable changed.
    pub fn apply_resize(&mut self, size: DrawableSize) {
        let ratio = size.device_pixel_ratio as f32;
        self.values.resolution = [size.width as f32, size.height as f32];
        self.values.offset_px = [self.offset.x * ratio, self.offset.y * ratio];
        self.values.px_scale = pixel_scale(size.height, self.scale);
    }

    pub fn tick(&mut self, elapsed_seconds: f32, rotation: &Mat3) {
        self.values.time = elapsed_seconds;
        self.values.rotation = std140_columns(rotation);
    }

    pub fn snapshot(&self) -> PrismUniforms {
        self.values
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.values)
    }

    pub fn inverse_base_half(&self) -> f32 {
        self.values.inv_base_half
    }

    pub fn inverse_height(&self) -> f32 {
        self.values.inv_height
    }

    pub fn min_axis(&self) -> f32 {
        self.values.min_axis
    }

    pub fn pixel_scale(&self) -> f32 {
        self.values.px_scale
    }

    pub fn resolution(&self) -> [f32; 2] {
        self.values.resolution
    }
}

#[cfg(test)]
mod tests {
    use prismconfig::PrismConfig;

    use super::*;

    fn params(height: f32, base_width: f32) -> EffectParams {
        PrismConfig {
            height,
            base_width,
            ..PrismConfig::default()
        }
        .normalized()
    }

    #[test]
    fn block_matches_std140_layout() {
        assert_eq!(std::mem::size_of::<PrismUniforms>(), 144);
        assert_eq!(std::mem::offset_of!(PrismUniforms, time_scale), 80);
        assert_eq!(std::mem::offset_of!(PrismUniforms, rotation), 96);
    }

    #[test]
    fn derived_constants_follow_geometry() {
        for (height, base_width) in [(3.5, 5.5), (1.0, 10.0), (8.0, 0.5), (0.002, 0.004)] {
            let state = UniformState::initialize(&params(height, base_width));
            let half = base_width / 2.0;
            assert!((state.inverse_base_half() - 1.0 / half).abs() < 1e-3 * (1.0 / half));
            assert!((state.inverse_height() - 1.0 / height).abs() < 1e-3 * (1.0 / height));
            assert_eq!(state.min_axis(), half.min(height));
        }
    }

    #[test]
    fn degenerate_geometry_never_divides_by_zero() {
        let state = UniformState::initialize(&params(0.0, -4.0));
        assert!(state.inverse_base_half().is_finite());
        assert!(state.inverse_height().is_finite());
        assert!(state.min_axis() > 0.0);
    }

    #[test]
    fn wobble_only_in_static_rotate() {
        let rotate = PrismConfig {
            animation_type: AnimationType::Rotate,
            ..PrismConfig::default()
        }
        .normalized();
        assert_eq!(UniformState::initialize(&rotate).snapshot().use_base_wobble, 1);
        let tumble = PrismConfig::default().normalized();
        assert_eq!(UniformState::initialize(&tumble).snapshot().use_base_wobble, 0);
    }

    #[test]
    fn resize_updates_resolution_scale_and_offset() {
        let config = PrismConfig {
            offset: Offset { x: 10.0, y: -4.0 },
            scale: 2.0,
            ..PrismConfig::default()
        };
        let mut state = UniformState::initialize(&config.normalized());
        let before = state.snapshot();
        state.apply_resize(DrawableSize {
            width: 1200,
            height: 900,
            device_pixel_ratio: 1.5,
        });
        let after = state.snapshot();
        assert_eq!(after.resolution, [1200.0, 900.0]);
        assert_eq!(after.offset_px, [15.0, -6.0]);
        assert!((after.px_scale - 1.0 / (900.0 * 0.1 * 2.0)).abs() < 1e-9);
        // configuration-derived constants stay put
        assert_eq!(after.inv_height, before.inv_height);
        assert_eq!(after.min_axis, before.min_axis);
    }

    #[test]
    fn tick_writes_time_and_rotation_only() {
        let mut state = UniformState::initialize(&PrismConfig::default().normalized());
        let before = state.snapshot();
        let rotation: Mat3 = [0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        state.tick(2.5, &rotation);
        let after = state.snapshot();
        assert_eq!(after.time, 2.5);
        assert_eq!(after.rotation[0], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(after.rotation[1], [-1.0, 0.0, 0.0, 0.0]);
        let mut expected = before;
        expected.time = 2.5;
        expected.rotation = after.rotation;
        assert_eq!(after, expected);
    }
}
