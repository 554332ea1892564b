use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::types::RenderError;

/// Vertex/fragment source pair for one program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSource<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

impl ProgramSource<'static> {
    pub const PRISM: Self = Self {
        vertex: VERTEX_SHADER_GLSL,
        fragment: PRISM_FRAGMENT_GLSL,
    };
}

/// Number of raymarch steps per pixel; fixed so per-frame cost is bounded.
pub const RAYMARCH_STEPS: u32 = 80;

/// Compiles one GLSL stage, surfacing naga/wgpu validation errors instead of
/// letting them reach the device's uncaptured-error handler.
pub(crate) fn compile_stage(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_owned()),
            stage,
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(RenderError::ShaderCompilation(format!("{label}: {err}"))),
        None => Ok(module),
    }
}

/// Pass-through full-screen triangle; positions come from the geometry buffer.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 position;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
}
";

/// Raymarched anisotropic octahedron clipped to an upward pyramid.
///
/// The uniform block layout must match [`crate::gpu::PrismUniforms`].
/// `gl_FragCoord` is flipped to a bottom-left origin before use so offsets
/// and noise seeding behave the same as on a GL canvas.
pub const PRISM_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform PrismParams {
    vec2 iResolution;
    vec2 uOffsetPx;
    float iTime;
    float uHeight;
    float uBaseHalf;
    int uUseBaseWobble;
    float uGlow;
    float uNoise;
    float uSaturation;
    float uScale;
    float uHueShift;
    float uColorFreq;
    float uBloom;
    float uCenterShift;
    float uInvBaseHalf;
    float uInvHeight;
    float uMinAxis;
    float uPxScale;
    float uTimeScale;
    float _pad0;
    float _pad1;
    float _pad2;
    mat3 uRot;
};

float rand(vec2 co) {
    return fract(sin(dot(co, vec2(12.9898, 78.233))) * 43758.5453);
}

float sdOctaAnisoInv(vec3 p) {
    vec3 q = vec3(abs(p.x) * uInvBaseHalf, abs(p.y) * uInvHeight, abs(p.z) * uInvBaseHalf);
    float m = q.x + q.y + q.z - 1.0;
    return m * uMinAxis * 0.577;
}

float sdPyramidUpInv(vec3 p) {
    return max(sdOctaAnisoInv(p), -p.y);
}

mat3 hueRotation(float a) {
    float c = cos(a);
    float s = sin(a);
    return mat3(
        0.299 + 0.701 * c + 0.168 * s, 0.587 - 0.587 * c - 0.331 * s, 0.114 - 0.114 * c + 0.500 * s,
        0.299 - 0.299 * c + 0.328 * s, 0.587 + 0.413 * c + 0.035 * s, 0.114 - 0.114 * c - 0.500 * s,
        0.299 - 0.300 * c - 0.497 * s, 0.587 - 0.588 * c + 0.296 * s, 0.114 + 0.886 * c + 0.201 * s
    );
}

void main() {
    vec2 fragCoord = vec2(gl_FragCoord.x, iResolution.y - gl_FragCoord.y);
    vec2 f = (fragCoord - 0.5 * iResolution - uOffsetPx) * uPxScale;
    float z = 5.0;
    vec4 o = vec4(0.0);

    mat2 wob = mat2(1.0);
    if (uUseBaseWobble == 1) {
        float t = iTime * uTimeScale;
        float c0 = cos(t);
        float c1 = cos(t + 33.0);
        float c2 = cos(t + 11.0);
        wob = mat2(c0, c1, c2, c0);
    }

    for (int i = 0; i < 80; i++) {
        vec3 p = vec3(f, z);
        vec2 xz = vec2(p.x, p.z) * wob;
        p = vec3(xz.x, p.y, xz.y);
        p = uRot * p;
        vec3 q = p;
        q.y += uCenterShift;
        float d = 0.1 + 0.2 * abs(sdPyramidUpInv(q));
        z -= d;
        o += (sin((p.y + z) * uColorFreq + vec4(0.0, 1.0, 2.0, 3.0)) + 1.0) / d;
    }

    o = tanh(o * o * (uGlow * uBloom) / 1e5);

    vec3 col = o.rgb;
    if (uNoise > 0.01) {
        col += (rand(fragCoord + iTime) - 0.5) * uNoise;
    }
    col = clamp(col, 0.0, 1.0);

    if (uSaturation != 1.0) {
        float L = dot(col, vec3(0.2126, 0.7152, 0.0722));
        col = mix(vec3(L), col, uSaturation);
    }

    if (abs(uHueShift) > 0.001) {
        col = hueRotation(uHueShift) * col;
    }

    outColor = vec4(clamp(col, 0.0, 1.0), o.a);
}
";

/// Clip-space corners of the triangle that covers the whole viewport.
pub const FULLSCREEN_TRIANGLE: [[f32; 2]; 3] = [[-1.0, -1.0], [3.0, -1.0], [-1.0, 3.0]];
