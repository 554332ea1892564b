//! Per-tick orientation of the prism.
//!
//! The controller owns the running/suspended state machine and turns elapsed
//! time (plus the pointer in hover mode) into the rotation matrix written to
//! the uniform block.

use std::f32::consts::TAU;

use prismconfig::{AnimationType, EffectParams};
use rand::prelude::*;
use tracing::debug;

use crate::gpu::{Mat3, IDENTITY};

/// Hover targets saturate at this many radians times the hover strength.
const HOVER_RANGE: f32 = 0.6;
/// Roll decays toward zero at this rate regardless of inertia.
const ROLL_DECAY: f32 = 0.1;
const TUMBLE_PITCH_AMPLITUDE: f32 = 0.6;
const TUMBLE_ROLL_AMPLITUDE: f32 = 0.5;

/// Frequencies and phases for the autonomous tumble, drawn once per session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationSeed {
    pub freq_x: f32,
    pub freq_y: f32,
    pub freq_z: f32,
    pub phase_x: f32,
    pub phase_z: f32,
}

impl RotationSeed {
    /// Reproducible seed for replay and tests.
    pub fn from_seed(seed: u64) -> Self {
        Self::draw(&mut StdRng::seed_from_u64(seed))
    }

    pub fn random() -> Self {
        Self::draw(&mut thread_rng())
    }

    pub fn draw<R: Rng>(rng: &mut R) -> Self {
        Self {
            freq_x: 0.3 + rng.gen::<f32>() * 0.6,
            freq_y: 0.2 + rng.gen::<f32>() * 0.7,
            freq_z: 0.1 + rng.gen::<f32>() * 0.5,
            phase_x: rng.gen::<f32>() * TAU,
            phase_z: rng.gen::<f32>() * TAU,
        }
    }
}

/// Pointer offset from the viewport centre, each axis in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub inside: bool,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            inside: true,
        }
    }
}

impl PointerState {
    /// Normalises a viewport position (origin top-left) against the viewport extent.
    pub fn from_viewport(x: f64, y: f64, width: f64, height: f64) -> Self {
        let axis = |position: f64, extent: f64| {
            let half = (extent * 0.5).max(f64::EPSILON);
            ((position - half) / half).clamp(-1.0, 1.0) as f32
        };
        Self {
            x: axis(x, width),
            y: axis(y, height),
            inside: true,
        }
    }
}

/// Yaw (Y), pitch (X), roll (Z) in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Builds the column-major rotation for `yaw` about Y, `pitch` about X and
/// `roll` about Z.
pub fn rotation_matrix(yaw: f32, pitch: f32, roll: f32) -> Mat3 {
    let (sy, cy) = yaw.sin_cos();
    let (sx, cx) = pitch.sin_cos();
    let (sz, cz) = roll.sin_cos();
    [
        cy * cz + sy * sx * sz,
        cx * sz,
        -sy * cz + cy * sx * sz,
        -cy * sz + sy * sx * cz,
        cx * cz,
        sy * sz + cy * sx * cz,
        sy * cx,
        -sx,
        cy * cx,
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPhase {
    Idle,
    Running,
    Suspended,
    Destroyed,
}

pub struct AnimationController {
    mode: AnimationType,
    phase: AnimationPhase,
    seed: RotationSeed,
    orientation: Orientation,
    hover_strength: f32,
    inertia: f32,
    time_scale: f32,
}

impl AnimationController {
    pub fn new(params: &EffectParams, seed: RotationSeed) -> Self {
        Self {
            mode: params.animation,
            phase: AnimationPhase::Idle,
            seed,
            orientation: Orientation::default(),
            hover_strength: params.hover_strength,
            inertia: params.inertia,
            time_scale: params.time_scale,
        }
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == AnimationPhase::Running
    }

    pub fn mode(&self) -> AnimationType {
        self.mode
    }

    pub fn seed(&self) -> RotationSeed {
        self.seed
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Idle or Suspended to Running. Returns whether the phase changed.
    pub fn resume(&mut self) -> bool {
        self.transition(
            &[AnimationPhase::Idle, AnimationPhase::Suspended],
            AnimationPhase::Running,
        )
    }

    /// Running (or a not-yet-started Idle) to Suspended.
    pub fn suspend(&mut self) -> bool {
        self.transition(
            &[AnimationPhase::Idle, AnimationPhase::Running],
            AnimationPhase::Suspended,
        )
    }

    pub fn destroy(&mut self) {
        if self.phase != AnimationPhase::Destroyed {
            debug!(from = ?self.phase, "animation destroyed");
            self.phase = AnimationPhase::Destroyed;
        }
    }

    fn transition(&mut self, from: &[AnimationPhase], to: AnimationPhase) -> bool {
        if !from.contains(&self.phase) {
            return false;
        }
        debug!(from = ?self.phase, to = ?to, "animation phase change");
        self.phase = to;
        true
    }

    /// Advances the orientation and returns the rotation to upload, or `None`
    /// when not running.
    pub fn tick(&mut self, elapsed_seconds: f32, pointer: &PointerState) -> Option<Mat3> {
        if !self.is_running() {
            return None;
        }
        match self.mode {
            AnimationType::Rotate => Some(IDENTITY),
            AnimationType::Hover => {
                let reach = HOVER_RANGE * self.hover_strength;
                let (target_yaw, target_pitch) = if pointer.inside {
                    (-pointer.x * reach, pointer.y * reach)
                } else {
                    (0.0, 0.0)
                };
                let current = &mut self.orientation;
                current.yaw = lerp(current.yaw, target_yaw, self.inertia);
                current.pitch = lerp(current.pitch, target_pitch, self.inertia);
                current.roll = lerp(current.roll, 0.0, ROLL_DECAY);
                Some(self.current_matrix())
            }
            AnimationType::ThreeDRotate => {
                let scaled = elapsed_seconds * self.time_scale;
                let seed = self.seed;
                self.orientation = Orientation {
                    yaw: scaled * seed.freq_y,
                    pitch: (scaled * seed.freq_x + seed.phase_x).sin() * TUMBLE_PITCH_AMPLITUDE,
                    roll: (scaled * seed.freq_z + seed.phase_z).sin() * TUMBLE_ROLL_AMPLITUDE,
                };
                Some(self.current_matrix())
            }
        }
    }

    fn current_matrix(&self) -> Mat3 {
        let Orientation { yaw, pitch, roll } = self.orientation;
        rotation_matrix(yaw, pitch, roll)
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}
