use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Lower bound substituted for non-positive geometry values.
pub const MIN_EXTENT: f32 = 0.001;

/// Device-pixel-ratio ceiling applied to the drawable unless overridden.
pub const DEFAULT_MAX_DEVICE_PIXEL_RATIO: f64 = 1.5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum AnimationType {
    /// Identity rotation; the shader shears the domain over time.
    #[serde(rename = "rotate")]
    Rotate,
    /// Orientation eases toward the pointer offset.
    #[serde(rename = "hover")]
    Hover,
    /// Free tumbling driven by per-session random frequencies.
    #[default]
    #[serde(rename = "3drotate")]
    ThreeDRotate,
}

impl AnimationType {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rotate" | "static" => Ok(Self::Rotate),
            "hover" => Ok(Self::Hover),
            "3drotate" | "3d" => Ok(Self::ThreeDRotate),
            other => Err(format!(
                "unknown animation type '{other}'; expected rotate, hover, or 3drotate"
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rotate => "rotate",
            Self::Hover => "hover",
            Self::ThreeDRotate => "3drotate",
        }
    }
}

impl fmt::Display for AnimationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

/// Effect configuration as supplied by the caller.
///
/// Values are stored verbatim; [`PrismConfig::normalized`] applies the
/// clamping rules the renderer relies on.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PrismConfig {
    pub height: f32,
    pub base_width: f32,
    pub animation_type: AnimationType,
    pub glow: f32,
    pub offset: Offset,
    pub noise: f32,
    pub transparent: bool,
    pub scale: f32,
    pub hue_shift: f32,
    pub color_frequency: f32,
    pub hover_strength: f32,
    pub inertia: f32,
    pub bloom: f32,
    pub suspend_when_offscreen: bool,
    pub time_scale: f32,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            height: 3.5,
            base_width: 5.5,
            animation_type: AnimationType::ThreeDRotate,
            glow: 0.8,
            offset: Offset::default(),
            noise: 0.3,
            transparent: true,
            scale: 3.6,
            hue_shift: 0.0,
            color_frequency: 1.0,
            hover_strength: 2.0,
            inertia: 0.08,
            bloom: 0.8,
            suspend_when_offscreen: true,
            time_scale: 0.5,
        }
    }
}

/// Clamped, immutable parameter snapshot consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub height: f32,
    pub base_width: f32,
    pub animation: AnimationType,
    pub glow: f32,
    pub offset: Offset,
    pub noise: f32,
    pub transparent: bool,
    pub saturation: f32,
    pub scale: f32,
    pub hue_shift: f32,
    pub color_frequency: f32,
    pub hover_strength: f32,
    pub inertia: f32,
    pub bloom: f32,
    pub suspend_when_offscreen: bool,
    pub time_scale: f32,
}

impl EffectParams {
    pub fn base_half(&self) -> f32 {
        self.base_width * 0.5
    }
}

impl Default for EffectParams {
    fn default() -> Self {
        PrismConfig::default().normalized()
    }
}

/// Zero means "unset" for these knobs, so it falls back rather than clamping.
fn or_fallback(value: f32, fallback: f32) -> f32 {
    if value == 0.0 || value.is_nan() {
        fallback
    } else {
        value
    }
}

impl PrismConfig {
    pub fn normalized(&self) -> EffectParams {
        EffectParams {
            height: self.height.max(MIN_EXTENT),
            base_width: self.base_width.max(MIN_EXTENT),
            animation: self.animation_type,
            glow: self.glow.max(0.0),
            offset: self.offset,
            noise: self.noise.max(0.0),
            transparent: self.transparent,
            saturation: if self.transparent { 1.5 } else { 1.0 },
            scale: self.scale.max(MIN_EXTENT),
            hue_shift: self.hue_shift,
            color_frequency: or_fallback(self.color_frequency, 1.0).max(0.0),
            hover_strength: or_fallback(self.hover_strength, 1.0).max(0.0),
            inertia: or_fallback(self.inertia, 0.12).clamp(0.0, 1.0),
            bloom: or_fallback(self.bloom, 1.0).max(0.0),
            suspend_when_offscreen: self.suspend_when_offscreen,
            time_scale: or_fallback(self.time_scale, 1.0).max(0.0),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("height", self.height),
            ("base_width", self.base_width),
            ("glow", self.glow),
            ("offset.x", self.offset.x),
            ("offset.y", self.offset.y),
            ("noise", self.noise),
            ("scale", self.scale),
            ("hue_shift", self.hue_shift),
            ("color_frequency", self.color_frequency),
            ("hover_strength", self.hover_strength),
            ("inertia", self.inertia),
            ("bloom", self.bloom),
            ("time_scale", self.time_scale),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "prism.{name} must be a finite number"
                )));
            }
        }
        Ok(())
    }
}

/// Renderer knobs that are not part of the visual effect itself.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderTuning {
    pub max_device_pixel_ratio: f64,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub resize_debounce: Duration,
    pub visibility_threshold: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fps: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for RenderTuning {
    fn default() -> Self {
        Self {
            max_device_pixel_ratio: DEFAULT_MAX_DEVICE_PIXEL_RATIO,
            resize_debounce: default_resize_debounce(),
            visibility_threshold: 0.1,
            max_fps: None,
            seed: None,
        }
    }
}

impl RenderTuning {
    /// Frame-rate cap with zero mapped to uncapped.
    pub fn fps_cap(&self) -> Option<f32> {
        self.max_fps.filter(|fps| *fps > 0.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_device_pixel_ratio.is_finite() || self.max_device_pixel_ratio <= 0.0 {
            return Err(ConfigError::Invalid(
                "render.max_device_pixel_ratio must be greater than zero".into(),
            ));
        }

        if !(self.visibility_threshold > 0.0 && self.visibility_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "render.visibility_threshold must be in (0, 1], got {}",
                self.visibility_threshold
            )));
        }

        if let Some(fps) = self.max_fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(ConfigError::Invalid("render.max_fps must be >= 0".into()));
            }
        }

        Ok(())
    }
}

/// On-disk configuration file: `[prism]` effect table plus `[render]` tuning.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PrismFile {
    pub prism: PrismConfig,
    pub render: RenderTuning,
}

impl PrismFile {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PrismFile = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.prism.validate()?;
        self.render.validate()
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|err| ConfigError::Invalid(format!("failed to serialize configuration: {err}")))
    }
}

fn default_resize_debounce() -> Duration {
    Duration::from_millis(100)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() || v.is_infinite() {
                return Err(E::custom("duration must be a non-negative number"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}
