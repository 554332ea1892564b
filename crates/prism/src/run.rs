use anyhow::{Context, Result};
use prismconfig::PrismFile;
use renderer::{Renderer, RendererConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::ConfigLocation;

/// Crates that stay at `warn` regardless of verbosity.
const QUIET_TARGETS: [&str; 3] = ["wgpu=warn", "naga=warn", "winit=warn"];

pub fn initialise_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let filter = QUIET_TARGETS
        .iter()
        .filter_map(|directive| directive.parse().ok())
        .fold(filter, |filter, directive| filter.add_directive(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration file (if any) and layers the command-line flags on top.
pub fn load_effective(args: &RunArgs) -> Result<(PrismFile, ConfigLocation)> {
    let location = ConfigLocation::resolve(args.config.as_deref())?;
    let mut file = if location.is_optional() && !location.path().exists() {
        debug!(path = %location.path().display(), "no configuration file; using defaults");
        PrismFile::default()
    } else {
        PrismFile::from_path(location.path()).with_context(|| {
            format!(
                "failed to load configuration from {} ({})",
                location.path().display(),
                location.origin()
            )
        })?
    };
    apply_overrides(&mut file, args);
    file.validate()
        .context("command-line overrides produced an invalid configuration")?;
    Ok((file, location))
}

fn apply_overrides(file: &mut PrismFile, args: &RunArgs) {
    let prism = &mut file.prism;
    if let Some(animation) = args.animation {
        prism.animation_type = animation;
    }
    if let Some(hue_shift) = args.hue_shift {
        prism.hue_shift = hue_shift;
    }
    if let Some(time_scale) = args.time_scale {
        prism.time_scale = time_scale;
    }
    if args.opaque {
        prism.transparent = false;
    }
    if args.no_suspend {
        prism.suspend_when_offscreen = false;
    }

    let render = &mut file.render;
    if let Some(fps) = args.fps {
        render.max_fps = Some(fps);
    }
    if let Some(seed) = args.seed {
        render.seed = Some(seed);
    }
}

pub fn run(args: &RunArgs) -> Result<()> {
    let (file, location) = load_effective(args)?;
    info!(
        config = %location.path().display(),
        animation = %file.prism.animation_type,
        "launching prism"
    );

    let config = RendererConfig {
        window_size: args.size,
        title: None,
        prism: file.prism,
        tuning: file.render,
    };
    Renderer::new(config).run()
}
