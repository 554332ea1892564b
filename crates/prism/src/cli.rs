use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use prismconfig::AnimationType;

#[derive(Parser, Debug)]
#[command(
    name = "prism",
    author,
    version,
    about = "Raymarched prism background effect",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; falls back to `$PRISM_CONFIG`, then the user config directory.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Animation mode: `rotate`, `hover`, or `3drotate`.
    #[arg(long, value_name = "MODE", value_parser = AnimationType::parse, global = true)]
    pub animation: Option<AnimationType>,

    /// Initial window size in logical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Seed for the autonomous rotation; random per run when omitted.
    #[arg(long, value_name = "N", global = true)]
    pub seed: Option<u64>,

    /// Optional FPS cap (0=uncapped).
    #[arg(long, value_name = "FPS", global = true)]
    pub fps: Option<f32>,

    /// Hue rotation applied to the final colour, in radians.
    #[arg(long, value_name = "RADIANS", allow_hyphen_values = true, global = true)]
    pub hue_shift: Option<f32>,

    /// Multiplier applied to animation time.
    #[arg(long, value_name = "X", global = true)]
    pub time_scale: Option<f32>,

    /// Render onto an opaque surface instead of a transparent one.
    #[arg(long, global = true)]
    pub opaque: bool,

    /// Keep animating while the window is occluded.
    #[arg(long, global = true)]
    pub no_suspend: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect the effective configuration.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the merged, validated configuration as TOML.
    Show,
    /// Print which configuration file would be loaded.
    Where,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WIDTHxHEIGHT, e.g. 1280x720".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size(" 800 X 600 ").unwrap(), (800, 600));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x600").is_err());
        assert!(parse_size("wide x tall").is_err());
    }

    #[test]
    fn flags_parse_into_run_args() {
        let cli = Cli::try_parse_from([
            "prism",
            "--animation",
            "hover",
            "--hue-shift",
            "-0.5",
            "--opaque",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.run.animation, Some(AnimationType::Hover));
        assert_eq!(cli.run.hue_shift, Some(-0.5));
        assert!(cli.run.opaque);
        assert_eq!(cli.run.verbose, 2);
        assert!(cli.command.is_none());
    }

    #[test]
    fn unknown_animation_is_rejected() {
        assert!(Cli::try_parse_from(["prism", "--animation", "spin"]).is_err());
    }

    #[test]
    fn config_subcommand_accepts_global_flags() {
        let cli =
            Cli::try_parse_from(["prism", "config", "show", "--config", "x.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand {
                action: ConfigAction::Show
            }))
        ));
        assert_eq!(cli.run.config, Some(PathBuf::from("x.toml")));
    }
}
