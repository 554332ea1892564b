mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::{Command, ConfigAction, RunArgs};
use paths::ConfigLocation;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing(cli.run.verbose);

    match cli.command {
        Some(Command::Config(config_cmd)) => handle_config_command(&cli.run, config_cmd.action),
        None => run::run(&cli.run),
    }
}

fn handle_config_command(args: &RunArgs, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let (file, _) = run::load_effective(args)?;
            print!("{}", file.to_toml_string()?);
            Ok(())
        }
        ConfigAction::Where => {
            let location = ConfigLocation::resolve(args.config.as_deref())?;
            let status = if location.path().exists() {
                "present"
            } else if location.is_optional() {
                "missing, using defaults"
            } else {
                "missing"
            };
            println!("Configuration file:");
            println!("  path:   {}", location.path().display());
            println!("  source: {}", location.origin());
            println!("  status: {status}");
            Ok(())
        }
    }
}
