use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG: &str = "PRISM_CONFIG";
pub const ENV_CONFIG_DIR: &str = "PRISM_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Prism";
const APPLICATION: &str = "prism";
const CONFIG_FILE: &str = "prism.toml";

/// Where the configuration path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Flag,
    Environment,
    UserDirectory,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Flag => "--config",
            Self::Environment => ENV_CONFIG,
            Self::UserDirectory => "user config directory",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLocation {
    path: PathBuf,
    origin: ConfigOrigin,
}

impl ConfigLocation {
    /// `--config`, then `$PRISM_CONFIG`, then `<config dir>/prism.toml`.
    pub fn resolve(flag: Option<&Path>) -> Result<Self> {
        if let Some(path) = flag {
            return Ok(Self {
                path: path.to_path_buf(),
                origin: ConfigOrigin::Flag,
            });
        }
        if let Some(path) = env_override(ENV_CONFIG) {
            return Ok(Self {
                path,
                origin: ConfigOrigin::Environment,
            });
        }
        Ok(Self {
            path: user_config_dir()?.join(CONFIG_FILE),
            origin: ConfigOrigin::UserDirectory,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> ConfigOrigin {
        self.origin
    }

    /// Only the implicit per-user file may be absent.
    pub fn is_optional(&self) -> bool {
        self.origin == ConfigOrigin::UserDirectory
    }
}

fn user_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env_override(ENV_CONFIG_DIR) {
        return Ok(dir);
    }
    let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .ok_or_else(|| anyhow!("failed to determine user directories"))?;
    Ok(project_dirs.config_dir().to_path_buf())
}

fn env_override(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
