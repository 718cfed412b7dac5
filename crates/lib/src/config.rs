//! Configuration location and trust policy.
//!
//! The allowlist lives at `~/.ssh/authorized_forced_commands.yml` unless the caller
//! supplies an explicit path (tests and the operator tool do). The gatekeeper binary
//! never takes the location from the environment.

use std::path::{Path, PathBuf};

use crate::error::GateError;

/// Historical location of the allowlist, relative to the invoking user's home.
pub const DEFAULT_CONFIG_PATH: &str = "~/.ssh/authorized_forced_commands.yml";

/// Where to find the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// A path expression that may start with `~` for the invoking user's home directory.
    HomeRelative(String),
    /// An already resolved path.
    Explicit(PathBuf),
}

impl Default for ConfigLocation {
    fn default() -> Self {
        ConfigLocation::HomeRelative(DEFAULT_CONFIG_PATH.to_string())
    }
}

impl ConfigLocation {
    /// Explicit path when given, the historical default otherwise.
    pub fn from_override(path: Option<PathBuf>) -> Self {
        path.map(ConfigLocation::Explicit).unwrap_or_default()
    }

    /// Resolve to an on-disk path, expanding `~` via the home directory.
    pub fn resolve(&self) -> Result<PathBuf, GateError> {
        match self {
            ConfigLocation::Explicit(p) => Ok(p.clone()),
            ConfigLocation::HomeRelative(expr) => expand_home(expr, dirs::home_dir().as_deref()),
        }
    }
}

/// Expand a leading `~` or `~/` against `home`. `~user` forms are not supported.
pub fn expand_home(expr: &str, home: Option<&Path>) -> Result<PathBuf, GateError> {
    let Some(rest) = expr.strip_prefix('~') else {
        return Ok(PathBuf::from(expr));
    };
    if !rest.is_empty() && !rest.starts_with('/') {
        return Err(GateError::PathResolution);
    }
    let home = home
        .filter(|h| !h.as_os_str().is_empty())
        .ok_or(GateError::PathResolution)?;
    Ok(home.join(rest.trim_start_matches('/')))
}

/// How strict the ownership guard is about permission bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrustPolicy {
    /// Also reject files writable by their group or by others. Off by default: historically
    /// only the other-read bit was checked, so such files were accepted.
    pub reject_group_writable: bool,
}

/// Inputs of one gatekeeper run.
#[derive(Debug, Clone, Default)]
pub struct GateOptions {
    pub config: ConfigLocation,
    pub policy: TrustPolicy,
}

impl GateOptions {
    pub fn with_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config: ConfigLocation::Explicit(path.into()),
            ..Self::default()
        }
    }
}
