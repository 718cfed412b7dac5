//! Create a template allowlist with safe permissions for operators.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;

static TEMPLATE: &str = include_str!("../config/authorized_forced_commands.yml");

/// Write the template configuration to `config_path` if it does not exist yet.
/// - Creates the parent directory with mode 0700 when missing.
/// - Creates the file with mode 0600; an existing file is never touched.
///
/// Returns true when a new file was written.
pub fn init_config_file(config_path: &Path) -> Result<bool> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !config_dir.exists() {
        fs::create_dir_all(config_dir)
            .with_context(|| format!("creating config directory {}", config_dir.display()))?;
        fs::set_permissions(config_dir, fs::Permissions::from_mode(0o700))
            .with_context(|| format!("restricting permissions of {}", config_dir.display()))?;
        log::info!("created config directory {}", config_dir.display());
    }

    if config_path.exists() {
        log::debug!("config already exists at {}, skipping", config_path.display());
        return Ok(false);
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(config_path)
        .with_context(|| format!("creating {}", config_path.display()))?;
    file.write_all(TEMPLATE.as_bytes())
        .with_context(|| format!("writing template to {}", config_path.display()))?;
    log::info!("wrote template config to {}", config_path.display());
    Ok(true)
}
