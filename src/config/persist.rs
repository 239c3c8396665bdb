//! Writing configuration back to disk.

use super::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Save the entire config to a TOML file (full replacement)
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

/// Write a default config file unless one already exists.
///
/// Returns `true` when a new file was created.
pub fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    tracing::info!("Creating new config file at {:?}", path);
    save_config(path, &Config::default())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    #[test]
    fn test_default_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("localfiles.toml");

        assert!(write_default_config(&path).unwrap());
        assert!(!write_default_config(&path).unwrap());

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.scheduler.period_secs, 30);
        assert_eq!(loaded.content.max_depth, 16);
    }
}
