pub mod persist;
mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./localfiles.toml",
        "~/.config/localfiles/config.toml",
        "/etc/localfiles/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

fn expand_paths(config: &mut Config) {
    config.content.root = expand_path(&config.content.root);
    config.storage.data_dir = expand_path(&config.storage.data_dir);
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.scheduler.period_secs == 0 {
        anyhow::bail!("Scheduler period cannot be 0");
    }

    if config.scheduler.default_interval_ticks == 0 {
        anyhow::bail!("Default interval must be at least one tick");
    }

    if config.content.max_depth == 0 {
        anyhow::bail!("Content max_depth must be at least 1");
    }

    if config.renderer.kind == RendererKind::Webhook && config.renderer.url.is_none() {
        anyhow::bail!("Webhook renderer is selected but has no url");
    }

    if !config.content.root.exists() {
        tracing::warn!("Content root does not exist: {:?}", config.content.root);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_legacy_values() {
        let config = Config::default();
        assert_eq!(config.scheduler.period_secs, 30);
        assert_eq!(config.scheduler.default_interval_ticks, 5);
        assert!(config.scheduler.use_local_files);
        assert!(config.scheduler.wrap_direct_lists);
        assert_eq!(config.renderer.kind, RendererKind::Log);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
debug = true

[scheduler]
period_secs = 10
use_local_files = false
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.debug);
        assert_eq!(config.scheduler.period_secs, 10);
        assert!(!config.scheduler.use_local_files);
        assert_eq!(config.scheduler.default_interval_ticks, 5);
        assert!(config.content.recursive);
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut config = Config::default();
        config.scheduler.period_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_webhook_requires_url() {
        let mut config = Config::default();
        config.renderer.kind = RendererKind::Webhook;
        assert!(validate_config(&config).is_err());

        config.renderer.url = Some("http://localhost:9000/skin".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
