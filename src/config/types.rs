use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Log at debug level for localfiles crates
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub renderer: RendererConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    /// Directory whose files are indexed
    #[serde(default = "default_content_root")]
    pub root: PathBuf,

    /// Descend into subdirectories while scanning
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Maximum directory depth below the scanned directory
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Scan the content root when `run` starts
    #[serde(default = "default_true")]
    pub scan_on_start: bool,
}

fn default_content_root() -> PathBuf {
    PathBuf::from("./content")
}

fn default_max_depth() -> usize {
    16
}

fn default_true() -> bool {
    true
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_content_root(),
            recursive: true,
            max_depth: default_max_depth(),
            scan_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where the registry and schedule tables are written
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Run the rotation loop at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between ticks
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,

    /// Interval given to newly registered targets, in ticks
    #[serde(default = "default_interval_ticks")]
    pub default_interval_ticks: u32,

    /// Resolve schedule entries through the asset registry
    #[serde(default = "default_true")]
    pub use_local_files: bool,

    /// Wrap direct lists back to the first entry. Only consulted when
    /// `use_local_files` is set; without it lists always wrap.
    #[serde(default = "default_true")]
    pub wrap_direct_lists: bool,
}

fn default_period_secs() -> u64 {
    30
}

fn default_interval_ticks() -> u32 {
    5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_secs: default_period_secs(),
            default_interval_ticks: default_interval_ticks(),
            use_local_files: true,
            wrap_direct_lists: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Whole-request timeout for remote downloads
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_fetch_timeout() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Only log what would be displayed
    #[default]
    Log,
    /// POST each rotation to an HTTP endpoint
    Webhook,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RendererConfig {
    #[serde(default)]
    pub kind: RendererKind,

    /// Endpoint for the webhook renderer
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_renderer_timeout")]
    pub timeout_secs: u64,
}

fn default_renderer_timeout() -> u64 {
    5
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::Log,
            url: None,
            timeout_secs: default_renderer_timeout(),
        }
    }
}
