//! Shared test harness for integration tests.
//!
//! [`TestHarness`] owns a temporary directory with a content root and a data
//! directory, and opens registries and schedulers backed by them. The
//! [`RecordingRenderer`] captures every rotation handed to it.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use tempfile::TempDir;

use localfiles::registry::{AssetRegistry, KeyAllocator, RegistrySettings, SharedRegistry};
use localfiles::renderer::Renderer;
use localfiles::scheduler::{SchedulerSettings, SharedScheduler, TargetScheduler};
use localfiles::state::DataFiles;
use localfiles_common::TargetId;
use localfiles_probe::{CompositeProber, Prober};

pub struct TestHarness {
    pub dir: TempDir,
    pub content_root: PathBuf,
    pub data_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let content_root = dir.path().join("content");
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&content_root).expect("failed to create content root");

        Self {
            dir,
            content_root,
            data_dir,
        }
    }

    pub fn files(&self) -> DataFiles {
        DataFiles::new(&self.data_dir)
    }

    pub fn prober() -> Arc<dyn Prober> {
        Arc::new(CompositeProber::standard())
    }

    /// Open (or re-open) the persistent registry.
    pub fn registry(&self) -> AssetRegistry {
        AssetRegistry::open(
            RegistrySettings::new(&self.content_root),
            self.files(),
            Self::prober(),
        )
        .expect("failed to open registry")
    }

    /// Registry with a deterministic key allocator.
    pub fn seeded_registry(&self, seed: u64) -> AssetRegistry {
        self.registry().with_key_allocator(KeyAllocator::seeded(seed))
    }

    pub fn shared_registry(&self) -> SharedRegistry {
        Arc::new(Mutex::new(self.registry()))
    }

    pub fn scheduler(&self, settings: SchedulerSettings) -> TargetScheduler {
        TargetScheduler::open(settings, self.files()).expect("failed to open scheduler")
    }

    pub fn shared_scheduler(&self, settings: SchedulerSettings) -> SharedScheduler {
        Arc::new(Mutex::new(self.scheduler(settings)))
    }

    /// Write a solid-colour PNG below the content root.
    pub fn write_png(&self, relative: &str, width: u32, height: u32) -> PathBuf {
        let path = self.content_root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        RgbImage::from_pixel(width, height, Rgb([200, 40, 40]))
            .save(&path)
            .expect("failed to write png fixture");
        path
    }

    /// Write arbitrary bytes below the content root.
    pub fn write_file(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.content_root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        std::fs::write(&path, bytes).expect("failed to write fixture");
        path
    }

    /// Names of every file directly in `dir`, sorted.
    pub fn list_dir(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("failed to read dir")
            .map(|e| e.expect("bad dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// PNG bytes for serving from mock servers.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    RgbImage::from_pixel(width, height, Rgb([10, 120, 200]))
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("failed to encode png");
    out.into_inner()
}

/// Renderer that records calls, optionally failing every one of them.
#[derive(Default)]
pub struct RecordingRenderer {
    pub calls: Mutex<Vec<(TargetId, String, bool)>>,
    pub fail: bool,
}

impl RecordingRenderer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(TargetId, String, bool)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Renderer for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn apply_skin(&self, target: TargetId, reference: &str, raw: bool) -> anyhow::Result<()> {
        self.calls.lock().push((target, reference.to_string(), raw));
        if self.fail {
            anyhow::bail!("renderer offline");
        }
        Ok(())
    }
}
