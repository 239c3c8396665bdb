//! Asset registry.
//!
//! Indexes the files under a single content root, keeps their metadata in an
//! [`AssetIndex`], and persists both index tables after every mutation.

pub mod fetch;
pub mod index;
pub mod keys;

pub use fetch::Fetcher;
pub use index::{AssetIndex, AssetRecord, AssetSummary};
pub use keys::{KeyAllocator, MAX_KEY_ATTEMPTS};

use crate::config::ContentConfig;
use crate::state::{self, DataFiles, FileStamp};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use localfiles_common::paths::{file_reference, is_bare_file_name};
use localfiles_common::{AssetKey, AssetRef, Error, Result};
use localfiles_probe::{ProbeInfo, Prober};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Registry shared between the scheduler loop and control commands.
pub type SharedRegistry = Arc<Mutex<AssetRegistry>>;

/// Scan behaviour derived from the `[content]` config section.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub root: PathBuf,
    pub recursive: bool,
    pub max_depth: usize,
}

impl RegistrySettings {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            root: std::path::absolute(&root).unwrap_or(root),
            recursive: true,
            max_depth: 16,
        }
    }
}

impl From<&ContentConfig> for RegistrySettings {
    fn from(config: &ContentConfig) -> Self {
        Self {
            recursive: config.recursive,
            max_depth: config.max_depth.max(1),
            ..Self::new(&config.root)
        }
    }
}

/// Outcome counters for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub files_found: usize,
    pub files_added: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
}

/// The indexed store of local media files.
pub struct AssetRegistry {
    index: AssetIndex,
    keys: KeyAllocator,
    prober: Arc<dyn Prober>,
    settings: RegistrySettings,
    files: Option<DataFiles>,
    /// Stamps of (file_meta, file_to_key) as last read or written here.
    stamps: (Option<FileStamp>, Option<FileStamp>),
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("index", &self.index)
            .field("keys", &self.keys)
            .field("settings", &self.settings)
            .field("files", &self.files)
            .field("stamps", &self.stamps)
            .finish_non_exhaustive()
    }
}

impl AssetRegistry {
    /// A registry that never touches disk state (content files still live on disk).
    pub fn in_memory(settings: RegistrySettings, prober: Arc<dyn Prober>) -> Self {
        Self {
            index: AssetIndex::new(),
            keys: KeyAllocator::new(),
            prober,
            settings,
            files: None,
            stamps: (None, None),
        }
    }

    /// Load the persisted tables from `files`, repairing them if they disagree.
    pub fn open(
        settings: RegistrySettings,
        files: DataFiles,
        prober: Arc<dyn Prober>,
    ) -> Result<Self> {
        let stamps = table_stamps(&files);
        let (index, repaired) = load_index(&files)?;
        info!("Loaded {} indexed files", index.len());

        let mut registry = Self {
            index,
            keys: KeyAllocator::new(),
            prober,
            settings,
            files: Some(files),
            stamps,
        };
        if repaired {
            registry.persist();
        }
        Ok(registry)
    }

    /// Re-read the tables if another process wrote them since this registry
    /// last read or wrote them. Returns `true` when the index was replaced.
    pub fn reload_if_changed(&mut self) -> Result<bool> {
        let Some(files) = &self.files else {
            return Ok(false);
        };
        let current = table_stamps(files);
        if current == self.stamps {
            return Ok(false);
        }

        let (index, repaired) = load_index(files)?;
        info!("Registry tables changed on disk; reloaded {} indexed files", index.len());
        self.index = index;
        self.stamps = current;
        if repaired {
            self.persist();
        }
        Ok(true)
    }

    /// Replace the key allocator (deterministic keys in tests).
    pub fn with_key_allocator(mut self, keys: KeyAllocator) -> Self {
        self.keys = keys;
        self
    }

    pub fn root(&self) -> &Path {
        &self.settings.root
    }

    pub fn index(&self) -> &AssetIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, key: AssetKey) -> Option<&AssetRecord> {
        self.index.get(key)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&AssetRecord> {
        self.index.get_by_name(name)
    }

    fn resolve(&self, asset: &AssetRef) -> Result<AssetKey> {
        self.index
            .resolve(asset)
            .ok_or_else(|| Error::not_found(format!("no indexed file for {}", asset)))
    }

    fn record(&self, asset: &AssetRef) -> Result<&AssetRecord> {
        let key = self.resolve(asset)?;
        self.index
            .get(key)
            .ok_or_else(|| Error::not_found(format!("no indexed file for {}", asset)))
    }

    // ------------------------------------------------------------------
    // Scanning and ingest
    // ------------------------------------------------------------------

    /// Scan the content root, or `subdir` below it.
    ///
    /// Without `force`, names that are already indexed are skipped. The
    /// tables are written once at the end, not per file.
    pub fn scan(&mut self, subdir: Option<&Path>, force: bool) -> Result<ScanSummary> {
        let dir = match subdir {
            Some(sub) => {
                if sub.components().any(|c| !matches!(c, Component::Normal(_))) {
                    return Err(Error::invalid_input(format!(
                        "subdirectory must be relative to the content root: {}",
                        sub.display()
                    )));
                }
                self.settings.root.join(sub)
            }
            None => self.settings.root.clone(),
        };

        if !dir.is_dir() {
            return Err(Error::not_found(format!("directory {}", dir.display())));
        }

        let depth = if self.settings.recursive {
            self.settings.max_depth
        } else {
            1
        };
        info!("Scanning for files in {:?} (force: {})", dir, force);

        let mut summary = ScanSummary::default();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(depth)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry during scan: {}", e);
                    summary.files_failed += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() || fetch::is_partial_download(entry.path()) {
                continue;
            }

            summary.files_found += 1;
            debug!("Checking path {:?}", entry.path());
            match self.insert_file(entry.path(), force) {
                Ok(Some(_)) => summary.files_added += 1,
                Ok(None) => summary.files_skipped += 1,
                Err(e) => {
                    warn!("Failed to index {:?}: {}", entry.path(), e);
                    summary.files_failed += 1;
                }
            }
        }

        self.persist();
        info!(
            found = summary.files_found,
            added = summary.files_added,
            skipped = summary.files_skipped,
            failed = summary.files_failed,
            "Scan complete"
        );
        Ok(summary)
    }

    /// Index one file and persist.
    ///
    /// Returns `None` when the name is already indexed and `force` is off;
    /// nothing is probed or allocated in that case.
    pub fn ingest(&mut self, path: &Path, force: bool) -> Result<Option<AssetKey>> {
        let key = self.insert_file(path, force)?;
        if key.is_some() {
            self.persist();
        }
        Ok(key)
    }

    /// Index a freshly downloaded file and remember where it came from.
    pub fn ingest_fetched(&mut self, path: &Path, url: &str) -> Result<AssetKey> {
        let key = self.build_and_insert(path)?;
        self.index.set_source_url(key, Some(url.to_string()));
        self.persist();
        Ok(key)
    }

    fn insert_file(&mut self, path: &Path, force: bool) -> Result<Option<AssetKey>> {
        let file_name = file_name_of(path)?;
        if !force && self.index.contains_name(&file_name) {
            debug!("Already indexed, skipping: {}", file_name);
            return Ok(None);
        }
        self.build_and_insert(path).map(Some)
    }

    fn build_and_insert(&mut self, path: &Path) -> Result<AssetKey> {
        let file_name = file_name_of(path)?;
        let meta = std::fs::metadata(path).map_err(|e| Error::storage(path, e))?;
        if !meta.is_file() {
            return Err(Error::invalid_input(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        let probe = match self.prober.probe(path) {
            Ok(info) => info,
            Err(e) => {
                debug!("Metadata probe failed for {:?}: {}", path, e);
                ProbeInfo::unknown()
            }
        };

        let created_at = meta
            .created()
            .or_else(|_| meta.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.root.clone());

        // Operator-assigned fields survive a forced re-ingest of the same name.
        let previous = self.index.get_by_name(&file_name);
        let category = previous.and_then(|r| r.category.clone());
        let description = previous.and_then(|r| r.description.clone());

        let index = &self.index;
        let key = self.keys.allocate(|k| index.contains_key(k))?;

        let record = AssetRecord {
            key,
            directory,
            file_name,
            source_url: None,
            description,
            category,
            size_bytes: meta.len(),
            created_at,
            mime_type: probe.mime_type,
            width: probe.width,
            height: probe.height,
        };

        if let Some(old) = self.index.insert(record) {
            debug!("Replaced {} (old key {}, new key {})", old.file_name, old.key, key);
        }
        Ok(key)
    }

    // ------------------------------------------------------------------
    // Mutations by reference
    // ------------------------------------------------------------------

    /// Tag an asset with a category. An empty category clears the tag.
    pub fn set_category(&mut self, asset: &AssetRef, category: &str) -> Result<()> {
        let key = self.resolve(asset)?;
        let category = (!category.is_empty()).then(|| category.to_string());
        self.index.set_category(key, category);
        self.persist();
        Ok(())
    }

    /// Attach a free-text description. An empty text clears it.
    pub fn set_description(&mut self, asset: &AssetRef, description: &str) -> Result<()> {
        let key = self.resolve(asset)?;
        let description = (!description.is_empty()).then(|| description.to_string());
        self.index.set_description(key, description);
        self.persist();
        Ok(())
    }

    /// Rename the file on disk and retarget both index directions.
    pub fn rename(&mut self, asset: &AssetRef, new_name: &str) -> Result<()> {
        if !is_bare_file_name(new_name) {
            return Err(Error::invalid_input(format!("bad file name: {:?}", new_name)));
        }

        let record = self.record(asset)?;
        let key = record.key;
        if record.file_name == new_name {
            return Ok(());
        }
        if self.index.contains_name(new_name) {
            return Err(Error::already_exists(new_name));
        }

        let from = record.path();
        let to = record.directory.join(new_name);
        if to.exists() {
            return Err(Error::already_exists(to.display().to_string()));
        }

        std::fs::rename(&from, &to).map_err(|e| Error::storage(&from, e))?;
        self.index.rename(key, new_name);
        info!("{:?} was renamed to {:?}", from, to);

        self.persist();
        Ok(())
    }

    /// Delete the file, then drop its record.
    pub fn delete(&mut self, asset: &AssetRef) -> Result<AssetRecord> {
        let record = self.record(asset)?;
        let key = record.key;
        let path = record.path();

        std::fs::remove_file(&path).map_err(|e| Error::storage(&path, e))?;
        let removed = self
            .index
            .remove(key)
            .ok_or_else(|| Error::not_found(format!("no indexed file for {}", asset)))?;
        info!("File {} was deleted from {:?}", removed.file_name, removed.directory);

        self.persist();
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Raw bytes of an asset.
    pub fn content(&self, asset: &AssetRef) -> Result<Vec<u8>> {
        let path = self.record(asset)?.path();
        std::fs::read(&path).map_err(|e| Error::storage(&path, e))
    }

    pub fn info(&self, asset: &AssetRef) -> Result<&AssetRecord> {
        self.record(asset)
    }

    pub fn list(&self) -> Vec<AssetSummary> {
        self.index.iter().map(AssetSummary::from).collect()
    }

    pub fn files_in_category(&self, category: &str) -> Vec<&AssetRecord> {
        self.index.in_category(category).collect()
    }

    /// `file://` reference for an indexed file name.
    pub fn resolve_reference(&self, name: &str) -> Option<String> {
        self.index
            .get_by_name(name)
            .map(|record| file_reference(&record.path()))
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write both tables, reporting failure to the caller.
    pub fn flush(&mut self) -> Result<()> {
        let Some(files) = &self.files else {
            return Ok(());
        };
        state::write_json(&files.file_meta(), self.index.records_table())?;
        state::write_json(&files.file_to_key(), self.index.names_table())?;
        self.stamps = table_stamps(files);
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!("Failed to persist registry: {}", e);
        }
    }
}

fn table_stamps(files: &DataFiles) -> (Option<FileStamp>, Option<FileStamp>) {
    (
        state::file_stamp(&files.file_meta()),
        state::file_stamp(&files.file_to_key()),
    )
}

fn load_index(files: &DataFiles) -> Result<(AssetIndex, bool)> {
    let records: IndexMap<AssetKey, AssetRecord> =
        state::read_json_or_default(&files.file_meta())?;
    let names: BTreeMap<String, AssetKey> = state::read_json_or_default(&files.file_to_key())?;

    let (index, repaired) = AssetIndex::from_tables(records, names);
    if repaired {
        warn!(
            "Registry tables in {:?} were out of step; rebuilt name table from records",
            files.dir()
        );
    }
    Ok((index, repaired))
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_input(format!("no usable file name: {}", path.display())))
}
