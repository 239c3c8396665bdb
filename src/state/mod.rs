//! On-disk state tables.
//!
//! Every table is a pretty-printed JSON document. Writes go through a
//! temporary file in the same directory that is renamed over the previous
//! version, so a crash mid-write leaves the old table intact.

use localfiles_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Key to record table.
pub const FILE_META: &str = "file_meta.json";
/// File name to key table.
pub const FILE_TO_KEY: &str = "file_to_key.json";
/// Target to schedule table.
pub const SCHEDULE: &str = "schedule.json";

/// Locations of the persisted tables under one data directory.
#[derive(Debug, Clone)]
pub struct DataFiles {
    dir: PathBuf,
}

impl DataFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_meta(&self) -> PathBuf {
        self.dir.join(FILE_META)
    }

    pub fn file_to_key(&self) -> PathBuf {
        self.dir.join(FILE_TO_KEY)
    }

    pub fn schedule(&self) -> PathBuf {
        self.dir.join(SCHEDULE)
    }
}

/// Serialize `value` to `path` atomically.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| Error::storage(dir, e))?;

    let json = serde_json::to_vec_pretty(value)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".state-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::storage(dir, e))?;
    tmp.write_all(&json).map_err(|e| Error::storage(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::storage(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::storage(path, e.error))?;

    Ok(())
}

/// Load a table, treating a missing file as an empty table.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| Error::storage(path, e))?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(&content)?)
}

/// Last-modified time and length of a table file.
///
/// Another process writing a table (a control command while `run` is up)
/// changes its stamp; owners compare stamps to notice and reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

/// Stamp of `path`, or `None` when the file does not exist.
pub fn file_stamp(path: &Path) -> Option<FileStamp> {
    let meta = std::fs::metadata(path).ok()?;
    Some(FileStamp {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}
