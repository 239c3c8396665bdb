//! Target rotation scheduler.
//!
//! Each registered target carries a [`ScheduleInfo`]. [`TargetScheduler::tick`]
//! advances every enabled target by one tick and returns the deliveries that
//! fell due; the [`runner`] module drives it on a timer and hands deliveries to
//! the renderer.

pub mod runner;
mod types;

pub use runner::SchedulerRunner;
pub use types::*;

use crate::config::SchedulerConfig;
use crate::registry::AssetRegistry;
use crate::state::{self, DataFiles, FileStamp};
use localfiles_common::paths::{file_reference, is_remote_url};
use localfiles_common::{Error, Result, TargetId};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Scheduler shared between the runner and control commands.
pub type SharedScheduler = Arc<Mutex<TargetScheduler>>;

/// Rotation behaviour derived from the `[scheduler]` config section.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub period: Duration,
    pub default_interval_ticks: u32,
    pub use_local_files: bool,
    pub wrap_direct_lists: bool,
}

impl SchedulerSettings {
    /// Whether a direct list cursor past the end goes back to the start.
    ///
    /// Lists only stop wrapping when entries resolve through local files
    /// and wrapping was switched off explicitly.
    pub fn wraps_direct_lists(&self) -> bool {
        !self.use_local_files || self.wrap_direct_lists
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for SchedulerSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            period: Duration::from_secs(config.period_secs.max(1)),
            default_interval_ticks: config.default_interval_ticks.max(1),
            use_local_files: config.use_local_files,
            wrap_direct_lists: config.wrap_direct_lists,
        }
    }
}

/// A rotation that fell due: show `reference` on `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub target: TargetId,
    pub reference: String,
}

/// Owns the schedule of every managed target.
pub struct TargetScheduler {
    targets: BTreeMap<TargetId, ScheduleInfo>,
    settings: SchedulerSettings,
    files: Option<DataFiles>,
    /// Stamp of the schedule table as last read or written here.
    stamp: Option<FileStamp>,
}

impl TargetScheduler {
    pub fn in_memory(settings: SchedulerSettings) -> Self {
        Self {
            targets: BTreeMap::new(),
            settings,
            files: None,
            stamp: None,
        }
    }

    /// Load the schedule table from `files`.
    pub fn open(settings: SchedulerSettings, files: DataFiles) -> Result<Self> {
        let stamp = state::file_stamp(&files.schedule());
        let targets = load_targets(&files)?;
        tracing::info!("Loaded {} scheduled targets", targets.len());

        Ok(Self {
            targets,
            settings,
            files: Some(files),
            stamp,
        })
    }

    /// Re-read the schedule table if another process wrote it since this
    /// scheduler last read or wrote it. Returns `true` when it was reloaded.
    pub fn reload_if_changed(&mut self) -> Result<bool> {
        let Some(files) = &self.files else {
            return Ok(false);
        };
        let current = state::file_stamp(&files.schedule());
        if current == self.stamp {
            return Ok(false);
        }

        self.targets = load_targets(files)?;
        self.stamp = current;
        tracing::info!(
            "Schedule changed on disk; reloaded {} targets",
            self.targets.len()
        );
        Ok(true)
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn get(&self, target: TargetId) -> Option<&ScheduleInfo> {
        self.targets.get(&target)
    }

    pub fn targets(&self) -> impl Iterator<Item = (TargetId, &ScheduleInfo)> {
        self.targets.iter().map(|(id, info)| (*id, info))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn target_mut(&mut self, target: TargetId) -> Result<&mut ScheduleInfo> {
        self.targets
            .get_mut(&target)
            .ok_or_else(|| Error::not_found(format!("target {} is not scheduled", target)))
    }

    // ------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------

    /// Add a target with default settings and no entries.
    pub fn register(&mut self, target: TargetId) -> Result<()> {
        if self.targets.contains_key(&target) {
            return Err(Error::already_exists(format!("target {}", target)));
        }
        self.targets
            .insert(target, ScheduleInfo::new(self.settings.default_interval_ticks));
        tracing::info!("Target {} added to schedule with defaults", target);
        self.persist();
        Ok(())
    }

    pub fn deregister(&mut self, target: TargetId) -> Result<ScheduleInfo> {
        let removed = self
            .targets
            .remove(&target)
            .ok_or_else(|| Error::not_found(format!("target {} is not scheduled", target)))?;
        tracing::info!("Target {} removed from schedule", target);
        self.persist();
        Ok(removed)
    }

    pub fn set_category_mode(&mut self, target: TargetId, category: &str) -> Result<()> {
        if category.is_empty() {
            return Err(Error::invalid_input("category must not be empty"));
        }
        self.target_mut(target)?.set_category(category);
        self.persist();
        Ok(())
    }

    pub fn add_url(&mut self, target: TargetId, url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(Error::invalid_input("entry must not be empty"));
        }
        self.target_mut(target)?.add_url(url);
        self.persist();
        Ok(())
    }

    pub fn remove_url(&mut self, target: TargetId, url: &str) -> Result<()> {
        if !self.target_mut(target)?.remove_url(url) {
            return Err(Error::not_found(format!("'{}' on target {}", url, target)));
        }
        self.persist();
        Ok(())
    }

    pub fn set_interval(&mut self, target: TargetId, ticks: u32) -> Result<()> {
        if ticks == 0 {
            return Err(Error::invalid_input("interval must be at least one tick"));
        }
        self.target_mut(target)?.interval_ticks = ticks;
        self.persist();
        Ok(())
    }

    pub fn set_enabled(&mut self, target: TargetId, enabled: bool) -> Result<()> {
        self.target_mut(target)?.enabled = enabled;
        self.persist();
        Ok(())
    }

    /// Flip the enabled flag, returning the new value.
    pub fn toggle_enabled(&mut self, target: TargetId) -> Result<bool> {
        let info = self.target_mut(target)?;
        info.enabled = !info.enabled;
        let enabled = info.enabled;
        self.persist();
        Ok(enabled)
    }

    /// Operator-facing status text for one target.
    pub fn describe(&self, target: TargetId) -> Result<String> {
        let info = self
            .get(target)
            .ok_or_else(|| Error::not_found(format!("target {} is not scheduled", target)))?;

        Ok(ScheduleReport {
            target,
            info,
            period: self.settings.period,
        }
        .to_string())
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    /// Advance every enabled target by one tick.
    ///
    /// Changes written to the schedule table by other processes are picked
    /// up first. Targets whose entry cannot be resolved are logged and
    /// skipped. The schedule table is written once at the end of the pass.
    pub fn tick(&mut self, registry: &AssetRegistry) -> Vec<Delivery> {
        if let Err(e) = self.reload_if_changed() {
            tracing::warn!("Keeping in-memory schedule; reload failed: {}", e);
        }

        let settings = &self.settings;
        let mut deliveries = Vec::new();

        for (target, info) in self.targets.iter_mut() {
            if !info.enabled || !info.advance() {
                continue;
            }

            match select_entry(info, settings, registry) {
                Ok(reference) => {
                    tracing::debug!(
                        target_id = %target,
                        %reference,
                        cursor = info.cursor_index,
                        "Rotation due"
                    );
                    deliveries.push(Delivery {
                        target: *target,
                        reference,
                    });
                }
                Err(e) => {
                    tracing::warn!(target_id = %target, error = %e, "Skipping rotation");
                }
            }
        }

        self.persist();
        deliveries
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn flush(&mut self) -> Result<()> {
        let Some(files) = &self.files else {
            return Ok(());
        };
        state::write_json(&files.schedule(), &self.targets)?;
        self.stamp = state::file_stamp(&files.schedule());
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!("Failed to persist schedule: {}", e);
        }
    }
}

fn load_targets(files: &DataFiles) -> Result<BTreeMap<TargetId, ScheduleInfo>> {
    let mut targets: BTreeMap<TargetId, ScheduleInfo> =
        state::read_json_or_default(&files.schedule())?;
    for info in targets.values_mut() {
        info.interval_ticks = info.interval_ticks.max(1);
    }
    Ok(targets)
}

/// Status text shown by `target describe`.
struct ScheduleReport<'a> {
    target: TargetId,
    info: &'a ScheduleInfo,
    period: Duration,
}

impl fmt::Display for ScheduleReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info;
        writeln!(f, "Target {}", self.target)?;
        match info.mode() {
            EntryMode::Empty => writeln!(f, "Entries: none")?,
            EntryMode::Category(category) => writeln!(f, "Category: {}", category)?,
            EntryMode::Direct(_) => {
                writeln!(f, "Entries:")?;
                for (rank, entry) in &info.entries {
                    writeln!(f, "  {}: {}", rank, entry)?;
                }
            }
        }
        writeln!(f, "Current entry index = {}", info.cursor_index)?;
        writeln!(f, "Cycle enabled: {}", info.enabled)?;
        writeln!(
            f,
            "Change every {} ticks ({} seconds per tick)",
            info.interval_ticks,
            self.period.as_secs()
        )?;
        write!(f, "Current tick count: {}", info.ticks_elapsed)
    }
}

/// Pick the entry under the (already advanced) cursor and resolve it.
fn select_entry(
    info: &mut ScheduleInfo,
    settings: &SchedulerSettings,
    registry: &AssetRegistry,
) -> Result<String> {
    if let Some(category) = info.category().map(str::to_string) {
        let files = registry.files_in_category(&category);
        if files.is_empty() {
            return Err(Error::not_found(format!("no files in category '{}'", category)));
        }
        if info.cursor_index >= files.len() {
            info.cursor_index = 0;
        }
        return Ok(file_reference(&files[info.cursor_index].path()));
    }

    let entries: Vec<String> = info.entries.values().cloned().collect();
    if info.cursor_index >= entries.len() && settings.wraps_direct_lists() {
        info.cursor_index = 0;
    }
    let entry = entries.get(info.cursor_index).ok_or_else(|| {
        Error::not_found(format!(
            "no entry at position {} of {}",
            info.cursor_index,
            entries.len()
        ))
    })?;

    if !settings.use_local_files {
        return Ok(entry.clone());
    }
    if let Some(reference) = registry.resolve_reference(entry) {
        return Ok(reference);
    }
    if is_remote_url(entry) {
        return Ok(entry.clone());
    }
    Err(Error::not_found(format!("'{}' is not an indexed file", entry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistrySettings;
    use localfiles_probe::CompositeProber;

    fn empty_registry() -> AssetRegistry {
        AssetRegistry::in_memory(
            RegistrySettings::new("/nonexistent"),
            Arc::new(CompositeProber::standard()),
        )
    }

    fn remote_settings() -> SchedulerSettings {
        SchedulerSettings {
            use_local_files: false,
            ..SchedulerSettings::default()
        }
    }

    fn target(raw: u64) -> TargetId {
        TargetId::new(raw)
    }

    #[test]
    fn register_twice_fails() {
        let mut scheduler = TargetScheduler::in_memory(SchedulerSettings::default());
        scheduler.register(target(1)).unwrap();
        assert!(matches!(
            scheduler.register(target(1)).unwrap_err(),
            Error::AlreadyExists(_)
        ));
        assert_eq!(scheduler.get(target(1)).unwrap().interval_ticks, 5);
    }

    #[test]
    fn control_on_unknown_target_is_not_found() {
        let mut scheduler = TargetScheduler::in_memory(SchedulerSettings::default());
        assert!(scheduler.add_url(target(9), "a.png").unwrap_err().is_not_found());
        assert!(scheduler.set_interval(target(9), 2).unwrap_err().is_not_found());
        assert!(scheduler.describe(target(9)).unwrap_err().is_not_found());
        assert!(scheduler.deregister(target(9)).unwrap_err().is_not_found());
    }

    #[test]
    fn zero_interval_rejected() {
        let mut scheduler = TargetScheduler::in_memory(SchedulerSettings::default());
        scheduler.register(target(1)).unwrap();
        assert!(matches!(
            scheduler.set_interval(target(1), 0).unwrap_err(),
            Error::InvalidInput(_)
        ));
    }

    #[test]
    fn direct_list_passes_urls_through_without_local_files() {
        let registry = empty_registry();
        let mut scheduler = TargetScheduler::in_memory(remote_settings());
        scheduler.register(target(1)).unwrap();
        scheduler.set_interval(target(1), 1).unwrap();
        scheduler.add_url(target(1), "https://x/a.png").unwrap();
        scheduler.add_url(target(1), "https://x/b.png").unwrap();

        let refs: Vec<String> = (0..3)
            .flat_map(|_| scheduler.tick(&registry))
            .map(|d| d.reference)
            .collect();
        assert_eq!(refs, ["https://x/b.png", "https://x/a.png", "https://x/b.png"]);
    }

    #[test]
    fn disabled_targets_do_not_tick() {
        let registry = empty_registry();
        let mut scheduler = TargetScheduler::in_memory(remote_settings());
        scheduler.register(target(1)).unwrap();
        scheduler.set_interval(target(1), 1).unwrap();
        scheduler.add_url(target(1), "https://x/a.png").unwrap();
        assert!(!scheduler.toggle_enabled(target(1)).unwrap());

        assert!(scheduler.tick(&registry).is_empty());
        assert_eq!(scheduler.get(target(1)).unwrap().ticks_elapsed, 0);
    }

    #[test]
    fn suppressed_wrap_runs_off_the_end() {
        let registry = empty_registry();
        let settings = SchedulerSettings {
            use_local_files: true,
            wrap_direct_lists: false,
            ..SchedulerSettings::default()
        };
        let mut scheduler = TargetScheduler::in_memory(settings);
        scheduler.register(target(1)).unwrap();
        scheduler.set_interval(target(1), 1).unwrap();
        scheduler.add_url(target(1), "https://x/a.png").unwrap();
        scheduler.add_url(target(1), "https://x/b.png").unwrap();

        assert_eq!(scheduler.tick(&registry).len(), 1);
        // Cursor is now past the end and stays there.
        assert!(scheduler.tick(&registry).is_empty());
        assert!(scheduler.tick(&registry).is_empty());
        assert_eq!(scheduler.get(target(1)).unwrap().cursor_index, 3);
    }

    #[test]
    fn unindexed_local_entry_is_skipped() {
        let registry = empty_registry();
        let mut scheduler = TargetScheduler::in_memory(SchedulerSettings::default());
        scheduler.register(target(1)).unwrap();
        scheduler.register(target(2)).unwrap();
        for t in [1, 2] {
            scheduler.set_interval(target(t), 1).unwrap();
        }
        scheduler.add_url(target(1), "missing.png").unwrap();
        scheduler.add_url(target(2), "https://x/a.png").unwrap();

        let deliveries = scheduler.tick(&registry);
        assert_eq!(
            deliveries,
            [Delivery {
                target: target(2),
                reference: "https://x/a.png".to_string()
            }]
        );
    }

    #[test]
    fn describe_lists_entries() {
        let mut scheduler = TargetScheduler::in_memory(SchedulerSettings::default());
        scheduler.register(target(4)).unwrap();
        scheduler.add_url(target(4), "a.png").unwrap();

        let text = scheduler.describe(target(4)).unwrap();
        assert!(text.contains("Target 4"));
        assert!(text.contains("  0: a.png"));
        assert!(text.contains("Change every 5 ticks (30 seconds per tick)"));

        scheduler.set_category_mode(target(4), "signs").unwrap();
        assert!(scheduler.describe(target(4)).unwrap().contains("Category: signs"));
    }

    #[test]
    fn describe_renders_full_report() {
        let mut scheduler = TargetScheduler::in_memory(SchedulerSettings::default());
        scheduler.register(target(4)).unwrap();
        scheduler.add_url(target(4), "a.png").unwrap();
        scheduler.add_url(target(4), "b.png").unwrap();
        scheduler.set_enabled(target(4), false).unwrap();

        assert_eq!(
            scheduler.describe(target(4)).unwrap(),
            "Target 4\n\
             Entries:\n  0: a.png\n  1: b.png\n\
             Current entry index = 0\n\
             Cycle enabled: false\n\
             Change every 5 ticks (30 seconds per tick)\n\
             Current tick count: 0"
        );

        scheduler.deregister(target(4)).unwrap();
        scheduler.register(target(4)).unwrap();
        assert!(scheduler
            .describe(target(4))
            .unwrap()
            .starts_with("Target 4\nEntries: none\nCurrent entry index = 0\n"));
    }
}
