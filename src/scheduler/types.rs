use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved rank marking the single entry of a category-mode schedule.
pub const CATEGORY_RANK: u32 = 99_999;

/// Rotation state for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleInfo {
    /// Ticks between rotations (at least 1)
    pub interval_ticks: u32,
    /// Ticks since the last rotation
    #[serde(default)]
    pub ticks_elapsed: u32,
    /// Position in the active entry list
    #[serde(default)]
    pub cursor_index: usize,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Ranked direct entries, or one entry at [`CATEGORY_RANK`] naming a category
    #[serde(default)]
    pub entries: BTreeMap<u32, String>,
}

fn default_enabled() -> bool {
    true
}

/// How a schedule picks its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryMode<'a> {
    Empty,
    /// Entries resolved live from this category on every due tick
    Category(&'a str),
    /// Fixed list in rank order
    Direct(Vec<&'a str>),
}

impl ScheduleInfo {
    pub fn new(interval_ticks: u32) -> Self {
        Self {
            interval_ticks: interval_ticks.max(1),
            ticks_elapsed: 0,
            cursor_index: 0,
            enabled: true,
            entries: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> EntryMode<'_> {
        if self.entries.is_empty() {
            return EntryMode::Empty;
        }
        match self.category() {
            Some(category) => EntryMode::Category(category),
            None => EntryMode::Direct(self.entries.values().map(String::as_str).collect()),
        }
    }

    /// Category name when in category mode.
    pub fn category(&self) -> Option<&str> {
        if self.entries.len() == 1 {
            self.entries.get(&CATEGORY_RANK).map(String::as_str)
        } else {
            None
        }
    }

    /// Switch to category mode, dropping any direct entries.
    pub fn set_category(&mut self, category: &str) {
        self.entries.clear();
        self.entries.insert(CATEGORY_RANK, category.to_string());
    }

    /// Append a direct entry, leaving category mode if it was active.
    pub fn add_url(&mut self, url: &str) {
        self.entries.remove(&CATEGORY_RANK);
        let rank = self.entries.len() as u32;
        self.entries.insert(rank, url.to_string());
    }

    /// Drop every direct entry equal to `url` and re-rank the rest densely.
    ///
    /// Returns `false`, leaving entries untouched, when no direct entry matches.
    pub fn remove_url(&mut self, url: &str) -> bool {
        let present = self
            .entries
            .iter()
            .any(|(rank, entry)| *rank != CATEGORY_RANK && entry == url);
        if !present {
            return false;
        }

        self.entries.remove(&CATEGORY_RANK);
        let remaining: Vec<String> = std::mem::take(&mut self.entries)
            .into_values()
            .filter(|entry| entry != url)
            .collect();
        self.entries = (0u32..).zip(remaining).collect();
        true
    }

    /// Count one tick; `true` when this tick triggers a rotation.
    ///
    /// On a due tick the elapsed count resets and the cursor moves forward
    /// by one. Wrapping is left to the caller, which knows the list length.
    pub fn advance(&mut self) -> bool {
        self.ticks_elapsed = self.ticks_elapsed.saturating_add(1);
        if self.ticks_elapsed < self.interval_ticks || self.entries.is_empty() {
            return false;
        }
        self.ticks_elapsed = 0;
        self.cursor_index += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes_are_exclusive() {
        let mut info = ScheduleInfo::new(5);
        assert_eq!(info.mode(), EntryMode::Empty);

        info.add_url("a.png");
        info.add_url("b.png");
        assert_eq!(info.mode(), EntryMode::Direct(vec!["a.png", "b.png"]));

        info.set_category("signs");
        assert_eq!(info.mode(), EntryMode::Category("signs"));
        assert_eq!(info.entries.len(), 1);

        info.add_url("c.png");
        assert_eq!(info.mode(), EntryMode::Direct(vec!["c.png"]));
        assert_eq!(info.entries.keys().copied().collect::<Vec<_>>(), [0]);
    }

    #[test]
    fn test_remove_url_reranks() {
        let mut info = ScheduleInfo::new(5);
        for url in ["a", "b", "c", "b"] {
            info.add_url(url);
        }

        assert!(info.remove_url("b"));
        assert_eq!(info.mode(), EntryMode::Direct(vec!["a", "c"]));
        assert_eq!(info.entries.keys().copied().collect::<Vec<_>>(), [0, 1]);

        assert!(!info.remove_url("zzz"));
        assert_eq!(info.entries.len(), 2);
    }

    #[test]
    fn test_remove_url_ignores_category_name() {
        let mut info = ScheduleInfo::new(5);
        info.set_category("signs");
        assert!(!info.remove_url("signs"));
        assert_eq!(info.category(), Some("signs"));
    }

    #[test]
    fn test_advance_cadence() {
        let mut info = ScheduleInfo::new(3);
        info.add_url("a");

        assert!(!info.advance());
        assert!(!info.advance());
        assert!(info.advance());
        assert_eq!(info.ticks_elapsed, 0);
        assert_eq!(info.cursor_index, 1);
    }

    #[test]
    fn test_advance_without_entries_keeps_counting() {
        let mut info = ScheduleInfo::new(2);
        assert!(!info.advance());
        assert!(!info.advance());
        assert!(!info.advance());
        assert_eq!(info.ticks_elapsed, 3);
        assert_eq!(info.cursor_index, 0);
    }

    #[test]
    fn test_interval_floor() {
        assert_eq!(ScheduleInfo::new(0).interval_ticks, 1);
    }

    #[test]
    fn test_persisted_shape() {
        let mut info = ScheduleInfo::new(5);
        info.set_category("signs");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["entries"]["99999"], "signs");
        assert_eq!(json["interval_ticks"], 5);
    }
}
