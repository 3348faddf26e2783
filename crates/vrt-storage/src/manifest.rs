//! Per-branch record of what was captured in the current run

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// The capture was written as the baseline
    Baseline,
    /// The capture was written to the compare store
    Compare,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureEntry {
    pub mode: CaptureMode,
    /// Whether a baseline existed before this capture was taken
    pub baseline_existed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub captured_at: OffsetDateTime,
}

/// Contents of `captures.json`: the captures of one run.
///
/// A run ends when it is compared. The first capture after that starts a
/// new run and drops everything recorded by the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureManifest {
    /// Increases each time a new run starts
    #[serde(default)]
    pub run: u64,
    /// Set once the run has been compared
    #[serde(default)]
    pub compared: bool,
    #[serde(default)]
    pub captures: BTreeMap<String, CaptureEntry>,
}

impl CaptureManifest {
    /// Record a capture. Within a run, a later capture of the same name
    /// replaces the earlier one but remembers that the name started out
    /// without a baseline.
    pub fn record(&mut self, name: &str, entry: CaptureEntry) {
        if self.compared {
            self.run += 1;
            self.compared = false;
            self.captures.clear();
        }

        let entry = match self.captures.get(name) {
            Some(previous) if !previous.baseline_existed => CaptureEntry {
                baseline_existed: false,
                ..entry
            },
            _ => entry,
        };
        self.captures.insert(name.to_string(), entry);
    }

    /// Mark the run as compared; it stays readable until the next capture
    pub fn close_run(&mut self) {
        self.compared = true;
    }

    /// Names captured without a pre-existing baseline
    pub fn new_names(&self) -> impl Iterator<Item = &str> {
        self.captures
            .iter()
            .filter(|(_, e)| !e.baseline_existed)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mode: CaptureMode, baseline_existed: bool) -> CaptureEntry {
        CaptureEntry {
            mode,
            baseline_existed,
            captured_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_recapture_keeps_new_flag() {
        let mut manifest = CaptureManifest::default();
        manifest.record("home", entry(CaptureMode::Baseline, false));
        manifest.record("home", entry(CaptureMode::Compare, true));

        let home = &manifest.captures["home"];
        assert_eq!(home.mode, CaptureMode::Compare);
        assert!(!home.baseline_existed);
        assert_eq!(manifest.new_names().collect::<Vec<_>>(), vec!["home"]);
    }

    #[test]
    fn test_capture_after_compare_starts_new_run() {
        let mut manifest = CaptureManifest::default();
        manifest.record("home", entry(CaptureMode::Baseline, false));
        manifest.record("login", entry(CaptureMode::Compare, true));
        manifest.close_run();
        assert_eq!(manifest.captures.len(), 2);

        manifest.record("home", entry(CaptureMode::Compare, true));
        assert_eq!(manifest.run, 1);
        assert!(!manifest.compared);
        assert_eq!(manifest.captures.keys().collect::<Vec<_>>(), vec!["home"]);
        assert_eq!(manifest.new_names().count(), 0);
    }

    #[test]
    fn test_existing_baseline_is_not_new() {
        let mut manifest = CaptureManifest::default();
        manifest.record("home", entry(CaptureMode::Compare, true));
        assert_eq!(manifest.new_names().count(), 0);
    }
}
