//! Commit-keyed history of approval snapshots

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::approvals::{DecisionAction, Decisions};
use crate::git::GitInfo;

pub const DEFAULT_MAX_HISTORY: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSummary {
    pub total_tests: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub pending: usize,
}

impl DecisionSummary {
    pub fn from_decisions(decisions: &Decisions) -> Self {
        let total_tests = decisions.len();
        let accepted = decisions
            .values()
            .filter(|d| d.action == DecisionAction::Accept)
            .count();
        let rejected = decisions
            .values()
            .filter(|d| d.action == DecisionAction::Reject)
            .count();
        Self {
            total_tests,
            accepted,
            rejected,
            pending: total_tests.saturating_sub(accepted + rejected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub short_sha: String,
    pub full_sha: String,
    pub author: String,
    pub email: String,
    pub date: String,
    pub message: String,
    pub branch: String,
    #[serde(with = "time::serde::rfc3339")]
    pub approval_timestamp: OffsetDateTime,
    #[serde(default)]
    pub approvals: Decisions,
    #[serde(default)]
    pub summary: DecisionSummary,
}

impl HistoryEntry {
    pub fn new(git: &GitInfo, decisions: Decisions, now: OffsetDateTime) -> Self {
        let summary = DecisionSummary::from_decisions(&decisions);
        Self {
            short_sha: git.short_sha.clone(),
            full_sha: git.sha.clone(),
            author: git.author.clone(),
            email: git.email.clone(),
            date: git.timestamp.clone(),
            message: git.message.clone(),
            branch: git.branch.clone(),
            approval_timestamp: now,
            approvals: decisions,
            summary,
        }
    }

    /// Names whose recorded action is `accept`
    pub fn accepted(&self) -> impl Iterator<Item = &str> {
        self.approvals
            .iter()
            .filter(|(_, d)| d.action == DecisionAction::Accept)
            .map(|(name, _)| name.as_str())
    }
}

/// Result of a single upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// True when an entry with the same short SHA already existed
    pub merged: bool,
    /// Short SHAs evicted to honour `max_history`
    pub dropped: Vec<String>,
}

/// Contents of `history.json`: newest first, unique by short SHA,
/// at most `max_history` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLedger {
    pub max_history: usize,
    #[serde(default)]
    pub commits: Vec<HistoryEntry>,
}

impl HistoryLedger {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            commits: Vec::new(),
        }
    }

    pub fn find(&self, short_sha: &str) -> Option<&HistoryEntry> {
        self.commits.iter().find(|c| c.short_sha == short_sha)
    }

    /// Record `decisions` against the commit in `git`.
    ///
    /// A repeated short SHA accumulates into the existing approvals map and
    /// moves to the front; otherwise a new entry is prepended. The list is
    /// then cut to `max_history`, dropping the oldest.
    pub fn upsert(
        &mut self,
        decisions: &Decisions,
        git: &GitInfo,
        now: OffsetDateTime,
    ) -> UpsertOutcome {
        let existing = self
            .commits
            .iter()
            .position(|c| c.short_sha == git.short_sha);

        let merged = existing.is_some();
        let entry = match existing {
            Some(index) => {
                let mut entry = self.commits.remove(index);
                entry
                    .approvals
                    .extend(decisions.iter().map(|(k, v)| (k.clone(), v.clone())));
                entry.summary = DecisionSummary::from_decisions(&entry.approvals);
                entry.approval_timestamp = now;
                entry
            }
            None => HistoryEntry::new(git, decisions.clone(), now),
        };
        self.commits.insert(0, entry);

        let cap = self.max_history.max(1);
        let dropped: Vec<String> = if self.commits.len() > cap {
            self.commits
                .drain(cap..)
                .map(|c| c.short_sha)
                .collect()
        } else {
            Vec::new()
        };

        if !dropped.is_empty() {
            debug!("History ledger dropped {} old commit(s): {:?}", dropped.len(), dropped);
        }

        UpsertOutcome { merged, dropped }
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
