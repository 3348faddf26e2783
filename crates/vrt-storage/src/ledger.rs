//! Decision ledger: bounded, commit-keyed history of approval decisions
//! plus the name-keyed approvals snapshot it keeps in step.

use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::info;
use vrt_core::{
    ApprovalsMeta, ApprovalsSnapshot, DecisionAction, Decisions, GitInfo, HistoryEntry,
    HistoryLedger, UpsertOutcome,
};

use crate::error::{Result, StorageError};
use crate::store::{JsonStore, Repository};

/// Everything persisted by one [`DecisionLedger::upsert`]
#[derive(Debug, Clone)]
pub struct LedgerUpdate {
    pub ledger: HistoryLedger,
    pub approvals: ApprovalsSnapshot,
    pub outcome: UpsertOutcome,
}

/// Which baselines a revert has to restore. The copy itself is done by the
/// caller through the baseline manager.
#[derive(Debug, Clone)]
pub struct RevertPlan {
    pub entry: HistoryEntry,
    /// Names accepted in that commit, whose baselines come back from its
    /// branch's captures
    pub restores: Vec<String>,
    /// Names rejected in that commit
    pub rejected: Vec<String>,
}

pub struct DecisionLedger {
    history: Box<dyn Repository<HistoryLedger>>,
    approvals: Box<dyn Repository<ApprovalsSnapshot>>,
    default_max_history: usize,
}

impl DecisionLedger {
    pub fn new(
        history: Box<dyn Repository<HistoryLedger>>,
        approvals: Box<dyn Repository<ApprovalsSnapshot>>,
        default_max_history: usize,
    ) -> Self {
        Self {
            history,
            approvals,
            default_max_history,
        }
    }

    /// Ledger backed by `history.json` and `approvals.json`
    pub fn open(
        history_path: impl Into<PathBuf>,
        approvals_path: impl Into<PathBuf>,
        default_max_history: usize,
    ) -> Self {
        Self::new(
            Box::new(JsonStore::<HistoryLedger>::new(history_path)),
            Box::new(JsonStore::<ApprovalsSnapshot>::new(approvals_path)),
            default_max_history,
        )
    }

    pub fn history(&self) -> Result<HistoryLedger> {
        Ok(self
            .history
            .load()?
            .unwrap_or_else(|| HistoryLedger::new(self.default_max_history)))
    }

    pub fn approvals(&self) -> Result<ApprovalsSnapshot> {
        Ok(self.approvals.load()?.unwrap_or_default())
    }

    /// Record decisions against the commit in `git`.
    ///
    /// The history is written first, then the approvals snapshot. The two
    /// writes are not one transaction: if the approvals write fails the
    /// error is returned and the history keeps the new entry. Repeating the
    /// call merges into that entry, so a retry converges on the intended
    /// state. An unreadable existing file is never replaced.
    pub fn upsert(
        &self,
        decisions: &Decisions,
        git: &GitInfo,
        meta: ApprovalsMeta,
    ) -> Result<LedgerUpdate> {
        if decisions.is_empty() {
            return Err(StorageError::Invalid("no decisions to record".to_string()));
        }

        let now = OffsetDateTime::now_utc();
        let mut outcome = None;
        let ledger = self.history.update(&mut |current| {
            let mut ledger =
                current.unwrap_or_else(|| HistoryLedger::new(self.default_max_history));
            outcome = Some(ledger.upsert(decisions, git, now));
            Ok(ledger)
        })?;

        let approvals = self.approvals.update(&mut |current| {
            let mut snapshot = current.unwrap_or_default();
            snapshot.apply_decisions(decisions);
            snapshot.meta = meta.clone();
            Ok(snapshot)
        })?;

        let outcome = outcome.unwrap_or(UpsertOutcome {
            merged: false,
            dropped: Vec::new(),
        });

        info!(
            "Recorded {} decision(s) for {} ({})",
            decisions.len(),
            git.short_sha,
            if outcome.merged { "merged" } else { "new entry" }
        );

        Ok(LedgerUpdate {
            ledger,
            approvals,
            outcome,
        })
    }

    /// Resolve what reverting to `short_sha` involves
    pub fn revert(&self, short_sha: &str) -> Result<RevertPlan> {
        let ledger = self.history()?;
        let entry = ledger
            .find(short_sha)
            .cloned()
            .ok_or_else(|| StorageError::CommitNotFound(short_sha.to_string()))?;

        let restores = entry.accepted().map(str::to_string).collect();
        let rejected = entry
            .approvals
            .iter()
            .filter(|(_, d)| d.action == DecisionAction::Reject)
            .map(|(name, _)| name.clone())
            .collect();

        Ok(RevertPlan {
            entry,
            restores,
            rejected,
        })
    }

    /// Put the approvals snapshot back to what `entry` recorded for its names
    pub fn restore_approvals(
        &self,
        entry: &HistoryEntry,
        meta: ApprovalsMeta,
    ) -> Result<ApprovalsSnapshot> {
        self.approvals.update(&mut |current| {
            let mut snapshot = current.unwrap_or_default();
            snapshot.apply_decisions(&entry.approvals);
            snapshot.meta = meta.clone();
            Ok(snapshot)
        })
    }

    /// Replace the `new` / `deleted` lists after a compare run
    pub fn refresh_inventory(
        &self,
        new: &[String],
        deleted: &[String],
    ) -> Result<ApprovalsSnapshot> {
        self.approvals.update(&mut |current| {
            let mut snapshot = current.unwrap_or_default();
            snapshot.refresh_inventory(new.iter().cloned(), deleted.iter().cloned());
            Ok(snapshot)
        })
    }
}
