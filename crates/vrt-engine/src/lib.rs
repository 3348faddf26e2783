//! Visual regression lifecycle orchestration
//!
//! Wires the baseline manager, diff engine, report synthesizer and decision
//! ledger together behind the operations the `vrt` binary exposes:
//! capture, compare, approve/reject, history and revert.

mod settings;

pub use settings::EngineSettings;

use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use vrt_baseline::layout::validate_name;
use vrt_baseline::{BaselineDecision, BaselineError, BaselineManager, StoreLayout};
use vrt_core::{
    ApprovalsMeta, ApprovalsSnapshot, CompareReport, ComparisonResult, CoreError, Decision,
    DecisionAction, Decisions, ErrorKind, GitInfo, HistoryLedger, PrInfo, ReportSynthesizer,
    RunInventory,
};
use vrt_diff::{DiffEngine, DiffError, DiffJob};
use vrt_sources::{
    CommandGitProvider, Filesystem, GitProvider, OsFilesystem, detect_pr_info_from_env,
};
use vrt_storage::{
    CaptureEntry, CaptureManifest, CaptureMode, DecisionLedger, JsonStore, LedgerUpdate,
    Repository, RevertPlan, StorageError,
};

const MANIFEST_FILE: &str = "captures.json";
const DECISION_SOURCE: &str = "cli";

#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub name: String,
    pub branch: String,
    pub decision: BaselineDecision,
    /// Whether a baseline existed before this capture
    pub baseline_existed: bool,
}

#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub report: CompareReport,
    pub report_path: PathBuf,
    pub approvals: ApprovalsSnapshot,
}

#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub action: DecisionAction,
    pub update: LedgerUpdate,
    /// Baselines replaced by the accepted captures
    pub updated: Vec<String>,
    /// Accepted names whose baseline could not be replaced
    pub failed_updates: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RevertOutcome {
    pub plan: RevertPlan,
    pub restored: Vec<String>,
    pub failed_restores: Vec<String>,
    pub approvals: ApprovalsSnapshot,
}

pub struct Engine {
    settings: EngineSettings,
    baselines: BaselineManager,
    diff: DiffEngine,
    synthesizer: ReportSynthesizer,
    ledger: Arc<DecisionLedger>,
    git: Arc<dyn GitProvider>,
    fs: Arc<dyn Filesystem>,
    pr_info: Option<PrInfo>,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        git: Arc<dyn GitProvider>,
        fs: Arc<dyn Filesystem>,
    ) -> Self {
        let layout = StoreLayout::new(
            settings.baseline_dir.clone(),
            settings.compare_dir.clone(),
            settings.diff_dir.clone(),
        );
        let baselines =
            BaselineManager::new(layout, settings.default_branch.clone(), Arc::clone(&fs));
        let ledger = Arc::new(DecisionLedger::open(
            settings.history_path.clone(),
            settings.approvals_path.clone(),
            settings.max_history,
        ));

        Self {
            diff: DiffEngine::new(settings.workers),
            synthesizer: ReportSynthesizer::new(),
            settings,
            baselines,
            ledger,
            git,
            fs,
            pr_info: None,
        }
    }

    /// Engine over the real filesystem, reading Git facts from
    /// `project_root` and PR context from the CI environment
    pub fn open(settings: EngineSettings, project_root: &Path) -> Self {
        Self::new(
            settings,
            Arc::new(CommandGitProvider::new(project_root)),
            Arc::new(OsFilesystem),
        )
        .with_pr_info(detect_pr_info_from_env())
    }

    pub fn with_pr_info(mut self, pr_info: Option<PrInfo>) -> Self {
        self.pr_info = pr_info;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Git facts for this run, with the configured branch override applied
    pub async fn git_info(&self) -> GitInfo {
        let info = self.git.git_info().await;
        match self.settings.branch.as_deref() {
            Some(branch) => info.with_branch(branch),
            None => info,
        }
    }

    /// Store a screenshot as either the baseline or a comparison candidate
    pub async fn capture(&self, name: &str, image: &Path) -> Result<CaptureOutcome> {
        let readable = self
            .fs
            .try_exists(image)
            .with_context(|| format!("Cannot read {}", image.display()))?;
        if !readable {
            bail!("Screenshot {} does not exist", image.display());
        }

        let git = self.git_info().await;
        let framework = self.settings.framework;
        let decision = self.baselines.manage(framework, name, &git.branch)?;

        let baseline_existed = if decision.is_main_branch {
            self.baseline_exists(&decision.baseline_path)
        } else {
            !decision.should_use_baseline
        };

        let target = decision.target();
        if let Some(parent) = target.parent() {
            self.fs
                .create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        self.fs
            .copy(image, target)
            .with_context(|| format!("Failed to store capture at {}", target.display()))?;

        let entry = CaptureEntry {
            mode: if decision.should_use_baseline {
                CaptureMode::Baseline
            } else {
                CaptureMode::Compare
            },
            baseline_existed,
            captured_at: OffsetDateTime::now_utc(),
        };
        let store = self.manifest(&git.branch);
        let recorded = name.to_string();
        blocking(move || {
            store
                .update(&mut |current| {
                    let mut manifest = current.unwrap_or_default();
                    manifest.record(&recorded, entry.clone());
                    Ok(manifest)
                })
                .context("Failed to record capture")
        })
        .await?;

        info!("Captured '{}' to {}", name, target.display());

        Ok(CaptureOutcome {
            name: name.to_string(),
            branch: git.branch,
            decision,
            baseline_existed,
        })
    }

    /// Diff every capture of the current run on this branch and write the
    /// report.
    ///
    /// Comparing closes the run: the next capture starts a new one. Until
    /// then the same run can be compared again. With `reset`, the branch's
    /// capture manifest is removed afterwards.
    pub async fn compare(&self, reset: bool) -> Result<CompareOutcome> {
        let git = self.git_info().await;
        let framework = self.settings.framework;
        let threshold = self.settings.threshold;
        let layout = self.baselines.layout();

        let store = self.manifest(&git.branch);
        let manifest = blocking(move || {
            store
                .update(&mut |current| {
                    let mut manifest = current.unwrap_or_default();
                    manifest.close_run();
                    Ok(manifest)
                })
                .context("Failed to read capture manifest")
        })
        .await?;
        if manifest.captures.is_empty() {
            warn!(
                "No captures recorded for '{}' on branch '{}'",
                framework, git.branch
            );
        }

        let mut jobs = Vec::new();
        let mut bootstrapped = Vec::new();
        for (name, entry) in &manifest.captures {
            let baseline_path = layout.baseline_path(framework, name);
            match entry.mode {
                CaptureMode::Compare => jobs.push(DiffJob {
                    name: name.clone(),
                    baseline_path,
                    compare_path: layout.compare_path(&git.branch, framework, name),
                    diff_path: layout.diff_path(&git.branch, framework, name),
                    threshold,
                }),
                CaptureMode::Baseline => {
                    let path = display(&baseline_path);
                    bootstrapped.push(ComparisonResult::new(
                        name.clone(),
                        path.clone(),
                        path,
                        0.0,
                        threshold,
                    ));
                }
            }
        }

        debug!(
            "Comparing {} capture(s), {} written as baseline",
            jobs.len(),
            bootstrapped.len()
        );

        let mut results = self.diff.compare_batch(jobs).await;
        results.append(&mut bootstrapped);

        let existing = self
            .baselines
            .existing_baselines(framework)
            .context("Failed to list baselines")?;
        let inventory = RunInventory {
            new: manifest.new_names().map(str::to_string).collect(),
            deleted: existing
                .into_iter()
                .filter(|name| !manifest.captures.contains_key(name))
                .collect(),
        };
        for name in &inventory.deleted {
            results.push(ComparisonResult::new(
                name.clone(),
                display(&layout.baseline_path(framework, name)),
                display(&layout.compare_path(&git.branch, framework, name)),
                0.0,
                threshold,
            ));
        }

        let new: Vec<String> = inventory.new.iter().cloned().collect();
        let deleted: Vec<String> = inventory.deleted.iter().cloned().collect();
        let ledger = Arc::clone(&self.ledger);
        let approvals = blocking(move || {
            ledger
                .refresh_inventory(&new, &deleted)
                .context("Failed to update approvals")
        })
        .await?;

        let report = self.synthesizer.synthesize(
            &results,
            &inventory,
            Some(&approvals),
            &git,
            self.pr_info.as_ref(),
        );

        let report_path = self.settings.report_path.clone();
        let report_store = JsonStore::<CompareReport>::new(report_path.clone());
        let report = blocking(move || {
            report_store
                .write(&report)
                .with_context(|| format!("Failed to write {}", report_store.path().display()))?;
            Ok(report)
        })
        .await?;

        if reset {
            let store = self.manifest(&git.branch);
            blocking(move || store.clear().context("Failed to reset capture manifest")).await?;
        }

        let summary = report.summary();
        info!(
            "Compared {} test(s): {} passed, {} changed, {} new, {} deleted",
            summary.total, summary.passed, summary.changed, summary.new, summary.deleted
        );

        Ok(CompareOutcome {
            report,
            report_path,
            approvals,
        })
    }

    /// Record an accept or reject decision for `names` against the current
    /// commit. Accepted captures then replace their baselines; a failed
    /// replacement is reported but the decision stays recorded.
    pub async fn decide(
        &self,
        names: &[String],
        action: DecisionAction,
    ) -> Result<DecisionOutcome> {
        let names: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        if names.is_empty() {
            bail!("No test names given");
        }
        for name in &names {
            validate_name(name)?;
        }

        let git = self.git_info().await;
        let now = OffsetDateTime::now_utc();
        let decisions: Decisions = names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    Decision {
                        action,
                        timestamp: now,
                    },
                )
            })
            .collect();

        let ledger = Arc::clone(&self.ledger);
        let meta = self.meta(&git, now);
        let decided_on = git.clone();
        let update = blocking(move || {
            ledger
                .upsert(&decisions, &decided_on, meta)
                .context("Failed to record decisions")
        })
        .await?;

        let mut updated = Vec::new();
        let mut failed_updates = Vec::new();
        if action == DecisionAction::Accept {
            let framework = self.settings.framework;
            let layout = self.baselines.layout();
            for name in names {
                let compare_path = layout.compare_path(&git.branch, framework, name);
                let baseline_path = layout.baseline_path(framework, name);
                if self.baselines.update_baseline(&compare_path, &baseline_path) {
                    updated.push(name.to_string());
                } else {
                    failed_updates.push(name.to_string());
                }
            }
        }

        Ok(DecisionOutcome {
            action,
            update,
            updated,
            failed_updates,
        })
    }

    pub async fn history(&self) -> Result<HistoryLedger> {
        let ledger = Arc::clone(&self.ledger);
        blocking(move || ledger.history().context("Failed to read history")).await
    }

    /// Bring baselines and approvals back to what `short_sha` recorded
    pub async fn revert(&self, short_sha: &str) -> Result<RevertOutcome> {
        let ledger = Arc::clone(&self.ledger);
        let short_sha = short_sha.to_string();
        let plan = blocking(move || Ok(ledger.revert(&short_sha)?)).await?;
        let framework = self.settings.framework;
        let layout = self.baselines.layout();

        let mut restored = Vec::new();
        let mut failed_restores = Vec::new();
        for name in &plan.restores {
            let source = layout.compare_path(&plan.entry.branch, framework, name);
            let baseline_path = layout.baseline_path(framework, name);
            if self.baselines.update_baseline(&source, &baseline_path) {
                restored.push(name.clone());
            } else {
                failed_restores.push(name.clone());
            }
        }

        let git = self.git_info().await;
        let ledger = Arc::clone(&self.ledger);
        let meta = self.meta(&git, OffsetDateTime::now_utc());
        let entry = plan.entry.clone();
        let approvals = blocking(move || {
            ledger
                .restore_approvals(&entry, meta)
                .context("Failed to restore approvals")
        })
        .await?;

        info!(
            "Reverted to {}: {} baseline(s) restored",
            plan.entry.short_sha,
            restored.len()
        );

        Ok(RevertOutcome {
            plan,
            restored,
            failed_restores,
            approvals,
        })
    }

    fn manifest(&self, branch: &str) -> JsonStore<CaptureManifest> {
        let root = self
            .baselines
            .layout()
            .compare_root(branch, self.settings.framework);
        JsonStore::new(root.join(MANIFEST_FILE))
    }

    fn baseline_exists(&self, path: &Path) -> bool {
        self.fs.try_exists(path).unwrap_or_else(|e| {
            warn!("Could not check baseline {}: {}", path.display(), e);
            false
        })
    }

    fn meta(&self, git: &GitInfo, now: OffsetDateTime) -> ApprovalsMeta {
        ApprovalsMeta {
            author: self
                .settings
                .author
                .clone()
                .unwrap_or_else(|| git.author.clone()),
            timestamp: now,
            source: Some(DECISION_SOURCE.to_string()),
            pr_url: self.pr_info.as_ref().and_then(|pr| pr.url.clone()),
            commit_sha: git.has_commit().then(|| git.sha.clone()),
            commit_url: git.commit_url(self.settings.repository_url.as_deref()),
        }
    }
}

/// Run file-locked storage work on the blocking pool
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context("Storage task panicked")?
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Classify an engine error by the first library error in its chain
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<StorageError>() {
            Some(e.kind())
        } else if let Some(e) = cause.downcast_ref::<BaselineError>() {
            Some(e.kind())
        } else if let Some(e) = cause.downcast_ref::<DiffError>() {
            Some(e.kind())
        } else {
            cause.downcast_ref::<CoreError>().map(CoreError::kind)
        }
    })
}
