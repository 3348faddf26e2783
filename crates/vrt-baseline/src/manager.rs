//! Baseline-write vs. compare routing

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vrt_core::Framework;
use vrt_sources::Filesystem;

use crate::error::Result;
use crate::layout::{StoreLayout, validate_name};

/// Branch that is always treated as the default, whatever is configured
const ALWAYS_MAIN: &str = "master";

/// Routing decision for one capture. Computed fresh, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineDecision {
    pub should_use_baseline: bool,
    pub baseline_path: PathBuf,
    pub compare_path: PathBuf,
    pub is_main_branch: bool,
}

impl BaselineDecision {
    /// Where the capture should be written
    pub fn target(&self) -> &Path {
        if self.should_use_baseline {
            &self.baseline_path
        } else {
            &self.compare_path
        }
    }
}

pub struct BaselineManager {
    layout: StoreLayout,
    default_branch: String,
    fs: Arc<dyn Filesystem>,
}

impl BaselineManager {
    pub fn new(
        layout: StoreLayout,
        default_branch: impl Into<String>,
        fs: Arc<dyn Filesystem>,
    ) -> Self {
        Self {
            layout,
            default_branch: default_branch.into(),
            fs,
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    pub fn is_main_branch(&self, branch: &str) -> bool {
        branch == self.default_branch || branch == ALWAYS_MAIN
    }

    /// Decide whether this capture becomes the baseline.
    ///
    /// The default branch always writes the baseline. A feature branch
    /// writes it only when none exists yet; otherwise the capture is a
    /// comparison candidate. If existence cannot be determined the baseline
    /// is treated as missing.
    pub fn manage(
        &self,
        framework: Framework,
        name: &str,
        branch: &str,
    ) -> Result<BaselineDecision> {
        validate_name(name)?;

        let baseline_path = self.layout.baseline_path(framework, name);
        let compare_path = self.layout.compare_path(branch, framework, name);
        let is_main_branch = self.is_main_branch(branch);

        let should_use_baseline = if is_main_branch {
            true
        } else {
            match self.fs.try_exists(&baseline_path) {
                Ok(exists) => !exists,
                Err(e) => {
                    warn!(
                        "Could not check baseline {}: {}; treating it as missing",
                        baseline_path.display(),
                        e
                    );
                    true
                }
            }
        };

        debug!(
            "'{}' on '{}': {}",
            name,
            branch,
            if should_use_baseline { "write baseline" } else { "compare" }
        );

        Ok(BaselineDecision {
            should_use_baseline,
            baseline_path,
            compare_path,
            is_main_branch,
        })
    }

    /// Copy `compare_path` over `baseline_path`.
    ///
    /// Returns false, without panicking or erroring, when the source is
    /// missing, the target directory cannot be created, or the copy fails.
    pub fn update_baseline(&self, compare_path: &Path, baseline_path: &Path) -> bool {
        match self.fs.try_exists(compare_path) {
            Ok(true) => {}
            Ok(false) => {
                warn!("Cannot update baseline: {} does not exist", compare_path.display());
                return false;
            }
            Err(e) => {
                warn!("Cannot update baseline from {}: {}", compare_path.display(), e);
                return false;
            }
        }

        if let Some(parent) = baseline_path.parent()
            && let Err(e) = self.fs.create_dir_all(parent)
        {
            warn!("Cannot create baseline directory {}: {}", parent.display(), e);
            return false;
        }

        match self.fs.copy(compare_path, baseline_path) {
            Ok(_) => {
                info!("Updated baseline {}", baseline_path.display());
                true
            }
            Err(e) => {
                warn!(
                    "Failed to copy {} to {}: {}",
                    compare_path.display(),
                    baseline_path.display(),
                    e
                );
                false
            }
        }
    }

    /// Names with a baseline on disk for `framework`
    pub fn existing_baselines(&self, framework: Framework) -> Result<BTreeSet<String>> {
        let root = self.layout.baseline_root(framework);
        let files = self.fs.list_files(&root, "png")?;
        Ok(files
            .iter()
            .filter_map(|path| StoreLayout::name_from_path(&root, path))
            .collect())
    }
}
