use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vrt_core::Framework;

pub const PROJECT_FILE: &str = "vrt.toml";

// ============================================================================
// Project Config (vrt.toml)
// ============================================================================

/// Project-level configuration (vrt.toml)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    /// Capture framework whose screenshots this project stores
    #[serde(default)]
    pub framework: Framework,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub diff: DiffConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Store locations, relative to the directory holding vrt.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_baseline_dir")]
    pub baseline_dir: PathBuf,

    #[serde(default = "default_compare_dir")]
    pub compare_dir: PathBuf,

    #[serde(default = "default_diff_dir")]
    pub diff_dir: PathBuf,

    #[serde(default = "default_report")]
    pub report: PathBuf,

    #[serde(default = "default_approvals")]
    pub approvals: PathBuf,

    #[serde(default = "default_history")]
    pub history: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Per-pixel tolerance and whole-image pass bound, in [0, 1]
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Concurrent comparisons; 0 uses the available parallelism
    #[serde(default)]
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Used to build commit links, e.g. https://github.com/org/repo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            baseline_dir: default_baseline_dir(),
            compare_dir: default_compare_dir(),
            diff_dir: default_diff_dir(),
            report: default_report(),
            approvals: default_approvals(),
            history: default_history(),
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            workers: 0,
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            repository_url: None,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

fn default_baseline_dir() -> PathBuf {
    PathBuf::from(".vrt/baseline")
}

fn default_compare_dir() -> PathBuf {
    PathBuf::from(".vrt/compare")
}

fn default_diff_dir() -> PathBuf {
    PathBuf::from(".vrt/diff")
}

fn default_report() -> PathBuf {
    PathBuf::from(".vrt/compare-report.json")
}

fn default_approvals() -> PathBuf {
    PathBuf::from(".vrt/approvals.json")
}

fn default_history() -> PathBuf {
    PathBuf::from(".vrt/history.json")
}

fn default_threshold() -> f64 {
    0.1
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_max_history() -> usize {
    5
}

impl ProjectConfig {
    /// Find and load vrt.toml from current or parent directories
    pub fn find_and_load() -> anyhow::Result<Option<(PathBuf, Self)>> {
        if let Some(path) = Self::find_project_root()? {
            let config = Self::load(&path)?;
            Ok(Some((path, config)))
        } else {
            Ok(None)
        }
    }

    /// Find vrt.toml by walking up from current directory
    pub fn find_project_root() -> anyhow::Result<Option<PathBuf>> {
        let current = std::env::current_dir()?;
        Self::find_project_root_from(&current)
    }

    /// Find vrt.toml by walking up from given directory
    pub fn find_project_root_from(start: &Path) -> anyhow::Result<Option<PathBuf>> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_FILE).exists() {
                return Ok(Some(current));
            }

            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load vrt.toml from project root
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        Self::load_file(&project_root.join(PROJECT_FILE))
    }

    /// Load and validate a config file at an explicit path
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save vrt.toml to project root
    pub fn save(&self, project_root: &Path) -> anyhow::Result<()> {
        let path = project_root.join(PROJECT_FILE);
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.diff.threshold) {
            anyhow::bail!(
                "diff.threshold must be within [0, 1], got {}",
                self.diff.threshold
            );
        }
        if self.history.max_history == 0 {
            anyhow::bail!("history.max_history must be at least 1");
        }
        if self.git.default_branch.trim().is_empty() {
            anyhow::bail!("git.default_branch must not be empty");
        }
        Ok(())
    }

    /// Store paths made absolute against the project root
    pub fn resolve_paths(&self, project_root: &Path) -> PathsConfig {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                project_root.join(p)
            }
        };
        PathsConfig {
            baseline_dir: resolve(&self.paths.baseline_dir),
            compare_dir: resolve(&self.paths.compare_dir),
            diff_dir: resolve(&self.paths.diff_dir),
            report: resolve(&self.paths.report),
            approvals: resolve(&self.paths.approvals),
            history: resolve(&self.paths.history),
        }
    }
}

// ============================================================================
// User Config (<config dir>/config.toml)
// ============================================================================

/// Per-user settings shared by every project
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub user: UserIdentity,
}

/// Who is recorded as the author of approval decisions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserConfig {
    /// Load user config from the default location; absent means defaults
    pub fn load() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Get config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "vrt", "vrt")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
