use std::path::{Path, PathBuf};
use vrt_config::{ProjectConfig, UserConfig};
use vrt_core::Framework;

/// Everything the engine needs from configuration, already resolved
/// against the project root and any command-line overrides
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub framework: Framework,
    pub baseline_dir: PathBuf,
    pub compare_dir: PathBuf,
    pub diff_dir: PathBuf,
    pub report_path: PathBuf,
    pub approvals_path: PathBuf,
    pub history_path: PathBuf,
    pub threshold: f64,
    pub workers: usize,
    pub default_branch: String,
    pub repository_url: Option<String>,
    pub max_history: usize,
    /// Overrides the Git author on approval decisions
    pub author: Option<String>,
    /// Overrides the branch reported by Git
    pub branch: Option<String>,
}

impl EngineSettings {
    pub fn from_config(config: &ProjectConfig, project_root: &Path) -> Self {
        let paths = config.resolve_paths(project_root);
        Self {
            framework: config.framework,
            baseline_dir: paths.baseline_dir,
            compare_dir: paths.compare_dir,
            diff_dir: paths.diff_dir,
            report_path: paths.report,
            approvals_path: paths.approvals,
            history_path: paths.history,
            threshold: config.diff.threshold,
            workers: config.diff.workers,
            default_branch: config.git.default_branch.clone(),
            repository_url: config.git.repository_url.clone(),
            max_history: config.history.max_history,
            author: None,
            branch: None,
        }
    }

    /// Take the decision author from the user config, if it names one
    pub fn with_user(mut self, user: &UserConfig) -> Self {
        if let Some(name) = user.user.name.as_deref().map(str::trim)
            && !name.is_empty()
        {
            self.author = Some(name.to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrt_config::UserIdentity;

    #[test]
    fn test_from_default_config() {
        let settings = EngineSettings::from_config(&ProjectConfig::default(), Path::new("/work"));
        assert_eq!(settings.baseline_dir, PathBuf::from("/work/.vrt/baseline"));
        assert_eq!(settings.report_path, PathBuf::from("/work/.vrt/compare-report.json"));
        assert_eq!(settings.default_branch, "main");
        assert_eq!(settings.author, None);
    }

    #[test]
    fn test_blank_user_name_is_ignored() {
        let user = UserConfig {
            user: UserIdentity {
                name: Some("  ".to_string()),
                email: None,
            },
        };
        let settings = EngineSettings::from_config(&ProjectConfig::default(), Path::new("/work"))
            .with_user(&user);
        assert_eq!(settings.author, None);
    }
}
