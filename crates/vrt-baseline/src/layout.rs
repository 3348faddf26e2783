//! Where baselines, captures and diffs live on disk

use std::path::{Component, Path, PathBuf};
use vrt_core::Framework;

use crate::error::{BaselineError, Result};
use crate::sanitize::sanitize_branch;

const EXTENSION: &str = "png";

#[derive(Debug, Clone)]
pub struct StoreLayout {
    pub baseline_dir: PathBuf,
    pub compare_dir: PathBuf,
    pub diff_dir: PathBuf,
}

impl StoreLayout {
    pub fn new(
        baseline_dir: impl Into<PathBuf>,
        compare_dir: impl Into<PathBuf>,
        diff_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            baseline_dir: baseline_dir.into(),
            compare_dir: compare_dir.into(),
            diff_dir: diff_dir.into(),
        }
    }

    pub fn baseline_root(&self, framework: Framework) -> PathBuf {
        self.baseline_dir.join(framework.as_str())
    }

    pub fn compare_root(&self, branch: &str, framework: Framework) -> PathBuf {
        self.compare_dir
            .join(sanitize_branch(branch))
            .join(framework.as_str())
    }

    pub fn diff_root(&self, branch: &str, framework: Framework) -> PathBuf {
        self.diff_dir
            .join(sanitize_branch(branch))
            .join(framework.as_str())
    }

    pub fn baseline_path(&self, framework: Framework, name: &str) -> PathBuf {
        self.baseline_root(framework).join(file_name(name))
    }

    pub fn compare_path(&self, branch: &str, framework: Framework, name: &str) -> PathBuf {
        self.compare_root(branch, framework).join(file_name(name))
    }

    pub fn diff_path(&self, branch: &str, framework: Framework, name: &str) -> PathBuf {
        self.diff_root(branch, framework).join(file_name(name))
    }

    /// Recover a screenshot name from a file under a framework root
    pub fn name_from_path(root: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(root).ok()?;
        if relative.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            return None;
        }
        let stem = relative.with_extension("");
        let parts: Vec<&str> = stem
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

/// Screenshot names may nest with `/` but must stay inside the store
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BaselineError::InvalidName(name.to_string(), "name is empty"));
    }
    let path = Path::new(name);
    if path.is_absolute() || name.starts_with('/') {
        return Err(BaselineError::InvalidName(
            name.to_string(),
            "name must be relative",
        ));
    }
    let escapes = name
        .split(['/', '\\'])
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        || path.components().any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(BaselineError::InvalidName(
            name.to_string(),
            "name may not contain empty, '.' or '..' segments",
        ));
    }
    Ok(())
}

fn file_name(name: &str) -> String {
    format!("{}.{}", name, EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StoreLayout {
        StoreLayout::new("vrt/baseline", "vrt/compare", "vrt/diff")
    }

    #[test]
    fn test_paths() {
        let layout = layout();
        assert_eq!(
            layout.baseline_path(Framework::Playwright, "home"),
            PathBuf::from("vrt/baseline/playwright/home.png")
        );
        assert_eq!(
            layout.compare_path("feature/x", Framework::Cypress, "home"),
            PathBuf::from("vrt/compare/feature-x/cypress/home.png")
        );
        assert_eq!(
            layout.diff_path("feature/x", Framework::Cypress, "home"),
            PathBuf::from("vrt/diff/feature-x/cypress/home.png")
        );
    }

    #[test]
    fn test_name_round_trip_through_nested_path() {
        let layout = layout();
        let root = layout.baseline_root(Framework::Playwright);
        let path = layout.baseline_path(Framework::Playwright, "checkout/step-1");
        assert_eq!(
            StoreLayout::name_from_path(&root, &path),
            Some("checkout/step-1".to_string())
        );
        assert_eq!(
            StoreLayout::name_from_path(&root, &root.join("notes.txt")),
            None
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("home").is_ok());
        assert!(validate_name("checkout/step-1").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("/etc/passwd").is_err());
        assert!(validate_name("../escape").is_err());
        assert!(validate_name("a/./b").is_err());
    }
}
