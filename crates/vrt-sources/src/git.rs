use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, warn};
use vrt_core::{GitInfo, UNKNOWN};

use crate::provider::GitProvider;

/// CI variables consulted, in order, when `HEAD` is detached
const CI_BRANCH_VARS: [&str; 4] = [
    "GITHUB_HEAD_REF",
    "GITHUB_REF_NAME",
    "CI_COMMIT_REF_NAME",
    "BRANCH_NAME",
];

/// Reads Git facts by running the `git` command line in a working directory
pub struct CommandGitProvider {
    workdir: PathBuf,
    env: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl CommandGitProvider {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Replace the environment lookup used for CI branch fallbacks
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(env);
        self
    }

    async fn git(&self, args: &[&str]) -> Option<String> {
        let output = match Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                debug!("Failed to run git {:?}: {}", args, e);
                return None;
            }
        };

        if !output.status.success() {
            debug!(
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!value.is_empty()).then_some(value)
    }

    fn ci_branch(&self) -> Option<String> {
        CI_BRANCH_VARS
            .iter()
            .filter_map(|key| (self.env)(key))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }
}

#[async_trait]
impl GitProvider for CommandGitProvider {
    async fn git_info(&self) -> GitInfo {
        let (branch, sha, short_sha, author, email, timestamp, message) = tokio::join!(
            self.git(&["rev-parse", "--abbrev-ref", "HEAD"]),
            self.git(&["rev-parse", "HEAD"]),
            self.git(&["rev-parse", "--short", "HEAD"]),
            self.git(&["log", "-1", "--format=%an"]),
            self.git(&["log", "-1", "--format=%ae"]),
            self.git(&["log", "-1", "--format=%cI"]),
            self.git(&["log", "-1", "--format=%s"]),
        );

        let branch = resolve_branch(branch, || self.ci_branch());
        let short_sha = short_sha.or_else(|| sha.as_deref().map(abbreviate));

        let info = GitInfo {
            branch: or_unknown("branch", branch),
            sha: or_unknown("sha", sha),
            short_sha: or_unknown("short sha", short_sha),
            author: or_unknown("author", author),
            email: or_unknown("email", email),
            timestamp: or_unknown("timestamp", timestamp),
            message: or_unknown("message", message),
        };

        debug!("Resolved git info: {} @ {}", info.branch, info.short_sha);
        info
    }
}

/// A detached `HEAD` (common in CI checkouts) defers to CI metadata
fn resolve_branch<F>(from_git: Option<String>, ci: F) -> Option<String>
where
    F: FnOnce() -> Option<String>,
{
    match from_git {
        Some(branch) if branch != "HEAD" => Some(branch),
        _ => ci(),
    }
}

fn abbreviate(sha: &str) -> String {
    sha.chars().take(7).collect()
}

fn or_unknown(field: &str, value: Option<String>) -> String {
    value.unwrap_or_else(|| {
        warn!("Could not determine git {}; using '{}'", field, UNKNOWN);
        UNKNOWN.to_string()
    })
}
