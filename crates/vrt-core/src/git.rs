//! Git and pull request facts consumed by a run

use serde::{Deserialize, Serialize};

/// Placeholder used for any field the Git provider could not resolve
pub const UNKNOWN: &str = "unknown";

/// Commit facts for the current run. Fields the provider could not
/// resolve hold [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
    pub branch: String,
    pub sha: String,
    pub short_sha: String,
    pub author: String,
    pub email: String,
    pub timestamp: String,
    pub message: String,
}

impl GitInfo {
    pub fn unknown() -> Self {
        Self {
            branch: UNKNOWN.to_string(),
            sha: UNKNOWN.to_string(),
            short_sha: UNKNOWN.to_string(),
            author: UNKNOWN.to_string(),
            email: UNKNOWN.to_string(),
            timestamp: UNKNOWN.to_string(),
            message: UNKNOWN.to_string(),
        }
    }

    /// Override the branch, e.g. from `--branch` or CI metadata
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn has_commit(&self) -> bool {
        self.sha != UNKNOWN
    }

    /// Link to the commit on the hosting service, if one is configured
    pub fn commit_url(&self, repository_url: Option<&str>) -> Option<String> {
        let base = repository_url?.trim_end_matches('/');
        if base.is_empty() || !self.has_commit() {
            return None;
        }
        Some(format!("{}/commit/{}", base, self.sha))
    }
}

impl Default for GitInfo {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Pull request context, present only when running for a PR
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
}
