//! Git metadata provider trait

use async_trait::async_trait;
use vrt_core::GitInfo;

/// Supplies Git facts for a run.
///
/// Never fails as a whole: fields that cannot be resolved come back as
/// [`vrt_core::UNKNOWN`].
#[async_trait]
pub trait GitProvider: Send + Sync {
    async fn git_info(&self) -> GitInfo;
}

/// Provider returning a fixed set of facts
#[derive(Debug, Clone)]
pub struct StaticGitProvider {
    info: GitInfo,
}

impl StaticGitProvider {
    pub fn new(info: GitInfo) -> Self {
        Self { info }
    }
}

#[async_trait]
impl GitProvider for StaticGitProvider {
    async fn git_info(&self) -> GitInfo {
        self.info.clone()
    }
}
