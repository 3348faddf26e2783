//! External collaborators consumed by the vrt core
//!
//! Everything here is injected into the components that need it rather than
//! looked up globally, so tests can swap in fixed facts.

pub mod fs;
pub mod git;
pub mod pr;
pub mod provider;

pub use fs::{Filesystem, OsFilesystem};
pub use git::CommandGitProvider;
pub use pr::{detect_pr_info, detect_pr_info_from_env};
pub use provider::{GitProvider, StaticGitProvider};
