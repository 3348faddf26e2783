//! Branch-aware baseline routing
//!
//! Decides, per capture, whether the image becomes the baseline or is
//! compared against it, and where both files live:
//!
//! ```text
//! <baseline_dir>/<framework>/<name>.png                 (branch independent)
//! <compare_dir>/<sanitized branch>/<framework>/<name>.png
//! <diff_dir>/<sanitized branch>/<framework>/<name>.png
//! ```

pub mod error;
pub mod layout;
pub mod manager;
pub mod sanitize;

pub use error::{BaselineError, Result};
pub use layout::StoreLayout;
pub use manager::{BaselineDecision, BaselineManager};
pub use sanitize::sanitize_branch;
