//! Output of a single baseline-vs-capture comparison

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Assumed viewport when a record has no decoded image to measure
    pub const FALLBACK: Dimensions = Dimensions {
        width: 1280,
        height: 800,
    };

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One per named screenshot per run.
///
/// `passed == (diff_percentage <= threshold)` holds for every result that
/// carries no `error`; errored results are never passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub name: String,
    pub baseline_path: String,
    pub compare_path: String,
    pub diff_path: Option<String>,
    pub passed: bool,
    pub diff_percentage: f64,
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparisonResult {
    pub fn new(
        name: impl Into<String>,
        baseline_path: impl Into<String>,
        compare_path: impl Into<String>,
        diff_percentage: f64,
        threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            baseline_path: baseline_path.into(),
            compare_path: compare_path.into(),
            diff_path: None,
            passed: diff_percentage <= threshold,
            diff_percentage,
            threshold,
            dimensions: None,
            error: None,
        }
    }

    /// A comparison that could not be carried out
    pub fn failed(
        name: impl Into<String>,
        baseline_path: impl Into<String>,
        compare_path: impl Into<String>,
        threshold: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            passed: false,
            error: Some(error.into()),
            ..Self::new(name, baseline_path, compare_path, 0.0, threshold)
        }
    }

    pub fn with_diff_path(mut self, diff_path: impl Into<String>) -> Self {
        self.diff_path = Some(diff_path.into());
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
