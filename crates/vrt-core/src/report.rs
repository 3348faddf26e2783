//! Report synthesizer - merges raw diff outcomes with human decisions
//!
//! Raw status and approval status are kept side by side: the approval, when
//! present, wins for display and filtering, but the raw outcome is never
//! overwritten.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;
use tracing::debug;

use crate::approvals::ApprovalsSnapshot;
use crate::comparison::{ComparisonResult, Dimensions};
use crate::git::{GitInfo, PrInfo};

/// Outcome of the pixel comparison, before any human decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Changed,
    Failed,
    New,
    Deleted,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Changed => "changed",
            TestStatus::Failed => "failed",
            TestStatus::New => "new",
            TestStatus::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub name: String,
    pub baseline: String,
    pub current: String,
    pub diff: Option<String>,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    pub diff_percentage: f64,
    pub diff_pixels: u64,
    pub dimensions: Dimensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestRecord {
    /// Status used for display and filtering
    pub fn display_status(&self) -> &'static str {
        match self.approval_status {
            Some(approval) => approval.as_str(),
            None => self.status.as_str(),
        }
    }

    /// Raw pass with no explicit decision; shown in the collapsed view
    pub fn is_unchanged(&self) -> bool {
        self.status == TestStatus::Passed && self.approval_status.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedTests {
    pub approved: Vec<String>,
    pub rejected: Vec<String>,
    pub new: Vec<String>,
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub git_info: GitInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_info: Option<PrInfo>,
    pub total_tests: usize,
    pub changed_tests: usize,
    pub passed_tests: usize,
    pub version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

/// Contents of `compare-report.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareReport {
    pub metadata: ReportMetadata,
    pub tests: Vec<TestRecord>,
    pub grouped_tests: GroupedTests,
}

/// Counts for terminal output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub changed: usize,
    pub failed: usize,
    pub new: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl CompareReport {
    pub fn test(&self, name: &str) -> Option<&TestRecord> {
        self.tests.iter().find(|t| t.name == name)
    }

    /// Raw passes without a decision, for the secondary view
    pub fn unchanged(&self) -> impl Iterator<Item = &TestRecord> {
        self.tests.iter().filter(|t| t.is_unchanged())
    }

    /// Records that need a reviewer's attention
    pub fn needs_review(&self) -> impl Iterator<Item = &TestRecord> {
        self.tests.iter().filter(|t| !t.is_unchanged())
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.tests.len(),
            ..Default::default()
        };
        for test in &self.tests {
            match test.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Changed => summary.changed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::New => summary.new += 1,
                TestStatus::Deleted => summary.deleted += 1,
            }
            match test.approval_status {
                Some(ApprovalStatus::Approved) => summary.approved += 1,
                Some(ApprovalStatus::Rejected) => summary.rejected += 1,
                None => {}
            }
            if test.is_unchanged() {
                summary.unchanged += 1;
            }
        }
        summary
    }
}

/// Which names were new or deleted in this run, relative to the baseline
/// store as it was before the run started
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunInventory {
    pub new: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
}

impl RunInventory {
    pub fn raw_status(&self, result: &ComparisonResult) -> TestStatus {
        if self.new.contains(&result.name) {
            TestStatus::New
        } else if self.deleted.contains(&result.name) {
            TestStatus::Deleted
        } else if result.is_error() {
            TestStatus::Failed
        } else if result.passed {
            TestStatus::Passed
        } else {
            TestStatus::Changed
        }
    }
}

/// Builds report snapshots
pub struct ReportSynthesizer {
    version: String,
}

impl ReportSynthesizer {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Merge raw results with the approvals snapshot.
    ///
    /// Records are ordered by name; a name appearing more than once keeps
    /// its last result.
    pub fn synthesize(
        &self,
        results: &[ComparisonResult],
        inventory: &RunInventory,
        approvals: Option<&ApprovalsSnapshot>,
        git_info: &GitInfo,
        pr_info: Option<&PrInfo>,
    ) -> CompareReport {
        let by_name: BTreeMap<&str, &ComparisonResult> =
            results.iter().map(|r| (r.name.as_str(), r)).collect();

        let tests: Vec<TestRecord> = by_name
            .values()
            .map(|result| self.record(result, inventory, approvals))
            .collect();

        let grouped_tests = match approvals {
            Some(approvals) => GroupedTests {
                approved: intersect(&tests, &approvals.approved),
                rejected: intersect(&tests, &approvals.rejected),
                new: intersect(&tests, &approvals.new),
                deleted: intersect(&tests, &approvals.deleted),
            },
            None => GroupedTests::default(),
        };

        let changed_tests = tests
            .iter()
            .filter(|t| matches!(t.status, TestStatus::Changed | TestStatus::Failed))
            .count();
        let passed_tests = tests
            .iter()
            .filter(|t| t.status == TestStatus::Passed)
            .count();

        debug!(
            "Synthesized report: {} tests, {} changed, {} passed",
            tests.len(),
            changed_tests,
            passed_tests
        );

        CompareReport {
            metadata: ReportMetadata {
                git_info: git_info.clone(),
                pr_info: pr_info.cloned(),
                total_tests: tests.len(),
                changed_tests,
                passed_tests,
                version: self.version.clone(),
                generated_at: OffsetDateTime::now_utc(),
            },
            tests,
            grouped_tests,
        }
    }

    fn record(
        &self,
        result: &ComparisonResult,
        inventory: &RunInventory,
        approvals: Option<&ApprovalsSnapshot>,
    ) -> TestRecord {
        let approval_status = approvals.and_then(|a| {
            if a.is_approved(&result.name) {
                Some(ApprovalStatus::Approved)
            } else if a.is_rejected(&result.name) {
                Some(ApprovalStatus::Rejected)
            } else {
                None
            }
        });

        let dimensions = result.dimensions.unwrap_or(Dimensions::FALLBACK);
        let diff_pixels = (result.diff_percentage * dimensions.pixel_count() as f64).round() as u64;

        TestRecord {
            name: result.name.clone(),
            baseline: result.baseline_path.clone(),
            current: result.compare_path.clone(),
            diff: result.diff_path.clone(),
            status: inventory.raw_status(result),
            approval_status,
            diff_percentage: result.diff_percentage,
            diff_pixels,
            dimensions,
            error: result.error.clone(),
        }
    }
}

impl Default for ReportSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

fn intersect(tests: &[TestRecord], names: &[String]) -> Vec<String> {
    tests
        .iter()
        .filter(|t| names.iter().any(|n| *n == t.name))
        .map(|t| t.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, diff: f64) -> ComparisonResult {
        ComparisonResult::new(
            name,
            format!("baseline/playwright/{}.png", name),
            format!("compare/feature-x/playwright/{}.png", name),
            diff,
            0.01,
        )
        .with_diff_path(format!("diff/{}.png", name))
        .with_dimensions(Dimensions {
            width: 100,
            height: 100,
        })
    }

    fn synthesize(
        results: &[ComparisonResult],
        inventory: &RunInventory,
        approvals: Option<&ApprovalsSnapshot>,
    ) -> CompareReport {
        ReportSynthesizer::with_version("test").synthesize(
            results,
            inventory,
            approvals,
            &GitInfo::unknown(),
            None,
        )
    }

    #[test]
    fn test_approval_precedence_scenario() {
        let approvals = ApprovalsSnapshot {
            approved: vec!["home".to_string()],
            rejected: vec!["login".to_string()],
            ..Default::default()
        };
        let results = vec![result("home", 0.0), result("login", 0.05)];

        let report = synthesize(&results, &RunInventory::default(), Some(&approvals));

        let home = report.test("home").unwrap();
        assert_eq!(home.status, TestStatus::Passed);
        assert_eq!(home.approval_status, Some(ApprovalStatus::Approved));
        assert_eq!(home.display_status(), "approved");

        let login = report.test("login").unwrap();
        assert_eq!(login.status, TestStatus::Changed);
        assert_eq!(login.approval_status, Some(ApprovalStatus::Rejected));
        assert_eq!(login.display_status(), "rejected");

        assert_eq!(report.grouped_tests.approved, vec!["home"]);
        assert_eq!(report.grouped_tests.rejected, vec!["login"]);
        assert_eq!(report.metadata.changed_tests, 1);
        assert_eq!(report.metadata.passed_tests, 1);
    }

    #[test]
    fn test_raw_status_overrides() {
        let mut inventory = RunInventory::default();
        inventory.new.insert("signup".to_string());
        inventory.deleted.insert("legacy".to_string());

        let broken = ComparisonResult::failed("broken", "b", "c", 0.01, "image missing");
        let results = vec![
            result("signup", 0.0),
            result("legacy", 0.0),
            result("home", 0.0),
            result("cart", 0.5),
            broken,
        ];

        let report = synthesize(&results, &inventory, None);
        assert_eq!(report.test("signup").unwrap().status, TestStatus::New);
        assert_eq!(report.test("legacy").unwrap().status, TestStatus::Deleted);
        assert_eq!(report.test("home").unwrap().status, TestStatus::Passed);
        assert_eq!(report.test("cart").unwrap().status, TestStatus::Changed);
        let broken = report.test("broken").unwrap();
        assert_eq!(broken.status, TestStatus::Failed);
        assert_eq!(broken.error.as_deref(), Some("image missing"));

        // changed ∪ failed
        assert_eq!(report.metadata.changed_tests, 2);
        assert_eq!(report.metadata.total_tests, 5);
    }

    #[test]
    fn test_diff_pixels_and_fallback_dimensions() {
        let mut no_dims = result("a", 0.5);
        no_dims.dimensions = None;
        let report = synthesize(&[result("b", 0.25), no_dims], &RunInventory::default(), None);

        assert_eq!(report.test("b").unwrap().diff_pixels, 2500);
        let a = report.test("a").unwrap();
        assert_eq!(a.dimensions, Dimensions::FALLBACK);
        assert_eq!(a.diff_pixels, 512_000);
    }

    #[test]
    fn test_grouping_ignores_raw_status_and_duplicates() {
        let approvals = ApprovalsSnapshot {
            approved: vec!["home".to_string(), "home".to_string(), "ghost".to_string()],
            new: vec!["signup".to_string()],
            ..Default::default()
        };
        let results = vec![result("home", 0.0), result("home", 0.0), result("signup", 0.0)];

        let report = synthesize(&results, &RunInventory::default(), Some(&approvals));
        assert_eq!(report.grouped_tests.approved, vec!["home"]);
        assert_eq!(report.grouped_tests.new, vec!["signup"]);
        assert_eq!(report.tests.len(), 2);
    }

    #[test]
    fn test_unchanged_partition() {
        let approvals = ApprovalsSnapshot {
            approved: vec!["home".to_string()],
            ..Default::default()
        };
        let results = vec![result("home", 0.0), result("about", 0.0), result("cart", 0.5)];
        let report = synthesize(&results, &RunInventory::default(), Some(&approvals));

        let unchanged: Vec<&str> = report.unchanged().map(|t| t.name.as_str()).collect();
        assert_eq!(unchanged, vec!["about"]);

        let summary = report.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.approved, 1);
        assert_eq!(summary.changed, 1);
    }

    #[test]
    fn test_report_wire_format() {
        let report = synthesize(&[result("home", 0.0)], &RunInventory::default(), None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["metadata"]["totalTests"], 1);
        assert_eq!(json["metadata"]["version"], "test");
        assert_eq!(json["tests"][0]["status"], "passed");
        assert!(json["tests"][0].get("approvalStatus").is_none());
        assert!(json["groupedTests"]["approved"].as_array().unwrap().is_empty());
        assert!(json["metadata"].get("prInfo").is_none());
    }
}
