//! Core domain models and logic for vrt
//!
//! This crate contains:
//! - Domain models (GitInfo, ComparisonResult, ApprovalsSnapshot, HistoryLedger)
//! - Report synthesizer (merges diff outcomes with human decisions)
//! - The shared error taxonomy

pub mod approvals;
pub mod comparison;
pub mod error;
pub mod framework;
pub mod git;
pub mod history;
pub mod report;

pub use approvals::{ApprovalsMeta, ApprovalsSnapshot, Decision, DecisionAction, Decisions};
pub use comparison::{ComparisonResult, Dimensions};
pub use error::{CoreError, ErrorKind, Result};
pub use framework::Framework;
pub use git::{GitInfo, PrInfo, UNKNOWN};
pub use history::{DecisionSummary, HistoryEntry, HistoryLedger, UpsertOutcome};
pub use report::{
    ApprovalStatus, CompareReport, GroupedTests, ReportMetadata, ReportSummary, ReportSynthesizer,
    RunInventory, TestRecord, TestStatus,
};
