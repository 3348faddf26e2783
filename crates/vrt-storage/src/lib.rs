//! Storage layer for vrt
//!
//! This crate provides:
//! - Locked, atomically written JSON repositories
//! - The decision ledger (history.json + approvals.json)
//! - The per-branch capture manifest

pub mod error;
pub mod ledger;
pub mod lock;
pub mod manifest;
pub mod store;

pub use error::{Result, StorageError};
pub use ledger::{DecisionLedger, LedgerUpdate, RevertPlan};
pub use lock::FileLock;
pub use manifest::{CaptureEntry, CaptureManifest, CaptureMode};
pub use store::{JsonStore, Repository};
