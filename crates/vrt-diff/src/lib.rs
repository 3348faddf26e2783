//! Pixel-level comparison engine
//!
//! Turns a baseline and a capture into a pass/fail verdict plus a diff
//! visualization. Batches run on a bounded pool of blocking workers.

pub mod engine;
pub mod error;
pub mod pixel;

pub use engine::{DiffEngine, DiffJob};
pub use error::{DiffError, Result};
