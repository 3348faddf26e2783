//! Error types for vrt-diff

use std::path::PathBuf;
use thiserror::Error;
use vrt_core::{Dimensions, ErrorKind};

pub type Result<T> = std::result::Result<T, DiffError>;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Image not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Dimension mismatch: baseline is {baseline}, capture is {capture}")]
    DimensionMismatch {
        baseline: Dimensions,
        capture: Dimensions,
    },

    #[error("Threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiffError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiffError::NotFound(_) => ErrorKind::NotFound,
            DiffError::DimensionMismatch { .. }
            | DiffError::InvalidThreshold(_)
            | DiffError::Image(image::ImageError::Decoding(_)) => ErrorKind::InvalidInput,
            DiffError::Image(_) | DiffError::Io(_) => ErrorKind::IoFailure,
        }
    }
}
