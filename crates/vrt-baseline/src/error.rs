use thiserror::Error;
use vrt_core::ErrorKind;

pub type Result<T> = std::result::Result<T, BaselineError>;

#[derive(Error, Debug)]
pub enum BaselineError {
    #[error("Invalid screenshot name '{0}': {1}")]
    InvalidName(String, &'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BaselineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BaselineError::InvalidName(..) => ErrorKind::InvalidInput,
            BaselineError::Io(_) => ErrorKind::IoFailure,
        }
    }
}
