use thiserror::Error;

/// Failure classes every crate in the workspace maps its errors onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    IoFailure,
    ExternalToolFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::IoFailure => "i/o failure",
            ErrorKind::ExternalToolFailure => "external tool failure",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("External tool failed: {0}")]
    ExternalTool(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::InvalidInput(_) | CoreError::Serialization(_) => ErrorKind::InvalidInput,
            CoreError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            CoreError::Io(_) | CoreError::Other(_) => ErrorKind::IoFailure,
            CoreError::ExternalTool(_) => ErrorKind::ExternalToolFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(CoreError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(CoreError::from(missing).kind(), ErrorKind::NotFound);
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        assert_eq!(CoreError::from(denied).kind(), ErrorKind::IoFailure);
        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(CoreError::from(bad_json).kind(), ErrorKind::InvalidInput);
    }
}
