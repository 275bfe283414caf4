use thiserror::Error;

/// Errors produced by the artifact resolution and packaging engine.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Unknown project or file.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request path does not follow the `group/artifact/version/file` grammar.
    #[error("malformed repository path: {0}")]
    BadPath(String),

    /// Archive construction failed.
    #[error("packaging failed: {0}")]
    Packaging(String),

    /// A project name could not be turned into a valid directory name.
    #[error("invalid project name: {0}")]
    InvalidName(String),

    /// The upstream tag source could not be queried.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for RepositoryError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

impl From<zip::result::ZipError> for RepositoryError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Packaging(err.to_string())
    }
}

impl From<walkdir::Error> for RepositoryError {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(io) => Self::Io(io),
            None => Self::Io(std::io::Error::other("filesystem loop detected")),
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
