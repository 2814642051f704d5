pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("concurrency limiter closed: {0}")]
    Limiter(#[from] tokio::sync::AcquireError),

    #[error("invalid `baseUrl` `{0}` (expected an absolute http:// or https:// URL)")]
    InvalidBaseUrl(String),

    #[error("invalid path `{0}` (must start with `/`)")]
    InvalidPath(String),

    #[error("`endpoints` must be a non-empty list of paths")]
    NoEndpoints,

    #[error("`users` must be a positive integer")]
    InvalidUsers,

    #[error("`concurrency` must be between 1 and {max}", max = tokio::sync::Semaphore::MAX_PERMITS)]
    InvalidConcurrency,

    #[error("path `{0}` is configured more than once (register, login and endpoint paths must be distinct)")]
    DuplicatePath(String),

    #[error("`{0}` must be a positive duration")]
    InvalidTimeout(&'static str),

    #[error("invalid output path: `{0}`")]
    InvalidOutputPath(String),
}

impl Error {
    /// Whether the error comes from user-supplied configuration rather than the runtime.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidBaseUrl(_)
                | Self::InvalidPath(_)
                | Self::NoEndpoints
                | Self::InvalidUsers
                | Self::InvalidConcurrency
                | Self::DuplicatePath(_)
                | Self::InvalidTimeout(_)
                | Self::InvalidOutputPath(_)
        )
    }
}
