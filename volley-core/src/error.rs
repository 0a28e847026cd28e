pub type Result<T> = std::result::Result<T, Error>;

/// Configuration problems, all detected before any virtual user is spawned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`vus` must be a positive integer")]
    InvalidVus,

    #[error("`duration` must be a positive duration")]
    InvalidDuration,

    #[error("`progress_interval` must be a positive duration")]
    InvalidProgressInterval,

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid check: {0}")]
    InvalidCheck(String),
}

/// Returned by custom check predicates. The check is recorded as failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CheckError(pub String);

impl CheckError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
