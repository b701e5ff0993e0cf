// Shared error type and result alias

/// Everything that can go wrong while admitting or running a job.
///
/// The first three variants (plus `Unavailable`) only ever occur on the
/// admission path and are turned into a failure envelope by the route layer.
/// The rest happen inside background jobs and end up in the logs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request body: {0}")]
    Decode(String),

    /// Carries the exact reason shown to the caller, e.g. "Not in QA mode".
    #[error("{0}")]
    ModeMismatch(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Inference engine error: {0}")]
    Engine(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
