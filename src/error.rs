use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    // IO-related errors
    #[error("Failed to access directory: {path}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Environment-related errors
    #[error("Usage data directory not found")]
    DataPathNotFound,

    // Pricing lookup miss; callers must not substitute a fabricated price
    #[error("Unknown model: {model}")]
    UnknownModel { model: String },

    // Series request rejected before any bucketing work
    #[error("Invalid series range: {message}")]
    InvalidRange { message: String },

    // Async processing
    #[error("Task failed")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed to initialize thread pool")]
    ThreadPoolInit(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, TallyError>;

/// Why a raw record was rejected by the parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseReason {
    #[error("record is not valid JSON")]
    InvalidJson,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("session id is empty")]
    EmptySessionId,

    #[error("token count is not a non-negative integer: {0}")]
    InvalidTokenCount(&'static str),
}

/// A rejected raw record. Carried in the `LoadReport` for diagnostics;
/// a parse failure never aborts a reload.
#[derive(Error, Debug, Clone)]
#[error("{reason}")]
pub struct ParseFailure {
    pub raw: String,
    pub reason: ParseReason,
}

impl ParseFailure {
    pub fn new(raw: impl Into<String>, reason: ParseReason) -> Self {
        Self {
            raw: raw.into(),
            reason,
        }
    }
}
