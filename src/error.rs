use thiserror::Error;

/// Rejected timeline options
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be a non-negative integer, got {value}")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("{field} must be a positive number of milliseconds, got {value}")]
    NonPositiveDuration { field: &'static str, value: i64 },

    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: i64,
        max: usize,
    },

    #[error("fixation duration min ({min} ms) is greater than max ({max} ms)")]
    FixationRange { min: i64, max: i64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("main trial completed past the end of the session ({total} trials)")]
    TrialOverflow { total: usize },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no trial data to export")]
    NoData,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("data upload is disabled in the configuration")]
    Disabled,

    #[error("HTTP error! status: {status}, response: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid participant id '{0}': use only letters, numbers and hyphens")]
    InvalidId(String),

    #[error("no participant profile found")]
    Missing,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
