use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadiatorError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("No jobs found.")]
    NoJobsFound,

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RadiatorError {
    /// Whether the caller should drop its rendered state and ask for new credentials.
    ///
    /// An empty job listing is grouped with rejected credentials because both
    /// backends answer an expired session with an empty result.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::NoJobsFound)
    }
}

pub type Result<T> = std::result::Result<T, RadiatorError>;
