use std::io;
use thiserror::Error;

/// Custom error type for the VantaSys metrics core
#[derive(Error, Debug)]
pub enum VantaError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Not supported on this platform: {0}")]
    PlatformUnsupported(String),

    #[error("Metric collection failed: {0}")]
    MetricCollection(String),
}

/// Result type alias for the metrics core
pub type Result<T> = std::result::Result<T, VantaError>;

impl VantaError {
    /// Create an invalid input error (the only error the façade surfaces to callers)
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        VantaError::InvalidInput(msg.into())
    }

    /// Create a probe failure error
    pub fn probe<S: Into<String>>(msg: S) -> Self {
        VantaError::Probe(msg.into())
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        VantaError::PlatformUnsupported(msg.into())
    }

    pub fn metric_collection<S: Into<String>>(msg: S) -> Self {
        VantaError::MetricCollection(msg.into())
    }

    /// True for errors caused by the caller rather than the host
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, VantaError::InvalidInput(_))
    }
}
