use crate::types::granularity::Granularity;
use std::path::PathBuf;
use thiserror::Error;

/// The archive answered, but the answer does not line up with the request.
///
/// Retrying the same request will not fix any of these, so the batch runner
/// escalates them instead of looping.
#[derive(Debug, Error)]
pub enum DataShapeError {
    #[error("Failed to decode archive response from {url}")]
    InvalidBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Archive returned {found} locations, {expected} were requested")]
    LocationCount { expected: usize, found: usize },

    #[error("Archive response has no {0} block")]
    MissingBlock(Granularity),

    #[error("Archive response is missing variable '{0}'")]
    MissingVariable(String),

    #[error("Series carries {found} variables, {expected} were requested")]
    VariableCount { expected: usize, found: usize },

    #[error("Variable '{variable}' has {found} values, the time axis has {expected} steps")]
    LengthMismatch {
        variable: String,
        expected: usize,
        found: usize,
    },

    #[error("Time axis is not evenly spaced at index {index}: expected {expected}, found {found}")]
    IrregularTime {
        index: usize,
        expected: i64,
        found: i64,
    },

    #[error("Sampling interval must be positive, got {0}")]
    InvalidInterval(i64),

    #[error("Timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid fetch request: {0}")]
    InvalidRequest(String),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Archive rejected request {url} with status {status}: {reason}")]
    Rejected {
        url: String,
        status: reqwest::StatusCode,
        reason: String,
    },

    #[error(transparent)]
    DataShape(#[from] DataShapeError),
}

impl FetchError {
    /// Whether the failure is worth retrying after a cooldown: transport
    /// errors, timeouts, rate limiting and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::NetworkRequest(..) => true,
            FetchError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn status(status: StatusCode) -> FetchError {
        FetchError::HttpStatus {
            url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            status,
        }
    }

    #[test]
    fn test_server_side_failures_are_retryable() {
        assert!(status(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(status(StatusCode::INTERNAL_SERVER_ERROR).is_retryable());
        assert!(status(StatusCode::TOO_MANY_REQUESTS).is_retryable());
    }

    #[test]
    fn test_malformed_or_rejected_requests_are_not_retried() {
        let rejected = FetchError::Rejected {
            url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            status: StatusCode::BAD_REQUEST,
            reason: "Parameter 'start_date' is out of allowed range".to_string(),
        };
        let shape = FetchError::DataShape(DataShapeError::MissingVariable("rain_sum".to_string()));

        assert!(!rejected.is_retryable());
        assert!(!shape.is_retryable());
        assert!(!FetchError::InvalidRequest("no locations".to_string()).is_retryable());
    }
}
