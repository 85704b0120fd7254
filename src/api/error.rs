use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the API. Every variant is shown inline by the screen
/// that issued the call; none of them ends the program.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned {status}: {body}")]
    Status {
        path: String,
        status: StatusCode,
        body: String,
    },

    #[error("unexpected response from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// One-line message for the status bar.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED => {
                "Invalid credentials".to_string()
            }
            ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND => {
                "Not found".to_string()
            }
            ApiError::Transport { source, .. } if source.is_timeout() => {
                "The server did not answer in time".to_string()
            }
            ApiError::Transport { .. } => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}
