//! HTTP Error Types

use ocrdeck_core::port::BackendError;
use thiserror::Error;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<HttpError> for BackendError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Request(e) if e.is_decode() => BackendError::Decode(e.to_string()),
            HttpError::Request(e) if e.is_timeout() => {
                BackendError::Transport(format!("Request timed out: {}", e))
            }
            HttpError::Request(e) if e.is_connect() => {
                BackendError::Transport(format!("Connection failed: {}", e))
            }
            HttpError::Request(e) => BackendError::Transport(e.to_string()),
            HttpError::Api { status, message } => BackendError::Rejected { status, message },
            HttpError::Serialization(e) => BackendError::Decode(e.to_string()),
            HttpError::InvalidRequest(message) => BackendError::Rejected {
                status: 0,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_maps_to_rejection() {
        let mapped: BackendError = HttpError::Api {
            status: 500,
            message: "Tesseract not installed".into(),
        }
        .into();
        assert_eq!(
            mapped,
            BackendError::Rejected {
                status: 500,
                message: "Tesseract not installed".into()
            }
        );
        assert_eq!(mapped.reason(), "Tesseract not installed");
    }

    #[test]
    fn test_serialization_error_maps_to_decode() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let mapped: BackendError = HttpError::from(json_err).into();
        assert!(matches!(mapped, BackendError::Decode(_)));
    }
}
