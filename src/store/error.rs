//! Error types for the record store client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {status_code} - {message}")]
    Http {
        status_code: u16,
        error_code: String,
        message: String,
    },

    #[error("Rate limited (retry after {retry_after}s)")]
    RateLimited { retry_after: u64 },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Request failed after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl StoreError {
    /// Parse error from a PostgREST response body.
    pub fn from_response(status_code: u16, body: &str) -> Self {
        // PostgREST errors are {"code": ..., "message": ..., "details": ..., "hint": ...}.
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            let code = json
                .get("code")
                .and_then(|v| v.as_str())
                .unwrap_or("UNKNOWN")
                .to_string();
            let message = json
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or(body)
                .to_string();

            if status_code == 401 || status_code == 403 {
                return Self::Authentication(message);
            }

            return Self::Http {
                status_code,
                error_code: code,
                message,
            };
        }

        Self::Http {
            status_code,
            error_code: "UNKNOWN".to_string(),
            message: body.to_string(),
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Network(_)
                | Self::Timeout(_)
                | Self::Http {
                    status_code: 500..=599,
                    ..
                }
        )
    }
}
