//! Error types for the chat relay
//!
//! Every failure of `POST /api/chat` is one of these variants and leaves the
//! handler as a JSON `{"error": "..."}` envelope.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::io_struct::ErrorBody;

pub const INVALID_INPUT_MESSAGE: &str = "Invalid input format";
pub const MISSING_API_KEY_MESSAGE: &str = "API key is missing";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid input format")]
    InvalidInput,

    #[error("API key is missing")]
    ConfigurationError,

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("{message}")]
    UpstreamError { status: u16, message: String },

    /// The cause is kept for logging only and never reaches the client.
    #[error("Internal Server Error")]
    InternalError { cause: String },
}

pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        RelayError::InternalError {
            cause: cause.to_string(),
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        RelayError::InternalError {
            cause: format!("request to {url} failed: {err}"),
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::internal(err)
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidInput => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::ConfigurationError | RelayError::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::UpstreamError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            RelayError::InternalError { cause } => log::error!("Internal Server Error: {cause}"),
            RelayError::ConfigurationError => log::error!("{MISSING_API_KEY_MESSAGE}"),
            _ => {}
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
