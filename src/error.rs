use serde::Deserialize;
use thiserror::Error;

/// Message shown inline when the backend does not provide one.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Every failure surfaced by the SmartHub client.
///
/// Errors are always local to the page or workflow that triggered them. None of the variants is
/// fatal to the library: the caller can retry or move on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, refused connection, timeout).
    #[error("connection error: {0}")]
    Connection(String),
    /// The backend answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("not authenticated")]
    Unauthorized,
    /// Wrong role, either reported by the backend (403) or caught by a client-side gate.
    #[error("access denied: {0}")]
    Forbidden(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    /// Client-side form validation failed; no request was sent.
    #[error("{0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    /// Builds an error from a non-success HTTP status and the raw response body.
    ///
    /// The backend usually answers with `{"message": "..."}`. Some endpoints use `error`
    /// instead. Anything else falls back to [`GENERIC_ERROR_MESSAGE`].
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());

        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(message),
            _ => ApiError::Http { status, message },
        }
    }

    /// The text a page shows in its inline, dismissible error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Connection(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            ApiError::Forbidden(message) => message.clone(),
            ApiError::Decode(_) | ApiError::Config(_) => GENERIC_ERROR_MESSAGE.to_string(),
            ApiError::Validation(message) => message.clone(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => format!("{} is invalid", field),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        messages.sort();
        ApiError::Validation(messages.join("; "))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
