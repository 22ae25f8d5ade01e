use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("token exchange failed with status {status}: {body}")]
    TokenExchange { status: StatusCode, body: String },

    #[error("unauthorized - refresh the access token and retry")]
    Unauthorized,

    #[error("request failed with status {status}: {body}")]
    RequestFailed { status: StatusCode, body: String },

    #[error("export failed bulk validation")]
    ValidationRejected,

    #[error("existing data present for the export date range (occurrences total {total}); submission refused")]
    ExistingData { total: f64 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..end],
                body.len()
            )
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            _ => ApiError::RequestFailed {
                status,
                body: Self::truncate_body(body),
            },
        }
    }
}
