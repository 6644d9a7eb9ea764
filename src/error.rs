use hyper::StatusCode;
use thiserror::Error;

/// Request-level error taxonomy. Every variant is terminal for its request
/// and maps to a plain-text HTTP error response; one request's failure never
/// affects another.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to decompress request body")]
    Decompression(#[source] std::io::Error),

    #[error("Invalid request body")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Failed to read request body")]
    BodyRead,

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Synthetic failure produced by the fault-injection routes.
    #[error("Random error")]
    InjectedFailure,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Decompression(_) | ApiError::InvalidBody(_) | ApiError::BodyRead => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InjectedFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
