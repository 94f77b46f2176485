use thiserror::Error;

/// Failures a deck generation can end with. Each carries a message fit for
/// showing next to the entry form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("No data received from the generation service.")]
    EmptyResponse,
    #[error("Invalid data format received from the generation service: {0}")]
    MalformedResponse(String),
    #[error("Generation service failed: {0}")]
    ServiceFailure(String),
    #[error("{0}")]
    Validation(String),
}

// 传输层错误
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

impl From<ServiceError> for GenerationError {
    fn from(err: ServiceError) -> Self {
        GenerationError::ServiceFailure(err.to_string())
    }
}
