// errors.rs
use thiserror::Error;

/// Failures raised by the analysis engine itself.
///
/// Only the statistics aggregator can fail; filtering, timelines and
/// seller-update matching are total over well-typed input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no properties found")]
    NoPropertiesFound,
}

/// Errors originating from either the server logic
/// (routing, missing resources, etc.) or downstream layers (DB).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Database Error: {0}")]
    DbError(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Internal Server Error")]
    InternalError,
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("invalid JSON: {e}"))
    }
}

impl ServerError {
    /// HTTP status code used when this error reaches a client.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Analysis(AnalysisError::NoPropertiesFound) => 404,
            ServerError::DbError(_) | ServerError::InternalError => 500,
        }
    }
}
