use crate::ranking::RankingError;
use crate::store::StoreError;
use ntex::http::StatusCode;
use ntex::web::{HttpResponse, WebResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl WebResponseError for AppError {
    fn error_response(&self, _: &ntex::web::HttpRequest) -> HttpResponse {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage error"),
        };
        HttpResponse::build(status).json(&serde_json::json!({ "error": message }))
    }
}

impl From<RankingError> for AppError {
    fn from(e: RankingError) -> Self {
        match e {
            RankingError::InvalidInput(msg) => AppError::InvalidInput(msg),
        }
    }
}
