use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use diesel_async::pooled_connection::PoolError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Payload(String),
    #[error("movie not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Payload(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => ApiError::NotFound,
            other => {
                log::error!("database error: {other}");
                ApiError::Database(other.to_string())
            }
        }
    }
}

impl From<deadpool::managed::PoolError<PoolError>> for ApiError {
    fn from(e: deadpool::managed::PoolError<PoolError>) -> Self {
        log::error!("connection pool error: {e}");
        ApiError::Database(e.to_string())
    }
}
