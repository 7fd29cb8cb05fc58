use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use hanja_core::model::HanjaError;
use services::CatalogServiceError;
use storage::StorageError;

pub const HANJA_NOT_FOUND: &str = "한자를 찾을 수 없습니다.";

/// Handler failure rendered as `{"detail": ...}`.
#[derive(Debug)]
pub enum HttpError {
    NotFound(String),
    Unprocessable(String),
    Internal(String),
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self {
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            HttpError::NotFound(d) | HttpError::Unprocessable(d) => d,
            HttpError::Internal(d) => {
                tracing::error!(error = %d, "request failed");
                "internal server error".to_string()
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<HanjaError> for HttpError {
    fn from(err: HanjaError) -> Self {
        HttpError::Unprocessable(err.to_string())
    }
}

impl From<StorageError> for HttpError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => HttpError::NotFound(HANJA_NOT_FOUND.to_string()),
            other => HttpError::Internal(other.to_string()),
        }
    }
}

impl From<CatalogServiceError> for HttpError {
    fn from(err: CatalogServiceError) -> Self {
        match err {
            CatalogServiceError::NotFound(_) => HttpError::NotFound(HANJA_NOT_FOUND.to_string()),
            CatalogServiceError::Hanja(e) => e.into(),
            CatalogServiceError::Storage(e) => e.into(),
            other => HttpError::Internal(other.to_string()),
        }
    }
}
