//! Shared error types for the services crate.

use thiserror::Error;

use hanja_core::model::{HanjaError, HanjaId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ApiClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("invalid API base url: {0}")]
    InvalidBaseUrl(String),
    #[error("API request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors surfaced by a `ProgressStore` read or write.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressStoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogServiceError {
    #[error("hanja {0} not found")]
    NotFound(HanjaId),
    #[error(transparent)]
    Hanja(#[from] HanjaError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by session lifecycle calls.
///
/// Store failures are not here: the controller degrades on those instead of failing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,
    #[error("session was closed")]
    Closed,
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
