#![forbid(unsafe_code)]

pub mod api_client;
pub mod app_context;
pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod progress_service;
pub mod progress_store;
pub mod sessions;

pub use hanja_core::Clock;

pub use api_client::{ApiClient, HanjaListResponse, ProgressListResponse};
pub use app_context::AppContext;
pub use app_services::AppServices;
pub use catalog_service::{CatalogService, ChapterSummary};
pub use error::{
    ApiError, AppServicesError, CatalogServiceError, ProgressStoreError, SessionError,
};
pub use progress_service::ProgressService;
pub use progress_store::ProgressStore;
pub use sessions::{
    ClassifyOutcome, EmptyReason, SessionController, SessionOptions, SessionPhase,
    SessionProgress, SessionScope, SessionView, SharedSession, TeardownHandle,
};
