use async_trait::async_trait;
use hanja_core::model::{Namespace, ProgressRecord, ProgressScope, UserId};

use crate::error::ProgressStoreError;

/// The two progress calls a session depends on.
///
/// Implemented by `ProgressService` (direct repository access) and
/// `ApiClient` (the REST backend).
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Current records for `user` inside `scope`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError` if the store cannot be read.
    async fn fetch_progress(
        &self,
        namespace: Namespace,
        user: &UserId,
        scope: ProgressScope,
    ) -> Result<Vec<ProgressRecord>, ProgressStoreError>;

    /// Upsert one record; returns what the store kept.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError` if the write is rejected or lost.
    async fn save_progress(
        &self,
        namespace: Namespace,
        record: &ProgressRecord,
    ) -> Result<ProgressRecord, ProgressStoreError>;
}
