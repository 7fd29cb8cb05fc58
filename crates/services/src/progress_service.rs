use std::sync::Arc;

use async_trait::async_trait;
use hanja_core::model::{Namespace, ProgressRecord, ProgressScope, UserId};
use storage::repository::{ProgressRepository, StorageError};

use crate::Clock;
use crate::error::ProgressStoreError;
use crate::progress_store::ProgressStore;

/// Reads and upserts progress records, stamping writes with the service clock.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if progress cannot be read.
    pub async fn list(
        &self,
        namespace: Namespace,
        user: &UserId,
        scope: ProgressScope,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        self.progress.list_progress(namespace, user, scope).await
    }

    /// Latest write wins; the returned record carries the stored timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    pub async fn save(
        &self,
        namespace: Namespace,
        record: &ProgressRecord,
    ) -> Result<ProgressRecord, StorageError> {
        let stored = self
            .progress
            .upsert_progress(namespace, record, self.clock.now())
            .await?;
        tracing::debug!(
            namespace = %namespace,
            user = %stored.user_id,
            hanja = %stored.hanja_id,
            is_known = stored.is_known,
            "progress saved"
        );
        Ok(stored)
    }
}

#[async_trait]
impl ProgressStore for ProgressService {
    async fn fetch_progress(
        &self,
        namespace: Namespace,
        user: &UserId,
        scope: ProgressScope,
    ) -> Result<Vec<ProgressRecord>, ProgressStoreError> {
        Ok(self.list(namespace, user, scope).await?)
    }

    async fn save_progress(
        &self,
        namespace: Namespace,
        record: &ProgressRecord,
    ) -> Result<ProgressRecord, ProgressStoreError> {
        Ok(self.save(namespace, record).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanja_core::model::{Chapter, Classification, HanjaId};
    use hanja_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn save_stamps_with_clock_and_is_readable_through_the_store_trait() {
        let service = ProgressService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        let record = ProgressRecord::new(
            UserId::default(),
            HanjaId::from_number(1),
            Chapter::new(1).unwrap(),
            Classification::Unknown,
        );

        let stored = service
            .save_progress(Namespace::Practice, &record)
            .await
            .unwrap();
        assert_eq!(stored.updated_at, Some(fixed_now()));

        let fetched = service
            .fetch_progress(Namespace::Practice, &UserId::default(), ProgressScope::All)
            .await
            .unwrap();
        assert_eq!(fetched, vec![stored]);
    }
}
