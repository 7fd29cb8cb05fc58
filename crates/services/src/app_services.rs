use std::sync::Arc;

use hanja_core::model::{Namespace, UserId};
use storage::repository::Storage;
use storage::seed_catalog;

use crate::Clock;
use crate::app_context::AppContext;
use crate::catalog_service::CatalogService;
use crate::error::{AppServicesError, CatalogServiceError};
use crate::progress_service::ProgressService;
use crate::progress_store::ProgressStore;
use crate::sessions::{SessionController, SessionScope};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    catalog: Arc<CatalogService>,
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock) -> Self {
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.hanja)));
        let progress = Arc::new(ProgressService::new(clock, Arc::clone(&storage.progress)));
        Self {
            storage,
            catalog,
            progress,
        }
    }

    /// Insert the bundled sample catalog; skipped when entries exist unless `force`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the catalog cannot be read or written.
    pub async fn seed_samples(&self, force: bool) -> Result<usize, AppServicesError> {
        Ok(seed_catalog(self.storage.hanja.as_ref(), force).await?)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    /// Snapshot the catalog for one user.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError` if the catalog cannot be read.
    pub async fn context(&self, user: UserId) -> Result<AppContext, CatalogServiceError> {
        AppContext::load(&self.catalog, user).await
    }

    /// A session that reads and writes progress through this backend.
    #[must_use]
    pub fn session(
        &self,
        ctx: AppContext,
        scope: SessionScope,
        namespace: Namespace,
    ) -> SessionController {
        let store: Arc<dyn ProgressStore> = self.progress();
        SessionController::new(ctx, store, scope, namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanja_core::model::Chapter;
    use hanja_core::time::fixed_clock;

    #[tokio::test]
    async fn seeded_services_start_a_chapter_session() {
        let services = AppServices::in_memory(fixed_clock());
        assert_eq!(services.seed_samples(false).await.unwrap(), 12);
        assert_eq!(services.seed_samples(false).await.unwrap(), 0);

        let ctx = services.context(UserId::default()).await.unwrap();
        let mut session = services.session(
            ctx,
            SessionScope::Chapter(Chapter::new(2).unwrap()),
            Namespace::Study,
        );
        session.start().await.unwrap();
        assert_eq!(session.progress().total, 4);
    }
}
