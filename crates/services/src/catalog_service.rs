use std::collections::BTreeMap;
use std::sync::Arc;

use hanja_core::model::{Chapter, Hanja, HanjaDraft, HanjaId, HanjaPatch};
use storage::repository::{HanjaRepository, StorageError};

use crate::error::CatalogServiceError;

/// Number of entries in one lesson.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChapterSummary {
    pub chapter: Chapter,
    pub count: usize,
}

/// Validated CRUD over the character catalog.
#[derive(Clone)]
pub struct CatalogService {
    hanja: Arc<dyn HanjaRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(hanja: Arc<dyn HanjaRepository>) -> Self {
        Self { hanja }
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if the catalog cannot be read.
    pub async fn list_all(&self) -> Result<Vec<Hanja>, CatalogServiceError> {
        Ok(self.hanja.list_hanja().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::NotFound` if no entry has this id.
    pub async fn get(&self, id: &HanjaId) -> Result<Hanja, CatalogServiceError> {
        self.hanja
            .get_hanja(id)
            .await?
            .ok_or_else(|| CatalogServiceError::NotFound(id.clone()))
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if the catalog cannot be read.
    pub async fn list_chapter(&self, chapter: Chapter) -> Result<Vec<Hanja>, CatalogServiceError> {
        Ok(self.hanja.list_by_chapter(chapter).await?)
    }

    /// Lessons present in the catalog, ascending.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if the catalog cannot be read.
    pub async fn chapters(&self) -> Result<Vec<ChapterSummary>, CatalogServiceError> {
        let mut counts: BTreeMap<Chapter, usize> = BTreeMap::new();
        for hanja in self.hanja.list_hanja().await? {
            *counts.entry(hanja.chapter).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(chapter, count)| ChapterSummary { chapter, count })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::Hanja` for validation failures.
    /// Returns `CatalogServiceError::Storage` if persistence fails.
    pub async fn create(&self, draft: HanjaDraft) -> Result<Hanja, CatalogServiceError> {
        let validated = draft.validate()?;
        let created = self.hanja.insert_hanja(validated).await?;
        tracing::info!(id = %created.id, character = %created.character, "hanja created");
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::NotFound` if no entry has this id,
    /// `CatalogServiceError::Hanja` if the patch is invalid.
    pub async fn update(
        &self,
        id: &HanjaId,
        patch: HanjaPatch,
    ) -> Result<Hanja, CatalogServiceError> {
        let current = self.get(id).await?;
        if patch.is_empty() {
            return Ok(current);
        }
        let updated = patch.apply(&current)?;
        match self.hanja.update_hanja(&updated).await {
            Ok(()) => {}
            Err(StorageError::NotFound) => return Err(CatalogServiceError::NotFound(id.clone())),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(id = %updated.id, "hanja updated");
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::NotFound` if no entry has this id.
    pub async fn delete(&self, id: &HanjaId) -> Result<(), CatalogServiceError> {
        if self.hanja.delete_hanja(id).await? {
            tracing::info!(id = %id, "hanja deleted");
            Ok(())
        } else {
            Err(CatalogServiceError::NotFound(id.clone()))
        }
    }
}
