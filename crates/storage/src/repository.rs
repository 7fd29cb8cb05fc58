use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hanja_core::model::{
    Chapter, Hanja, HanjaId, Namespace, ProgressRecord, ProgressScope, UserId, ValidatedHanja,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the character catalog.
#[async_trait]
pub trait HanjaRepository: Send + Sync {
    /// All entries ordered by chapter, then id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_hanja(&self) -> Result<Vec<Hanja>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn get_hanja(&self, id: &HanjaId) -> Result<Option<Hanja>, StorageError>;

    /// Entries of one chapter ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_by_chapter(&self, chapter: Chapter) -> Result<Vec<Hanja>, StorageError>;

    /// Insert a new entry under the next free numeric id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn insert_hanja(&self, hanja: ValidatedHanja) -> Result<Hanja, StorageError>;

    /// Insert or replace an entry keyed by its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn upsert_hanja(&self, hanja: &Hanja) -> Result<(), StorageError>;

    /// Replace an existing entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no entry has this id.
    async fn update_hanja(&self, hanja: &Hanja) -> Result<(), StorageError>;

    /// Remove an entry and every progress record pointing at it.
    /// Returns `false` when nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn delete_hanja(&self, id: &HanjaId) -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn count_hanja(&self) -> Result<u64, StorageError>;
}

/// Repository contract for per-user progress, one key space per namespace.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Records for `user` inside `scope`, in first-write order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if progress cannot be read.
    async fn list_progress(
        &self,
        namespace: Namespace,
        user: &UserId,
        scope: ProgressScope,
    ) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Upsert keyed by `(namespace, user, hanja_id)`. Returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_progress(
        &self,
        namespace: Namespace,
        record: &ProgressRecord,
        updated_at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError>;
}

pub(crate) fn sort_catalog(list: &mut [Hanja]) {
    list.sort_by(|a, b| {
        a.chapter
            .cmp(&b.chapter)
            .then_with(|| a.id.sort_key().cmp(&b.id.sort_key()))
    });
}

/// `StorageError::Conflict` once the numeric id space is exhausted.
pub(crate) fn next_numeric_id<'a>(
    ids: impl IntoIterator<Item = &'a HanjaId>,
) -> Result<HanjaId, StorageError> {
    let max = ids.into_iter().filter_map(HanjaId::numeric).max().unwrap_or(0);
    max.checked_add(1)
        .map(HanjaId::from_number)
        .ok_or(StorageError::Conflict)
}

type ProgressKey = (Namespace, UserId);

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    hanja: Arc<Mutex<HashMap<HanjaId, Hanja>>>,
    progress: Arc<Mutex<HashMap<ProgressKey, Vec<ProgressRecord>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl HanjaRepository for InMemoryRepository {
    async fn list_hanja(&self) -> Result<Vec<Hanja>, StorageError> {
        let guard = self.hanja.lock().map_err(poisoned)?;
        let mut list: Vec<Hanja> = guard.values().cloned().collect();
        sort_catalog(&mut list);
        Ok(list)
    }

    async fn get_hanja(&self, id: &HanjaId) -> Result<Option<Hanja>, StorageError> {
        let guard = self.hanja.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn list_by_chapter(&self, chapter: Chapter) -> Result<Vec<Hanja>, StorageError> {
        let guard = self.hanja.lock().map_err(poisoned)?;
        let mut list: Vec<Hanja> = guard
            .values()
            .filter(|h| h.chapter == chapter)
            .cloned()
            .collect();
        sort_catalog(&mut list);
        Ok(list)
    }

    async fn insert_hanja(&self, hanja: ValidatedHanja) -> Result<Hanja, StorageError> {
        let mut guard = self.hanja.lock().map_err(poisoned)?;
        let id = next_numeric_id(guard.keys())?;
        let hanja = hanja.assign_id(id.clone());
        guard.insert(id, hanja.clone());
        Ok(hanja)
    }

    async fn upsert_hanja(&self, hanja: &Hanja) -> Result<(), StorageError> {
        let mut guard = self.hanja.lock().map_err(poisoned)?;
        guard.insert(hanja.id.clone(), hanja.clone());
        Ok(())
    }

    async fn update_hanja(&self, hanja: &Hanja) -> Result<(), StorageError> {
        let mut guard = self.hanja.lock().map_err(poisoned)?;
        match guard.get_mut(&hanja.id) {
            Some(slot) => {
                *slot = hanja.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete_hanja(&self, id: &HanjaId) -> Result<bool, StorageError> {
        let removed = self.hanja.lock().map_err(poisoned)?.remove(id).is_some();
        if removed {
            let mut progress = self.progress.lock().map_err(poisoned)?;
            for records in progress.values_mut() {
                records.retain(|r| &r.hanja_id != id);
            }
        }
        Ok(removed)
    }

    async fn count_hanja(&self) -> Result<u64, StorageError> {
        let guard = self.hanja.lock().map_err(poisoned)?;
        Ok(guard.len() as u64)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn list_progress(
        &self,
        namespace: Namespace,
        user: &UserId,
        scope: ProgressScope,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard
            .get(&(namespace, user.clone()))
            .map(|records| {
                records
                    .iter()
                    .filter(|r| scope.matches(r.chapter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert_progress(
        &self,
        namespace: Namespace,
        record: &ProgressRecord,
        updated_at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        let stored = record.clone().stamped(updated_at);
        let mut guard = self.progress.lock().map_err(poisoned)?;
        let records = guard
            .entry((namespace, record.user_id.clone()))
            .or_default();
        match records.iter_mut().find(|r| r.hanja_id == record.hanja_id) {
            Some(slot) => *slot = stored.clone(),
            None => records.push(stored.clone()),
        }
        Ok(stored)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub hanja: Arc<dyn HanjaRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let hanja: Arc<dyn HanjaRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self { hanja, progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanja_core::model::{Classification, HanjaDraft};
    use hanja_core::time::fixed_now;

    fn draft(character: &str, chapter: u32) -> ValidatedHanja {
        HanjaDraft {
            character: character.into(),
            sound: "음".into(),
            meaning: "뜻".into(),
            stroke_order: Vec::new(),
            examples: Vec::new(),
            chapter,
            difficulty: 1,
        }
        .validate()
        .unwrap()
    }

    fn chapter(n: u32) -> Chapter {
        Chapter::new(n).unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_lists_by_chapter() {
        let repo = InMemoryRepository::new();
        let a = repo.insert_hanja(draft("山", 2)).await.unwrap();
        let b = repo.insert_hanja(draft("一", 1)).await.unwrap();
        assert_eq!(a.id.as_str(), "1");
        assert_eq!(b.id.as_str(), "2");

        let all = repo.list_hanja().await.unwrap();
        assert_eq!(all[0].character, "一");
        assert_eq!(all[1].character, "山");

        let ch2 = repo.list_by_chapter(chapter(2)).await.unwrap();
        assert_eq!(ch2.len(), 1);
        assert_eq!(repo.count_hanja().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_missing_entry_is_not_found() {
        let repo = InMemoryRepository::new();
        let ghost = draft("水", 1).assign_id(HanjaId::from_number(99));
        let err = repo.update_hanja(&ghost).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn insert_after_max_numeric_id_is_a_conflict() {
        let repo = InMemoryRepository::new();
        let last = draft("木", 2).assign_id(HanjaId::from_number(u64::MAX));
        repo.upsert_hanja(&last).await.unwrap();

        let err = repo.insert_hanja(draft("林", 2)).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(repo.count_hanja().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn progress_upsert_replaces_in_place() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("민지");
        let first = ProgressRecord::new(
            user.clone(),
            HanjaId::from_number(1),
            chapter(1),
            Classification::Unknown,
        );
        let second = ProgressRecord::new(
            user.clone(),
            HanjaId::from_number(2),
            chapter(2),
            Classification::Unknown,
        );
        repo.upsert_progress(Namespace::Study, &first, fixed_now())
            .await
            .unwrap();
        repo.upsert_progress(Namespace::Study, &second, fixed_now())
            .await
            .unwrap();
        let flipped = ProgressRecord {
            is_known: true,
            ..first.clone()
        };
        repo.upsert_progress(Namespace::Study, &flipped, fixed_now())
            .await
            .unwrap();

        let all = repo
            .list_progress(Namespace::Study, &user, ProgressScope::All)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].hanja_id, first.hanja_id);
        assert!(all[0].is_known);
        assert_eq!(all[0].updated_at, Some(fixed_now()));

        let ch2 = repo
            .list_progress(Namespace::Study, &user, ProgressScope::Chapter(chapter(2)))
            .await
            .unwrap();
        assert_eq!(ch2.len(), 1);
    }

    #[tokio::test]
    async fn namespaces_are_independent() {
        let repo = InMemoryRepository::new();
        let user = UserId::default();
        let record = ProgressRecord::new(
            user.clone(),
            HanjaId::from_number(1),
            chapter(1),
            Classification::Known,
        );
        repo.upsert_progress(Namespace::Study, &record, fixed_now())
            .await
            .unwrap();
        let practice = repo
            .list_progress(Namespace::Practice, &user, ProgressScope::All)
            .await
            .unwrap();
        assert!(practice.is_empty());
    }

    #[tokio::test]
    async fn delete_drops_progress_for_the_entry() {
        let repo = InMemoryRepository::new();
        let hanja = repo.insert_hanja(draft("火", 2)).await.unwrap();
        let user = UserId::default();
        let record =
            ProgressRecord::new(user.clone(), hanja.id.clone(), hanja.chapter, Classification::Unknown);
        repo.upsert_progress(Namespace::Practice, &record, fixed_now())
            .await
            .unwrap();

        assert!(repo.delete_hanja(&hanja.id).await.unwrap());
        assert!(!repo.delete_hanja(&hanja.id).await.unwrap());
        let left = repo
            .list_progress(Namespace::Practice, &user, ProgressScope::All)
            .await
            .unwrap();
        assert!(left.is_empty());
    }
}
