use chrono::{DateTime, Utc};
use hanja_core::model::{Namespace, ProgressRecord, ProgressScope, UserId};

use super::SqliteRepository;
use super::mapping::{map_progress_row, progress_table};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn list_progress(
        &self,
        namespace: Namespace,
        user: &UserId,
        scope: ProgressScope,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let table = progress_table(namespace);
        let rows = match scope {
            ProgressScope::All => {
                sqlx::query(&format!(
                    r"
                    SELECT user_id, hanja_id, chapter, is_known, updated_at
                    FROM {table}
                    WHERE user_id = ?1
                    ORDER BY id ASC
                    "
                ))
                .bind(user.as_str())
                .fetch_all(&self.pool)
                .await
            }
            ProgressScope::Chapter(chapter) => {
                sqlx::query(&format!(
                    r"
                    SELECT user_id, hanja_id, chapter, is_known, updated_at
                    FROM {table}
                    WHERE user_id = ?1 AND chapter = ?2
                    ORDER BY id ASC
                    "
                ))
                .bind(user.as_str())
                .bind(i64::from(chapter.value()))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_progress_row(&row)?);
        }
        Ok(records)
    }

    async fn upsert_progress(
        &self,
        namespace: Namespace,
        record: &ProgressRecord,
        updated_at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        let table = progress_table(namespace);
        sqlx::query(&format!(
            r"
            INSERT INTO {table} (user_id, hanja_id, chapter, is_known, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, hanja_id) DO UPDATE SET
                -- keep the row id so listing order stays first-write order
                chapter = excluded.chapter,
                is_known = excluded.is_known,
                updated_at = excluded.updated_at
            "
        ))
        .bind(record.user_id.as_str())
        .bind(record.hanja_id.as_str())
        .bind(i64::from(record.chapter.value()))
        .bind(i64::from(record.is_known))
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(record.clone().stamped(updated_at))
    }
}
