use hanja_core::model::{Chapter, Hanja, HanjaId, Namespace, ValidatedHanja};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{encode_json, map_hanja_row, progress_table, ser};
use crate::repository::{HanjaRepository, StorageError, next_numeric_id, sort_catalog};

const SELECT_HANJA: &str = r"
    SELECT id, character, sound, meaning, stroke_order, examples, chapter, difficulty
    FROM hanja
";

fn connection(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

async fn write_hanja<'e, E>(executor: E, hanja: &Hanja) -> Result<(), StorageError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r"
        INSERT INTO hanja (id, character, sound, meaning, stroke_order, examples, chapter, difficulty)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO UPDATE SET
            character = excluded.character,
            sound = excluded.sound,
            meaning = excluded.meaning,
            stroke_order = excluded.stroke_order,
            examples = excluded.examples,
            chapter = excluded.chapter,
            difficulty = excluded.difficulty
        ",
    )
    .bind(hanja.id.as_str())
    .bind(hanja.character.as_str())
    .bind(hanja.sound.as_str())
    .bind(hanja.meaning.as_str())
    .bind(encode_json(&hanja.stroke_order)?)
    .bind(encode_json(&hanja.examples)?)
    .bind(i64::from(hanja.chapter.value()))
    .bind(i64::from(hanja.difficulty.value()))
    .execute(executor)
    .await
    .map_err(connection)?;
    Ok(())
}

#[async_trait::async_trait]
impl HanjaRepository for SqliteRepository {
    async fn list_hanja(&self) -> Result<Vec<Hanja>, StorageError> {
        let rows = sqlx::query(SELECT_HANJA)
            .fetch_all(&self.pool)
            .await
            .map_err(connection)?;

        let mut list = Vec::with_capacity(rows.len());
        for row in rows {
            list.push(map_hanja_row(&row)?);
        }
        sort_catalog(&mut list);
        Ok(list)
    }

    async fn get_hanja(&self, id: &HanjaId) -> Result<Option<Hanja>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_HANJA} WHERE id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(connection)?;

        row.as_ref().map(map_hanja_row).transpose()
    }

    async fn list_by_chapter(&self, chapter: Chapter) -> Result<Vec<Hanja>, StorageError> {
        let rows = sqlx::query(&format!("{SELECT_HANJA} WHERE chapter = ?1"))
            .bind(i64::from(chapter.value()))
            .fetch_all(&self.pool)
            .await
            .map_err(connection)?;

        let mut list = Vec::with_capacity(rows.len());
        for row in rows {
            list.push(map_hanja_row(&row)?);
        }
        sort_catalog(&mut list);
        Ok(list)
    }

    async fn insert_hanja(&self, hanja: ValidatedHanja) -> Result<Hanja, StorageError> {
        let mut tx = self.pool.begin().await.map_err(connection)?;

        let rows = sqlx::query("SELECT id FROM hanja")
            .fetch_all(&mut *tx)
            .await
            .map_err(connection)?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(HanjaId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?);
        }

        let hanja = hanja.assign_id(next_numeric_id(&ids)?);
        write_hanja(&mut *tx, &hanja).await?;
        tx.commit().await.map_err(connection)?;
        Ok(hanja)
    }

    async fn upsert_hanja(&self, hanja: &Hanja) -> Result<(), StorageError> {
        write_hanja(&self.pool, hanja).await
    }

    async fn update_hanja(&self, hanja: &Hanja) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE hanja SET
                character = ?2,
                sound = ?3,
                meaning = ?4,
                stroke_order = ?5,
                examples = ?6,
                chapter = ?7,
                difficulty = ?8
            WHERE id = ?1
            ",
        )
        .bind(hanja.id.as_str())
        .bind(hanja.character.as_str())
        .bind(hanja.sound.as_str())
        .bind(hanja.meaning.as_str())
        .bind(encode_json(&hanja.stroke_order)?)
        .bind(encode_json(&hanja.examples)?)
        .bind(i64::from(hanja.chapter.value()))
        .bind(i64::from(hanja.difficulty.value()))
        .execute(&self.pool)
        .await
        .map_err(connection)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_hanja(&self, id: &HanjaId) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await.map_err(connection)?;

        let res = sqlx::query("DELETE FROM hanja WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(connection)?;

        if res.rows_affected() == 0 {
            return Ok(false);
        }

        for namespace in Namespace::ALL {
            let table = progress_table(namespace);
            sqlx::query(&format!("DELETE FROM {table} WHERE hanja_id = ?1"))
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(connection)?;
        }

        tx.commit().await.map_err(connection)?;
        Ok(true)
    }

    async fn count_hanja(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hanja")
            .fetch_one(&self.pool)
            .await
            .map_err(connection)?;
        u64::try_from(count).map_err(ser)
    }
}
