use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies versioned schema changes once each, tracked in `schema_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: catalog plus the two progress namespaces.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS hanja (
                    id TEXT PRIMARY KEY,
                    character TEXT NOT NULL,
                    sound TEXT NOT NULL,
                    meaning TEXT NOT NULL,
                    stroke_order TEXT NOT NULL DEFAULT '[]',
                    examples TEXT NOT NULL DEFAULT '[]',
                    chapter INTEGER NOT NULL CHECK (chapter > 0),
                    difficulty INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 5)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        for table in ["study_progress", "practice_progress"] {
            sqlx::query(&format!(
                r"
                    CREATE TABLE IF NOT EXISTS {table} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        user_id TEXT NOT NULL,
                        hanja_id TEXT NOT NULL,
                        chapter INTEGER NOT NULL CHECK (chapter > 0),
                        is_known INTEGER NOT NULL CHECK (is_known IN (0, 1)),
                        updated_at TEXT NOT NULL,
                        UNIQUE (user_id, hanja_id)
                    );
                "
            ))
            .execute(&mut *tx)
            .await?;

            sqlx::query(&format!(
                r"
                    CREATE INDEX IF NOT EXISTS idx_{table}_user_chapter
                        ON {table} (user_id, chapter);
                "
            ))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_hanja_chapter ON hanja (chapter);")
            .execute(&mut *tx)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_hanja_difficulty ON hanja (difficulty);")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
