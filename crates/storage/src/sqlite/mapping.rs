use hanja_core::model::{
    Chapter, Difficulty, Example, Hanja, HanjaId, Namespace, ProgressRecord, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Table backing each progress namespace.
pub(crate) fn progress_table(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Study => "study_progress",
        Namespace::Practice => "practice_progress",
    }
}

pub(crate) fn chapter_from_i64(v: i64) -> Result<Chapter, StorageError> {
    let raw = u32::try_from(v)
        .map_err(|_| StorageError::Serialization(format!("chapter out of range: {v}")))?;
    Chapter::new(raw).map_err(ser)
}

pub(crate) fn difficulty_from_i64(v: i64) -> Result<Difficulty, StorageError> {
    let raw = u8::try_from(v)
        .map_err(|_| StorageError::Serialization(format!("difficulty out of range: {v}")))?;
    Difficulty::new(raw).map_err(ser)
}

pub(crate) fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

pub(crate) fn map_hanja_row(row: &SqliteRow) -> Result<Hanja, StorageError> {
    let stroke_order: Vec<String> =
        serde_json::from_str(&row.try_get::<String, _>("stroke_order").map_err(ser)?)
            .map_err(ser)?;
    let examples: Vec<Example> =
        serde_json::from_str(&row.try_get::<String, _>("examples").map_err(ser)?).map_err(ser)?;

    Ok(Hanja {
        id: HanjaId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?,
        character: row.try_get("character").map_err(ser)?,
        sound: row.try_get("sound").map_err(ser)?,
        meaning: row.try_get("meaning").map_err(ser)?,
        stroke_order,
        examples,
        chapter: chapter_from_i64(row.try_get("chapter").map_err(ser)?)?,
        difficulty: difficulty_from_i64(row.try_get("difficulty").map_err(ser)?)?,
    })
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    Ok(ProgressRecord {
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        hanja_id: HanjaId::new(row.try_get::<String, _>("hanja_id").map_err(ser)?)
            .map_err(ser)?,
        chapter: chapter_from_i64(row.try_get("chapter").map_err(ser)?)?,
        is_known: row.try_get::<i64, _>("is_known").map_err(ser)? != 0,
        updated_at: Some(row.try_get("updated_at").map_err(ser)?),
    })
}
