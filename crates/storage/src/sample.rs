//! Starter catalog: the first three lessons of the grade-5 character list.

use hanja_core::model::{Example, HanjaDraft};

use crate::repository::{HanjaRepository, StorageError};

const SAMPLES: &[(&str, &str, &str, u32, u8, [(&str, &str); 2])] = &[
    ("一", "일", "하나", 1, 1, [("一石二鳥", "한 가지 일로 두 가지 이득을 얻음"), ("一見", "한 번 봄")]),
    ("二", "이", "둘", 1, 1, [("二重", "이중"), ("二月", "이월")]),
    ("三", "삼", "셋", 1, 1, [("三角", "삼각"), ("三月", "삼월")]),
    ("人", "인", "사람", 1, 2, [("人間", "인간"), ("人口", "인구")]),
    ("大", "대", "큰", 1, 2, [("大學", "대학"), ("大小", "크고 작음")]),
    ("小", "소", "작은", 1, 2, [("小學", "소학"), ("大小", "크고 작음")]),
    ("山", "산", "뫼", 2, 2, [("山頂", "산꼭대기"), ("火山", "화산")]),
    ("水", "수", "물", 2, 2, [("水準", "수준"), ("海水", "바닷물")]),
    ("火", "화", "불", 2, 2, [("火災", "화재"), ("火山", "화산")]),
    ("木", "목", "나무", 2, 2, [("木造", "목조"), ("樹木", "수목")]),
    ("歌", "가", "노래", 3, 2, [("歌手", "가수"), ("詩歌", "시가")]),
    ("家", "가", "집", 3, 2, [("家長", "가장"), ("國家", "국가")]),
];

/// Drafts for the starter catalog, in id order.
#[must_use]
pub fn sample_catalog() -> Vec<HanjaDraft> {
    SAMPLES
        .iter()
        .map(|(character, sound, meaning, chapter, difficulty, examples)| HanjaDraft {
            character: (*character).to_string(),
            sound: (*sound).to_string(),
            meaning: (*meaning).to_string(),
            stroke_order: Vec::new(),
            examples: examples
                .iter()
                .map(|(sentence, meaning)| Example::new(*sentence, *meaning))
                .collect(),
            chapter: *chapter,
            difficulty: *difficulty,
        })
        .collect()
}

/// Insert the starter catalog when the repository is empty (or always, with `force`).
/// Returns how many entries were inserted.
///
/// # Errors
///
/// Returns `StorageError` if reading or writing the catalog fails, or
/// `StorageError::Serialization` if a sample fails validation.
pub async fn seed_catalog(repo: &dyn HanjaRepository, force: bool) -> Result<usize, StorageError> {
    if !force && repo.count_hanja().await? > 0 {
        return Ok(0);
    }

    let drafts = sample_catalog();
    let count = drafts.len();
    for draft in drafts {
        let validated = draft
            .validate()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        repo.insert_hanja(validated).await?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;

    #[test]
    fn samples_validate() {
        for draft in sample_catalog() {
            draft.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn seeding_is_skipped_once_catalog_has_entries() {
        let repo = InMemoryRepository::new();
        assert_eq!(seed_catalog(&repo, false).await.unwrap(), 12);
        assert_eq!(seed_catalog(&repo, false).await.unwrap(), 0);
        assert_eq!(repo.count_hanja().await.unwrap(), 12);

        let ch1 = repo
            .list_by_chapter(hanja_core::model::Chapter::new(1).unwrap())
            .await
            .unwrap();
        assert_eq!(ch1.len(), 6);
        assert_eq!(ch1[0].id.as_str(), "1");
    }
}
