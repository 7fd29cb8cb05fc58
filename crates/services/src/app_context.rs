use std::collections::HashMap;
use std::sync::Arc;

use hanja_core::model::{Chapter, Hanja, HanjaId, UserId};

use crate::catalog_service::CatalogService;
use crate::error::CatalogServiceError;

/// Catalog snapshot and active user handed to each session.
///
/// Built once per screen visit and passed explicitly; cheap to clone.
#[derive(Clone, Debug)]
pub struct AppContext {
    catalog: Arc<[Hanja]>,
    index: Arc<HashMap<HanjaId, usize>>,
    user: UserId,
}

impl AppContext {
    #[must_use]
    pub fn new(catalog: Vec<Hanja>, user: UserId) -> Self {
        let index = catalog
            .iter()
            .enumerate()
            .map(|(i, h)| (h.id.clone(), i))
            .collect();
        Self {
            catalog: catalog.into(),
            index: Arc::new(index),
            user,
        }
    }

    /// Snapshot the full catalog from the service.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError` if the catalog cannot be read.
    pub async fn load(catalog: &CatalogService, user: UserId) -> Result<Self, CatalogServiceError> {
        Ok(Self::new(catalog.list_all().await?, user))
    }

    /// Same catalog, different user.
    #[must_use]
    pub fn with_user(&self, user: UserId) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            index: Arc::clone(&self.index),
            user,
        }
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    #[must_use]
    pub fn catalog(&self) -> &[Hanja] {
        &self.catalog
    }

    #[must_use]
    pub fn get(&self, id: &HanjaId) -> Option<&Hanja> {
        self.index.get(id).map(|&i| &self.catalog[i])
    }

    pub fn chapter(&self, chapter: Chapter) -> impl Iterator<Item = &Hanja> {
        self.catalog.iter().filter(move |h| h.chapter == chapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanja_core::model::HanjaDraft;

    fn hanja(id: u64, chapter: u32) -> Hanja {
        HanjaDraft {
            character: format!("字{id}"),
            sound: "자".into(),
            meaning: "글자".into(),
            stroke_order: Vec::new(),
            examples: Vec::new(),
            chapter,
            difficulty: 1,
        }
        .validate()
        .unwrap()
        .assign_id(HanjaId::from_number(id))
    }

    #[test]
    fn lookup_by_id_and_chapter() {
        let ctx = AppContext::new(vec![hanja(1, 1), hanja(2, 2), hanja(3, 2)], UserId::default());
        assert_eq!(ctx.get(&HanjaId::from_number(2)).unwrap().chapter.value(), 2);
        assert!(ctx.get(&HanjaId::from_number(9)).is_none());
        assert_eq!(ctx.chapter(Chapter::new(2).unwrap()).count(), 2);
    }

    #[test]
    fn with_user_shares_catalog() {
        let ctx = AppContext::new(vec![hanja(1, 1)], UserId::default());
        let other = ctx.with_user(UserId::new("수아"));
        assert_eq!(other.user().as_str(), "수아");
        assert_eq!(other.catalog().len(), 1);
    }
}
