use hanja_core::model::{Chapter, Namespace, ProgressScope};

/// What a session draws its first pass from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionScope {
    /// Every catalog card in one lesson.
    Chapter(Chapter),
    /// Cards the user has already classified somewhere.
    Global,
}

impl SessionScope {
    /// Progress slice read at start and at every pass checkpoint.
    #[must_use]
    pub fn progress_scope(&self) -> ProgressScope {
        match self {
            SessionScope::Chapter(chapter) => ProgressScope::Chapter(*chapter),
            SessionScope::Global => ProgressScope::All,
        }
    }

    #[must_use]
    pub fn chapter(&self) -> Option<Chapter> {
        match self {
            SessionScope::Chapter(chapter) => Some(*chapter),
            SessionScope::Global => None,
        }
    }

    /// Screen heading, e.g. `3단원 연습 (복습)`.
    #[must_use]
    pub fn title(&self, namespace: Namespace, review: bool) -> String {
        let base = match (self, namespace) {
            (SessionScope::Chapter(ch), Namespace::Study) => format!("{ch}단원"),
            (SessionScope::Chapter(ch), Namespace::Practice) => format!("{ch}단원 연습"),
            (SessionScope::Global, Namespace::Study) => "전체 학습".to_string(),
            (SessionScope::Global, Namespace::Practice) => "전체 연습".to_string(),
        };
        if review { format!("{base} (복습)") } else { base }
    }
}

/// Tunables for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Size cap for the first pass of a global session. `None` keeps every engaged card.
    pub global_limit: Option<usize>,
    /// Stop after this many review passes even if unknown cards remain. `None` loops
    /// until every card is known.
    pub max_review_passes: Option<u32>,
}

impl SessionOptions {
    pub const DEFAULT_GLOBAL_LIMIT: usize = 20;

    #[must_use]
    pub fn with_global_limit(mut self, limit: Option<usize>) -> Self {
        self.global_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_review_passes(mut self, max: Option<u32>) -> Self {
        self.max_review_passes = max;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            global_limit: Some(Self::DEFAULT_GLOBAL_LIMIT),
            max_review_passes: None,
        }
    }
}

/// Why a session had nothing to show at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmptyReason {
    NoCardsInChapter,
    NothingStudied,
}

impl EmptyReason {
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            EmptyReason::NoCardsInChapter => "이 단원에 한자가 없습니다.",
            EmptyReason::NothingStudied => "학습한 한자가 없습니다. 먼저 학습을 시작해주세요.",
        }
    }
}
