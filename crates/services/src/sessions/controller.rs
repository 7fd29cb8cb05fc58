use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hanja_core::model::{
    Classification, Hanja, HanjaId, Namespace, ProgressRecord, ProgressScope, ProgressSnapshot,
    UserId,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use super::pass::Pass;
use super::progress::{SessionProgress, SessionView};
use super::scope::{EmptyReason, SessionOptions, SessionScope};
use crate::app_context::AppContext;
use crate::error::SessionError;
use crate::progress_store::ProgressStore;

//
// ─── PHASES AND OUTCOMES ───────────────────────────────────────────────────────
//

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the initial progress snapshot.
    Loading,
    /// A card is on screen.
    Active,
    /// Nothing to show; terminal.
    Empty(EmptyReason),
    /// Every pass resolved; terminal.
    Complete,
}

impl SessionPhase {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Empty(_) | SessionPhase::Complete)
    }
}

/// What a single `classify` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyOutcome {
    /// The next card of the same pass is on screen.
    Advanced,
    /// The pass ended with unknown cards left; a reshuffled review pass began.
    ReviewStarted { cards: usize },
    /// The pass ended and nothing is left to review.
    Completed,
    /// No current card, a stale id, or a torn-down session.
    Ignored,
}

/// Flag shared between a session and its owner; once set, in-flight results are dropped.
#[derive(Debug, Clone, Default)]
pub struct TeardownHandle(Arc<AtomicBool>);

impl TeardownHandle {
    pub fn tear_down(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Card sequencing for one study or practice screen.
///
/// Presents cards one at a time, writes one progress record per classification,
/// and re-enters with the still-unknown cards until none remain. Store failures
/// degrade to local state and are never surfaced as errors.
pub struct SessionController {
    ctx: AppContext,
    store: Arc<dyn ProgressStore>,
    scope: SessionScope,
    namespace: Namespace,
    options: SessionOptions,
    rng: StdRng,
    phase: SessionPhase,
    snapshot: ProgressSnapshot,
    pass: Pass,
    completion_checks: u32,
    teardown: TeardownHandle,
}

impl SessionController {
    #[must_use]
    pub fn new(
        ctx: AppContext,
        store: Arc<dyn ProgressStore>,
        scope: SessionScope,
        namespace: Namespace,
    ) -> Self {
        Self {
            ctx,
            store,
            scope,
            namespace,
            options: SessionOptions::default(),
            rng: StdRng::seed_from_u64(rand::random()),
            phase: SessionPhase::Loading,
            snapshot: ProgressSnapshot::empty(),
            pass: Pass::default(),
            completion_checks: 0,
            teardown: TeardownHandle::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Deterministic shuffles for tests and replays.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Load the progress snapshot and build the first pass.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` on a second call and
    /// `SessionError::Closed` if the session was torn down before or during the load.
    pub async fn start(&mut self) -> Result<SessionPhase, SessionError> {
        self.ensure_open()?;
        if self.phase != SessionPhase::Loading {
            return Err(SessionError::AlreadyStarted);
        }

        let snapshot = self
            .fetch_snapshot(self.namespace, self.scope.progress_scope())
            .await
            .unwrap_or_default();
        let engaged = match self.scope {
            SessionScope::Chapter(_) => HashSet::new(),
            SessionScope::Global => {
                let mut engaged = snapshot.engaged_ids();
                if self.namespace == Namespace::Practice {
                    if let Some(study) = self
                        .fetch_snapshot(Namespace::Study, ProgressScope::All)
                        .await
                    {
                        engaged.extend(study.engaged_ids());
                    }
                }
                engaged
            }
        };
        self.ensure_open()?;
        self.snapshot = snapshot;

        let (cards, limit, empty_reason) = match self.scope {
            SessionScope::Chapter(chapter) => (
                self.ctx.chapter(chapter).cloned().collect::<Vec<_>>(),
                None,
                EmptyReason::NoCardsInChapter,
            ),
            SessionScope::Global => (
                self.ctx
                    .catalog()
                    .iter()
                    .filter(|h| engaged.contains(&h.id))
                    .cloned()
                    .collect(),
                self.options.global_limit,
                EmptyReason::NothingStudied,
            ),
        };
        self.pass = Pass::build(cards, 1, limit, &mut self.rng);

        self.phase = if self.pass.total() == 0 {
            SessionPhase::Empty(empty_reason)
        } else {
            SessionPhase::Active
        };
        info!(
            namespace = %self.namespace,
            scope = ?self.scope,
            user = %self.ctx.user(),
            cards = self.pass.total(),
            phase = ?self.phase,
            "session started"
        );
        Ok(self.phase)
    }

    /// Record a swipe on the card currently on screen and move on.
    pub async fn classify(&mut self, id: &HanjaId, classification: Classification) -> ClassifyOutcome {
        if self.teardown.is_torn_down() || self.phase != SessionPhase::Active {
            return ClassifyOutcome::Ignored;
        }
        let Some(card) = self.pass.current() else {
            return ClassifyOutcome::Ignored;
        };
        if card.id != *id {
            debug!(on_screen = %card.id, got = %id, "ignoring classification for a card not on screen");
            return ClassifyOutcome::Ignored;
        }

        let record = ProgressRecord::new(
            self.ctx.user().clone(),
            card.id.clone(),
            card.chapter,
            classification,
        );
        if let Err(err) = self.store.save_progress(self.namespace, &record).await {
            warn!(
                namespace = %self.namespace,
                hanja = %record.hanja_id,
                error = %err,
                "progress write failed; keeping local state"
            );
        }
        if self.teardown.is_torn_down() {
            return ClassifyOutcome::Ignored;
        }

        self.snapshot.apply(&record.hanja_id, classification);
        self.pass.advance();
        if self.pass.is_finished() {
            self.finish_pass().await
        } else {
            ClassifyOutcome::Advanced
        }
    }

    async fn finish_pass(&mut self) -> ClassifyOutcome {
        self.completion_checks += 1;
        let refreshed = self
            .fetch_snapshot(self.namespace, self.scope.progress_scope())
            .await;
        if self.teardown.is_torn_down() {
            return ClassifyOutcome::Ignored;
        }
        match refreshed {
            Some(snapshot) => self.snapshot = snapshot,
            None => debug!("checkpoint falls back to local progress"),
        }

        let reviews_done = self.pass.number().saturating_sub(1);
        if self
            .options
            .max_review_passes
            .is_some_and(|max| reviews_done >= max)
        {
            info!(reviews = reviews_done, "review pass limit reached");
            return self.complete();
        }

        let cards: Vec<Hanja> = self
            .snapshot
            .unknown()
            .iter()
            .filter_map(|id| self.ctx.get(id))
            .cloned()
            .collect();
        if cards.is_empty() {
            return self.complete();
        }

        let number = self.pass.number() + 1;
        self.pass = Pass::build(cards, number, None, &mut self.rng);
        debug!(pass = number, cards = self.pass.total(), "review pass started");
        ClassifyOutcome::ReviewStarted {
            cards: self.pass.total(),
        }
    }

    fn complete(&mut self) -> ClassifyOutcome {
        self.phase = SessionPhase::Complete;
        info!(
            namespace = %self.namespace,
            user = %self.ctx.user(),
            passes = self.pass.number(),
            "session complete"
        );
        ClassifyOutcome::Completed
    }

    async fn fetch_snapshot(
        &self,
        namespace: Namespace,
        scope: ProgressScope,
    ) -> Option<ProgressSnapshot> {
        match self
            .store
            .fetch_progress(namespace, self.ctx.user(), scope)
            .await
        {
            Ok(records) => Some(ProgressSnapshot::from_records(&records)),
            Err(err) => {
                warn!(
                    namespace = %namespace,
                    user = %self.ctx.user(),
                    error = %err,
                    "progress read failed"
                );
                None
            }
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.teardown.is_torn_down() {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    //
    // ─── PRESENTATION ──────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn current_card(&self) -> Option<&Hanja> {
        if self.phase == SessionPhase::Active {
            self.pass.current()
        } else {
            None
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let loaded = matches!(self.phase, SessionPhase::Active | SessionPhase::Complete);
        SessionProgress {
            total: if loaded { self.pass.total() } else { 0 },
            resolved: if loaded { self.pass.resolved() } else { 0 },
            remaining: if loaded { self.pass.remaining().len() } else { 0 },
            is_complete: self.phase == SessionPhase::Complete,
        }
    }

    #[must_use]
    pub fn progress_fraction(&self) -> f32 {
        self.progress().fraction()
    }

    /// `"index / total"` for the card on screen.
    #[must_use]
    pub fn position(&self) -> Option<String> {
        if self.phase == SessionPhase::Active {
            self.progress().position_text()
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_review_pass(&self) -> bool {
        self.pass.is_review()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Loading
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn known_ids(&self) -> &HashSet<HanjaId> {
        self.snapshot.known()
    }

    #[must_use]
    pub fn unknown_ids(&self) -> &[HanjaId] {
        self.snapshot.unknown()
    }

    #[must_use]
    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.snapshot
    }

    /// 1 for the initial pass; 0 before `start`.
    #[must_use]
    pub fn pass_number(&self) -> u32 {
        self.pass.number()
    }

    /// Number of end-of-pass checkpoints run so far.
    #[must_use]
    pub fn completion_checks(&self) -> u32 {
        self.completion_checks
    }

    #[must_use]
    pub fn scope(&self) -> SessionScope {
        self.scope
    }

    #[must_use]
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        self.ctx.user()
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.scope.title(self.namespace, self.pass.is_review())
    }

    /// Inline text for terminal phases.
    #[must_use]
    pub fn message(&self) -> Option<&'static str> {
        match self.phase {
            SessionPhase::Empty(reason) => Some(reason.message()),
            SessionPhase::Complete if self.pass.is_review() => Some("복습이 완료되었습니다!"),
            SessionPhase::Complete => Some(match self.namespace {
                Namespace::Study => "학습이 완료되었습니다!",
                Namespace::Practice => "연습이 완료되었습니다!",
            }),
            SessionPhase::Loading | SessionPhase::Active => None,
        }
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            title: self.title(),
            phase: self.phase,
            current: self.current_card().cloned(),
            progress: self.progress(),
            review: self.is_review_pass(),
            pass_number: self.pass_number(),
            message: self.message(),
        }
    }

    #[must_use]
    pub fn teardown_handle(&self) -> TeardownHandle {
        self.teardown.clone()
    }
}
