use std::sync::Arc;

use hanja_core::model::{Classification, HanjaId};
use tokio::sync::Mutex;

use super::controller::{ClassifyOutcome, SessionController, SessionPhase, TeardownHandle};
use super::progress::SessionView;
use crate::error::SessionError;

/// Cloneable handle for driving one session from several tasks.
///
/// Calls are serialized by the mutex, so a checkpoint always resolves before the
/// next classification is looked at. `close` does not wait for the lock.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<SessionController>>,
    teardown: TeardownHandle,
}

impl SharedSession {
    #[must_use]
    pub fn new(controller: SessionController) -> Self {
        let teardown = controller.teardown_handle();
        Self {
            inner: Arc::new(Mutex::new(controller)),
            teardown,
        }
    }

    /// # Errors
    ///
    /// See `SessionController::start`.
    pub async fn start(&self) -> Result<SessionPhase, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        self.inner.lock().await.start().await
    }

    pub async fn classify(&self, id: &HanjaId, classification: Classification) -> ClassifyOutcome {
        if self.is_closed() {
            return ClassifyOutcome::Ignored;
        }
        self.inner.lock().await.classify(id, classification).await
    }

    pub async fn view(&self) -> SessionView {
        self.inner.lock().await.view()
    }

    /// Tear the session down. Results still in flight are discarded on arrival.
    pub fn close(&self) {
        self.teardown.tear_down();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.teardown.is_torn_down()
    }
}
