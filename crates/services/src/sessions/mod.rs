mod controller;
mod pass;
mod progress;
mod scope;
mod shared;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{ClassifyOutcome, SessionController, SessionPhase, TeardownHandle};
pub use progress::{SessionProgress, SessionView};
pub use scope::{EmptyReason, SessionOptions, SessionScope};
pub use shared::SharedSession;
