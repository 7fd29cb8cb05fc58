mod hanja;
mod ids;
mod progress;

pub use hanja::{
    Chapter, Difficulty, Example, Hanja, HanjaDraft, HanjaError, HanjaPatch, ValidatedHanja,
};
pub use ids::{HanjaId, ParseIdError, UserId};
pub use progress::{
    Classification, Namespace, ProgressRecord, ProgressScope, ProgressSnapshot, UnknownNamespace,
};
