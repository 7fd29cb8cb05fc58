use hanja_core::model::Hanja;

use super::controller::SessionPhase;

/// Aggregated view of pass progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionProgress {
    pub total: usize,
    pub resolved: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Resolved share of the current pass in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f32 {
        if self.is_complete {
            return 1.0;
        }
        if self.total == 0 {
            return 0.0;
        }
        (self.resolved as f32 / self.total as f32).clamp(0.0, 1.0)
    }

    /// `"3 / 12"`, counting the card on screen. `None` with nothing on screen.
    #[must_use]
    pub fn position_text(&self) -> Option<String> {
        if self.is_complete || self.remaining == 0 {
            return None;
        }
        Some(format!("{} / {}", self.resolved + 1, self.total))
    }
}

/// Everything a screen needs to render one frame of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub title: String,
    pub phase: SessionPhase,
    pub current: Option<Hanja>,
    pub progress: SessionProgress,
    pub review: bool,
    pub pass_number: u32,
    /// Inline message for empty or finished sessions.
    pub message: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_and_position() {
        let progress = SessionProgress {
            total: 4,
            resolved: 1,
            remaining: 3,
            is_complete: false,
        };
        assert!((progress.fraction() - 0.25).abs() < f32::EPSILON);
        assert_eq!(progress.position_text().as_deref(), Some("2 / 4"));

        let done = SessionProgress {
            is_complete: true,
            ..SessionProgress::default()
        };
        assert!((done.fraction() - 1.0).abs() < f32::EPSILON);
        assert_eq!(done.position_text(), None);
        assert!(SessionProgress::default().fraction().abs() < f32::EPSILON);
    }
}
