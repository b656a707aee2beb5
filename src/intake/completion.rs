use super::stage::has_recommendation_markers;
use crate::models::{Message, Stage};

/// Whether the consultation has reached its recommendations.
///
/// True for a terminal stage, or when any persisted assistant message carries
/// the recommendation markers, whatever stage the backend reported.
pub fn is_complete(stage: Stage, messages: &[Message]) -> bool {
    stage.is_terminal()
        || messages
            .iter()
            .filter(|m| m.is_assistant_reply())
            .any(|m| has_recommendation_markers(&m.content))
}

/// Monotonic completion flag for one session.
///
/// Once set it stays set until `reset`. `observe` reports the false → true
/// transition exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionLatch {
    complete: bool,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.complete
    }

    /// Feed the latest detector result. Returns true only on the transition.
    pub fn observe(&mut self, detected: bool) -> bool {
        if detected && !self.complete {
            self.complete = true;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.complete = false;
    }
}
