use serde::Serialize;

use crate::models::{Message, SessionId, Stage};

/// Backend phrases announcing that it will analyze without further input.
pub const AUTO_TRIGGER_PHRASES: &[&str] = &[
    "I'll now analyze your symptoms",
    "provide a preliminary diagnosis",
    "Thank you for sharing these additional symptoms",
];

/// Synthetic input sent for an automatic or manual continuation.
pub const CONTINUE_TOKEN: &str = "continue";

/// Synthetic input that asks the backend to skip answer validation.
pub const CONTINUE_ANYWAY_TOKEN: &str = "continue_anyway";

/// Whether this message should trigger a deferred "continue".
pub fn should_auto_continue(message: &Message) -> bool {
    message.is_assistant_reply()
        && AUTO_TRIGGER_PHRASES
            .iter()
            .any(|phrase| message.content.contains(phrase))
}

/// Identity of one scheduled continuation.
///
/// A ticket whose session or sequence no longer matches the pending one is
/// stale; firing it does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ContinuationTicket {
    pub session: SessionId,
    pub seq: u64,
}

/// Inputs to the forced-diagnosis ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcePolicy {
    pub exchange_count: u32,
    pub exchange_limit: u32,
    pub is_complete: bool,
    pub stage: Stage,
    /// Already issued once this session (successfully or not).
    pub already_forced: bool,
}

/// Whether a diagnosis should be requested without the user asking.
pub fn should_force_diagnosis(policy: &ForcePolicy) -> bool {
    policy.exchange_count >= policy.exchange_limit
        && !policy.is_complete
        && policy.stage != Stage::Start
        && !policy.already_forced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ForcePolicy {
        ForcePolicy {
            exchange_count: 5,
            exchange_limit: 5,
            is_complete: false,
            stage: Stage::Symptoms,
            already_forced: false,
        }
    }

    // ── Auto-continue ──

    #[test]
    fn each_trigger_phrase_matches() {
        for phrase in AUTO_TRIGGER_PHRASES {
            let msg = Message::assistant(format!("Okay. {phrase}."));
            assert!(should_auto_continue(&msg), "{phrase}");
        }
    }

    #[test]
    fn combined_phrase_matches() {
        let msg = Message::assistant(
            "Thank you for sharing these additional symptoms, I'll now analyze your symptoms.",
        );
        assert!(should_auto_continue(&msg));
    }

    #[test]
    fn user_and_transient_messages_never_trigger() {
        assert!(!should_auto_continue(&Message::user(
            "I'll now analyze your symptoms"
        )));
        assert!(!should_auto_continue(&Message::transient(
            "provide a preliminary diagnosis"
        )));
    }

    #[test]
    fn ordinary_question_does_not_trigger() {
        assert!(!should_auto_continue(&Message::assistant(
            "How long have you had the headache?"
        )));
    }

    // ── Forced diagnosis ──

    #[test]
    fn forces_at_limit() {
        assert!(should_force_diagnosis(&policy()));
        assert!(should_force_diagnosis(&ForcePolicy {
            exchange_count: 7,
            ..policy()
        }));
    }

    #[test]
    fn below_limit_does_not_force() {
        assert!(!should_force_diagnosis(&ForcePolicy {
            exchange_count: 4,
            ..policy()
        }));
    }

    #[test]
    fn never_forces_twice_or_when_complete_or_at_start() {
        assert!(!should_force_diagnosis(&ForcePolicy {
            already_forced: true,
            ..policy()
        }));
        assert!(!should_force_diagnosis(&ForcePolicy {
            is_complete: true,
            ..policy()
        }));
        assert!(!should_force_diagnosis(&ForcePolicy {
            stage: Stage::Start,
            ..policy()
        }));
    }
}
