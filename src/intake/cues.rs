use serde::Serialize;

use crate::models::{Action, Message, MessageRole, Stage};

/// Prefix of the message appended when a call fails.
pub const ERROR_PREFIX: &str = "Sorry, I encountered an error:";

const VALIDATION_FEEDBACK: &str = "doesn't seem to address my question";

const PARTIAL_ANSWER_PROMPTS: &[&str] = &[
    "Could you please also tell me about",
    "You mentioned seeing a doctor",
    "also share what diagnosis",
];

/// Announcements offering a manual "get diagnosis now".
const NEEDS_CONTINUATION: &[&str] = &[
    "I'll now analyze your symptoms",
    "provide a preliminary diagnosis",
];

const DIAGNOSIS_MARKER: &str = "LIKELY CONDITION";

/// How the render layer should present a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCue {
    Plain,
    /// The backend rejected the answer; offer "continue anyway".
    ValidationFeedback,
    /// The backend wants more detail; offer "continue anyway".
    PartialAnswer,
    /// The backend is about to analyze; offer "get diagnosis now".
    NeedsContinuation,
    /// Plain-text diagnosis, rendered as `##` blocks.
    Diagnosis,
    /// Already carries HTML; render as-is.
    Markup,
    Error,
    Loading,
}

impl MessageCue {
    /// Cues that offer the user a way to bypass answer validation.
    pub fn offers_continue_anyway(&self) -> bool {
        matches!(self, Self::ValidationFeedback | Self::PartialAnswer)
    }
}

/// Classify a message for display.
pub fn cue_for(message: &Message) -> MessageCue {
    if message.role == MessageRole::User {
        return MessageCue::Plain;
    }
    if message.is_transient {
        return MessageCue::Loading;
    }

    let content = message.content.as_str();
    if content.starts_with(ERROR_PREFIX) {
        return MessageCue::Error;
    }
    if message.summary.is_some() || content.contains("<div class=") || content.contains("</div>") {
        return MessageCue::Markup;
    }
    if content.contains(VALIDATION_FEEDBACK) {
        return MessageCue::ValidationFeedback;
    }
    if PARTIAL_ANSWER_PROMPTS.iter().any(|p| content.contains(p)) {
        return MessageCue::PartialAnswer;
    }
    if NEEDS_CONTINUATION.iter().any(|p| content.contains(p)) {
        return MessageCue::NeedsContinuation;
    }
    if content.contains(DIAGNOSIS_MARKER) {
        return MessageCue::Diagnosis;
    }
    MessageCue::Plain
}

/// State the action set is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionContext {
    pub busy: bool,
    /// A deferred continuation is waiting on its timer.
    pub continuation_pending: bool,
    pub is_complete: bool,
    pub stage: Stage,
    pub summary_generated: bool,
    /// Cue of the latest persisted assistant message.
    pub latest_cue: Option<MessageCue>,
}

/// Actions the user may trigger right now. Reset is always offered.
///
/// A pending continuation can be fired early; nothing else is offered while busy.
pub fn available_actions(ctx: &ActionContext) -> Vec<Action> {
    let mut actions = Vec::new();

    if ctx.continuation_pending {
        actions.push(Action::ContinueNow);
    } else if !ctx.busy {
        if !ctx.is_complete {
            actions.push(Action::Submit);
            if ctx.stage != Stage::Start {
                actions.push(Action::RequestDiagnosis);
            }
            if ctx.latest_cue.is_some_and(|cue| cue.offers_continue_anyway()) {
                actions.push(Action::ContinueAnyway);
            }
        } else if !ctx.summary_generated {
            actions.push(Action::RequestSummary);
        }
    }

    actions.push(Action::Reset);
    actions
}
