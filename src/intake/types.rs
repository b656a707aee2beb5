use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use super::continuation::ContinuationTicket;
use crate::models::{PatientRecord, SessionId, Stage};

/// Loading text for ordinary turns and continuations.
pub const LOADING_PLACEHOLDER: &str = "...";
pub const DIAGNOSIS_PLACEHOLDER: &str = "Generating medical diagnosis based on our conversation...";
pub const SUMMARY_PLACEHOLDER: &str = "Generating medical case summary...";

/// Snapshot of the reconciled consultation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsultationState {
    pub stage: Stage,
    pub is_complete: bool,
    /// Completed user-submitted exchanges this session.
    pub exchange_count: u32,
    pub patient_record: PatientRecord,
}

/// Who produced the input of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrigin {
    User,
    /// Automatic or manual "continue".
    Continuation,
    ContinueAnyway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CallKind {
    Turn { origin: TurnOrigin },
    Diagnosis { forced: bool },
    Summary,
}

/// Identity of the one outstanding dialogue call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CallTicket {
    pub session: SessionId,
    pub seq: u64,
    pub kind: CallKind,
}

/// Identity of the one outstanding patient-record fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RecordTicket {
    pub session: SessionId,
    pub seq: u64,
}

/// What the driver must send to the dialogue service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueRequest {
    Turn { input: String },
    ForceDiagnosis,
    Summary,
}

/// A call the state machine has committed to; the driver executes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub ticket: CallTicket,
    pub request: DialogueRequest,
}

/// Follow-up work produced by settling a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    /// Deferred "continue" to fire after the configured delay.
    pub continuation: Option<ContinuationTicket>,
    /// Call to issue immediately (forced diagnosis).
    pub follow_up: Option<PendingCall>,
    /// Patient-record refresh to start.
    pub record_fetch: Option<RecordTicket>,
    /// The result belonged to a superseded call and was ignored.
    pub stale: bool,
}

impl Settlement {
    pub(crate) fn stale() -> Self {
        Self {
            stale: true,
            ..Self::default()
        }
    }
}

/// Sidebar entry for one completed user exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub title: String,
    pub user_text: String,
    pub assistant_text: String,
    pub recorded_at: NaiveDateTime,
}

impl HistoryEntry {
    pub fn new(user_text: &str, assistant_text: &str) -> Self {
        Self {
            title: history_title(user_text),
            user_text: user_text.to_string(),
            assistant_text: assistant_text.to_string(),
            recorded_at: Local::now().naive_local(),
        }
    }
}

const TITLE_MAX_CHARS: usize = 20;

/// First 20 characters of the user text, with `...` when truncated.
pub fn history_title(user_text: &str) -> String {
    let trimmed = user_text.trim();

    // Byte position just past the 20th character
    let boundary = trimmed
        .char_indices()
        .nth(TITLE_MAX_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    if boundary >= trimmed.len() {
        trimmed.to_string()
    } else {
        format!("{}...", &trimmed[..boundary])
    }
}
