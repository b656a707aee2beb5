//! Dialogue backend client.
//!
//! The consultation core only sees the two traits below. `HttpDialogueClient`
//! speaks the backend's JSON API; `ScriptedDialogue` is an in-memory stand-in
//! for tests.

pub mod http;
pub mod scripted;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{PatientRecord, SessionId};

pub use http::HttpDialogueClient;
pub use scripted::{ScriptedCall, ScriptedDialogue};

/// Failure of a backend call. Display text is shown to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogueError {
    /// Transport failure (connect, timeout, client construction).
    #[error("{0}")]
    Network(String),

    /// 2xx response with a missing or malformed payload.
    #[error("Invalid response format from server: {0}")]
    Protocol(String),

    /// Non-2xx response with the server-supplied detail.
    #[error("{detail}")]
    Service { status: u16, detail: String },
}

/// One backend reply to a turn or a diagnosis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    /// Raw stage token as reported by the backend.
    pub stage: Option<String>,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            stage: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }
}

/// Request/response conversation with the intake backend.
#[allow(async_fn_in_trait)]
pub trait DialogueService {
    /// Send user input (or a synthetic continuation token) for the session.
    async fn send_turn(&self, session: &SessionId, input: &str) -> Result<Reply, DialogueError>;

    /// Ask the backend to diagnose with what it has collected so far.
    async fn force_diagnosis(&self, session: &SessionId) -> Result<Reply, DialogueError>;

    /// Generate the free-text case summary for the session.
    async fn generate_summary(&self, session: &SessionId) -> Result<String, DialogueError>;
}

/// Read access to the patient data the backend collected.
#[allow(async_fn_in_trait)]
pub trait PatientRecordService {
    async fn fetch_record(&self, session: &SessionId) -> Result<PatientRecord, DialogueError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_user_facing_detail() {
        let err = DialogueError::Service {
            status: 500,
            detail: "Error processing response".into(),
        };
        assert_eq!(err.to_string(), "Error processing response");
        assert_eq!(
            DialogueError::Protocol("missing next_question".into()).to_string(),
            "Invalid response format from server: missing next_question"
        );
    }

    #[test]
    fn reply_builder() {
        let reply = Reply::new("How long?").with_stage("symptoms");
        assert_eq!(reply.text, "How long?");
        assert_eq!(reply.stage.as_deref(), Some("symptoms"));
    }
}
