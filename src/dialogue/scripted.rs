use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{DialogueError, DialogueService, PatientRecordService, Reply};
use crate::models::{PatientRecord, SessionId};

/// A call observed by `ScriptedDialogue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedCall {
    Turn { session: SessionId, input: String },
    ForceDiagnosis { session: SessionId },
    Summary { session: SessionId },
    FetchRecord { session: SessionId },
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<Reply, DialogueError>>,
    summaries: VecDeque<Result<String, DialogueError>>,
    records: VecDeque<Result<PatientRecord, DialogueError>>,
    calls: Vec<ScriptedCall>,
}

/// In-memory dialogue backend that plays back queued responses.
///
/// Turns and diagnosis requests share one reply queue. An exhausted queue
/// answers with a network error. Clones share the same script, so a test can
/// keep a handle while the driver owns another.
#[derive(Clone, Default)]
pub struct ScriptedDialogue {
    script: Arc<Mutex<Script>>,
    latency: Option<Duration>,
}

impl ScriptedDialogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency` (virtual time under a paused clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push_reply(&self, reply: Reply) -> &Self {
        self.lock().replies.push_back(Ok(reply));
        self
    }

    pub fn push_reply_error(&self, error: DialogueError) -> &Self {
        self.lock().replies.push_back(Err(error));
        self
    }

    pub fn push_summary(&self, summary: impl Into<String>) -> &Self {
        self.lock().summaries.push_back(Ok(summary.into()));
        self
    }

    pub fn push_record(&self, record: Result<PatientRecord, DialogueError>) -> &Self {
        self.lock().records.push_back(record);
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.lock().calls.clone()
    }

    /// Inputs of the turn calls received so far.
    pub fn turn_inputs(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ScriptedCall::Turn { input, .. } => Some(input.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&ScriptedCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| matches(c)).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn respond<T>(
        &self,
        call: ScriptedCall,
        pick: impl FnOnce(&mut Script) -> Option<Result<T, DialogueError>>,
    ) -> Result<T, DialogueError> {
        let next = {
            let mut script = self.lock();
            script.calls.push(call);
            pick(&mut script)
        };
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        next.unwrap_or_else(|| Err(DialogueError::Network("No scripted response".into())))
    }
}

impl DialogueService for ScriptedDialogue {
    async fn send_turn(&self, session: &SessionId, input: &str) -> Result<Reply, DialogueError> {
        let call = ScriptedCall::Turn {
            session: *session,
            input: input.to_string(),
        };
        self.respond(call, |s| s.replies.pop_front()).await
    }

    async fn force_diagnosis(&self, session: &SessionId) -> Result<Reply, DialogueError> {
        let call = ScriptedCall::ForceDiagnosis { session: *session };
        self.respond(call, |s| s.replies.pop_front()).await
    }

    async fn generate_summary(&self, session: &SessionId) -> Result<String, DialogueError> {
        let call = ScriptedCall::Summary { session: *session };
        self.respond(call, |s| s.summaries.pop_front()).await
    }
}

impl PatientRecordService for ScriptedDialogue {
    async fn fetch_record(&self, session: &SessionId) -> Result<PatientRecord, DialogueError> {
        let call = ScriptedCall::FetchRecord { session: *session };
        self.respond(call, |s| s.records.pop_front()).await
    }
}
