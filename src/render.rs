//! Render-facing types: what the consultation emits, and what the user sends back.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::intake::cues::{cue_for, MessageCue};
use crate::intake::progress::ProgressStep;
use crate::intake::types::{ConsultationState, HistoryEntry};
use crate::models::{Action, Message, MessageRole, Phase};
use crate::summary::{heading_blocks, HeadingBlock, SummaryDocument};

/// One displayable transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderInstruction {
    User { text: String },
    Assistant { text: String, cue: MessageCue },
    Loading { text: String },
    Error { text: String },
    /// Backend-supplied HTML, displayed as-is.
    Markup { html: String },
    Diagnosis { blocks: Vec<HeadingBlock> },
    Summary { document: SummaryDocument },
}

impl RenderInstruction {
    pub fn from_message(message: &Message) -> Self {
        if message.role == MessageRole::User {
            return Self::User {
                text: message.content.clone(),
            };
        }
        if let Some(document) = &message.summary {
            return Self::Summary {
                document: document.clone(),
            };
        }

        let text = message.content.clone();
        match cue_for(message) {
            MessageCue::Loading => Self::Loading { text },
            MessageCue::Error => Self::Error { text },
            MessageCue::Markup => Self::Markup { html: text },
            MessageCue::Diagnosis => Self::Diagnosis {
                blocks: heading_blocks(&text),
            },
            cue => Self::Assistant { text, cue },
        }
    }
}

/// Render instructions for a transcript, in order.
pub fn instructions_for(messages: &[Message]) -> Vec<RenderInstruction> {
    messages.iter().map(RenderInstruction::from_message).collect()
}

/// Everything a render target needs to draw the consultation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderFrame {
    pub instructions: Vec<RenderInstruction>,
    pub state: ConsultationState,
    pub phase: Phase,
    pub stage_label: &'static str,
    pub progress: Vec<ProgressStep>,
    pub actions: Vec<Action>,
    /// Completed exchanges, newest first.
    pub history: Vec<HistoryEntry>,
    pub busy: bool,
}

/// Sink for consultation frames.
pub trait RenderTarget {
    fn render(&mut self, frame: &RenderFrame);
}

/// User input and button-triggered intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Submit(String),
    RequestDiagnosis,
    RequestSummary,
    ContinueAnyway,
    ContinueNow,
    Reset,
}

impl Intent {
    pub fn action(&self) -> Action {
        match self {
            Self::Submit(_) => Action::Submit,
            Self::RequestDiagnosis => Action::RequestDiagnosis,
            Self::RequestSummary => Action::RequestSummary,
            Self::ContinueAnyway => Action::ContinueAnyway,
            Self::ContinueNow => Action::ContinueNow,
            Self::Reset => Action::Reset,
        }
    }
}

/// Render target that keeps every frame, for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingTarget {
    frames: Arc<Mutex<Vec<RenderFrame>>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<RenderFrame> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<RenderFrame> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RenderFrame>> {
        self.frames.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RenderTarget for RecordingTarget {
    fn render(&mut self, frame: &RenderFrame) {
        self.lock().push(frame.clone());
    }
}
