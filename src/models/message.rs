use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::MessageRole;
use crate::summary::SummaryDocument;

/// One entry of the consultation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Loading placeholder; never survives past the call it stands in for.
    pub is_transient: bool,
    pub sent_at: NaiveDateTime,
    /// Structured case summary, when this message carries one.
    /// `content` then holds the markup rendering of the same document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryDocument>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content.into(), false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content.into(), false)
    }

    /// Loading placeholder shown while a request is outstanding.
    pub fn transient(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content.into(), true)
    }

    pub fn summary(document: SummaryDocument, markup: String) -> Self {
        let mut msg = Self::assistant(markup);
        msg.summary = Some(document);
        msg
    }

    fn new(role: MessageRole, content: String, is_transient: bool) -> Self {
        Self {
            role,
            content,
            is_transient,
            sent_at: Local::now().naive_local(),
            summary: None,
        }
    }

    /// Persisted assistant message (not a loading placeholder).
    pub fn is_assistant_reply(&self) -> bool {
        self.role == MessageRole::Assistant && !self.is_transient
    }
}

/// Latest non-transient assistant message, if any.
pub fn latest_assistant(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.is_assistant_reply())
}
