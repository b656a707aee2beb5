use serde::{Deserialize, Serialize};

use crate::models::SectionKind;

/// Fixed title of every generated case summary.
pub const SUMMARY_TITLE: &str = "MEDICAL CASE SUMMARY";

/// Structured rendering of a case summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryDocument {
    pub title: String,
    /// Rendered blocks in source order; consecutive blocks may share a heading.
    pub sections: Vec<Section>,
}

impl SummaryDocument {
    pub fn new() -> Self {
        Self {
            title: SUMMARY_TITLE.to_string(),
            sections: Vec::new(),
        }
    }

    /// Distinct headings in order of first appearance (empty heading excluded).
    pub fn headings(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for section in &self.sections {
            let heading = section.heading.as_str();
            if !heading.is_empty() && !seen.contains(&heading) {
                seen.push(heading);
            }
        }
        seen
    }
}

impl Default for SummaryDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Uppercased section name; empty for text before the first header.
    pub heading: String,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum SectionBody {
    Paragraph(String),
    /// Highlighted finding (assessment / diagnosis / likely condition).
    Emphasized(String),
    List(Vec<String>),
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self.body {
            SectionBody::Paragraph(_) => SectionKind::Paragraph,
            SectionBody::Emphasized(_) => SectionKind::Emphasized,
            SectionBody::List(_) => SectionKind::List,
        }
    }
}

/// Output of the summary formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Formatted {
    Document(SummaryDocument),
    /// Input already carried structural markup and was left untouched.
    Passthrough(String),
}

impl Formatted {
    /// Markup text for display: rendered document, or the untouched input.
    pub fn as_text(&self) -> String {
        match self {
            Self::Document(doc) => super::markup::to_markup(doc),
            Self::Passthrough(raw) => raw.clone(),
        }
    }

    pub fn document(&self) -> Option<&SummaryDocument> {
        match self {
            Self::Document(doc) => Some(doc),
            Self::Passthrough(_) => None,
        }
    }
}

/// A `## heading` block split out of a diagnosis message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingBlock {
    pub heading: String,
    pub content: String,
}
