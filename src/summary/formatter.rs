use std::sync::LazyLock;

use regex::Regex;

use super::types::{Formatted, Section, SectionBody, SummaryDocument};

/// Section names recognized in generated summaries.
const SECTION_NAMES: &[&str] = &[
    "Medical Case Summary",
    "Chief Complaint",
    "History",
    "Medications",
    "Assessment",
    "Diagnosis",
    "Likely Condition",
    "Recommendations",
];

/// Sections whose body is collapsed into a single emphasized finding.
const EMPHASIZED_SECTIONS: &[&str] = &["assessment", "diagnosis", "likely condition"];

const TITLE_PHRASE: &str = "medical case summary";

/// Decorated title occurrences: `# …`, `## … ##`, `**…**`, `__…__`, `[…]`.
static DECORATED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)#{1,6}[ \t]*medical case summary[ \t]*#{0,6}|\*\*[ \t]*medical case summary[ \t]*\*\*|__[ \t]*medical case summary[ \t]*__|\[[ \t]*medical case summary[ \t]*\]",
    )
    .expect("valid title regex")
});

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s").expect("valid numbered-item regex"));

/// True when the text already contains document markup and must not be re-wrapped.
pub fn has_structural_markup(text: &str) -> bool {
    text.contains("<div") || text.contains("<h")
}

/// Convert a generated case summary into a sectioned document.
///
/// Never fails: text that matches no known structure degrades to paragraphs.
pub fn format(raw: &str) -> Formatted {
    if has_structural_markup(raw) {
        return Formatted::Passthrough(raw.to_string());
    }

    let cleaned = DECORATED_TITLE.replace_all(raw, "");
    let lines: Vec<&str> = cleaned
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_title_line(l) && !is_rule(l))
        .collect();

    let mut builder = DocumentBuilder::default();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if !is_section_header(line) {
            builder.push_body_line(line);
            i += 1;
            continue;
        }

        let (name, remainder) = split_header(line);
        if name.eq_ignore_ascii_case(TITLE_PHRASE) {
            i += 1;
            continue;
        }
        builder.open_section(&name);

        if is_emphasized_section(&name) {
            // Greedy run up to the next header; bullets after a finding stay a list.
            let mut parts: Vec<&str> = remainder.into_iter().collect();
            let mut j = i + 1;
            while j < lines.len() && !is_section_header(lines[j]) && !is_bullet(lines[j]) {
                parts.push(lines[j]);
                j += 1;
            }
            builder.push_emphasized(&parts.join(" "));
            i = j;
            continue;
        }

        if let Some(rest) = remainder {
            builder.push_body_line(rest);
        }
        i += 1;
    }

    Formatted::Document(builder.finish())
}

/// A header names a known section AND carries a heading/emphasis prefix.
fn is_section_header(line: &str) -> bool {
    if !(line.starts_with("**") || line.starts_with('#')) {
        return false;
    }
    let lower = line.to_lowercase();
    SECTION_NAMES
        .iter()
        .any(|name| lower.contains(&name.to_lowercase()))
}

/// Split a header line into its section name and any text after the colon.
fn split_header(line: &str) -> (String, Option<&str>) {
    let stripped = line.replace("**", "").replace('#', "");
    let stripped = stripped.trim();

    match stripped.split_once(':') {
        Some((name, _)) => {
            let rest = line
                .split_once(':')
                .map(|(_, rest)| rest.trim_start_matches('*').trim())
                .filter(|rest| !rest.is_empty());
            (name.trim().to_string(), rest)
        }
        None => (stripped.to_string(), None),
    }
}

fn is_emphasized_section(name: &str) -> bool {
    let lower = name.to_lowercase();
    EMPHASIZED_SECTIONS.iter().any(|s| lower.contains(s))
}

fn is_title_line(line: &str) -> bool {
    line.trim_matches(|c: char| matches!(c, '#' | '*' | '_' | '[' | ']' | ':') || c.is_whitespace())
        .eq_ignore_ascii_case(TITLE_PHRASE)
}

/// Horizontal rules such as `---` or `***` carry no content.
fn is_rule(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| matches!(c, '-' | '*' | '_' | '='))
}

fn is_bullet(line: &str) -> bool {
    line.starts_with('-') || (line.starts_with('*') && !line.starts_with("**"))
}

fn is_coerced_item(line: &str) -> bool {
    NUMBERED_ITEM.is_match(line) || line.contains(": ")
}

fn strip_inline_emphasis(text: &str) -> String {
    text.replace("**", "").trim().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListRun {
    Bullet,
    Coerced,
}

#[derive(Default)]
struct DocumentBuilder {
    heading: String,
    sections: Vec<Section>,
    open_list: Option<(ListRun, Vec<String>)>,
}

impl DocumentBuilder {
    fn open_section(&mut self, name: &str) {
        self.close_list();
        self.heading = name.to_uppercase();
    }

    fn push_body_line(&mut self, line: &str) {
        if is_bullet(line) {
            let item = strip_inline_emphasis(&line[1..]);
            if !item.is_empty() {
                self.push_item(ListRun::Bullet, item);
            }
        } else if is_coerced_item(line) {
            self.push_item(ListRun::Coerced, strip_inline_emphasis(line));
        } else {
            self.close_list();
            let text = strip_inline_emphasis(line);
            if !text.is_empty() {
                self.push(SectionBody::Paragraph(text));
            }
        }
    }

    fn push_emphasized(&mut self, text: &str) {
        self.close_list();
        let text = strip_inline_emphasis(text);
        if !text.is_empty() {
            self.push(SectionBody::Emphasized(text));
        }
    }

    fn push_item(&mut self, run: ListRun, item: String) {
        match &mut self.open_list {
            Some((open_run, items)) if *open_run == run => items.push(item),
            _ => {
                self.close_list();
                self.open_list = Some((run, vec![item]));
            }
        }
    }

    fn close_list(&mut self) {
        if let Some((_, items)) = self.open_list.take() {
            self.push(SectionBody::List(items));
        }
    }

    fn push(&mut self, body: SectionBody) {
        self.sections.push(Section {
            heading: self.heading.clone(),
            body,
        });
    }

    fn finish(mut self) -> SummaryDocument {
        self.close_list();
        SummaryDocument {
            sections: self.sections,
            ..SummaryDocument::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionKind;
    use crate::summary::SUMMARY_TITLE;

    fn document(raw: &str) -> SummaryDocument {
        match format(raw) {
            Formatted::Document(doc) => doc,
            Formatted::Passthrough(_) => panic!("expected a document for {raw:?}"),
        }
    }

    #[test]
    fn migraine_summary_structure() {
        let doc = document(
            "**Medical Case Summary**\n**Assessment**\nLikely migraine\n- rest\n- hydration",
        );
        assert_eq!(doc.title, SUMMARY_TITLE);
        assert_eq!(doc.sections.len(), 2);

        assert_eq!(doc.sections[0].heading, "ASSESSMENT");
        assert_eq!(doc.sections[0].kind(), SectionKind::Emphasized);
        assert_eq!(
            doc.sections[0].body,
            SectionBody::Emphasized("Likely migraine".into())
        );

        assert_eq!(doc.sections[1].kind(), SectionKind::List);
        assert_eq!(
            doc.sections[1].body,
            SectionBody::List(vec!["rest".into(), "hydration".into()])
        );
    }

    #[test]
    fn html_input_passes_through_unchanged() {
        let html = r#"<div class="summary-card"><h3>Already done</h3></div>"#;
        assert_eq!(format(html), Formatted::Passthrough(html.to_string()));
    }

    #[test]
    fn passthrough_is_idempotent() {
        let structured = "<div><h4>CHIEF COMPLAINT</h4><p>Sore throat</p></div>";
        let once = format(structured);
        let twice = format(&once.as_text());
        assert_eq!(once, twice);
    }

    #[test]
    fn rendered_document_is_passthrough_on_reformat() {
        let first = format("## Chief Complaint\nSore throat for three days");
        let markup = first.as_text();
        assert_eq!(format(&markup), Formatted::Passthrough(markup.clone()));
    }

    #[test]
    fn duplicate_decorated_titles_collapse_to_one() {
        let raw = "## Medical Case Summary\n\n**Medical Case Summary**\n# MEDICAL CASE SUMMARY #\n[Medical Case Summary]\nMedical case summary:\n**Chief Complaint**\nFever";
        let doc = document(raw);
        assert_eq!(doc.title, SUMMARY_TITLE);
        assert!(doc
            .sections
            .iter()
            .all(|s| !s.heading.contains("MEDICAL CASE SUMMARY")));
        assert_eq!(doc.headings(), vec!["CHIEF COMPLAINT"]);
    }

    #[test]
    fn input_without_title_still_gets_one() {
        let doc = document("**History**\nNo prior consultations");
        assert_eq!(doc.title, SUMMARY_TITLE);
        assert_eq!(doc.headings(), vec!["HISTORY"]);
    }

    #[test]
    fn empty_input_yields_title_only() {
        let doc = document("");
        assert_eq!(doc.title, SUMMARY_TITLE);
        assert!(doc.sections.is_empty());

        let doc = document("## Medical Case Summary\n\n   \n");
        assert!(doc.sections.is_empty());
    }

    #[test]
    fn section_name_without_marker_is_body_text() {
        let doc = document("**Chief Complaint**\nHistory of recurring headaches since childhood");
        assert_eq!(doc.headings(), vec!["CHIEF COMPLAINT"]);
        assert_eq!(
            doc.sections[0].body,
            SectionBody::Paragraph("History of recurring headaches since childhood".into())
        );
    }

    #[test]
    fn header_name_truncated_at_colon_and_rest_kept() {
        let doc = document("**Chief Complaint:** Sore throat\n**Medications:**\n- Paracetamol 500mg");
        assert_eq!(doc.headings(), vec!["CHIEF COMPLAINT", "MEDICATIONS"]);
        assert_eq!(
            doc.sections[0].body,
            SectionBody::Paragraph("Sore throat".into())
        );
        assert_eq!(
            doc.sections[1].body,
            SectionBody::List(vec!["Paracetamol 500mg".into()])
        );
    }

    #[test]
    fn diagnosis_consumes_lines_up_to_next_header() {
        let doc = document(
            "## Diagnosis\nViral pharyngitis,\nlikely self-limiting\nwithin a week\n## Recommendations\nSee a GP if fever persists",
        );
        assert_eq!(
            doc.sections[0].body,
            SectionBody::Emphasized("Viral pharyngitis, likely self-limiting within a week".into())
        );
        assert_eq!(doc.sections[1].heading, "RECOMMENDATIONS");
        assert_eq!(
            doc.sections[1].body,
            SectionBody::Paragraph("See a GP if fever persists".into())
        );
        assert_eq!(doc.sections.len(), 2);
    }

    #[test]
    fn likely_condition_inline_finding() {
        let doc = document("**Likely Condition: Tension headache**\n**Recommendations**\n- Sleep");
        assert_eq!(doc.sections[0].heading, "LIKELY CONDITION");
        assert_eq!(
            doc.sections[0].body,
            SectionBody::Emphasized("Tension headache".into())
        );
    }

    #[test]
    fn bullet_run_closes_on_non_bullet() {
        let doc = document("**Recommendations**\n- Rest\n* Fluids\nMonitor temperature\n- Return if worse");
        let kinds: Vec<SectionKind> = doc.sections.iter().map(Section::kind).collect();
        assert_eq!(
            kinds,
            vec![SectionKind::List, SectionKind::Paragraph, SectionKind::List]
        );
        assert_eq!(
            doc.sections[0].body,
            SectionBody::List(vec!["Rest".into(), "Fluids".into()])
        );
    }

    #[test]
    fn numbered_and_key_value_lines_become_lists() {
        let doc = document(
            "**History**\n1. Fever for 3 days\n2. No travel\nOnset: sudden\n**Medications**\nNone reported",
        );
        assert_eq!(
            doc.sections[0].body,
            SectionBody::List(vec![
                "1. Fever for 3 days".into(),
                "2. No travel".into(),
                "Onset: sudden".into(),
            ])
        );
        assert_eq!(doc.sections[1].heading, "MEDICATIONS");
        assert_eq!(doc.sections[1].kind(), SectionKind::Paragraph);
    }

    #[test]
    fn text_before_first_header_is_kept() {
        let doc = document("Prepared for the attending physician.\n**Chief Complaint**\nCough");
        assert_eq!(doc.sections[0].heading, "");
        assert_eq!(
            doc.sections[0].body,
            SectionBody::Paragraph("Prepared for the attending physician.".into())
        );
    }

    #[test]
    fn unstructured_text_degrades_to_paragraphs() {
        let doc = document("The patient reports a sore throat.\nNo fever was mentioned.");
        assert_eq!(doc.sections.len(), 2);
        assert!(doc
            .sections
            .iter()
            .all(|s| s.kind() == SectionKind::Paragraph));
    }

    #[test]
    fn horizontal_rules_are_dropped() {
        let doc = document("**History**\n---\nAsthma as a child");
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn markup_detection() {
        assert!(has_structural_markup("<div>x</div>"));
        assert!(has_structural_markup("<h4>x</h4>"));
        assert!(!has_structural_markup("plain **markdown**"));
    }
}
