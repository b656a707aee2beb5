//! Case summary formatting.
//!
//! Turns the loosely formatted summary text produced by the backend into a
//! sectioned [`SummaryDocument`] with exactly one title, and renders it as
//! an HTML card for display.

pub mod formatter;
pub mod markup;
pub mod types;

pub use formatter::{format, has_structural_markup};
pub use markup::to_markup;
pub use types::{Formatted, HeadingBlock, Section, SectionBody, SummaryDocument, SUMMARY_TITLE};

/// Split a diagnosis message into `## heading` blocks.
///
/// Text before the first `##` line is dropped when blank; otherwise it is
/// returned under an empty heading.
pub fn heading_blocks(text: &str) -> Vec<HeadingBlock> {
    let mut blocks = Vec::new();
    let mut heading = String::new();
    let mut content: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(rest) = line.trim_start().strip_prefix("##") {
            flush_block(&mut blocks, &heading, &content);
            heading = rest.trim_start_matches('#').trim().to_string();
            content.clear();
        } else {
            content.push(line);
        }
    }
    flush_block(&mut blocks, &heading, &content);
    blocks
}

fn flush_block(blocks: &mut Vec<HeadingBlock>, heading: &str, content: &[&str]) {
    let body = content.join("\n").trim().to_string();
    if heading.is_empty() && body.is_empty() {
        return;
    }
    blocks.push(HeadingBlock {
        heading: heading.to_string(),
        content: body,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_diagnosis_into_blocks() {
        let blocks = heading_blocks(
            "## URGENCY LEVEL\nModerate\n## LIKELY CONDITION\nMigraine\n## ACTION STEPS\n- Rest\n- Hydrate",
        );
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].heading, "URGENCY LEVEL");
        assert_eq!(blocks[0].content, "Moderate");
        assert_eq!(blocks[2].content, "- Rest\n- Hydrate");
    }

    #[test]
    fn leading_text_kept_under_empty_heading() {
        let blocks = heading_blocks("Based on our conversation:\n## TIMEFRAME\nWithin 48 hours");
        assert_eq!(blocks[0].heading, "");
        assert_eq!(blocks[0].content, "Based on our conversation:");
        assert_eq!(blocks[1].heading, "TIMEFRAME");
    }

    #[test]
    fn text_without_headings_is_one_block() {
        let blocks = heading_blocks("Plain reply");
        assert_eq!(
            blocks,
            vec![HeadingBlock {
                heading: String::new(),
                content: "Plain reply".into()
            }]
        );
        assert!(heading_blocks("").is_empty());
    }
}
