use super::types::{SectionBody, SummaryDocument};

/// Render a document as an HTML card.
///
/// The output always contains a `<div`, so formatting it again is a passthrough.
pub fn to_markup(doc: &SummaryDocument) -> String {
    let mut out = String::from("<div class=\"summary-card\">\n");
    out.push_str(&format!(
        "<h3 class=\"summary-title\">{}</h3>\n",
        escape_html(&doc.title)
    ));

    let mut current_heading: Option<&str> = None;
    for section in &doc.sections {
        if current_heading != Some(section.heading.as_str()) {
            if current_heading.is_some() {
                out.push_str("</div>\n");
            }
            out.push_str("<div class=\"summary-section\">\n");
            if !section.heading.is_empty() {
                out.push_str(&format!(
                    "<h4 class=\"section-title\">{}</h4>\n",
                    escape_html(&section.heading)
                ));
            }
            current_heading = Some(section.heading.as_str());
        }

        match &section.body {
            SectionBody::Paragraph(text) => {
                out.push_str(&format!("<p>{}</p>\n", escape_html(text)));
            }
            SectionBody::Emphasized(text) => {
                out.push_str(&format!(
                    "<div class=\"diagnosis-highlight\">{}</div>\n",
                    escape_html(text)
                ));
            }
            SectionBody::List(items) => {
                out.push_str("<ul>\n");
                for item in items {
                    out.push_str(&format!("<li>{}</li>\n", escape_html(item)));
                }
                out.push_str("</ul>\n");
            }
        }
    }
    if current_heading.is_some() {
        out.push_str("</div>\n");
    }

    out.push_str("</div>");
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
