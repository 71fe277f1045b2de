//! Wrap an HTML fragment in a minimal document shell.

/// Build the complete document handed to the renderer.
///
/// The fragment is inserted verbatim; only the title is escaped.
pub fn assemble_document(fragment: &str, title: &str) -> String {
    assemble_with_style(fragment, title, None)
}

/// Same shell, with an optional `<style>` block in the head.
///
/// Used for the HTML sidecar so the file looks like the PDF in a browser.
pub fn assemble_with_style(fragment: &str, title: &str, css: Option<&str>) -> String {
    let mut doc = String::with_capacity(fragment.len() + 256);
    doc.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    doc.push_str("<meta charset=\"UTF-8\">\n");
    doc.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    if let Some(css) = css {
        doc.push_str("<style>\n");
        doc.push_str(css);
        doc.push_str("</style>\n");
    }
    doc.push_str("</head>\n<body>\n");
    doc.push_str(fragment);
    if !fragment.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str("</body>\n</html>\n");
    doc
}

/// Escape text for use in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_has_head_and_body() {
        let doc = assemble_document("<p>hi</p>\n", "Whitepaper");
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<meta charset=\"UTF-8\">"));
        assert!(doc.contains("<title>Whitepaper</title>"));
        let body_start = doc.find("<body>").unwrap();
        let body_end = doc.find("</body>").unwrap();
        assert!(doc.find("</head>").unwrap() < body_start);
        assert!(doc[body_start..body_end].contains("<p>hi</p>"));
    }

    #[test]
    fn title_is_escaped() {
        let doc = assemble_document("", "R&D <draft>");
        assert!(doc.contains("<title>R&amp;D &lt;draft&gt;</title>"));
    }

    #[test]
    fn style_block_only_when_requested() {
        assert!(!assemble_document("", "t").contains("<style>"));
        let doc = assemble_with_style("", "t", Some("body { color: red; }\n"));
        assert!(doc.contains("<style>\nbody { color: red; }\n</style>"));
    }
}
