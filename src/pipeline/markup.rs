//! Markdown → HTML fragment.
//!
//! CommonMark via `pulldown-cmark`, plus pipe tables and newline-to-`<br />`
//! conversion. Fenced code blocks keep their info string as a
//! `language-xxx` class. Nothing is ever rejected: syntax the parser does
//! not recognise comes through as literal text.

use crate::config::MarkdownOptions;
use pulldown_cmark::{html, Event, Options, Parser};

/// Convert markdown text to an HTML fragment.
pub fn markdown_to_html(markdown: &str, options: &MarkdownOptions) -> String {
    let mut parser_options = Options::empty();
    if options.tables {
        parser_options.insert(Options::ENABLE_TABLES);
    }

    let hard_breaks = options.hard_breaks;
    let parser = Parser::new_ext(markdown, parser_options).map(move |event| match event {
        Event::SoftBreak if hard_breaks => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
