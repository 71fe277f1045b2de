//! HTML parsing for the renderer.
//!
//! The document is parsed with `scraper` (html5ever), so entity decoding,
//! implied elements and malformed raw HTML from the markdown follow the
//! HTML5 parsing rules. The parsed tree is then flattened into a stream of
//! open / close / text events, which is the shape the layout engine walks.

use scraper::{ElementRef, Html, Node};

/// One event of a depth-first walk over the parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Element opened. `name` is the lowercase local name.
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// Element closed. Void elements (`br`, `img`, `hr`) close immediately.
    End(String),
    /// Character data, entities already decoded.
    Text(String),
}

impl Token {
    /// Value of attribute `key` on a start tag.
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Token::Start { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Parse `html` as a complete document and flatten it into tokens.
///
/// The result always starts with `<html>` and contains `<head>` and
/// `<body>`, whether or not the input spelled them out. Comments, doctype
/// and processing instructions are dropped.
pub fn tokenize(html: &str) -> Vec<Token> {
    let document = Html::parse_document(html);
    let mut tokens = Vec::new();
    walk(document.root_element(), &mut tokens);
    tokens
}

fn walk(element: ElementRef<'_>, out: &mut Vec<Token>) {
    let name = element.value().name().to_ascii_lowercase();
    out.push(Token::Start {
        name: name.clone(),
        attrs: element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect(),
    });

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text: &str = text;
                out.push(Token::Text(text.to_string()));
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    walk(child, out);
                }
            }
            _ => {}
        }
    }

    out.push(Token::End(name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str) -> Token {
        Token::Start {
            name: name.into(),
            attrs: vec![],
        }
    }

    fn body(html: &str) -> Vec<Token> {
        let tokens = tokenize(html);
        let from = tokens.iter().position(|t| *t == start("body")).unwrap() + 1;
        let to = tokens.iter().rposition(|t| *t == Token::End("body".into())).unwrap();
        tokens[from..to].to_vec()
    }

    #[test]
    fn tags_and_text() {
        assert_eq!(
            body("<p>Hello <em>world</em></p>"),
            vec![
                start("p"),
                Token::Text("Hello ".into()),
                start("em"),
                Token::Text("world".into()),
                Token::End("em".into()),
                Token::End("p".into()),
            ]
        );
    }

    #[test]
    fn document_shell_is_implied() {
        let tokens = tokenize("<p>x</p>");
        assert_eq!(tokens[0], start("html"));
        assert_eq!(tokens[1], start("head"));
        assert!(tokens.contains(&start("body")));
        assert_eq!(tokens.last(), Some(&Token::End("html".into())));
    }

    #[test]
    fn attributes_and_void_elements() {
        let tokens = body(
            r#"<table><tr><th style="text-align: center">x</th></tr></table><br /><img src='a.png' alt="A &amp; B">"#,
        );
        let th = tokens.iter().find(|t| t.attr("style").is_some()).unwrap();
        assert_eq!(th.attr("style"), Some("text-align: center"));

        let br = tokens.iter().position(|t| *t == start("br")).unwrap();
        assert_eq!(tokens[br + 1], Token::End("br".into()));

        let img = tokens
            .iter()
            .find(|t| matches!(t, Token::Start { name, .. } if name == "img"))
            .unwrap();
        assert_eq!(img.attr("alt"), Some("A & B"));
        assert_eq!(img.attr("src"), Some("a.png"));
    }

    #[test]
    fn attribute_value_may_contain_gt() {
        let tokens = body(r#"<a title="a > b">x</a>"#);
        assert_eq!(tokens[0].attr("title"), Some("a > b"));
        assert_eq!(tokens[1], Token::Text("x".into()));
    }

    #[test]
    fn comments_and_doctype_dropped() {
        let tokens = body("<!DOCTYPE html><!-- note --><p>x</p>");
        assert_eq!(
            tokens,
            vec![start("p"), Token::Text("x".into()), Token::End("p".into())]
        );
    }

    #[test]
    fn uppercase_tags_are_lowercased() {
        let tokens = body("<P>x</P>");
        assert_eq!(tokens[0], start("p"));
        assert_eq!(tokens[2], Token::End("p".into()));
    }

    #[test]
    fn every_named_entity_is_decoded() {
        let tokens = body("<div>A &rarr; B &hearts; C &lt;&gt; &#65;&#x42; &eacute;</div>");
        assert_eq!(tokens[1], Token::Text("A → B ♥ C <> AB é".into()));
    }

    #[test]
    fn unknown_entities_stay_literal() {
        let tokens = body("<p>&unknown; &amp</p>");
        assert_eq!(tokens[1], Token::Text("&unknown; &".into()));
    }

    #[test]
    fn unclosed_tags_are_closed_by_the_parser() {
        let tokens = body("<p><em>open<p>next");
        let ends = tokens
            .iter()
            .filter(|t| matches!(t, Token::End(name) if name == "p"))
            .count();
        assert_eq!(ends, 2);
        assert!(tokens.contains(&Token::Text("next".into())));
    }

    #[test]
    fn stray_lt_is_text() {
        assert_eq!(body("1 < 2"), vec![Token::Text("1 < 2".into())]);
    }
}
