//! The fixed whitepaper style sheet.
//!
//! The same rules exist in two forms:
//!
//! * [`BASE_CSS`] / [`StyleSheet::to_css`]: CSS text embedded in the HTML
//!   sidecar so the document looks the same when opened in a browser.
//! * [`StyleSheet`]: the typed rule set the layout engine reads. Its
//!   [`Default`] mirrors the CSS value for value.
//!
//! Only the `@page` block varies with configuration (paper size, margins,
//! footer); every typographic rule is fixed.

use crate::config::PageSize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Typographic rules shared by every conversion. The `@page` block is
/// generated by [`StyleSheet::to_css`].
pub const BASE_CSS: &str = r#"
body {
    font-family: 'Georgia', serif;
    font-size: 11pt;
    line-height: 1.6;
    color: #1a1a1a;
    max-width: 100%;
}

h1 {
    font-size: 24pt;
    font-weight: bold;
    color: #1a365d;
    margin-top: 0;
    margin-bottom: 8pt;
    text-align: center;
    border-bottom: 2px solid #1a365d;
    padding-bottom: 12pt;
}

h2 {
    font-size: 14pt;
    font-weight: bold;
    color: #2d3748;
    margin-top: 24pt;
    margin-bottom: 12pt;
    border-bottom: 1px solid #e2e8f0;
    padding-bottom: 6pt;
}

h3 {
    font-size: 12pt;
    font-weight: bold;
    color: #4a5568;
    margin-top: 18pt;
    margin-bottom: 8pt;
}

h4 {
    font-size: 11pt;
    font-weight: bold;
    color: #4a5568;
    margin-top: 12pt;
    margin-bottom: 6pt;
}

p {
    margin: 0 0 12pt 0;
    text-align: justify;
}

p:first-of-type {
    font-style: italic;
    text-align: center;
    font-size: 12pt;
    color: #4a5568;
    margin-bottom: 6pt;
}

p:nth-of-type(2) {
    text-align: center;
    font-size: 10pt;
    color: #718096;
    margin-bottom: 24pt;
}

ul, ol {
    margin: 0 0 12pt 0;
    padding-left: 24pt;
}

li {
    margin-bottom: 6pt;
}

code {
    font-family: 'Courier New', monospace;
    font-size: 9pt;
    background-color: #f7fafc;
    padding: 2pt 4pt;
    border-radius: 2pt;
    color: #c53030;
}

pre {
    font-family: 'Courier New', monospace;
    font-size: 9pt;
    background-color: #1a202c;
    color: #e2e8f0;
    padding: 12pt;
    border-radius: 4pt;
    margin: 12pt 0;
    overflow-x: auto;
    white-space: pre-wrap;
    word-wrap: break-word;
}

pre code {
    background-color: transparent;
    color: #e2e8f0;
    padding: 0;
}

blockquote {
    border-left: 3pt solid #4299e1;
    margin: 12pt 0;
    padding: 8pt 16pt;
    background-color: #ebf8ff;
    font-style: italic;
    color: #2b6cb0;
}

hr {
    border: none;
    border-top: 1px solid #e2e8f0;
    margin: 24pt 0;
}

strong {
    font-weight: bold;
    color: #1a202c;
}

em {
    font-style: italic;
}

a {
    color: #3182ce;
    text-decoration: underline;
}

table {
    width: 100%;
    border-collapse: collapse;
    margin: 12pt 0;
    font-size: 10pt;
}

th, td {
    border: 1px solid #e2e8f0;
    padding: 8pt;
    text-align: left;
}

th {
    background-color: #edf2f7;
    font-weight: bold;
}

h3:last-of-type {
    margin-top: 36pt;
    border-top: 2px solid #1a365d;
    padding-top: 18pt;
}
"#;

/// CSS `px` expressed in points (96 px per inch, 72 pt per inch).
pub const PX: f32 = 0.75;

/// Points per inch.
pub const INCH: f32 = 72.0;

// ── Primitive values ─────────────────────────────────────────────────────

/// An opaque sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

const fn hex(value: u32) -> Color {
    Color::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
}

/// Font families available to the layout engine.
///
/// Georgia maps to the serif standard font and Courier New to the
/// monospaced one, so no font files need to be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    Serif,
    Monospace,
}

/// A concrete face: family plus weight and slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontFace {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
}

impl FontFace {
    pub const SERIF: FontFace = FontFace {
        family: FontFamily::Serif,
        bold: false,
        italic: false,
    };

    pub const MONO: FontFace = FontFace {
        family: FontFamily::Monospace,
        bold: false,
        italic: false,
    };

    pub fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// A solid border edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Border {
    /// Width in points.
    pub width: f32,
    pub color: Color,
}

// ── Rule groups ──────────────────────────────────────────────────────────

/// `@page` rule: paper, margins and the page-number footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageStyle {
    pub size: PageSize,
    /// Margin on all four sides, in points.
    pub margin: f32,
    pub page_numbers: bool,
    pub footer_size: f32,
    pub footer_color: Color,
}

/// Inherited body text properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyStyle {
    pub size: f32,
    pub line_height: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingStyle {
    pub size: f32,
    pub color: Color,
    pub align: TextAlign,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub padding_bottom: f32,
    pub border_bottom: Option<Border>,
}

/// A paragraph rule. `None` fields inherit from the enclosing block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    pub size: Option<f32>,
    pub color: Option<Color>,
    pub italic: Option<bool>,
    pub align: TextAlign,
    pub margin_bottom: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListStyle {
    pub margin_bottom: f32,
    pub padding_left: f32,
    pub item_margin_bottom: f32,
    /// Gap between the marker and the item text.
    pub marker_gap: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineCodeStyle {
    pub size: f32,
    pub color: Color,
    pub background: Color,
    pub padding_x: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlockStyle {
    pub size: f32,
    pub color: Color,
    pub background: Color,
    pub padding: f32,
    pub margin: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockquoteStyle {
    pub border_left: Border,
    pub background: Color,
    pub color: Color,
    pub padding_y: f32,
    pub padding_x: f32,
    pub margin: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleStyle {
    pub border: Border,
    pub margin: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStyle {
    pub size: f32,
    pub margin: f32,
    pub cell_padding: f32,
    pub border: Border,
    pub header_background: Color,
}

/// Overrides for the last `h3` among its siblings ("About the Author").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingHeadingStyle {
    pub margin_top: f32,
    pub border_top: Border,
    pub padding_top: f32,
}

/// The complete typed rule set. See [`BASE_CSS`] for the CSS form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    pub page: PageStyle,
    pub body: BodyStyle,
    /// `h1`..`h4`; `h5` and `h6` reuse the `h4` rule.
    pub headings: [HeadingStyle; 4],
    pub paragraph: ParagraphStyle,
    /// `p:first-of-type`
    pub lead_paragraph: ParagraphStyle,
    /// `p:nth-of-type(2)`
    pub byline_paragraph: ParagraphStyle,
    pub list: ListStyle,
    pub inline_code: InlineCodeStyle,
    pub code_block: CodeBlockStyle,
    pub blockquote: BlockquoteStyle,
    pub rule: RuleStyle,
    pub strong_color: Color,
    pub link_color: Color,
    pub table: TableStyle,
    /// `h3:last-of-type`
    pub closing_heading: ClosingHeadingStyle,
}

impl Default for StyleSheet {
    fn default() -> Self {
        let heading = |size, color, margin_top, margin_bottom| HeadingStyle {
            size,
            color: hex(color),
            align: TextAlign::Left,
            margin_top,
            margin_bottom,
            padding_bottom: 0.0,
            border_bottom: None,
        };

        Self {
            page: PageStyle {
                size: PageSize::Letter,
                margin: INCH,
                page_numbers: true,
                footer_size: 10.0,
                footer_color: hex(0x666666),
            },
            body: BodyStyle {
                size: 11.0,
                line_height: 1.6,
                color: hex(0x1a1a1a),
            },
            headings: [
                HeadingStyle {
                    align: TextAlign::Center,
                    padding_bottom: 12.0,
                    border_bottom: Some(Border {
                        width: 2.0 * PX,
                        color: hex(0x1a365d),
                    }),
                    ..heading(24.0, 0x1a365d, 0.0, 8.0)
                },
                HeadingStyle {
                    padding_bottom: 6.0,
                    border_bottom: Some(Border {
                        width: PX,
                        color: hex(0xe2e8f0),
                    }),
                    ..heading(14.0, 0x2d3748, 24.0, 12.0)
                },
                heading(12.0, 0x4a5568, 18.0, 8.0),
                heading(11.0, 0x4a5568, 12.0, 6.0),
            ],
            paragraph: ParagraphStyle {
                size: None,
                color: None,
                italic: None,
                align: TextAlign::Justify,
                margin_bottom: 12.0,
            },
            lead_paragraph: ParagraphStyle {
                size: Some(12.0),
                color: Some(hex(0x4a5568)),
                italic: Some(true),
                align: TextAlign::Center,
                margin_bottom: 6.0,
            },
            byline_paragraph: ParagraphStyle {
                size: Some(10.0),
                color: Some(hex(0x718096)),
                italic: None,
                align: TextAlign::Center,
                margin_bottom: 24.0,
            },
            list: ListStyle {
                margin_bottom: 12.0,
                padding_left: 24.0,
                item_margin_bottom: 6.0,
                marker_gap: 6.0,
            },
            inline_code: InlineCodeStyle {
                size: 9.0,
                color: hex(0xc53030),
                background: hex(0xf7fafc),
                padding_x: 4.0,
            },
            code_block: CodeBlockStyle {
                size: 9.0,
                color: hex(0xe2e8f0),
                background: hex(0x1a202c),
                padding: 12.0,
                margin: 12.0,
            },
            blockquote: BlockquoteStyle {
                border_left: Border {
                    width: 3.0,
                    color: hex(0x4299e1),
                },
                background: hex(0xebf8ff),
                color: hex(0x2b6cb0),
                padding_y: 8.0,
                padding_x: 16.0,
                margin: 12.0,
            },
            rule: RuleStyle {
                border: Border {
                    width: PX,
                    color: hex(0xe2e8f0),
                },
                margin: 24.0,
            },
            strong_color: hex(0x1a202c),
            link_color: hex(0x3182ce),
            table: TableStyle {
                size: 10.0,
                margin: 12.0,
                cell_padding: 8.0,
                border: Border {
                    width: PX,
                    color: hex(0xe2e8f0),
                },
                header_background: hex(0xedf2f7),
            },
            closing_heading: ClosingHeadingStyle {
                margin_top: 36.0,
                border_top: Border {
                    width: 2.0 * PX,
                    color: hex(0x1a365d),
                },
                padding_top: 18.0,
            },
        }
    }
}

impl StyleSheet {
    /// Rule for heading level 1–6.
    pub fn heading(&self, level: usize) -> &HeadingStyle {
        &self.headings[level.clamp(1, 4) - 1]
    }

    /// Full CSS text: the generated `@page` block followed by [`BASE_CSS`].
    pub fn to_css(&self) -> String {
        let margin_in = self.page.margin / INCH;
        let mut css = format!(
            "@page {{\n    size: {};\n    margin: {margin_in}in {margin_in}in {margin_in}in {margin_in}in;\n",
            self.page.size.css_name()
        );
        if self.page.page_numbers {
            css.push_str(&format!(
                "\n    @bottom-center {{\n        content: counter(page);\n        \
                 font-family: 'Georgia', serif;\n        font-size: {}pt;\n        color: {};\n    }}\n",
                self.page.footer_size, self.page.footer_color
            ));
        }
        css.push_str("}\n");
        css.push_str(BASE_CSS);
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_from_hex() {
        assert_eq!(Color::from_hex("#1a365d"), Some(Color::rgb(0x1a, 0x36, 0x5d)));
        assert_eq!(Color::from_hex("#666"), Some(Color::rgb(0x66, 0x66, 0x66)));
        assert_eq!(Color::from_hex("1a365d"), None);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn color_display_round_trips() {
        let c = Color::rgb(0x2b, 0x6c, 0xb0);
        assert_eq!(c.to_string(), "#2b6cb0");
        assert_eq!(Color::from_hex(&c.to_string()), Some(c));
    }

    #[test]
    fn typed_rules_match_css_text() {
        let sheet = StyleSheet::default();
        let css = sheet.to_css();

        assert!(css.contains("size: letter;"));
        assert!(css.contains("margin: 1in 1in 1in 1in;"));
        assert!(css.contains("content: counter(page);"));

        // Every colour the typed sheet uses must appear in the CSS.
        for color in [
            sheet.body.color,
            sheet.heading(1).color,
            sheet.heading(2).color,
            sheet.heading(3).color,
            sheet.inline_code.color,
            sheet.code_block.background,
            sheet.blockquote.background,
            sheet.blockquote.border_left.color,
            sheet.table.header_background,
            sheet.link_color,
            sheet.strong_color,
        ] {
            assert!(css.contains(&color.to_string()), "missing {color}");
        }
    }

    #[test]
    fn page_block_follows_page_style() {
        let mut sheet = StyleSheet::default();
        sheet.page.size = PageSize::A4;
        sheet.page.page_numbers = false;
        sheet.page.margin = 54.0;

        let css = sheet.to_css();
        assert!(css.contains("size: A4;"));
        assert!(css.contains("margin: 0.75in"));
        assert!(!css.contains("counter(page)"));
    }

    #[test]
    fn deep_headings_reuse_h4_rule() {
        let sheet = StyleSheet::default();
        assert_eq!(sheet.heading(6), sheet.heading(4));
        assert_eq!(sheet.heading(1).size, 24.0);
        assert_eq!(sheet.heading(1).align, TextAlign::Center);
    }
}
