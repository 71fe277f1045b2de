//! Layout engine: parsed HTML + [`StyleSheet`] → positioned drawing operations.
//!
//! The engine walks the parsed document's token stream once, keeping a cursor that moves down
//! the current page. Inline content is buffered until its block closes, then
//! broken into lines, aligned and emitted. Backgrounds (blockquotes, code
//! blocks) are "panels": their rectangles are inserted beneath the text once
//! their extent on a page is known, and split across page breaks.
//!
//! All coordinates are in points measured from the top-left corner of the
//! page; the painter flips them into PDF space.
//!
//! Table rows taller than the remaining space move to the next page; rows
//! taller than a whole page are split between lines and continue there.
//!
//! Sibling-sensitive rules (`p:first-of-type`, `p:nth-of-type(2)`,
//! `h3:last-of-type`) are resolved per container element: the document body,
//! `blockquote`, `li`, `th` and `td`.

use super::html::{tokenize, Token};
use super::metrics::FontMetrics;
use crate::style::{Border, Color, FontFace, FontFamily, StyleSheet, TextAlign};
use tracing::{debug, trace};

/// Vertical position of the baseline inside the em box.
const ASCENT: f32 = 0.8;

/// One drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        baseline: f32,
        text: String,
        face: FontFace,
        size: f32,
        color: Color,
    },
    Rect {
        x: f32,
        top: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        stroke: Option<Border>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        border: Border,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

/// A fully paginated document, ready to paint.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub width: f32,
    pub height: f32,
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text run on every page, in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| {
            p.ops.iter().filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
        })
    }
}

/// Lay out an HTML document with the given style sheet, measuring text with
/// the standard fonts only.
pub fn layout_document(html: &str, sheet: &StyleSheet) -> DocumentLayout {
    layout_document_with_metrics(html, sheet, &FontMetrics::standard())
}

/// Lay out an HTML document, measuring text with `metrics`.
pub fn layout_document_with_metrics(
    html: &str,
    sheet: &StyleSheet,
    metrics: &FontMetrics,
) -> DocumentLayout {
    let tokens = body_tokens(tokenize(html));
    let h3_totals = count_h3_per_container(&tokens);

    let mut engine = Engine::new(sheet, metrics, h3_totals);
    for token in &tokens {
        engine.handle(token);
    }
    let layout = engine.finish();
    debug!("Laid out {} page(s)", layout.page_count());
    layout
}

// ── Token preparation ────────────────────────────────────────────────────

/// Elements whose content never reaches the page.
fn is_hidden(name: &str) -> bool {
    matches!(name, "head" | "title" | "style" | "script")
}

/// Elements that scope `:first-of-type` / `:last-of-type` counting.
fn is_container(name: &str) -> bool {
    matches!(name, "blockquote" | "li" | "th" | "td")
}

/// Drop everything inside hidden elements.
fn body_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut hidden = 0usize;
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match &token {
            Token::Start { name, .. } if is_hidden(name) => hidden += 1,
            Token::End(name) if is_hidden(name) => hidden = hidden.saturating_sub(1),
            _ if hidden > 0 => {}
            _ => out.push(token),
        }
    }
    out
}

/// Number of direct `h3` children of each container, in opening order.
/// Index 0 is the document body.
fn count_h3_per_container(tokens: &[Token]) -> Vec<usize> {
    let mut totals = vec![0usize];
    let mut stack = vec![0usize];
    for token in tokens {
        match token {
            Token::Start { name, .. } if is_container(name) => {
                totals.push(0);
                stack.push(totals.len() - 1);
            }
            Token::End(name) if is_container(name) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Token::Start { name, .. } if name == "h3" => {
                if let Some(&id) = stack.last() {
                    totals[id] += 1;
                }
            }
            _ => {}
        }
    }
    totals
}

// ── Engine state ─────────────────────────────────────────────────────────

/// Resolved style of one inline run.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RunStyle {
    face: FontFace,
    size: f32,
    color: Color,
    underline: bool,
    background: Option<Color>,
}

#[derive(Debug, Clone)]
enum Inline {
    Text(String, RunStyle),
    Break,
}

/// Inherited block-level text properties.
#[derive(Debug, Clone, Copy)]
struct BlockText {
    family: FontFamily,
    size: f32,
    color: Color,
    bold: bool,
    italic: bool,
    align: TextAlign,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum InlineTag {
    Strong,
    Em,
    Code,
    Link,
}

#[derive(Debug, Clone, Copy)]
enum Open {
    Paragraph { margin_bottom: f32 },
    Heading { level: usize },
    List { indent: f32 },
    Item,
    Panel { inset_left: f32, inset_right: f32, code: bool },
    Table,
    Cell { header: bool, align: TextAlign },
    Inline(InlineTag),
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: Open,
    text: Option<BlockText>,
}

/// An open background box. `insert_at` is the op index on the current page
/// where its rectangles go so they paint beneath the content.
#[derive(Debug, Clone, Copy)]
struct Panel {
    fill: Color,
    left_border: Option<Border>,
    x: f32,
    width: f32,
    segment_top: f32,
    insert_at: usize,
}

#[derive(Debug, Default)]
struct Siblings {
    paragraphs: usize,
    h3_seen: usize,
    h3_total: usize,
}

struct ListFrame {
    ordered: bool,
    next: u64,
}

struct Cell {
    runs: Vec<Inline>,
    header: bool,
    align: TextAlign,
}

/// Column geometry shared by every row of one table.
struct TableGrid {
    columns: usize,
    x0: f32,
    column_width: f32,
    inner_width: f32,
    padding: f32,
    border: Border,
    header_background: Color,
    min_content: f32,
}

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    style: RunStyle,
    width: f32,
    space_before: f32,
}

#[derive(Debug, Clone)]
struct Line {
    pieces: Vec<Piece>,
    font_size: f32,
    /// Last line of its paragraph or ended by `<br>`: never justified.
    last: bool,
}

impl Line {
    fn empty(base_size: f32) -> Self {
        Self {
            pieces: Vec::new(),
            font_size: base_size,
            last: false,
        }
    }

    fn push(&mut self, piece: Piece) {
        self.font_size = self.font_size.max(piece.style.size);
        self.pieces.push(piece);
    }

    fn natural_width(&self) -> f32 {
        self.pieces.iter().map(|p| p.space_before + p.width).sum()
    }

    fn gaps(&self) -> usize {
        self.pieces
            .iter()
            .skip(1)
            .filter(|p| p.space_before > 0.0)
            .count()
    }
}

struct Engine<'s> {
    sheet: &'s StyleSheet,
    metrics: &'s FontMetrics,
    page_width: f32,
    page_height: f32,
    content_top: f32,
    content_bottom: f32,
    content_left: f32,
    content_right: f32,

    pages: Vec<PageLayout>,
    cursor: f32,
    pending_margin: f32,
    inset_left: f32,
    inset_right: f32,

    root_text: BlockText,
    open: Vec<(String, Frame)>,
    inline: Vec<Inline>,
    marker: Option<(String, RunStyle)>,
    panels: Vec<Panel>,
    lists: Vec<ListFrame>,
    table: Option<Vec<Vec<Cell>>>,
    preformatted: usize,
    pre_text: String,

    containers: Vec<Siblings>,
    h3_totals: Vec<usize>,
    next_container: usize,
}

impl<'s> Engine<'s> {
    fn new(sheet: &'s StyleSheet, metrics: &'s FontMetrics, h3_totals: Vec<usize>) -> Self {
        let (page_width, page_height) = sheet.page.size.dimensions();
        let margin = sheet.page.margin;
        let root = Siblings {
            h3_total: h3_totals.first().copied().unwrap_or(0),
            ..Siblings::default()
        };

        Self {
            sheet,
            metrics,
            page_width,
            page_height,
            content_top: margin,
            content_bottom: page_height - margin,
            content_left: margin,
            content_right: page_width - margin,
            pages: vec![PageLayout::default()],
            cursor: margin,
            pending_margin: 0.0,
            inset_left: 0.0,
            inset_right: 0.0,
            root_text: BlockText {
                family: FontFamily::Serif,
                size: sheet.body.size,
                color: sheet.body.color,
                bold: false,
                italic: false,
                align: TextAlign::Left,
            },
            open: Vec::new(),
            inline: Vec::new(),
            marker: None,
            panels: Vec::new(),
            lists: Vec::new(),
            table: None,
            preformatted: 0,
            pre_text: String::new(),
            containers: vec![root],
            h3_totals,
            next_container: 1,
        }
    }

    // ── Geometry helpers ─────────────────────────────────────────────────

    fn left(&self) -> f32 {
        self.content_left + self.inset_left
    }

    fn right(&self) -> f32 {
        self.content_right - self.inset_right
    }

    fn at_page_top(&self) -> bool {
        self.cursor <= self.content_top + 0.01
    }

    fn push_op(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn op_count(&self) -> usize {
        self.pages.last().map_or(0, |p| p.ops.len())
    }

    fn block(&self) -> BlockText {
        self.open
            .iter()
            .rev()
            .find_map(|(_, f)| f.text)
            .unwrap_or(self.root_text)
    }

    fn line_height(&self, size: f32) -> f32 {
        size * self.sheet.body.line_height
    }

    fn run_style(&self) -> RunStyle {
        let block = self.block();
        let mut style = RunStyle {
            face: FontFace {
                family: block.family,
                bold: block.bold,
                italic: block.italic,
            },
            size: block.size,
            color: block.color,
            underline: false,
            background: None,
        };
        for (_, frame) in &self.open {
            let Open::Inline(tag) = frame.kind else {
                continue;
            };
            match tag {
                InlineTag::Strong => {
                    style.face.bold = true;
                    style.color = self.sheet.strong_color;
                }
                InlineTag::Em => style.face.italic = true,
                InlineTag::Code => {
                    style.face.family = FontFamily::Monospace;
                    if self.preformatted > 0 {
                        style.color = self.sheet.code_block.color;
                    } else {
                        style.size = self.sheet.inline_code.size;
                        style.color = self.sheet.inline_code.color;
                        style.background = Some(self.sheet.inline_code.background);
                    }
                }
                InlineTag::Link => {
                    style.color = self.sheet.link_color;
                    style.underline = true;
                }
            }
        }
        style
    }

    // ── Vertical flow ────────────────────────────────────────────────────

    /// Collapse `margin` with the pending bottom margin and advance.
    /// Margins vanish at the top of a page.
    fn apply_margin(&mut self, margin: f32) {
        let space = self.pending_margin.max(margin);
        self.pending_margin = 0.0;
        if !self.at_page_top() {
            self.cursor += space;
            if self.cursor > self.content_bottom {
                self.new_page();
            }
        }
    }

    /// Start a new page unless `height` still fits on this one.
    fn ensure_space(&mut self, height: f32) {
        if self.cursor + height > self.content_bottom + 0.01 && !self.at_page_top() {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        let bottom = self.content_bottom;
        for i in (0..self.panels.len()).rev() {
            let panel = self.panels[i];
            self.draw_panel(&panel, bottom);
        }
        self.pages.push(PageLayout::default());
        self.cursor = self.content_top;
        for panel in &mut self.panels {
            panel.segment_top = self.content_top;
            panel.insert_at = 0;
        }
        trace!("Page break → page {}", self.pages.len());
    }

    fn open_panel(&mut self, fill: Color, left_border: Option<Border>) {
        let x = self.left();
        let width = self.right() - x;
        let panel = Panel {
            fill,
            left_border,
            x,
            width,
            segment_top: self.cursor,
            insert_at: self.op_count(),
        };
        self.panels.push(panel);
    }

    fn close_panel(&mut self) {
        if let Some(panel) = self.panels.pop() {
            let bottom = self.cursor;
            self.draw_panel(&panel, bottom);
        }
    }

    fn draw_panel(&mut self, panel: &Panel, bottom: f32) {
        let height = bottom - panel.segment_top;
        if height <= 0.0 {
            return;
        }
        let mut rects = vec![DrawOp::Rect {
            x: panel.x,
            top: panel.segment_top,
            width: panel.width,
            height,
            fill: Some(panel.fill),
            stroke: None,
        }];
        if let Some(border) = panel.left_border {
            rects.push(DrawOp::Rect {
                x: panel.x,
                top: panel.segment_top,
                width: border.width,
                height,
                fill: Some(border.color),
                stroke: None,
            });
        }
        if let Some(page) = self.pages.last_mut() {
            let at = panel.insert_at.min(page.ops.len());
            page.ops.splice(at..at, rects);
        }
    }

    fn horizontal_rule(&mut self, border: Border) {
        let y = self.cursor + border.width / 2.0;
        let (x1, x2) = (self.left(), self.right());
        self.push_op(DrawOp::Line {
            x1,
            y1: y,
            x2,
            y2: y,
            border,
        });
        self.cursor += border.width;
    }

    // ── Token dispatch ───────────────────────────────────────────────────

    fn handle(&mut self, token: &Token) {
        match token {
            Token::Start { name, .. } => {
                if is_container(name) {
                    let total = self.h3_totals.get(self.next_container).copied().unwrap_or(0);
                    self.next_container += 1;
                    self.containers.push(Siblings {
                        h3_total: total,
                        ..Siblings::default()
                    });
                }
                self.start_tag(name, token);
            }
            Token::End(name) => {
                self.end_tag(name);
                if is_container(name) && self.containers.len() > 1 {
                    self.containers.pop();
                }
            }
            Token::Text(text) => self.text(text),
        }
    }

    fn push_frame(&mut self, tag: &str, kind: Open, text: Option<BlockText>) {
        self.open.push((tag.to_string(), Frame { kind, text }));
    }

    fn start_tag(&mut self, name: &str, token: &Token) {
        let sheet = self.sheet;
        match name {
            "p" => {
                self.flush_inline();
                let ordinal = self.containers.last_mut().map_or(0, |c| {
                    c.paragraphs += 1;
                    c.paragraphs
                });
                let rule = match ordinal {
                    1 => &sheet.lead_paragraph,
                    2 => &sheet.byline_paragraph,
                    _ => &sheet.paragraph,
                };
                self.apply_margin(0.0);
                let parent = self.block();
                let text = BlockText {
                    size: rule.size.unwrap_or(parent.size),
                    color: rule.color.unwrap_or(parent.color),
                    italic: rule.italic.unwrap_or(parent.italic),
                    align: rule.align,
                    ..parent
                };
                self.push_frame(
                    name,
                    Open::Paragraph {
                        margin_bottom: rule.margin_bottom,
                    },
                    Some(text),
                );
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush_inline();
                let level = usize::from(name.as_bytes()[1] - b'0');
                let rule = sheet.heading(level);
                let closing = level == 3
                    && self.containers.last_mut().is_some_and(|c| {
                        c.h3_seen += 1;
                        c.h3_seen == c.h3_total
                    });
                if closing {
                    let closing_rule = &sheet.closing_heading;
                    self.apply_margin(closing_rule.margin_top);
                    self.horizontal_rule(closing_rule.border_top);
                    self.cursor += closing_rule.padding_top;
                } else {
                    self.apply_margin(rule.margin_top);
                }
                let parent = self.block();
                let text = BlockText {
                    family: FontFamily::Serif,
                    size: rule.size,
                    color: rule.color,
                    bold: true,
                    align: rule.align,
                    ..parent
                };
                self.push_frame(name, Open::Heading { level }, Some(text));
            }
            "ul" | "ol" => {
                self.flush_inline();
                self.apply_margin(0.0);
                let start = token
                    .attr("start")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1);
                self.lists.push(ListFrame {
                    ordered: name == "ol",
                    next: start,
                });
                let indent = sheet.list.padding_left;
                self.inset_left += indent;
                self.push_frame(name, Open::List { indent }, None);
            }
            "li" => {
                self.flush_inline();
                self.apply_margin(0.0);
                let style = self.run_style();
                let marker = match self.lists.last_mut() {
                    Some(list) if list.ordered => {
                        let n = list.next;
                        list.next += 1;
                        format!("{n}.")
                    }
                    _ => "•".to_string(),
                };
                self.marker = Some((marker, style));
                let text = self.block();
                self.push_frame(name, Open::Item, Some(text));
            }
            "blockquote" => {
                self.flush_inline();
                let rule = &sheet.blockquote;
                self.apply_margin(rule.margin);
                self.open_panel(rule.background, Some(rule.border_left));
                let inset_left = rule.border_left.width + rule.padding_x;
                let inset_right = rule.padding_x;
                self.inset_left += inset_left;
                self.inset_right += inset_right;
                self.cursor += rule.padding_y;
                let text = BlockText {
                    italic: true,
                    color: rule.color,
                    ..self.block()
                };
                self.push_frame(
                    name,
                    Open::Panel {
                        inset_left,
                        inset_right,
                        code: false,
                    },
                    Some(text),
                );
            }
            "pre" => {
                self.flush_inline();
                let rule = &sheet.code_block;
                self.apply_margin(rule.margin);
                self.open_panel(rule.background, None);
                self.inset_left += rule.padding;
                self.inset_right += rule.padding;
                self.cursor += rule.padding;
                self.preformatted += 1;
                self.pre_text.clear();
                let text = BlockText {
                    family: FontFamily::Monospace,
                    size: rule.size,
                    color: rule.color,
                    bold: false,
                    italic: false,
                    align: TextAlign::Left,
                };
                self.push_frame(
                    name,
                    Open::Panel {
                        inset_left: rule.padding,
                        inset_right: rule.padding,
                        code: true,
                    },
                    Some(text),
                );
            }
            "table" => {
                self.flush_inline();
                self.apply_margin(sheet.table.margin);
                self.table = Some(Vec::new());
                let text = BlockText {
                    size: sheet.table.size,
                    ..self.block()
                };
                self.push_frame(name, Open::Table, Some(text));
            }
            "tr" => {
                if let Some(rows) = self.table.as_mut() {
                    rows.push(Vec::new());
                }
            }
            "th" | "td" => {
                let header = name == "th";
                let align = match token.attr("style").or_else(|| token.attr("align")) {
                    Some(s) if s.contains("center") => TextAlign::Center,
                    Some(s) if s.contains("right") => TextAlign::Right,
                    _ => TextAlign::Left,
                };
                let text = BlockText {
                    bold: header || self.block().bold,
                    align,
                    ..self.block()
                };
                self.push_frame(name, Open::Cell { header, align }, Some(text));
            }
            "hr" => {
                self.flush_inline();
                let rule = &sheet.rule;
                self.apply_margin(rule.margin);
                self.ensure_space(rule.border.width);
                self.horizontal_rule(rule.border);
                self.pending_margin = rule.margin;
            }
            "br" => {
                if self.preformatted > 0 {
                    self.pre_text.push('\n');
                } else {
                    self.inline.push(Inline::Break);
                }
            }
            "img" => {
                if let Some(alt) = token.attr("alt").filter(|a| !a.trim().is_empty()) {
                    let style = self.run_style();
                    self.inline.push(Inline::Text(alt.to_string(), style));
                }
            }
            "strong" | "b" => self.push_frame(name, Open::Inline(InlineTag::Strong), None),
            "em" | "i" => self.push_frame(name, Open::Inline(InlineTag::Em), None),
            "code" | "kbd" | "tt" => self.push_frame(name, Open::Inline(InlineTag::Code), None),
            "a" => self.push_frame(name, Open::Inline(InlineTag::Link), None),
            other => trace!("Ignoring <{other}>"),
        }
    }

    fn end_tag(&mut self, name: &str) {
        let Some(pos) = self.open.iter().rposition(|(tag, _)| tag == name) else {
            return;
        };
        while self.open.len() > pos {
            // Close innermost first while its frame (and text style) is still open.
            let Some((_, frame)) = self.open.last().cloned() else {
                break;
            };
            self.close(frame.kind);
            self.open.pop();
        }
    }

    fn close(&mut self, kind: Open) {
        let sheet = self.sheet;
        match kind {
            Open::Paragraph { margin_bottom } => {
                self.flush_inline();
                self.pending_margin = self.pending_margin.max(margin_bottom);
            }
            Open::Heading { level } => {
                self.flush_inline();
                let rule = sheet.heading(level);
                if let Some(border) = rule.border_bottom {
                    self.cursor += rule.padding_bottom;
                    self.horizontal_rule(border);
                }
                self.pending_margin = rule.margin_bottom;
            }
            Open::List { indent } => {
                self.flush_inline();
                self.inset_left -= indent;
                self.lists.pop();
                self.pending_margin = self.pending_margin.max(sheet.list.margin_bottom);
            }
            Open::Item => {
                self.flush_inline();
                self.marker = None;
                self.pending_margin = self.pending_margin.max(sheet.list.item_margin_bottom);
            }
            Open::Panel {
                inset_left,
                inset_right,
                code,
            } => {
                let (padding_bottom, margin) = if code {
                    self.emit_preformatted();
                    self.preformatted = self.preformatted.saturating_sub(1);
                    (sheet.code_block.padding, sheet.code_block.margin)
                } else {
                    self.flush_inline();
                    // Child margins stay inside the padded box.
                    if !self.at_page_top() {
                        self.cursor += self.pending_margin;
                    }
                    self.pending_margin = 0.0;
                    (sheet.blockquote.padding_y, sheet.blockquote.margin)
                };
                self.cursor += padding_bottom;
                self.close_panel();
                self.inset_left -= inset_left;
                self.inset_right -= inset_right;
                self.pending_margin = margin;
            }
            Open::Table => {
                if let Some(rows) = self.table.take() {
                    self.layout_table(rows);
                }
                self.pending_margin = sheet.table.margin;
            }
            Open::Cell { header, align } => {
                let runs = std::mem::take(&mut self.inline);
                match self.table.as_mut() {
                    Some(rows) => {
                        if rows.is_empty() {
                            rows.push(Vec::new());
                        }
                        if let Some(row) = rows.last_mut() {
                            row.push(Cell {
                                runs,
                                header,
                                align,
                            });
                        }
                    }
                    None => {
                        self.inline = runs;
                        self.flush_inline();
                    }
                }
            }
            Open::Inline(_) => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.preformatted > 0 {
            self.pre_text.push_str(text);
            return;
        }
        let in_cell = self
            .open
            .iter()
            .any(|(_, f)| matches!(f.kind, Open::Cell { .. }));
        if self.table.is_some() && !in_cell {
            return;
        }
        if self.inline.is_empty() && text.chars().all(is_layout_space) {
            return;
        }
        let style = self.run_style();
        self.inline.push(Inline::Text(text.to_string(), style));
    }

    // ── Inline layout ────────────────────────────────────────────────────

    /// Lay out buffered inline content as lines of the current block.
    fn flush_inline(&mut self) {
        if self.inline.is_empty() {
            return;
        }
        let items = std::mem::take(&mut self.inline);
        let block = self.block();
        let x = self.left();
        let width = self.right() - x;

        for line in self.break_lines(&items, width, block.size) {
            let height = self.line_height(line.font_size);
            self.ensure_space(height);
            let top = self.cursor;
            let baseline = self.emit_line(&line, x, width, top, block.align);
            if let Some((marker, style)) = self.marker.take() {
                let marker_width = self.metrics.text_width(&marker, style.face, style.size);
                self.push_op(DrawOp::Text {
                    x: x - self.sheet.list.marker_gap - marker_width,
                    baseline,
                    text: marker,
                    face: style.face,
                    size: style.size,
                    color: style.color,
                });
            }
            self.cursor += height;
        }
    }

    fn piece_width(&self, text: &str, style: &RunStyle) -> f32 {
        let padding = if style.background.is_some() {
            2.0 * self.sheet.inline_code.padding_x
        } else {
            0.0
        };
        self.metrics.text_width(text, style.face, style.size) + padding
    }

    /// Greedy line breaking. Runs glued together without whitespace
    /// (`**word**,`) move to the next line as a unit.
    fn break_lines(&self, items: &[Inline], width: f32, base_size: f32) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut line = Line::empty(base_size);
        let mut space: Option<RunStyle> = None;
        let mut word_start = 0usize;

        for item in items {
            let (text, style) = match item {
                Inline::Break => {
                    line.last = true;
                    lines.push(std::mem::replace(&mut line, Line::empty(base_size)));
                    space = None;
                    word_start = 0;
                    continue;
                }
                Inline::Text(text, style) => (text, *style),
            };

            for (is_space, chunk) in whitespace_runs(text) {
                if is_space {
                    if !line.pieces.is_empty() {
                        space = Some(style);
                    }
                    continue;
                }

                let mut space_before = space
                    .take()
                    .map_or(0.0, |s| self.metrics.text_width(" ", s.face, s.size));
                let glued = space_before == 0.0 && !line.pieces.is_empty();
                let chunk_width = self.piece_width(chunk, &style);

                if !line.pieces.is_empty() && line.natural_width() + space_before + chunk_width > width {
                    let carried = if glued && word_start > 0 {
                        line.pieces.split_off(word_start)
                    } else {
                        Vec::new()
                    };
                    line.font_size = line
                        .pieces
                        .iter()
                        .fold(base_size, |m, p| m.max(p.style.size));
                    let mut next = Line::empty(base_size);
                    for (i, mut piece) in carried.into_iter().enumerate() {
                        if i == 0 {
                            piece.space_before = 0.0;
                        }
                        next.push(piece);
                    }
                    lines.push(std::mem::replace(&mut line, next));
                    word_start = 0;
                    if line.pieces.is_empty() {
                        space_before = 0.0;
                    }
                }

                if !glued {
                    word_start = line.pieces.len();
                }

                if chunk_width > width && line.pieces.is_empty() {
                    let mut parts = split_to_width(chunk, &style, width, self);
                    let tail = parts.pop().unwrap_or_default();
                    for part in parts {
                        let mut full = Line::empty(base_size);
                        let part_width = self.piece_width(&part, &style);
                        full.push(Piece {
                            text: part,
                            style,
                            width: part_width,
                            space_before: 0.0,
                        });
                        lines.push(full);
                    }
                    let tail_width = self.piece_width(&tail, &style);
                    line.push(Piece {
                        text: tail,
                        style,
                        width: tail_width,
                        space_before: 0.0,
                    });
                    continue;
                }

                line.push(Piece {
                    text: chunk.to_string(),
                    style,
                    width: chunk_width,
                    space_before,
                });
            }
        }

        if !line.pieces.is_empty() {
            lines.push(line);
        }
        if let Some(last) = lines.last_mut() {
            last.last = true;
        }
        lines
    }

    /// Emit one line; returns its baseline.
    fn emit_line(&mut self, line: &Line, x: f32, width: f32, top: f32, align: TextAlign) -> f32 {
        let slack = (width - line.natural_width()).max(0.0);
        let gaps = line.gaps();
        let (mut pen, stretch) = match align {
            TextAlign::Center => (x + slack / 2.0, 0.0),
            TextAlign::Right => (x + slack, 0.0),
            TextAlign::Justify if !line.last && gaps > 0 => (x, slack / gaps as f32),
            _ => (x, 0.0),
        };
        let height = self.line_height(line.font_size);
        let baseline = top + (height - line.font_size) / 2.0 + line.font_size * ASCENT;
        let padding = self.sheet.inline_code.padding_x;

        for piece in &line.pieces {
            if piece.space_before > 0.0 {
                pen += piece.space_before + stretch;
            }
            let style = piece.style;
            let mut text_x = pen;
            if let Some(background) = style.background {
                self.push_op(DrawOp::Rect {
                    x: pen,
                    top: baseline - style.size * ASCENT - 2.0,
                    width: piece.width,
                    height: style.size + 4.0,
                    fill: Some(background),
                    stroke: None,
                });
                text_x += padding;
            }
            self.push_op(DrawOp::Text {
                x: text_x,
                baseline,
                text: piece.text.clone(),
                face: style.face,
                size: style.size,
                color: style.color,
            });
            if style.underline {
                let y = baseline + style.size * 0.12;
                self.push_op(DrawOp::Line {
                    x1: pen,
                    y1: y,
                    x2: pen + piece.width,
                    y2: y,
                    border: Border {
                        width: (style.size * 0.05).max(0.5),
                        color: style.color,
                    },
                });
            }
            pen += piece.width;
        }
        baseline
    }

    /// Lay out `<pre>` content: whitespace kept, long lines wrapped.
    fn emit_preformatted(&mut self) {
        let raw = std::mem::take(&mut self.pre_text);
        let body = raw.strip_suffix('\n').unwrap_or(&raw);
        if body.is_empty() {
            return;
        }
        let block = self.block();
        let style = RunStyle {
            face: FontFace {
                family: block.family,
                bold: false,
                italic: false,
            },
            size: block.size,
            color: block.color,
            underline: false,
            background: None,
        };
        let x = self.left();
        let width = self.right() - x;
        let height = self.line_height(style.size);

        for source_line in body.split('\n') {
            let expanded = source_line.trim_end_matches('\r').replace('\t', "    ");
            let visual = if expanded.is_empty() {
                vec![String::new()]
            } else {
                split_to_width(&expanded, &style, width, self)
            };
            for text in visual {
                self.ensure_space(height);
                let baseline = self.cursor + (height - style.size) / 2.0 + style.size * ASCENT;
                if !text.trim().is_empty() {
                    self.push_op(DrawOp::Text {
                        x,
                        baseline,
                        text,
                        face: style.face,
                        size: style.size,
                        color: style.color,
                    });
                }
                self.cursor += height;
            }
        }
    }

    // ── Tables ───────────────────────────────────────────────────────────

    fn layout_table(&mut self, rows: Vec<Vec<Cell>>) {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return;
        }
        let rule = &self.sheet.table;
        let x0 = self.left();
        let column_width = (self.right() - x0) / columns as f32;
        let padding = rule.cell_padding;
        let base_size = self.block().size;
        let grid = TableGrid {
            columns,
            x0,
            column_width,
            inner_width: (column_width - 2.0 * padding).max(1.0),
            padding,
            border: rule.border,
            header_background: rule.header_background,
            min_content: self.line_height(base_size),
        };
        let page_room = self.content_bottom - self.content_top;

        for row in rows {
            let wrapped: Vec<Vec<Line>> = row
                .iter()
                .map(|cell| self.break_lines(&cell.runs, grid.inner_width, base_size))
                .collect();
            let content_height = wrapped
                .iter()
                .map(|lines| {
                    lines
                        .iter()
                        .map(|l| self.line_height(l.font_size))
                        .sum::<f32>()
                })
                .fold(grid.min_content, f32::max);
            let row_height = content_height + 2.0 * padding;
            if row_height <= page_room {
                self.ensure_space(row_height);
            }
            self.place_row(&row, &wrapped, &grid);
        }
    }

    /// Draw one row, continuing on following pages when its lines run past
    /// the bottom margin. Each page gets its own bordered segment.
    fn place_row(&mut self, row: &[Cell], wrapped: &[Vec<Line>], grid: &TableGrid) {
        let mut next = vec![0usize; wrapped.len()];
        loop {
            let top = self.cursor;
            let limit = self.content_bottom - grid.padding;
            let at_top = self.at_page_top();

            let mut taken = Vec::with_capacity(wrapped.len());
            let mut used = 0.0f32;
            for (lines, &from) in wrapped.iter().zip(&next) {
                let mut to = from;
                let mut y = top + grid.padding;
                while let Some(line) = lines.get(to) {
                    let height = self.line_height(line.font_size);
                    // A fresh page always takes at least one line.
                    if y + height > limit + 0.01 && !(to == from && at_top) {
                        break;
                    }
                    y += height;
                    to += 1;
                }
                used = used.max(y - top - grid.padding);
                taken.push(from..to);
            }

            let done = wrapped.iter().zip(&taken).all(|(lines, r)| r.end >= lines.len());
            if !done && taken.iter().all(|r| r.is_empty()) {
                self.new_page();
                continue;
            }
            let height = if done {
                used.max(grid.min_content) + 2.0 * grid.padding
            } else {
                self.content_bottom - top
            };

            for column in 0..grid.columns {
                let x = grid.x0 + column as f32 * grid.column_width;
                let cell = row.get(column);
                self.push_op(DrawOp::Rect {
                    x,
                    top,
                    width: grid.column_width,
                    height,
                    fill: cell
                        .is_some_and(|c| c.header)
                        .then_some(grid.header_background),
                    stroke: Some(grid.border),
                });
                let (Some(cell), Some(lines), Some(range)) =
                    (cell, wrapped.get(column), taken.get(column))
                else {
                    continue;
                };
                let mut y = top + grid.padding;
                for line in &lines[range.clone()] {
                    self.emit_line(line, x + grid.padding, grid.inner_width, y, cell.align);
                    y += self.line_height(line.font_size);
                }
            }

            self.cursor = top + height;
            if done {
                break;
            }
            trace!("Table row continues on the next page");
            next = taken.iter().map(|r| r.end).collect();
            self.new_page();
        }
    }

    // ── Finish ───────────────────────────────────────────────────────────

    fn finish(mut self) -> DocumentLayout {
        self.flush_inline();
        while let Some((_, frame)) = self.open.last().cloned() {
            self.close(frame.kind);
            self.open.pop();
        }
        while !self.panels.is_empty() {
            self.close_panel();
        }
        if self.pages.len() > 1 && self.pages.last().is_some_and(|p| p.ops.is_empty()) {
            self.pages.pop();
        }

        if self.sheet.page.page_numbers {
            let page = &self.sheet.page;
            let face = FontFace::SERIF;
            let baseline = self.page_height - page.margin / 2.0 + page.footer_size * 0.3;
            for (i, layout) in self.pages.iter_mut().enumerate() {
                let text = (i + 1).to_string();
                let width = self.metrics.text_width(&text, face, page.footer_size);
                layout.ops.push(DrawOp::Text {
                    x: (self.page_width - width) / 2.0,
                    baseline,
                    text,
                    face,
                    size: page.footer_size,
                    color: page.footer_color,
                });
            }
        }

        DocumentLayout {
            width: self.page_width,
            height: self.page_height,
            pages: self.pages,
        }
    }
}

/// Whitespace that collapses in normal flow. Non-breaking spaces are text.
fn is_layout_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}

/// Split `text` into alternating whitespace / non-whitespace runs.
fn whitespace_runs(text: &str) -> Vec<(bool, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let space = is_layout_space(c);
        match current {
            Some(kind) if kind == space => {}
            Some(kind) => {
                runs.push((kind, &text[start..i]));
                start = i;
                current = Some(space);
            }
            None => current = Some(space),
        }
    }
    if let Some(kind) = current {
        runs.push((kind, &text[start..]));
    }
    runs
}

/// Break `text` into pieces no wider than `width` (at least one char each).
fn split_to_width(text: &str, style: &RunStyle, width: f32, engine: &Engine<'_>) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if current.chars().count() > 1 && engine.piece_width(&current, style) > width {
            current.pop();
            parts.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::assemble::assemble_document;
    use crate::pipeline::markup::markdown_to_html;
    use crate::pipeline::render::metrics::{text_width, FallbackFont};

    fn layout_markdown(md: &str) -> DocumentLayout {
        let fragment = markdown_to_html(md, &Default::default());
        layout_document(&assemble_document(&fragment, "Test"), &StyleSheet::default())
    }

    fn text_ops(layout: &DocumentLayout) -> Vec<(&str, f32, f32, FontFace, f32)> {
        layout
            .pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Text {
                    text,
                    x,
                    baseline,
                    face,
                    size,
                    ..
                } => Some((text.as_str(), *x, *baseline, *face, *size)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_document_has_one_numbered_page() {
        let layout = layout_markdown("");
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.texts().collect::<Vec<_>>(), vec!["1"]);
        assert_eq!((layout.width, layout.height), (612.0, 792.0));
    }

    #[test]
    fn title_is_not_rendered() {
        let layout = layout_markdown("Body text");
        assert!(!layout.texts().any(|t| t == "Test"));
    }

    #[test]
    fn every_word_reaches_the_page() {
        let md = "# The Disconnected Pipeline\n\nData flows *between* teams.\n\n\
                  Second paragraph with `code` and a [link](https://example.com).\n\n\
                  - alpha\n- beta\n\n> quoted wisdom\n";
        let layout = layout_markdown(md);
        let texts: Vec<&str> = layout.texts().collect();
        for word in [
            "The", "Disconnected", "Pipeline", "Data", "flows", "between", "teams.", "code",
            "link", "alpha", "beta", "quoted", "wisdom",
        ] {
            assert!(texts.contains(&word), "missing {word:?} in {texts:?}");
        }
    }

    #[test]
    fn h1_is_centred_bold_with_rule() {
        let layout = layout_markdown("# Title");
        let ops = &layout.pages[0].ops;
        let (x, face, size) = ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text {
                    text, x, face, size, ..
                } if text == "Title" => Some((*x, *face, *size)),
                _ => None,
            })
            .unwrap();
        assert!(face.bold);
        assert_eq!(size, 24.0);
        let width = text_width("Title", face, size);
        assert!((x + width / 2.0 - 306.0).abs() < 0.5, "not centred: x={x}");
        assert!(ops.iter().any(|op| matches!(
            op,
            DrawOp::Line { border, .. } if border.color == StyleSheet::default().heading(1).color
        )));
    }

    #[test]
    fn first_and_second_paragraph_variants() {
        let layout = layout_markdown("Lead text\n\nByline text\n\nBody text");
        let ops = text_ops(&layout);
        let lead = ops.iter().find(|o| o.0 == "Lead").unwrap();
        let byline = ops.iter().find(|o| o.0 == "Byline").unwrap();
        let body = ops.iter().find(|o| o.0 == "Body").unwrap();
        assert!(lead.3.italic);
        assert_eq!(lead.4, 12.0);
        assert_eq!(byline.4, 10.0);
        assert!(!byline.3.italic);
        assert_eq!(body.4, 11.0);
        // Body is justified from the left margin; variants are centred.
        assert_eq!(body.1, 72.0);
        assert!(lead.1 > 72.0);
    }

    #[test]
    fn long_paragraph_is_justified() {
        let words = "lorem ipsum dolor sit amet ".repeat(30);
        let md = format!("one\n\ntwo\n\n{words}");
        let layout = layout_markdown(&md);
        let ops = text_ops(&layout);
        let lines: Vec<f32> = ops
            .iter()
            .filter(|o| o.0 == "lorem" && o.1 == 72.0)
            .map(|o| o.2)
            .collect();
        assert!(lines.len() > 1, "expected wrapping");
        // Every justified (non-final) line ends at the right margin.
        let baseline = lines[0];
        let last_on_line = ops
            .iter()
            .filter(|o| o.2 == baseline)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();
        let end = last_on_line.1 + text_width(last_on_line.0, last_on_line.3, last_on_line.4);
        assert!((end - 540.0).abs() < 0.5, "line ends at {end}");
    }

    #[test]
    fn long_documents_paginate_with_numbers() {
        let md = (0..200)
            .map(|i| format!("Paragraph number {i} with some filler text."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let layout = layout_markdown(&md);
        assert!(layout.page_count() > 3);
        for (i, page) in layout.pages.iter().enumerate() {
            let Some(DrawOp::Text { text, baseline, .. }) = page.ops.last() else {
                panic!("page {i} has no footer");
            };
            assert_eq!(text, &(i + 1).to_string());
            assert!(*baseline > 792.0 - 72.0);
        }
        // Nothing is drawn into the bottom margin except the footer.
        for page in &layout.pages {
            for op in &page.ops[..page.ops.len() - 1] {
                if let DrawOp::Text { baseline, .. } = op {
                    assert!(*baseline <= 720.0 + 0.01);
                }
            }
        }
    }

    #[test]
    fn page_numbers_can_be_disabled() {
        let mut sheet = StyleSheet::default();
        sheet.page.page_numbers = false;
        let layout = layout_document("<p>x</p>", &sheet);
        assert_eq!(layout.texts().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn code_block_panel_is_painted_beneath_text() {
        let layout = layout_markdown("```\nlet x = 1;\n    indented\n```\n");
        let ops = &layout.pages[0].ops;
        let rect_index = ops
            .iter()
            .position(|op| matches!(op, DrawOp::Rect { fill: Some(c), .. } if *c == StyleSheet::default().code_block.background))
            .expect("code background");
        let text_index = ops
            .iter()
            .position(|op| matches!(op, DrawOp::Text { text, .. } if text.starts_with("let")))
            .unwrap();
        assert!(rect_index < text_index);
        let indented = text_ops(&layout)
            .into_iter()
            .find(|o| o.0.trim() == "indented")
            .unwrap();
        assert_eq!(indented.0, "    indented");
        assert_eq!(indented.3.family, FontFamily::Monospace);
    }

    #[test]
    fn long_code_lines_wrap_inside_panel() {
        let line = "x".repeat(300);
        let layout = layout_markdown(&format!("```\n{line}\n```\n"));
        let pieces: Vec<_> = text_ops(&layout)
            .into_iter()
            .filter(|o| o.0.starts_with('x'))
            .collect();
        assert!(pieces.len() >= 3);
        let total: usize = pieces.iter().map(|p| p.0.len()).sum();
        assert_eq!(total, 300);
        for p in &pieces {
            assert!(p.1 + text_width(p.0, p.3, p.4) <= 540.0 - 12.0 + 0.01);
        }
    }

    #[test]
    fn blockquote_has_border_and_italic_text() {
        let layout = layout_markdown("intro\n\nbyline\n\n> wise words");
        let sheet = StyleSheet::default();
        let ops = &layout.pages[0].ops;
        assert!(ops.iter().any(|op| matches!(
            op,
            DrawOp::Rect { fill: Some(c), width, .. } if *c == sheet.blockquote.border_left.color && *width == 3.0
        )));
        let wise = text_ops(&layout).into_iter().find(|o| o.0 == "wise").unwrap();
        assert!(wise.3.italic);
        assert!(wise.1 >= 72.0 + 3.0 + 16.0);
    }

    #[test]
    fn list_markers_sit_left_of_items() {
        let layout = layout_markdown("p1\n\np2\n\n1. first\n2. second\n\n- bullet");
        let ops = text_ops(&layout);
        let first = ops.iter().find(|o| o.0 == "first").unwrap();
        let marker = ops.iter().find(|o| o.0 == "1.").unwrap();
        assert_eq!(first.1, 72.0 + 24.0);
        assert!(marker.1 < first.1);
        assert_eq!(marker.2, first.2);
        assert!(ops.iter().any(|o| o.0 == "2."));
        assert!(ops.iter().any(|o| o.0 == "•"));
    }

    #[test]
    fn ordered_list_honours_start() {
        let layout = layout_markdown("3. three\n4. four");
        assert!(layout.texts().any(|t| t == "3."));
        assert!(layout.texts().any(|t| t == "4."));
    }

    #[test]
    fn table_cells_are_bordered_and_header_shaded() {
        let layout = layout_markdown("| Name | Value |\n|------|------:|\n| a | 1 |\n| b | 2 |\n");
        let sheet = StyleSheet::default();
        let ops = &layout.pages[0].ops;
        let cells: Vec<_> = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Rect { stroke: Some(_), .. }))
            .collect();
        assert_eq!(cells.len(), 6);
        let shaded = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Rect { fill: Some(c), .. } if *c == sheet.table.header_background))
            .count();
        assert_eq!(shaded, 2);

        let text = text_ops(&layout);
        let name = text.iter().find(|o| o.0 == "Name").unwrap();
        assert!(name.3.bold);
        assert_eq!(name.4, 10.0);
        // Right-aligned column ends at the cell's inner edge.
        let one = text.iter().find(|o| o.0 == "1").unwrap();
        let end = one.1 + text_width("1", one.3, one.4);
        assert!((end - (540.0 - 8.0)).abs() < 0.5, "ends at {end}");
    }

    #[test]
    fn last_h3_gets_closing_rule() {
        let layout = layout_markdown("### First\n\ntext\n\n### About the Author\n\nbio");
        let sheet = StyleSheet::default();
        let closing_lines = layout.pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { border, .. } if *border == sheet.closing_heading.border_top))
            .count();
        assert_eq!(closing_lines, 1);
    }

    #[test]
    fn inline_code_has_background() {
        let layout = layout_markdown("a\n\nb\n\nuse `cargo` here");
        let sheet = StyleSheet::default();
        assert!(layout.pages[0].ops.iter().any(|op| matches!(
            op,
            DrawOp::Rect { fill: Some(c), .. } if *c == sheet.inline_code.background
        )));
        let code = text_ops(&layout).into_iter().find(|o| o.0 == "cargo").unwrap();
        assert_eq!(code.3.family, FontFamily::Monospace);
        assert_eq!(code.4, 9.0);
    }

    #[test]
    fn line_breaks_start_new_lines() {
        let layout = layout_markdown("one\ntwo");
        let ops = text_ops(&layout);
        let one = ops.iter().find(|o| o.0 == "one").unwrap();
        let two = ops.iter().find(|o| o.0 == "two").unwrap();
        assert!(two.2 > one.2);
    }

    #[test]
    fn unknown_raw_html_keeps_its_text() {
        let layout = layout_document(
            "<body><div class=\"note\"><span>kept</span></div></body>",
            &StyleSheet::default(),
        );
        assert!(layout.texts().any(|t| t == "kept"));
    }

    #[test]
    fn raw_html_entities_are_decoded() {
        let layout = layout_markdown("<div>A &rarr; B &hearts; C &eacute;t&eacute;</div>");
        let texts: Vec<&str> = layout.texts().collect();
        assert_eq!(texts, vec!["A", "→", "B", "♥", "C", "été", "1"]);
    }

    #[test]
    fn tall_table_row_continues_on_next_pages() {
        let words = "cell ".repeat(4000);
        let layout = layout_markdown(&format!("| Notes |\n|-------|\n| {words} |\n"));
        assert!(layout.page_count() > 2, "pages={}", layout.page_count());

        let bottom = 792.0 - 72.0;
        let mut cells = 0;
        for page in &layout.pages {
            let (footer, body) = page.ops.split_last().unwrap();
            assert!(matches!(footer, DrawOp::Text { baseline, .. } if *baseline > bottom));
            for op in body {
                match op {
                    DrawOp::Text { text, baseline, .. } => {
                        assert!(*baseline <= bottom + 0.01, "{text:?} at {baseline}");
                        if text == "cell" {
                            cells += 1;
                        }
                    }
                    DrawOp::Rect { top, height, .. } => {
                        assert!(top + height <= bottom + 0.01, "rect ends at {}", top + height);
                    }
                    DrawOp::Line { .. } => {}
                }
            }
        }
        assert_eq!(cells, 4000);
    }

    #[test]
    fn rows_that_fit_a_page_are_not_split() {
        let filler = (0..40)
            .map(|i| format!("Paragraph {i} of filler."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let md = format!("{filler}\n\n| A |\n|---|\n| one two three |\n");
        let layout = layout_markdown(&md);
        let pages_with_cell: Vec<usize> = layout
            .pages
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                p.ops
                    .iter()
                    .any(|op| matches!(op, DrawOp::Text { text, .. } if text == "one" || text == "three"))
            })
            .map(|(i, _)| i)
            .collect();
        assert_eq!(pages_with_cell.len(), 1);
    }

    #[test]
    fn fallback_metrics_measure_non_latin_text() {
        let metrics = FontMetrics::with_fallback(FallbackFont::with_widths(
            "test.ttf",
            [('漢', 1000), ('字', 1000)],
        ));
        let sheet = StyleSheet::default();
        let html = assemble_document("<h1>漢字</h1>", "Test");
        let layout = layout_document_with_metrics(&html, &sheet, &metrics);
        let (x, size) = layout.pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, x, size, .. } if text == "漢字" => Some((*x, *size)),
                _ => None,
            })
            .unwrap();
        // Centred using the font's full-em advances.
        assert!((x + size - 306.0).abs() < 0.5, "x={x}");
    }

    #[test]
    fn overlong_word_is_split() {
        let word = "a".repeat(400);
        let layout = layout_markdown(&format!("x\n\ny\n\n{word}"));
        let total: usize = layout
            .texts()
            .filter(|t| t.starts_with('a'))
            .map(str::len)
            .sum();
        assert_eq!(total, 400);
    }

    #[test]
    fn whitespace_runs_alternate() {
        assert_eq!(
            whitespace_runs(" a  bc\n"),
            vec![(true, " "), (false, "a"), (true, "  "), (false, "bc"), (true, "\n")]
        );
        assert!(whitespace_runs("").is_empty());
    }

    #[test]
    fn h3_totals_are_per_container() {
        let tokens = tokenize("<h3>a</h3><blockquote><h3>b</h3><h3>c</h3></blockquote><h3>d</h3>");
        assert_eq!(count_h3_per_container(&tokens), vec![2, 2]);
    }
}
