//! Layout engine – flattens the styled tree into a vertical stream of
//! unbreakable [`Fragment`]s (text lines, table rows, rules) that the
//! paginator distributes over pages.
//!
//! Coordinates inside a fragment are relative to the left edge of the content
//! box and the top of the fragment.

use std::mem;

use crate::dom::Tag;
use crate::fonts::{line_height, measure_text_width, FontFamily};
use crate::layout_config::PageItem;
use crate::style::{Color, ComputedStyle, Display, ListStyle, StyledNode, TextAlign};

/// Baseline position as a fraction of the font size.
const ASCENT: f32 = 0.8;

/// A vertical slice of the document kept on one page unless it is taller
/// than the page.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub height: f32,
    /// Gap above the fragment; dropped at the top of a page.
    pub space_before: f32,
    /// Start a new page before this fragment.
    pub break_before: bool,
    pub items: Vec<PageItem>,
}

/// Horizontal extent of a block's content.
#[derive(Debug, Clone, Copy)]
struct Ctx {
    x: f32,
    width: f32,
}

// ---------------------------------------------------------------------------
// Inline content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct TextStyle {
    font_size: f32,
    family: FontFamily,
    bold: bool,
    italic: bool,
    underline: bool,
    color: [f32; 3],
    background: Option<[f32; 3]>,
}

impl From<&ComputedStyle> for TextStyle {
    fn from(s: &ComputedStyle) -> Self {
        Self {
            font_size: s.font_size,
            family: s.family,
            bold: s.bold,
            italic: s.italic,
            underline: s.underline,
            color: s.color.to_rgb(),
            background: s.background.map(Color::to_rgb),
        }
    }
}

impl TextStyle {
    fn measure(&self, text: &str) -> f32 {
        measure_text_width(text, self.font_size, self.family, self.bold)
    }

    fn item(&self, x: f32, baseline: f32, text: String) -> PageItem {
        PageItem::Text {
            x,
            y: baseline,
            text,
            font_size: self.font_size,
            family: self.family,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            color: self.color,
        }
    }
}

#[derive(Debug, Clone)]
enum Token {
    Word(String, TextStyle),
    Space(TextStyle),
    Break,
}

#[derive(Debug)]
struct Span {
    text: String,
    style: TextStyle,
    x: f32,
    width: f32,
}

#[derive(Debug, Default)]
struct Line {
    spans: Vec<Span>,
    width: f32,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    fn push_word(&mut self, word: &str, style: &TextStyle, space: Option<&TextStyle>) {
        let gap = match space {
            Some(s) if !self.is_empty() => s.measure(" "),
            _ => 0.0,
        };
        match self.spans.last_mut() {
            Some(last) if last.style == *style => {
                if gap > 0.0 {
                    last.text.push(' ');
                }
                last.text.push_str(word);
                last.width = style.measure(&last.text);
            }
            _ => self.spans.push(Span {
                text: word.to_string(),
                style: style.clone(),
                x: self.width + gap,
                width: style.measure(word),
            }),
        }
        if let Some(last) = self.spans.last() {
            self.width = last.x + last.width;
        }
    }
}

fn collect_inline(node: &StyledNode, tokens: &mut Vec<Token>) {
    match node {
        StyledNode::Text { text, style } => push_text(tokens, text, style),
        StyledNode::Element {
            tag,
            style,
            children,
            attrs,
        } => match tag {
            Tag::Br => tokens.push(Token::Break),
            Tag::Img => {
                if let Some(alt) = attrs.get("alt").filter(|a| !a.trim().is_empty()) {
                    push_text(tokens, alt, style);
                }
            }
            _ => {
                for child in children {
                    collect_inline(child, tokens);
                }
            }
        },
    }
}

/// Split text into words, collapsing whitespace unless the style is `pre`.
fn push_text(tokens: &mut Vec<Token>, text: &str, style: &ComputedStyle) {
    let ts = TextStyle::from(style);
    if style.white_space_pre {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                tokens.push(Token::Break);
            }
            let line = line.trim_end_matches('\r').replace('\t', "    ");
            if !line.is_empty() {
                tokens.push(Token::Word(line, ts.clone()));
            }
        }
        return;
    }

    let mut word = String::new();
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !word.is_empty() {
                tokens.push(Token::Word(mem::take(&mut word), ts.clone()));
            }
            if matches!(tokens.last(), Some(Token::Word(..))) {
                tokens.push(Token::Space(ts.clone()));
            }
        } else {
            word.push(c);
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word, ts));
    }
}

/// Greedy line breaking. Words not separated by whitespace stay together;
/// a word wider than the whole line is split by character.
fn break_lines(tokens: &[Token], width: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();
    let mut space: Option<&TextStyle> = None;
    let mut glued = false;

    for token in tokens {
        match token {
            Token::Break => {
                lines.push(mem::take(&mut line));
                space = None;
                glued = false;
            }
            Token::Space(s) => {
                space = Some(s);
                glued = false;
            }
            Token::Word(word, style) => {
                let gap = match space {
                    Some(s) if !line.is_empty() => s.measure(" "),
                    _ => 0.0,
                };
                let w = style.measure(word);
                if !line.is_empty() && (w > width || (!glued && line.width + gap + w > width)) {
                    lines.push(mem::take(&mut line));
                }

                if w > width {
                    let mut chunk = String::new();
                    for c in word.chars() {
                        chunk.push(c);
                        if style.measure(&chunk) > width && chunk.chars().count() > 1 {
                            chunk.pop();
                            line.push_word(&chunk, style, None);
                            lines.push(mem::take(&mut line));
                            chunk = c.to_string();
                        }
                    }
                    line.push_word(&chunk, style, None);
                } else {
                    line.push_word(word, style, space);
                }
                space = None;
                glued = true;
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn has_content(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| !matches!(t, Token::Space(_)))
}

// ---------------------------------------------------------------------------
// Block flow
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Background {
    x: f32,
    width: f32,
    color: [f32; 3],
    /// Set once the block has emitted its first fragment.
    opened: bool,
}

impl Background {
    fn fill(&self, height: f32) -> PageItem {
        PageItem::Fill {
            x: self.x,
            y: 0.0,
            width: self.width,
            height,
            color: self.color,
        }
    }
}

#[derive(Debug)]
struct Marker {
    text: String,
    style: TextStyle,
    right: f32,
}

#[derive(Debug, Default)]
struct LayoutBuilder {
    fragments: Vec<Fragment>,
    pending_space: f32,
    pending_break: bool,
    backgrounds: Vec<Background>,
    counters: Vec<u32>,
    marker: Option<Marker>,
}

/// A child is laid out as a block when it is block-level itself or when an
/// inline element wraps block-level content.
fn is_block_level(node: &StyledNode) -> bool {
    match node {
        StyledNode::Text { .. } => false,
        StyledNode::Element {
            tag: Tag::Br | Tag::Img,
            ..
        } => false,
        StyledNode::Element {
            style, children, ..
        } => style.display.is_block() || children.iter().any(is_block_level),
    }
}

impl LayoutBuilder {
    fn push_fragment(&mut self, mut frag: Fragment, baseline: f32) {
        let space = mem::take(&mut self.pending_space);
        if space > 0.0 {
            let fills: Vec<PageItem> = self
                .backgrounds
                .iter()
                .filter(|b| b.opened)
                .map(|b| b.fill(space))
                .collect();
            if fills.is_empty() {
                frag.space_before = space;
            } else {
                self.fragments.push(Fragment {
                    height: space,
                    space_before: 0.0,
                    break_before: mem::take(&mut self.pending_break),
                    items: fills,
                });
            }
        }
        frag.break_before |= mem::take(&mut self.pending_break);

        let mut items: Vec<PageItem> = self
            .backgrounds
            .iter()
            .map(|b| b.fill(frag.height))
            .collect();
        items.append(&mut frag.items);
        if let Some(marker) = self.marker.take() {
            let x = marker.right - marker.style.measure(&marker.text);
            items.push(marker.style.item(x, baseline, marker.text));
        }
        frag.items = items;

        for b in &mut self.backgrounds {
            b.opened = true;
        }
        self.fragments.push(frag);
    }

    fn layout_flow(&mut self, children: &[StyledNode], block: &ComputedStyle, ctx: Ctx) {
        let mut tokens = Vec::new();
        for child in children {
            if is_block_level(child) {
                self.flush_inline(&mut tokens, block, ctx);
                self.layout_block(child, ctx);
            } else {
                collect_inline(child, &mut tokens);
            }
        }
        self.flush_inline(&mut tokens, block, ctx);
    }

    fn flush_inline(&mut self, tokens: &mut Vec<Token>, block: &ComputedStyle, ctx: Ctx) {
        if has_content(tokens) {
            for line in break_lines(tokens, ctx.width) {
                self.emit_line(line, block, ctx);
            }
        }
        tokens.clear();
    }

    fn emit_line(&mut self, line: Line, block: &ComputedStyle, ctx: Ctx) {
        let max_size = line
            .spans
            .iter()
            .map(|s| s.style.font_size)
            .fold(block.font_size, f32::max);
        let height = line_height(max_size, block.line_height);
        let baseline = (height - max_size) / 2.0 + max_size * ASCENT;

        let slack = (ctx.width - line.width).max(0.0);
        let offset = match block.text_align {
            TextAlign::Left => 0.0,
            TextAlign::Center => slack / 2.0,
            TextAlign::Right => slack,
        };

        let mut items = Vec::new();
        for span in line.spans {
            let x = ctx.x + offset + span.x;
            if let Some(color) = span.style.background {
                items.push(PageItem::Fill {
                    x,
                    y: 0.0,
                    width: span.width,
                    height,
                    color,
                });
            }
            items.push(span.style.item(x, baseline, span.text));
        }
        self.push_fragment(
            Fragment {
                height,
                items,
                ..Fragment::default()
            },
            baseline,
        );
    }

    /// Vertical padding: painted when the block has a background, otherwise
    /// folded into the pending gap.
    fn pad(&mut self, amount: f32, painted: bool, baseline: f32) {
        if amount <= 0.0 {
            return;
        }
        if painted {
            self.push_fragment(
                Fragment {
                    height: amount,
                    ..Fragment::default()
                },
                baseline,
            );
        } else {
            self.pending_space += amount;
        }
    }

    fn layout_block(&mut self, node: &StyledNode, ctx: Ctx) {
        let StyledNode::Element {
            tag,
            style,
            children,
            attrs,
        } = node
        else {
            return;
        };
        if style.display == Display::Table {
            self.layout_table(node, ctx);
            return;
        }

        if style.page_break_before {
            self.pending_break = true;
        }
        self.pending_space = self.pending_space.max(style.margin_top);

        let outer = Ctx {
            x: ctx.x + style.margin_left,
            width: (ctx.width - style.margin_left - style.margin_right).max(1.0),
        };
        let inner = Ctx {
            x: outer.x + style.padding_left,
            width: (outer.width - style.padding_left - style.padding_right).max(1.0),
        };
        let baseline = style.font_size * ASCENT;

        // Body and html backgrounds paint the whole page instead.
        let painted = match style.background {
            Some(color) if !matches!(tag, Tag::Html | Tag::Body) => {
                self.backgrounds.push(Background {
                    x: outer.x,
                    width: outer.width,
                    color: color.to_rgb(),
                    opened: false,
                });
                true
            }
            _ => false,
        };
        self.pad(style.padding_top, painted, baseline);

        match tag {
            Tag::Hr => {
                let thickness = style.border_width.max(0.5);
                self.push_fragment(
                    Fragment {
                        height: thickness,
                        items: vec![PageItem::Rule {
                            x1: outer.x,
                            y1: thickness / 2.0,
                            x2: outer.x + outer.width,
                            y2: thickness / 2.0,
                            thickness,
                            color: style.border_color.to_rgb(),
                        }],
                        ..Fragment::default()
                    },
                    baseline,
                );
            }
            Tag::Ul | Tag::Ol => {
                let start = attrs
                    .get("start")
                    .and_then(|s| s.trim().parse::<u32>().ok())
                    .unwrap_or(1);
                self.counters.push(start.saturating_sub(1));
                self.layout_flow(children, style, inner);
                self.counters.pop();
            }
            _ => {
                if style.display == Display::ListItem {
                    self.marker = self.list_marker(style, inner);
                }
                self.layout_flow(children, style, inner);
                if style.display == Display::ListItem {
                    self.marker = None;
                }
            }
        }

        self.pad(style.padding_bottom, painted, baseline);
        if painted {
            self.backgrounds.pop();
        }
        self.pending_space = self.pending_space.max(style.margin_bottom);
        if style.page_break_after {
            self.pending_break = true;
        }
    }

    fn list_marker(&mut self, style: &ComputedStyle, inner: Ctx) -> Option<Marker> {
        let n = match self.counters.last_mut() {
            Some(counter) => {
                *counter += 1;
                *counter
            }
            None => 1,
        };
        let text = match style.list_style {
            ListStyle::Disc => "\u{2022}".to_string(),
            ListStyle::Decimal => format!("{n}."),
            ListStyle::None => return None,
        };
        let mut marker_style = TextStyle::from(style);
        marker_style.underline = false;
        marker_style.background = None;
        Some(Marker {
            text,
            right: inner.x - style.font_size * 0.5,
            style: marker_style,
        })
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    fn layout_table(&mut self, node: &StyledNode, ctx: Ctx) {
        let StyledNode::Element {
            style, children, ..
        } = node
        else {
            return;
        };
        if style.page_break_before {
            self.pending_break = true;
        }
        self.pending_space = self.pending_space.max(style.margin_top);
        let outer = Ctx {
            x: ctx.x + style.margin_left,
            width: (ctx.width - style.margin_left - style.margin_right).max(1.0),
        };

        let mut rows = Vec::new();
        for child in children {
            match child {
                StyledNode::Element { tag: Tag::Block(name), .. } if name == "caption" => {
                    self.layout_block(child, outer);
                }
                _ => collect_rows(child, &mut rows),
            }
        }

        let columns = rows.iter().map(|r| row_span(r)).max().unwrap_or(0);
        if columns > 0 {
            let col_width = outer.width / columns as f32;
            for row in rows {
                self.layout_row(row, style, outer, col_width);
            }
        }

        self.pending_space = self.pending_space.max(style.margin_bottom);
        if style.page_break_after {
            self.pending_break = true;
        }
    }

    fn layout_row(&mut self, row: &StyledNode, table: &ComputedStyle, outer: Ctx, col_width: f32) {
        let StyledNode::Element {
            style: row_style,
            children,
            ..
        } = row
        else {
            return;
        };

        struct CellBox {
            x: f32,
            width: f32,
            content: Vec<PageItem>,
            height: f32,
            background: Option<[f32; 3]>,
            border: f32,
            border_color: [f32; 3],
        }

        let mut cells = Vec::new();
        let mut col = 0usize;
        for cell in children.iter().filter(|c| is_cell(c)) {
            let StyledNode::Element {
                style: cs,
                children: content,
                attrs,
                ..
            } = cell
            else {
                continue;
            };
            let span = colspan(attrs);
            let x = outer.x + col as f32 * col_width;
            let width = col_width * span as f32;
            col += span;

            let border = if cs.border_width > 0.0 {
                cs.border_width
            } else {
                table.border_width
            };
            let inner = Ctx {
                x: 0.0,
                width: (width - cs.padding_left - cs.padding_right - 2.0 * border).max(1.0),
            };

            let mut sub = LayoutBuilder::default();
            sub.layout_flow(content, cs, inner);
            let (mut items, content_height) = sub.into_stack();
            for item in &mut items {
                item.translate(x + border + cs.padding_left, border + cs.padding_top);
            }

            cells.push(CellBox {
                x,
                width,
                content: items,
                height: content_height + cs.padding_top + cs.padding_bottom + 2.0 * border,
                background: cs.background.or(row_style.background).map(Color::to_rgb),
                border,
                border_color: cs.border_color.to_rgb(),
            });
        }
        if cells.is_empty() {
            return;
        }

        let row_height = cells.iter().map(|c| c.height).fold(0.0, f32::max);
        let mut items = Vec::new();
        for mut cell in cells {
            if let Some(color) = cell.background {
                items.push(PageItem::Fill {
                    x: cell.x,
                    y: 0.0,
                    width: cell.width,
                    height: row_height,
                    color,
                });
            }
            // Cells are vertically centred.
            let dy = (row_height - cell.height) / 2.0;
            for item in &mut cell.content {
                item.translate(0.0, dy);
            }
            items.append(&mut cell.content);
            if cell.border > 0.0 {
                items.push(PageItem::Stroke {
                    x: cell.x,
                    y: 0.0,
                    width: cell.width,
                    height: row_height,
                    thickness: cell.border,
                    color: cell.border_color,
                });
            }
        }

        if row_style.page_break_before {
            self.pending_break = true;
        }
        self.push_fragment(
            Fragment {
                height: row_height,
                items,
                ..Fragment::default()
            },
            row_style.font_size * ASCENT,
        );
    }

    /// Stack all fragments vertically, ignoring page breaks.
    fn into_stack(self) -> (Vec<PageItem>, f32) {
        let mut y = 0.0;
        let mut items = Vec::new();
        for (i, frag) in self.fragments.into_iter().enumerate() {
            if i > 0 {
                y += frag.space_before;
            }
            for mut item in frag.items {
                item.translate(0.0, y);
                items.push(item);
            }
            y += frag.height;
        }
        (items, y)
    }
}

fn is_cell(node: &StyledNode) -> bool {
    matches!(node, StyledNode::Element { style, .. } if style.display == Display::TableCell)
}

fn colspan(attrs: &std::collections::HashMap<String, String>) -> usize {
    attrs
        .get("colspan")
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, 1000)
}

fn row_span(row: &StyledNode) -> usize {
    match row {
        StyledNode::Element { children, .. } => children
            .iter()
            .filter(|c| is_cell(c))
            .map(|c| match c {
                StyledNode::Element { attrs, .. } => colspan(attrs),
                StyledNode::Text { .. } => 0,
            })
            .sum(),
        StyledNode::Text { .. } => 0,
    }
}

/// Rows directly under the table or inside `thead`/`tbody`/`tfoot`.
fn collect_rows<'a>(node: &'a StyledNode, rows: &mut Vec<&'a StyledNode>) {
    if let StyledNode::Element {
        style, children, ..
    } = node
    {
        if style.display == Display::TableRow {
            rows.push(node);
        } else if style.display == Display::Block {
            for child in children {
                collect_rows(child, rows);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out `nodes` inside a content box `content_width` points wide.
pub fn compute_layout(
    nodes: &[StyledNode],
    root: &ComputedStyle,
    content_width: f32,
) -> Vec<Fragment> {
    let mut builder = LayoutBuilder::default();
    builder.layout_flow(
        nodes,
        root,
        Ctx {
            x: 0.0,
            width: content_width.max(1.0),
        },
    );
    builder.fragments
}

/// Canvas colour: the `<body>` background, falling back to `<html>`.
pub fn page_background(nodes: &[StyledNode]) -> Option<Color> {
    fn find(nodes: &[StyledNode], tag: &Tag) -> Option<Option<Color>> {
        nodes.iter().find_map(|n| match n {
            StyledNode::Element {
                tag: t,
                style,
                children,
                ..
            } => {
                if t == tag {
                    Some(style.background)
                } else {
                    find(children, tag)
                }
            }
            StyledNode::Text { .. } => None,
        })
    }
    find(nodes, &Tag::Body)
        .flatten()
        .or_else(|| find(nodes, &Tag::Html).flatten())
}
