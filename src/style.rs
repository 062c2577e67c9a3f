//! Style resolver – maps tag defaults and inline `style` declarations to a
//! flat [`ComputedStyle`] struct consumed by the layout engine.
//!
//! All lengths are PDF points. The render scale is folded into the root
//! style, so every length resolved below it comes out already scaled.

use std::collections::HashMap;

use crate::dom::{DomNode, ElementNode, Tag};
use crate::fonts::FontFamily;
use crate::options::Length;

/// CSS pixels to PDF points.
const PX_TO_PT: f32 = 0.75;
/// Browser default font size (16px).
const BASE_FONT_PT: f32 = 12.0;
/// Browsers shrink monospace text to 13px.
const MONO_RATIO: f32 = 13.0 / 16.0;

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    pub display: Display,

    // Inherited
    pub font_size: f32,
    pub root_font_size: f32,
    pub scale: f32,
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub white_space_pre: bool,
    pub list_style: ListStyle,

    // Box
    pub background: Option<Color>,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,
    pub border_width: f32,
    pub border_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self::root(1.0)
    }
}

impl ComputedStyle {
    /// Style of the initial containing block at the given render scale.
    pub fn root(scale: f32) -> Self {
        let font_size = BASE_FONT_PT * scale;
        Self {
            display: Display::Block,
            font_size,
            root_font_size: font_size,
            scale,
            family: FontFamily::Serif,
            bold: false,
            italic: false,
            underline: false,
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.2,
            white_space_pre: false,
            list_style: ListStyle::Disc,
            background: None,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: Color::BLACK,
            page_break_before: false,
            page_break_after: false,
        }
    }

    /// Copy of the inherited properties with every box property reset.
    fn inherit(&self) -> Self {
        Self {
            display: Display::Inline,
            background: None,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: self.color,
            page_break_before: false,
            page_break_after: false,
            ..self.clone()
        }
    }

    fn px(&self, px: f32) -> f32 {
        px * PX_TO_PT * self.scale
    }

    /// Resolve a CSS length against this style's font size.
    pub fn length(&self, value: &str) -> Option<f32> {
        let value = value.trim().to_ascii_lowercase();
        if let Some(em) = value.strip_suffix("rem") {
            return em.trim().parse::<f32>().ok().map(|v| v * self.root_font_size);
        }
        if let Some(em) = value.strip_suffix("em") {
            return em.trim().parse::<f32>().ok().map(|v| v * self.font_size);
        }
        if let Some(pct) = value.strip_suffix('%') {
            return pct
                .trim()
                .parse::<f32>()
                .ok()
                .map(|v| v / 100.0 * self.font_size);
        }
        value
            .parse::<Length>()
            .ok()
            .map(|l| l.to_points() as f32 * self.scale)
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    ListItem,
    Table,
    TableRow,
    TableCell,
    None,
}

impl Display {
    pub fn is_block(self) -> bool {
        !matches!(self, Display::Inline | Display::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Disc,
    Decimal,
    None,
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn to_rgb(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb8(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// Parse `#rgb`, `#rrggbb`, `rgb()`/`rgba()` or a basic colour keyword.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        if value.starts_with('#') {
            return Self::from_hex(&value);
        }
        if let Some(args) = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = args
                .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
                .filter(|p| !p.is_empty())
                .collect();
            if parts.len() < 3 {
                return None;
            }
            let channel = |p: &str| -> Option<f32> {
                let v = match p.strip_suffix('%') {
                    Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                    None => p.parse::<f32>().ok()? / 255.0,
                };
                Some(v.clamp(0.0, 1.0))
            };
            let a = match parts.get(3) {
                Some(a) => match a.strip_suffix('%') {
                    Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                    None => a.parse::<f32>().ok()?,
                },
                None => 1.0,
            };
            return Some(Self {
                r: channel(parts[0])?,
                g: channel(parts[1])?,
                b: channel(parts[2])?,
                a: a.clamp(0.0, 1.0),
            });
        }
        named_color(&value)
    }
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "transparent" => Color::TRANSPARENT,
        "red" => Color::rgb8(255, 0, 0),
        "maroon" => Color::rgb8(128, 0, 0),
        "green" => Color::rgb8(0, 128, 0),
        "lime" => Color::rgb8(0, 255, 0),
        "blue" => Color::rgb8(0, 0, 255),
        "navy" => Color::rgb8(0, 0, 128),
        "yellow" => Color::rgb8(255, 255, 0),
        "olive" => Color::rgb8(128, 128, 0),
        "purple" => Color::rgb8(128, 0, 128),
        "fuchsia" | "magenta" => Color::rgb8(255, 0, 255),
        "teal" => Color::rgb8(0, 128, 128),
        "aqua" | "cyan" => Color::rgb8(0, 255, 255),
        "orange" => Color::rgb8(255, 165, 0),
        "gray" | "grey" => Color::rgb8(128, 128, 128),
        "silver" => Color::rgb8(192, 192, 192),
        "lightgray" | "lightgrey" => Color::rgb8(211, 211, 211),
        "darkgray" | "darkgrey" => Color::rgb8(169, 169, 169),
        _ => return None,
    };
    Some(color)
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementNode, parent: &ComputedStyle) -> ComputedStyle {
    let mut style = parent.inherit();
    apply_tag_defaults(&mut style, &element.tag);
    apply_presentational_attributes(&mut style, element);
    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }
    style
}

/// User-agent defaults based on tag semantics.
fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    let vertical_em = |s: &mut ComputedStyle, em: f32| {
        s.margin_top = s.font_size * em;
        s.margin_bottom = s.font_size * em;
    };

    match tag {
        Tag::Html => s.display = Display::Block,
        Tag::Body => {
            s.display = Display::Block;
            let m = s.px(8.0);
            s.margin_top = m;
            s.margin_right = m;
            s.margin_bottom = m;
            s.margin_left = m;
        }
        Tag::Head | Tag::Title | Tag::Style | Tag::Script | Tag::Void(_) => {
            s.display = Display::None;
        }
        Tag::P => {
            s.display = Display::Block;
            vertical_em(s, 1.0);
        }
        Tag::Heading(level) => {
            let (size, margin) = match level {
                1 => (2.0, 0.67),
                2 => (1.5, 0.83),
                3 => (1.17, 1.0),
                4 => (1.0, 1.33),
                5 => (0.83, 1.67),
                _ => (0.67, 2.33),
            };
            s.display = Display::Block;
            s.font_size *= size;
            s.bold = true;
            vertical_em(s, margin);
        }
        Tag::Ul | Tag::Ol => {
            s.display = Display::Block;
            s.list_style = if *tag == Tag::Ol {
                ListStyle::Decimal
            } else {
                ListStyle::Disc
            };
            vertical_em(s, 1.0);
            s.padding_left = s.px(40.0);
        }
        Tag::Li => s.display = Display::ListItem,
        Tag::Table => s.display = Display::Table,
        Tag::TableSection => s.display = Display::Block,
        Tag::Tr => s.display = Display::TableRow,
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            let p = s.px(1.0);
            s.padding_top = p;
            s.padding_right = p;
            s.padding_bottom = p;
            s.padding_left = p;
            if *tag == Tag::Th {
                s.bold = true;
                s.text_align = TextAlign::Center;
            }
        }
        Tag::Pre => {
            s.display = Display::Block;
            s.family = FontFamily::Mono;
            s.font_size *= MONO_RATIO;
            s.white_space_pre = true;
            vertical_em(s, 1.0);
        }
        Tag::Blockquote => {
            s.display = Display::Block;
            vertical_em(s, 1.0);
            s.margin_left = s.px(40.0);
            s.margin_right = s.px(40.0);
        }
        Tag::Hr => {
            s.display = Display::Block;
            vertical_em(s, 0.5);
            s.border_width = s.px(1.0);
            s.border_color = Color::rgb8(128, 128, 128);
        }
        Tag::Strong => s.bold = true,
        Tag::Em => s.italic = true,
        Tag::U => s.underline = true,
        Tag::Code => {
            s.family = FontFamily::Mono;
            s.font_size *= MONO_RATIO;
        }
        Tag::Br | Tag::Img => {}
        Tag::Block(name) => {
            s.display = Display::Block;
            match name.as_str() {
                "center" => s.text_align = TextAlign::Center,
                "address" => s.italic = true,
                "dt" => s.bold = true,
                "dd" => s.margin_left = s.px(40.0),
                "dl" => vertical_em(s, 1.0),
                "figure" => {
                    vertical_em(s, 1.0);
                    s.margin_left = s.px(40.0);
                    s.margin_right = s.px(40.0);
                }
                "caption" => s.text_align = TextAlign::Center,
                _ => {}
            }
        }
        Tag::Inline(name) => match name.as_str() {
            "a" => {
                s.color = Color::rgb8(0, 0, 238);
                s.underline = true;
            }
            "small" | "sub" | "sup" => s.font_size *= 0.83,
            "big" => s.font_size *= 1.2,
            "mark" => {
                s.background = Some(Color::rgb8(255, 255, 0));
            }
            _ => {}
        },
    }
}

/// Legacy attributes templates still use: `align`, `bgcolor`, table `border`.
fn apply_presentational_attributes(s: &mut ComputedStyle, element: &ElementNode) {
    if let Some(align) = element.attr("align") {
        if let Some(a) = parse_text_align(align) {
            s.text_align = a;
        }
    }
    if let Some(bg) = element.attr("bgcolor").and_then(Color::parse) {
        s.background = Some(bg).filter(|c| !c.is_transparent());
    }
    if element.tag == Tag::Table {
        if let Some(width) = element.attr("border").and_then(|b| b.trim().parse::<f32>().ok()) {
            s.border_width = s.px(width);
        }
    }
}

// ---------------------------------------------------------------------------
// Inline style parsing (limited subset)
// ---------------------------------------------------------------------------

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for decl in style_str.split(';') {
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        let prop = prop.trim().to_ascii_lowercase();
        let val = val.trim().trim_end_matches("!important").trim();
        if !prop.is_empty() && !val.is_empty() {
            apply_css_property(s, &prop, val);
        }
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let lower = val.to_ascii_lowercase();
    match prop {
        "display" => {
            s.display = match lower.as_str() {
                "block" | "flex" | "grid" | "inline-block" => Display::Block,
                "inline" => Display::Inline,
                "list-item" => Display::ListItem,
                "table" => Display::Table,
                "table-row" => Display::TableRow,
                "table-cell" => Display::TableCell,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "font-size" => {
            if let Some(size) = parse_font_size(s, &lower) {
                s.font_size = size;
            }
        }
        "font-weight" => {
            s.bold = match lower.as_str() {
                "bold" | "bolder" => true,
                "normal" | "lighter" => false,
                n => n.parse::<u16>().map(|w| w >= 600).unwrap_or(s.bold),
            }
        }
        "font-style" => s.italic = lower == "italic" || lower == "oblique",
        "font-family" => s.family = FontFamily::from_css(&lower),
        "font" => {
            // Only the family part of the shorthand is honoured.
            if let Some(family) = lower.split_whitespace().last() {
                s.family = FontFamily::from_css(family);
            }
        }
        "color" => {
            if let Some(c) = Color::parse(&lower) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            let color = lower
                .split_whitespace()
                .find_map(Color::parse)
                .or_else(|| Color::parse(&lower));
            if let Some(c) = color {
                s.background = Some(c).filter(|c| !c.is_transparent());
            }
        }
        "text-align" => {
            if let Some(a) = parse_text_align(&lower) {
                s.text_align = a;
            }
        }
        "text-decoration" | "text-decoration-line" => {
            s.underline = lower.contains("underline");
        }
        "white-space" => s.white_space_pre = lower.starts_with("pre"),
        "line-height" => {
            if lower == "normal" {
                s.line_height = 1.2;
            } else if let Ok(v) = lower.parse::<f32>() {
                s.line_height = v;
            } else if let Some(pt) = s.length(&lower) {
                if s.font_size > 0.0 {
                    s.line_height = pt / s.font_size;
                }
            }
        }
        "list-style" | "list-style-type" => {
            if lower.contains("none") {
                s.list_style = ListStyle::None;
            } else if lower.contains("decimal") {
                s.list_style = ListStyle::Decimal;
            } else if ["disc", "circle", "square"].iter().any(|k| lower.contains(k)) {
                s.list_style = ListStyle::Disc;
            }
        }
        "margin" => {
            let [t, r, b, l] = box_shorthand(s, &lower, [
                s.margin_top,
                s.margin_right,
                s.margin_bottom,
                s.margin_left,
            ]);
            (s.margin_top, s.margin_right, s.margin_bottom, s.margin_left) = (t, r, b, l);
        }
        "margin-top" => set_length(s, &lower, |s| &mut s.margin_top),
        "margin-right" => set_length(s, &lower, |s| &mut s.margin_right),
        "margin-bottom" => set_length(s, &lower, |s| &mut s.margin_bottom),
        "margin-left" => set_length(s, &lower, |s| &mut s.margin_left),
        "padding" => {
            let [t, r, b, l] = box_shorthand(s, &lower, [
                s.padding_top,
                s.padding_right,
                s.padding_bottom,
                s.padding_left,
            ]);
            (s.padding_top, s.padding_right, s.padding_bottom, s.padding_left) = (t, r, b, l);
        }
        "padding-top" => set_length(s, &lower, |s| &mut s.padding_top),
        "padding-right" => set_length(s, &lower, |s| &mut s.padding_right),
        "padding-bottom" => set_length(s, &lower, |s| &mut s.padding_bottom),
        "padding-left" => set_length(s, &lower, |s| &mut s.padding_left),
        "border" => {
            if lower == "none" || lower == "0" {
                s.border_width = 0.0;
                return;
            }
            for part in lower.split_whitespace() {
                if let Some(w) = parse_border_width(s, part) {
                    s.border_width = w;
                } else if let Some(c) = Color::parse(part) {
                    s.border_color = c;
                }
            }
            if s.border_width == 0.0 && lower.contains("solid") {
                s.border_width = s.px(3.0);
            }
        }
        "border-width" => {
            if let Some(w) = parse_border_width(s, &lower) {
                s.border_width = w;
            }
        }
        "border-color" => {
            if let Some(c) = Color::parse(&lower) {
                s.border_color = c;
            }
        }
        "page-break-before" | "break-before" => {
            s.page_break_before = matches!(lower.as_str(), "always" | "page" | "left" | "right");
        }
        "page-break-after" | "break-after" => {
            s.page_break_after = matches!(lower.as_str(), "always" | "page" | "left" | "right");
        }
        _ => {}
    }
}

fn set_length(s: &mut ComputedStyle, val: &str, field: impl Fn(&mut ComputedStyle) -> &mut f32) {
    if let Some(pt) = s.length(val) {
        *field(s) = pt;
    } else if val == "auto" {
        *field(s) = 0.0;
    }
}

/// Expand a 1–4 value box shorthand (`margin`, `padding`).
fn box_shorthand(s: &ComputedStyle, val: &str, current: [f32; 4]) -> [f32; 4] {
    let parts: Vec<f32> = val
        .split_whitespace()
        .map(|p| if p == "auto" { Some(0.0) } else { s.length(p) })
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();
    match parts.as_slice() {
        [a] => [*a, *a, *a, *a],
        [v, h] => [*v, *h, *v, *h],
        [t, h, b] => [*t, *h, *b, *h],
        [t, r, b, l] => [*t, *r, *b, *l],
        _ => current,
    }
}

fn parse_font_size(s: &ComputedStyle, val: &str) -> Option<f32> {
    let keyword = match val {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        _ => None,
    };
    match keyword {
        Some(px) => Some(s.px(px)),
        None if val == "smaller" => Some(s.font_size / 1.2),
        None if val == "larger" => Some(s.font_size * 1.2),
        None => s.length(val),
    }
}

fn parse_border_width(s: &ComputedStyle, val: &str) -> Option<f32> {
    match val {
        "thin" => Some(s.px(1.0)),
        "medium" => Some(s.px(3.0)),
        "thick" => Some(s.px(5.0)),
        _ => s.length(val),
    }
}

fn parse_text_align(val: &str) -> Option<TextAlign> {
    match val.trim().to_ascii_lowercase().as_str() {
        "left" | "start" | "justify" => Some(TextAlign::Left),
        "center" | "middle" => Some(TextAlign::Center),
        "right" | "end" => Some(TextAlign::Right),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (`alt`, `start`, `colspan`, ...).
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

impl StyledNode {
    pub fn style(&self) -> &ComputedStyle {
        match self {
            StyledNode::Element { style, .. } | StyledNode::Text { style, .. } => style,
        }
    }
}

/// Build a styled tree from a DOM tree, resolving styles top-down. Elements
/// with `display: none` are dropped together with their subtree.
pub fn build_styled_tree(nodes: &[DomNode], parent_style: &ComputedStyle) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style);
                if style.display == Display::None {
                    continue;
                }
                let children = build_styled_tree(&e.children, &style);
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                if !text.is_empty() {
                    result.push(StyledNode::Text {
                        text: text.clone(),
                        style: parent_style.inherit(),
                    });
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn styled(html: &str) -> Vec<StyledNode> {
        build_styled_tree(&parse_html(html), &ComputedStyle::root(1.0))
    }

    #[test]
    fn inline_style_font_size() {
        let mut s = ComputedStyle::default();
        apply_inline_style(&mut s, "font-size: 24px; color: #ff0000");
        assert_eq!(s.font_size, 18.0);
        assert!((s.color.r - 1.0).abs() < 0.01);
    }

    #[test]
    fn color_parsing() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::parse("rgb(255, 0, 0)"), Some(Color::rgb8(255, 0, 0)));
        assert!(Color::parse("rgba(0,0,0,0)").unwrap().is_transparent());
        assert_eq!(Color::parse("Navy"), Some(Color::rgb8(0, 0, 128)));
        assert_eq!(Color::parse("#zzz"), None);
    }

    #[test]
    fn heading_defaults_scale_with_root() {
        let nodes = build_styled_tree(&parse_html("<h1>Title</h1>"), &ComputedStyle::root(0.5));
        let style = nodes[0].style();
        assert_eq!(style.font_size, 12.0);
        assert!(style.bold);
        assert!((style.margin_top - 12.0 * 0.67).abs() < 0.01);
    }

    #[test]
    fn lengths_resolve_to_points() {
        let s = ComputedStyle::default();
        assert_eq!(s.length("16px"), Some(12.0));
        assert_eq!(s.length("2em"), Some(24.0));
        assert_eq!(s.length("1in"), Some(72.0));
        assert_eq!(s.length("50%"), Some(6.0));
        assert_eq!(s.length("wide"), None);
    }

    #[test]
    fn box_shorthand_expands() {
        let mut s = ComputedStyle::default();
        apply_inline_style(&mut s, "margin: 4px 8px; padding: 1pt 2pt 3pt");
        assert_eq!(
            (s.margin_top, s.margin_right, s.margin_bottom, s.margin_left),
            (3.0, 6.0, 3.0, 6.0)
        );
        assert_eq!(
            (s.padding_top, s.padding_right, s.padding_bottom, s.padding_left),
            (1.0, 2.0, 3.0, 2.0)
        );
    }

    #[test]
    fn hidden_elements_are_dropped() {
        let nodes = styled(
            r#"<head><title>x</title></head><p style="display:none">gone</p><p>kept</p>"#,
        );
        assert_eq!(nodes.len(), 1);
        assert!(matches!(&nodes[0], StyledNode::Element { tag: Tag::P, .. }));
    }

    #[test]
    fn page_breaks_and_legacy_attributes() {
        let nodes = styled(
            r##"<div style="page-break-after: always" align="center" bgcolor="#eeeeee">x</div>"##,
        );
        let style = nodes[0].style();
        assert!(style.page_break_after);
        assert_eq!(style.text_align, TextAlign::Center);
        assert!(style.background.is_some());
    }

    #[test]
    fn text_properties_inherit() {
        let nodes = styled(r#"<div style="color: red; font-family: monospace"><b>x</b></div>"#);
        let StyledNode::Element { children, .. } = &nodes[0] else {
            panic!("expected element");
        };
        let inner = children[0].style();
        assert_eq!(inner.color, Color::rgb8(255, 0, 0));
        assert_eq!(inner.family, FontFamily::Mono);
        assert!(inner.bold);
        assert_eq!(inner.background, None);
    }
}
