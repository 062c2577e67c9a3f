//! Layout config – the intermediate representation between pagination and
//! PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on each page.

use serde::{Deserialize, Serialize};

use crate::fonts::FontFamily;

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Canvas colour taken from `<body>` or `<html>`.
    #[serde(default)]
    pub page_background: Option<[f32; 3]>,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub items: Vec<PageItem>,
}

/// A drawing primitive. Coordinates are points from the page's top-left
/// corner; `y` of a text item is its baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageItem {
    Text {
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        family: FontFamily,
        bold: bool,
        italic: bool,
        underline: bool,
        color: [f32; 3],
    },
    /// Background rectangle; skipped when backgrounds are not printed.
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: [f32; 3],
    },
    /// Straight line, e.g. an `<hr>`.
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
        color: [f32; 3],
    },
    /// Rectangle outline, e.g. a table cell border.
    Stroke {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        thickness: f32,
        color: [f32; 3],
    },
}

impl PageItem {
    /// Shift the item by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            PageItem::Text { x, y, .. }
            | PageItem::Fill { x, y, .. }
            | PageItem::Stroke { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            PageItem::Rule { x1, y1, x2, y2, .. } => {
                *x1 += dx;
                *x2 += dx;
                *y1 += dy;
                *y2 += dy;
            }
        }
    }

    /// Top and bottom of the painted area. Text extends a quarter of its
    /// size below the baseline for descenders.
    pub fn vertical_span(&self) -> (f32, f32) {
        match self {
            PageItem::Text { y, font_size, .. } => (y - font_size, y + font_size * 0.25),
            PageItem::Fill { y, height, .. } | PageItem::Stroke { y, height, .. } => {
                (*y, y + height)
            }
            PageItem::Rule {
                y1, y2, thickness, ..
            } => (y1.min(*y2) - thickness / 2.0, y1.max(*y2) + thickness / 2.0),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            PageItem::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl LayoutConfig {
    pub fn new(page_width_pt: f32, page_height_pt: f32) -> Self {
        Self {
            title: Self::default_title(),
            page_width_pt,
            page_height_pt,
            page_background: None,
            pages: Vec::new(),
        }
    }

    pub fn default_title() -> String {
        "html-press document".to_string()
    }

    /// All text on page `index`, one entry per text item.
    pub fn page_text(&self, index: usize) -> Vec<&str> {
        self.pages
            .get(index)
            .map(|p| p.items.iter().filter_map(PageItem::text).collect())
            .unwrap_or_default()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
