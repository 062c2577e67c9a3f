//! Rendering options – paper size, margins, background printing and
//! header/footer settings handed to a render engine.
//!
//! Defaults: A4 portrait, backgrounds printed, zero margins, no header or
//! footer. Options load from JSON with camelCase keys, e.g.
//!
//! ```json
//! { "format": "Letter", "landscape": true, "margin": { "top": "1cm" } }
//! ```

use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

const PX_PER_INCH: f64 = 96.0;
const PT_PER_INCH: f64 = 72.0;
const CM_PER_INCH: f64 = 2.54;

// ---------------------------------------------------------------------------
// Lengths
// ---------------------------------------------------------------------------

/// A non-negative CSS length, stored in CSS pixels (96 per inch).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "String")]
pub struct Length(f64);

#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Number(f64),
    Text(String),
}

impl Length {
    pub const ZERO: Self = Self(0.0);

    pub fn px(value: f64) -> Self {
        Self(value)
    }

    pub fn pt(value: f64) -> Self {
        Self(value * PX_PER_INCH / PT_PER_INCH)
    }

    pub fn inches(value: f64) -> Self {
        Self(value * PX_PER_INCH)
    }

    pub fn cm(value: f64) -> Self {
        Self::inches(value / CM_PER_INCH)
    }

    pub fn mm(value: f64) -> Self {
        Self::cm(value / 10.0)
    }

    pub fn to_px(self) -> f64 {
        self.0
    }

    pub fn to_inches(self) -> f64 {
        self.0 / PX_PER_INCH
    }

    pub fn to_points(self) -> f64 {
        self.to_inches() * PT_PER_INCH
    }
}

impl FromStr for Length {
    type Err = OptionsError;

    /// Parse `"12px"`, `"9pt"`, `"0.5in"`, `"1cm"`, `"10mm"` or a bare number
    /// (pixels).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        // The unit is the trailing run of letters, so exponents stay in the number.
        let number = trimmed.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        let unit = &trimmed[number.len()..];

        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| OptionsError::InvalidLength(s.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(OptionsError::InvalidLength(s.to_string()));
        }

        match unit {
            "" | "px" => Ok(Self::px(value)),
            "pt" => Ok(Self::pt(value)),
            "in" => Ok(Self::inches(value)),
            "cm" => Ok(Self::cm(value)),
            "mm" => Ok(Self::mm(value)),
            _ => Err(OptionsError::InvalidLength(s.to_string())),
        }
    }
}

impl TryFrom<LengthRepr> for Length {
    type Error = OptionsError;

    fn try_from(repr: LengthRepr) -> Result<Self, Self::Error> {
        match repr {
            LengthRepr::Number(n) if n.is_finite() && n >= 0.0 => Ok(Self::px(n)),
            LengthRepr::Number(n) => Err(OptionsError::InvalidLength(n.to_string())),
            LengthRepr::Text(s) => s.parse(),
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.0)
    }
}

impl From<Length> for String {
    fn from(length: Length) -> Self {
        length.to_string()
    }
}

// ---------------------------------------------------------------------------
// Paper
// ---------------------------------------------------------------------------

/// Named paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaperFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
}

impl PaperFormat {
    /// Portrait `(width, height)` in inches.
    pub fn size_inches(self) -> (f64, f64) {
        match self {
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
            PaperFormat::Ledger => (17.0, 11.0),
            PaperFormat::A0 => (33.1, 46.8),
            PaperFormat::A1 => (23.4, 33.1),
            PaperFormat::A2 => (16.54, 23.4),
            PaperFormat::A3 => (11.7, 16.54),
            PaperFormat::A4 => (8.27, 11.7),
            PaperFormat::A5 => (5.83, 8.27),
            PaperFormat::A6 => (4.13, 5.83),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PaperFormat::Letter => "Letter",
            PaperFormat::Legal => "Legal",
            PaperFormat::Tabloid => "Tabloid",
            PaperFormat::Ledger => "Ledger",
            PaperFormat::A0 => "A0",
            PaperFormat::A1 => "A1",
            PaperFormat::A2 => "A2",
            PaperFormat::A3 => "A3",
            PaperFormat::A4 => "A4",
            PaperFormat::A5 => "A5",
            PaperFormat::A6 => "A6",
        }
    }
}

impl FromStr for PaperFormat {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" => Ok(PaperFormat::Letter),
            "legal" => Ok(PaperFormat::Legal),
            "tabloid" => Ok(PaperFormat::Tabloid),
            "ledger" => Ok(PaperFormat::Ledger),
            "a0" => Ok(PaperFormat::A0),
            "a1" => Ok(PaperFormat::A1),
            "a2" => Ok(PaperFormat::A2),
            "a3" => Ok(PaperFormat::A3),
            "a4" => Ok(PaperFormat::A4),
            "a5" => Ok(PaperFormat::A5),
            "a6" => Ok(PaperFormat::A6),
            _ => Err(OptionsError::UnknownFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for PaperFormat {
    type Error = OptionsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PaperFormat> for String {
    fn from(format: PaperFormat) -> Self {
        format.name().to_string()
    }
}

impl fmt::Display for PaperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Distances between the paper edge and the content box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Margins {
    pub fn uniform(length: Length) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }
}

// ---------------------------------------------------------------------------
// Page ranges
// ---------------------------------------------------------------------------

/// Parsed `"1-5, 8, 11-"` page selection (1-based, inclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRanges {
    ranges: Vec<RangeInclusive<usize>>,
}

impl PageRanges {
    /// Whether 1-based `page` is selected.
    pub fn contains(&self, page: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(&page))
    }
}

impl FromStr for PageRanges {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OptionsError::InvalidPageRange(s.to_string());
        let page = |p: &str| -> Result<usize, OptionsError> {
            match p.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(invalid()),
            }
        };

        let mut ranges = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let range = match part.split_once('-') {
                None => {
                    let n = page(part)?;
                    n..=n
                }
                Some((start, end)) => {
                    let start = if start.trim().is_empty() { 1 } else { page(start)? };
                    let end = if end.trim().is_empty() { usize::MAX } else { page(end)? };
                    if start > end {
                        return Err(invalid());
                    }
                    start..=end
                }
            };
            ranges.push(range);
        }

        if ranges.is_empty() {
            return Err(invalid());
        }
        Ok(Self { ranges })
    }
}

// ---------------------------------------------------------------------------
// RenderOptions
// ---------------------------------------------------------------------------

/// Configuration for a single render call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Paper format (default: A4).
    pub format: PaperFormat,
    /// Explicit paper width; overrides `format` when set together with `height`.
    pub width: Option<Length>,
    /// Explicit paper height; overrides `format` when set together with `width`.
    pub height: Option<Length>,
    /// Swap paper width and height.
    pub landscape: bool,
    /// Paint background colours (default: true).
    pub print_background: bool,
    /// Page margins (default: zero on every edge).
    pub margin: Margins,
    /// Draw the header and footer templates (default: false).
    pub display_header_footer: bool,
    /// HTML for the page header. Elements with class `pageNumber`,
    /// `totalPages`, `title`, `date` or `url` are filled in by the engine.
    pub header_template: Option<String>,
    /// HTML for the page footer, same classes as `header_template`.
    pub footer_template: Option<String>,
    /// Rendering scale, 0.1 to 2.0 (default: 1.0).
    pub scale: f64,
    /// Pages to emit, e.g. `"1-3, 5"`. All pages when unset.
    pub page_ranges: Option<String>,
    /// Let `@page` CSS rules override the paper size.
    pub prefer_css_page_size: bool,
    /// Document title used when the HTML carries no `<title>`.
    pub title: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: PaperFormat::A4,
            width: None,
            height: None,
            landscape: false,
            print_background: true,
            margin: Margins::default(),
            display_header_footer: false,
            header_template: None,
            footer_template: None,
            scale: 1.0,
            page_ranges: None,
            prefer_css_page_size: false,
            title: None,
        }
    }
}

impl RenderOptions {
    pub fn with_format(mut self, format: PaperFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_margins(mut self, margin: Margins) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_landscape(mut self, landscape: bool) -> Self {
        self.landscape = landscape;
        self
    }

    /// Paper `(width, height)` in inches before orientation is applied.
    pub fn base_size_inches(&self) -> (f64, f64) {
        match (self.width, self.height) {
            (Some(w), Some(h)) => (w.to_inches(), h.to_inches()),
            _ => self.format.size_inches(),
        }
    }

    /// Effective paper `(width, height)` in inches after applying the
    /// explicit size and orientation.
    pub fn paper_size_inches(&self) -> (f64, f64) {
        let (w, h) = self.base_size_inches();
        if self.landscape {
            (h, w)
        } else {
            (w, h)
        }
    }

    /// Effective paper `(width, height)` in PDF points.
    pub fn paper_size_points(&self) -> (f64, f64) {
        let (w, h) = self.paper_size_inches();
        (w * PT_PER_INCH, h * PT_PER_INCH)
    }

    /// Parsed page selection, `None` meaning every page.
    pub fn parsed_page_ranges(&self) -> Result<Option<PageRanges>, OptionsError> {
        match self.page_ranges.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(ranges) => ranges.parse().map(Some),
        }
    }

    /// Reject combinations no engine can honour.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !(0.1..=2.0).contains(&self.scale) {
            return Err(OptionsError::OutOfRange {
                field: "scale",
                value: self.scale,
            });
        }

        let (w, h) = self.paper_size_inches();
        if w <= 0.0 {
            return Err(OptionsError::OutOfRange { field: "width", value: w });
        }
        if h <= 0.0 {
            return Err(OptionsError::OutOfRange { field: "height", value: h });
        }

        let horizontal = self.margin.left.to_inches() + self.margin.right.to_inches();
        if horizontal >= w {
            return Err(OptionsError::OutOfRange {
                field: "horizontal margins",
                value: horizontal,
            });
        }
        let vertical = self.margin.top.to_inches() + self.margin.bottom.to_inches();
        if vertical >= h {
            return Err(OptionsError::OutOfRange {
                field: "vertical margins",
                value: vertical,
            });
        }

        self.parsed_page_ranges()?;
        Ok(())
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read options from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn defaults() {
        let o = RenderOptions::default();
        assert_eq!(o.format, PaperFormat::A4);
        assert!(o.print_background);
        assert_eq!(o.margin, Margins::uniform(Length::ZERO));
        assert!(!o.display_header_footer);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn length_units() {
        assert!(close("1in".parse::<Length>().unwrap().to_px(), 96.0));
        assert!(close("2.54cm".parse::<Length>().unwrap().to_inches(), 1.0));
        assert!(close("25.4mm".parse::<Length>().unwrap().to_inches(), 1.0));
        assert!(close("72pt".parse::<Length>().unwrap().to_inches(), 1.0));
        assert!(close("48".parse::<Length>().unwrap().to_inches(), 0.5));
        assert!(close(" 0cm ".parse::<Length>().unwrap().to_px(), 0.0));
    }

    #[test]
    fn length_accepts_exponents() {
        assert_eq!("1e2px".parse::<Length>().unwrap(), Length::px(100.0));
        assert!(close("2.5E-1in".parse::<Length>().unwrap().to_px(), 24.0));
        assert!(close("1e1".parse::<Length>().unwrap().to_px(), 10.0));
        assert!("1e".parse::<Length>().is_err());
    }

    #[test]
    fn length_rejects_garbage() {
        for bad in ["", "cm", "-1cm", "1furlong", "abc", "inf", "1pxpt"] {
            assert!(bad.parse::<Length>().is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let o = RenderOptions::default().with_landscape(true);
        let (w, h) = o.paper_size_inches();
        assert!(close(w, 11.7) && close(h, 8.27));
    }

    #[test]
    fn explicit_size_overrides_format() {
        let o = RenderOptions {
            width: Some(Length::inches(4.0)),
            height: Some(Length::inches(6.0)),
            ..RenderOptions::default()
        };
        assert_eq!(o.paper_size_points(), (288.0, 432.0));
    }

    #[test]
    fn validate_rejects_bad_scale_and_margins() {
        let o = RenderOptions {
            scale: 3.0,
            ..RenderOptions::default()
        };
        assert!(matches!(o.validate(), Err(OptionsError::OutOfRange { field: "scale", .. })));

        let o = RenderOptions::default().with_margins(Margins::uniform(Length::inches(5.0)));
        assert!(o.validate().is_err());
    }

    #[test]
    fn page_ranges_parse() {
        let r: PageRanges = "1-3, 5, 9-".parse().unwrap();
        assert!(r.contains(1) && r.contains(3) && r.contains(5) && r.contains(100));
        assert!(!r.contains(4) && !r.contains(8));

        let r: PageRanges = "-2".parse().unwrap();
        assert!(r.contains(1) && r.contains(2) && !r.contains(3));

        for bad in ["0", "3-1", "x", ",", "1-y"] {
            assert!(bad.parse::<PageRanges>().is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn json_roundtrip_with_camel_case_keys() {
        let o = RenderOptions::from_json(
            r#"{
                "format": "letter",
                "landscape": true,
                "printBackground": false,
                "margin": { "top": "1cm", "left": 48 },
                "displayHeaderFooter": true,
                "pageRanges": "1-2"
            }"#,
        )
        .unwrap();
        assert_eq!(o.format, PaperFormat::Letter);
        assert!(o.landscape && !o.print_background && o.display_header_footer);
        assert!(close(o.margin.top.to_inches(), 1.0 / 2.54));
        assert!(close(o.margin.left.to_inches(), 0.5));
        assert_eq!(o.margin.right, Length::ZERO);

        let back = RenderOptions::from_json(&o.to_json()).unwrap();
        assert_eq!(back.format, o.format);
        assert!(close(back.margin.top.to_px(), o.margin.top.to_px()));
    }

    #[test]
    fn json_rejects_unknown_format() {
        assert!(RenderOptions::from_json(r#"{"format": "B5"}"#).is_err());
    }
}
