//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API), adding header/footer bands and applying
//! the page selection from [`RenderOptions`].

use std::sync::LazyLock;

use printpdf::*;
use regex::{Captures, Regex};

use crate::compose::{decode, encode};
use crate::error::EngineError;
use crate::fonts::{measure_text_width, wrap_text, FontFamily};
use crate::layout_config::{LayoutConfig, PageItem, PageLayout};
use crate::options::RenderOptions;
use crate::style::TextAlign;

const PT_TO_MM: f32 = 0.352778;
/// Header and footer text size when the template sets none.
const BAND_FONT_PT: f32 = 8.0;
/// Minimum horizontal inset of header and footer text.
const BAND_INSET_PT: f32 = 20.0;

static FIELD_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<span\b[^>]*?\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))[^>]*>(.*?)</span\s*>"#,
    )
    .expect("valid regex")
});
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").expect("valid regex"));
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:div|p|br|li|tr|td|th|h[1-6]|table|section)\b[^>]*>")
        .expect("valid regex")
});
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static TEXT_ALIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)text-align\s*:\s*(left|center|right)").expect("valid regex")
});
static FONT_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)font-size\s*:\s*([0-9]*\.?[0-9]+)\s*(px|pt)").expect("valid regex")
});

const DEFAULT_HEADER: &[(TextAlign, &str)] = &[
    (TextAlign::Left, r#"<span class="date"></span>"#),
    (TextAlign::Center, r#"<span class="title"></span>"#),
];
const DEFAULT_FOOTER: &[(TextAlign, &str)] = &[
    (TextAlign::Left, r#"<span class="url"></span>"#),
    (
        TextAlign::Right,
        r#"<span class="pageNumber"></span>/<span class="totalPages"></span>"#,
    ),
];

/// Values substituted into header and footer templates.
#[derive(Debug, Clone)]
pub struct PrintFields<'a> {
    pub page_number: usize,
    pub total_pages: usize,
    pub title: &'a str,
    pub date: &'a str,
    pub url: &'a str,
}

/// Expand a header/footer template to plain text. `<span>` elements with
/// class `pageNumber`, `totalPages`, `title`, `date` or `url` are replaced
/// by the field value; remaining markup is stripped.
pub fn expand_print_template(template: &str, fields: &PrintFields<'_>) -> String {
    let without_style = STYLE_BLOCK.replace_all(template, "");
    let expanded = FIELD_SPAN.replace_all(&without_style, |caps: &Captures<'_>| {
        let classes = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        let value = classes.split_whitespace().find_map(|class| match class {
            "pageNumber" => Some(fields.page_number.to_string()),
            "totalPages" => Some(fields.total_pages.to_string()),
            "title" => Some(fields.title.to_string()),
            "date" => Some(fields.date.to_string()),
            "url" => Some(fields.url.to_string()),
            _ => None,
        });
        match value {
            Some(v) => encode(v.as_str()),
            None => caps.get(4).map_or("", |m| m.as_str()).to_string(),
        }
    });
    let spaced = BLOCK_TAG.replace_all(&expanded, " ");
    let text = ANY_TAG.replace_all(&spaced, "");
    decode(&text).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn template_align(template: &str) -> TextAlign {
    match TEXT_ALIGN
        .captures(template)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .as_deref()
    {
        Some("center") => TextAlign::Center,
        Some("right") => TextAlign::Right,
        _ => TextAlign::Left,
    }
}

fn template_font_size(template: &str) -> f32 {
    FONT_SIZE
        .captures(template)
        .and_then(|c| {
            let size: f32 = c.get(1)?.as_str().parse().ok()?;
            let unit = c.get(2)?.as_str().to_ascii_lowercase();
            Some(if unit == "px" { size * 0.75 } else { size })
        })
        .filter(|s| *s > 0.0)
        .unwrap_or(BAND_FONT_PT)
}

/// Render a LayoutConfig into PDF bytes.
///
/// Pages outside `options.page_ranges` are dropped; a selection matching no
/// page is an error. Background fills are only painted when
/// `options.print_background` is set.
pub fn render_pdf(config: &LayoutConfig, options: &RenderOptions) -> Result<Vec<u8>, EngineError> {
    let ranges = options
        .parsed_page_ranges()
        .map_err(|e| EngineError::Render(e.to_string()))?;
    let total_pages = config.pages.len();
    let selected: Vec<(usize, &PageLayout)> = config
        .pages
        .iter()
        .enumerate()
        .map(|(i, page)| (i + 1, page))
        .filter(|(number, _)| ranges.as_ref().map_or(true, |r| r.contains(*number)))
        .collect();
    if selected.is_empty() {
        return Err(EngineError::Render(format!(
            "page range {:?} selects none of the {total_pages} pages",
            options.page_ranges.as_deref().unwrap_or_default()
        )));
    }

    let page_w = Mm(config.page_width_pt * PT_TO_MM);
    let page_h = Mm(config.page_height_pt * PT_TO_MM);
    let date = chrono::Local::now().format("%-m/%-d/%y").to_string();

    let mut doc = PdfDocument::new(&config.title);
    let mut pages = Vec::with_capacity(selected.len());

    for (number, page_layout) in selected {
        let mut ops = Vec::new();

        if options.print_background {
            if let Some(bg) = config.page_background {
                fill_rect(
                    &mut ops,
                    0.0,
                    0.0,
                    config.page_width_pt,
                    config.page_height_pt,
                    config.page_height_pt,
                    bg,
                );
            }
        }

        for item in &page_layout.items {
            render_item(&mut ops, item, config.page_height_pt, options.print_background);
        }

        if options.display_header_footer {
            let fields = PrintFields {
                page_number: number,
                total_pages,
                title: &config.title,
                date: &date,
                url: "",
            };
            render_band(&mut ops, config, options, &fields, Band::Header);
            render_band(&mut ops, config, options, &fields, Band::Footer);
        }

        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    doc.with_pages(pages);
    let mut warnings = Vec::new();
    // Text is written as raw `Tj` operators, which secure mode strips.
    let save_options = PdfSaveOptions {
        secure: false,
        ..PdfSaveOptions::default()
    };
    let bytes = doc.save(&save_options, &mut warnings);
    if !warnings.is_empty() {
        log::debug!("printpdf reported {} warnings", warnings.len());
    }

    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Header / footer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Header,
    Footer,
}

fn render_band(
    ops: &mut Vec<Op>,
    config: &LayoutConfig,
    options: &RenderOptions,
    fields: &PrintFields<'_>,
    band: Band,
) {
    let template = match band {
        Band::Header => options.header_template.as_deref(),
        Band::Footer => options.footer_template.as_deref(),
    };
    let segments: Vec<(TextAlign, &str)> = match template {
        Some(t) => vec![(template_align(t), t)],
        None => match band {
            Band::Header => DEFAULT_HEADER.to_vec(),
            Band::Footer => DEFAULT_FOOTER.to_vec(),
        },
    };

    let (page_w, page_h) = (config.page_width_pt, config.page_height_pt);
    let left = (options.margin.left.to_points() as f32).max(BAND_INSET_PT);
    let right = page_w - (options.margin.right.to_points() as f32).max(BAND_INSET_PT);
    let width = (right - left).max(1.0);

    for (align, template) in segments {
        let text = expand_print_template(template, fields);
        if text.is_empty() {
            continue;
        }
        let size = template_font_size(template);
        let line_h = size * 1.2;
        let lines = wrap_text(&text, size, FontFamily::Sans, false, width);
        let block_h = line_h * lines.len() as f32;

        let top = match band {
            Band::Header => {
                let margin = options.margin.top.to_points() as f32;
                ((margin - block_h) / 2.0).max(2.0)
            }
            Band::Footer => {
                let margin = options.margin.bottom.to_points() as f32;
                (page_h - margin + (margin - block_h) / 2.0).min(page_h - block_h - 2.0)
            }
        };

        for (i, line) in lines.iter().enumerate() {
            let line_w = measure_text_width(line, size, FontFamily::Sans, false);
            let x = match align {
                TextAlign::Left => left,
                TextAlign::Center => left + (width - line_w) / 2.0,
                TextAlign::Right => right - line_w,
            };
            let baseline = top + i as f32 * line_h + size;
            draw_text(
                ops,
                x,
                page_h - baseline,
                line,
                size,
                BuiltinFont::Helvetica,
                [0.0; 3],
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Page items
// ---------------------------------------------------------------------------

fn render_item(ops: &mut Vec<Op>, item: &PageItem, page_height: f32, print_background: bool) {
    // PDF coordinate system: origin at bottom-left; layout uses top-left.
    match item {
        PageItem::Text {
            x,
            y,
            text,
            font_size,
            family,
            bold,
            italic,
            underline,
            color,
        } => {
            if text.is_empty() {
                return;
            }
            let baseline = page_height - y;
            let font = builtin_font(*family, *bold, *italic);
            draw_text(ops, *x, baseline, text, *font_size, font, *color);

            if *underline {
                let width = measure_text_width(text, *font_size, *family, *bold);
                let uy = baseline - font_size * 0.1;
                stroke_path(
                    ops,
                    vec![point(*x, uy), point(x + width, uy)],
                    false,
                    (font_size / 16.0).max(0.5),
                    *color,
                );
            }
        }
        PageItem::Fill {
            x,
            y,
            width,
            height,
            color,
        } => {
            if print_background {
                fill_rect(ops, *x, *y, *width, *height, page_height, *color);
            }
        }
        PageItem::Rule {
            x1,
            y1,
            x2,
            y2,
            thickness,
            color,
        } => stroke_path(
            ops,
            vec![
                point(*x1, page_height - y1),
                point(*x2, page_height - y2),
            ],
            false,
            *thickness,
            *color,
        ),
        PageItem::Stroke {
            x,
            y,
            width,
            height,
            thickness,
            color,
        } => {
            let (x1, x2) = (*x, x + width);
            let (top, bottom) = (page_height - y, page_height - y - height);
            stroke_path(
                ops,
                vec![
                    point(x1, top),
                    point(x2, top),
                    point(x2, bottom),
                    point(x1, bottom),
                ],
                true,
                *thickness,
                *color,
            );
        }
    }
}

fn builtin_font(family: FontFamily, bold: bool, italic: bool) -> BuiltinFont {
    match (family, bold, italic) {
        (FontFamily::Sans, false, false) => BuiltinFont::Helvetica,
        (FontFamily::Sans, true, false) => BuiltinFont::HelveticaBold,
        (FontFamily::Sans, false, true) => BuiltinFont::HelveticaOblique,
        (FontFamily::Sans, true, true) => BuiltinFont::HelveticaBoldOblique,
        (FontFamily::Serif, false, false) => BuiltinFont::TimesRoman,
        (FontFamily::Serif, true, false) => BuiltinFont::TimesBold,
        (FontFamily::Serif, false, true) => BuiltinFont::TimesItalic,
        (FontFamily::Serif, true, true) => BuiltinFont::TimesBoldItalic,
        (FontFamily::Mono, false, false) => BuiltinFont::Courier,
        (FontFamily::Mono, true, false) => BuiltinFont::CourierBold,
        (FontFamily::Mono, false, true) => BuiltinFont::CourierOblique,
        (FontFamily::Mono, true, true) => BuiltinFont::CourierBoldOblique,
    }
}

fn rgb(c: [f32; 3]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// `baseline` is in PDF coordinates.
fn draw_text(
    ops: &mut Vec<Op>,
    x: f32,
    baseline: f32,
    text: &str,
    size: f32,
    font: BuiltinFont,
    color: [f32; 3],
) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(x),
            y: Pt(baseline),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font,
    });
    ops.push(Op::SetFillColor { col: rgb(color) });
    // printpdf writes builtin-font text as UTF-8 bytes, so the WinAnsi bytes
    // go out as a `Tj` string. The empty write registers the font resource.
    ops.push(Op::WriteTextBuiltinFont {
        items: Vec::new(),
        font,
    });
    ops.push(Op::Unknown {
        key: "Tj".to_string(),
        value: vec![DictItem::String {
            data: to_winlatin(text),
            literal: false,
        }],
    });
    ops.push(Op::EndTextSection);
}

/// `top` is measured from the top of the page.
fn fill_rect(
    ops: &mut Vec<Op>,
    x: f32,
    top: f32,
    width: f32,
    height: f32,
    page_height: f32,
    color: [f32; 3],
) {
    let (x1, x2) = (x, x + width);
    let (y1, y2) = (page_height - top - height, page_height - top);
    ops.push(Op::SetFillColor { col: rgb(color) });
    ops.push(Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![PolygonRing {
                points: vec![point(x1, y1), point(x2, y1), point(x2, y2), point(x1, y2)],
            }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        },
    });
}

fn stroke_path(
    ops: &mut Vec<Op>,
    points: Vec<LinePoint>,
    is_closed: bool,
    thickness: f32,
    color: [f32; 3],
) {
    ops.push(Op::SetOutlineColor { col: rgb(color) });
    ops.push(Op::SetOutlineThickness { pt: Pt(thickness) });
    ops.push(Op::DrawLine {
        line: Line { points, is_closed },
    });
}

/// Encode text for the builtin fonts, which use WinAnsiEncoding (one byte
/// per glyph). Characters without a WinAnsi code become `?`.
fn to_winlatin(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> PrintFields<'static> {
        PrintFields {
            page_number: 2,
            total_pages: 5,
            title: "Q3 <Report>",
            date: "1/2/26",
            url: "",
        }
    }

    #[test]
    fn render_empty_page() {
        let mut config = LayoutConfig::new(595.0, 842.0);
        config.pages.push(PageLayout {
            page_index: 0,
            items: Vec::new(),
        });
        let bytes = render_pdf(&config, &RenderOptions::default()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn page_ranges_filter_pages() {
        let mut config = LayoutConfig::new(595.0, 842.0);
        for i in 0..3 {
            config.pages.push(PageLayout {
                page_index: i,
                items: Vec::new(),
            });
        }
        let options = RenderOptions {
            page_ranges: Some("5-".into()),
            ..RenderOptions::default()
        };
        let err = render_pdf(&config, &options).unwrap_err();
        assert!(matches!(err, EngineError::Render(_)));

        let options = RenderOptions {
            page_ranges: Some("2".into()),
            display_header_footer: true,
            ..RenderOptions::default()
        };
        assert!(render_pdf(&config, &options).is_ok());
    }

    #[test]
    fn template_fields_are_filled() {
        let text = expand_print_template(
            r#"<div style="font-size:10px; text-align:right">Page <span class="pageNumber"></span> of <span class='totalPages'></span></div>"#,
            &fields(),
        );
        assert_eq!(text, "Page 2 of 5");
    }

    #[test]
    fn template_values_are_not_markup() {
        let text = expand_print_template(r#"<span class=title></span>"#, &fields());
        assert_eq!(text, "Q3 <Report>");
    }

    #[test]
    fn unknown_spans_keep_their_text() {
        let text = expand_print_template(
            r#"<style>span { color: red }</style><span class="brand">ACME</span> <span class="date"></span>"#,
            &fields(),
        );
        assert_eq!(text, "ACME 1/2/26");
    }

    #[test]
    fn template_layout_hints() {
        let t = r#"<div style="font-size: 12px; text-align: center">x</div>"#;
        assert_eq!(template_align(t), TextAlign::Center);
        assert_eq!(template_font_size(t), 9.0);
        assert_eq!(template_font_size("<span>x</span>"), BAND_FONT_PT);
    }

    #[test]
    fn winlatin_maps_typographic_characters() {
        assert_eq!(to_winlatin("a\u{2022}b"), vec![b'a', 0x95, b'b']);
        assert_eq!(to_winlatin("caf\u{E9}"), b"caf\xE9".to_vec());
        assert_eq!(to_winlatin("\u{4E2D}"), b"?".to_vec());
    }

    #[test]
    fn text_ops_carry_winlatin_bytes() {
        let mut ops = Vec::new();
        draw_text(
            &mut ops,
            10.0,
            20.0,
            "\u{2018}caf\u{E9}\u{2019}",
            12.0,
            BuiltinFont::Helvetica,
            [0.0; 3],
        );
        assert!(ops.iter().any(|op| matches!(
            op,
            Op::WriteTextBuiltinFont { items, font: BuiltinFont::Helvetica } if items.is_empty()
        )));
        let shown: Vec<&Vec<u8>> = ops
            .iter()
            .filter_map(|op| match op {
                Op::Unknown { key, value } if key == "Tj" => match value.as_slice() {
                    [DictItem::String { data, .. }] => Some(data),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec![&vec![0x91, b'c', b'a', b'f', 0xE9, 0x92]]);
    }

    #[test]
    fn non_ascii_text_renders_to_pdf() {
        let mut config = LayoutConfig::new(200.0, 200.0);
        config.pages.push(PageLayout {
            page_index: 0,
            items: vec![PageItem::Text {
                x: 10.0,
                y: 30.0,
                text: "Gr\u{FC}\u{DF}e \u{2022} \u{20AC}5".to_string(),
                font_size: 12.0,
                family: FontFamily::default(),
                bold: false,
                italic: false,
                underline: false,
                color: [0.0; 3],
            }],
        });
        let bytes = render_pdf(&config, &RenderOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
