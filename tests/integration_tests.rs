//! Integration tests for html-press.
//!
//! These tests cover:
//! - structural validation and encoding
//! - placeholder substitution strategies
//! - fragment composition end to end
//! - the gateway contract (no engine call on rejected input)
//! - native engine output, pagination and page ranges

use std::sync::atomic::{AtomicUsize, Ordering};

use html_press::compose::{
    concat_fragments, decode, encode, inject_fragment, load_fragment, substitute_placeholders,
    substitute_placeholders_with, validate, PlaceholderMap, Substitution,
};
use html_press::error::{EngineError, OptionsError, RenderError, StructuralError};
use html_press::gateway::{RenderEngine, RenderGateway};
use html_press::layout_config::PageItem;
use html_press::options::{Length, PaperFormat, RenderOptions};
use html_press::pipeline::NativeEngine;
use html_press::templates;

// =====================================================================
// Helpers
// =====================================================================

/// Engine that counts calls and returns canned bytes or fails.
struct StubEngine {
    calls: AtomicUsize,
    output: Vec<u8>,
    timeout: Option<String>,
}

impl StubEngine {
    fn returning(output: &[u8]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            output: output.to_vec(),
            timeout: None,
        }
    }

    /// Fails every call with `EngineError::Timeout(message)`.
    fn failing(message: &str) -> Self {
        Self {
            timeout: Some(message.to_string()),
            ..Self::returning(b"")
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RenderEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    fn render(&self, _html: &str, _options: &RenderOptions) -> Result<Vec<u8>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.timeout {
            Some(message) => Err(EngineError::Timeout(message.clone())),
            None => Ok(self.output.clone()),
        }
    }
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn all_text(layout: &html_press::layout_config::LayoutConfig) -> String {
    (0..layout.pages.len())
        .flat_map(|i| layout.page_text(i))
        .collect::<Vec<_>>()
        .join(" ")
}

// =====================================================================
// Validation and encoding
// =====================================================================

#[test]
fn validate_reports_first_missing_marker() {
    assert_eq!(validate("   \n"), Err(StructuralError::Empty));
    assert_eq!(validate("<body>x</body>"), Err(StructuralError::MissingHtml));
    assert_eq!(validate("<html><p>x</p></html>"), Err(StructuralError::MissingBody));
    assert_eq!(
        validate("<html><body>hi"),
        Err(StructuralError::MissingBodyClose)
    );
    assert!(validate("<HTML lang=\"en\"><BODY class=\"x\">hi</BODY></HTML>").is_ok());
}

#[test]
fn encode_then_decode_is_identity() {
    for s in [
        "",
        "plain",
        "Tom & Jerry <\"quoted\"> 'single'",
        "café naïve ½",
        "emoji 🎉 and more",
        "&amp; already encoded",
    ] {
        assert_eq!(decode(&encode(s)), s, "round trip of {s:?}");
    }
    assert_eq!(encode(None::<&str>), "");
}

// =====================================================================
// Placeholder substitution
// =====================================================================

#[test]
fn single_pass_does_not_rescan_values() {
    let map = PlaceholderMap::new().with("A", "B").with("B", "C");
    assert_eq!(substitute_placeholders("A", &map), "B");
    assert_eq!(
        substitute_placeholders_with("A", &map, Substitution::SinglePass),
        "B"
    );
}

#[test]
fn cascading_follows_chains() {
    let map = PlaceholderMap::new().with("A", "B").with("B", "C");
    assert_eq!(
        substitute_placeholders_with("A", &map, Substitution::Cascading),
        "C"
    );
}

#[test]
fn overlapping_tokens_prefer_longest() {
    let map = PlaceholderMap::new()
        .with("{{name}}", "short")
        .with("{{name_full}}", "long");
    assert_eq!(
        substitute_placeholders("{{name_full}} / {{name}}", &map),
        "long / short"
    );
}

#[test]
fn placeholder_data_from_json() {
    let map = PlaceholderMap::from_json(r#"{"{{a}}": "1", "{{b}}": null}"#).unwrap();
    assert_eq!(
        substitute_placeholders("[{{a}}][{{b}}]", &map),
        "[1][]"
    );
}

// =====================================================================
// Composition
// =====================================================================

#[test]
fn concat_appends_line_breaks() {
    assert_eq!(concat_fragments(["<p>a</p>", "<p>b</p>"]), "<p>a</p>\n<p>b</p>\n");
    assert_eq!(concat_fragments(Vec::<String>::new()), "");
}

#[test]
fn missing_fragment_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(load_fragment(dir.path().join("nope.html")).unwrap(), "");
    assert_eq!(load_fragment(dir.path()).unwrap(), "");

    // A regular file used as a directory component is missing too.
    let file = dir.path().join("existing.html");
    std::fs::write(&file, "<p>x</p>").unwrap();
    assert_eq!(load_fragment(file.join("child.html")).unwrap(), "");

    let path = dir.path().join("part.html");
    std::fs::write(&path, "<p>part</p>").unwrap();
    assert_eq!(load_fragment(&path).unwrap(), "<p>part</p>");
}

#[test]
fn inject_replaces_every_occurrence() {
    let out = inject_fragment("<i>X</i><b>X</b>", "X", "y");
    assert_eq!(out, "<i>y</i><b>y</b>");
    assert_eq!(inject_fragment("<i>X</i>", "X", None::<&str>), "<i></i>");
}

#[test]
fn composed_fragments_render_end_to_end() {
    let body = concat_fragments([
        "<html><head><title>{{title}}</title></head><body>",
        "<h1>Hello {{name}}</h1>",
        "<p>Welcome aboard.</p>",
        "</body></html>",
    ]);
    let map = PlaceholderMap::new()
        .with("{{title}}", "Greeting")
        .with("{{name}}", encode("Ann & Bob"));
    let html = substitute_placeholders(&body, &map);
    assert!(html.contains("Hello Ann &amp; Bob"));

    let engine = NativeEngine::new();
    let layout = engine
        .layout_document(&html, &RenderOptions::default())
        .unwrap();
    assert_eq!(layout.title, "Greeting");
    assert!(all_text(&layout).contains("Ann & Bob"));

    let gateway = RenderGateway::new(engine);
    let bytes = gateway.render_to_pdf(&html, None).unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn sample_document_renders() {
    let html = templates::sample_document();
    let bytes = RenderGateway::new(NativeEngine::new())
        .render_to_pdf(&html, None)
        .unwrap();
    assert_valid_pdf(&bytes);
}

// =====================================================================
// Gateway contract
// =====================================================================

#[test]
fn structural_error_skips_engine() {
    let stub = StubEngine::returning(b"%PDF-1.7 stub");
    let gateway = RenderGateway::new(&stub);
    let err = gateway.render_to_pdf("<html><body>hi", None).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Structural(StructuralError::MissingBodyClose)
    ));
    assert!(err.is_caller_error());
    assert_eq!(stub.calls(), 0);
}

#[test]
fn invalid_options_skip_engine() {
    let stub = StubEngine::returning(b"%PDF-1.7 stub");
    let gateway = RenderGateway::new(&stub);
    let html = "<html><body>hi</body></html>";

    let bad_scale = RenderOptions {
        scale: 3.0,
        ..RenderOptions::default()
    };
    let err = gateway.render_to_pdf(html, Some(&bad_scale)).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Options(OptionsError::OutOfRange { field: "scale", .. })
    ));

    let bad_ranges = RenderOptions {
        page_ranges: Some("3-1".into()),
        ..RenderOptions::default()
    };
    assert!(gateway.render_to_pdf(html, Some(&bad_ranges)).is_err());
    assert_eq!(stub.calls(), 0);

    gateway.render_to_pdf(html, None).unwrap();
    assert_eq!(stub.calls(), 1);
}

#[test]
fn malformed_engine_output_is_rejected() {
    let html = "<html><body>hi</body></html>";
    for output in [&b""[..], b"<html>not a pdf</html>"] {
        let stub = StubEngine::returning(output);
        let err = RenderGateway::new(&stub)
            .render_to_pdf(html, None)
            .unwrap_err();
        match err {
            RenderError::Engine { engine, source } => {
                assert_eq!(engine, "stub");
                assert!(matches!(source, EngineError::MalformedOutput(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(stub.calls(), 1);
    }
}

#[test]
fn engine_failure_keeps_name_and_diagnostic() {
    let stub = StubEngine::failing("page load exceeded 30s");
    let err = RenderGateway::new(&stub)
        .render_to_pdf("<html><body>hi</body></html>", None)
        .unwrap_err();

    assert!(!err.is_caller_error());
    assert!(err.to_string().contains("page load exceeded 30s"), "{err}");
    match err {
        RenderError::Engine { engine, source } => {
            assert_eq!(engine, "stub");
            match source {
                EngineError::Timeout(message) => assert_eq!(message, "page load exceeded 30s"),
                other => panic!("unexpected engine error {other:?}"),
            }
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(stub.calls(), 1);
}

#[test]
fn render_to_file_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("doc.pdf");
    let written = RenderGateway::new(NativeEngine::new())
        .render_to_file("<html><body><p>file</p></body></html>", None, &path)
        .unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), written);
    assert_valid_pdf(&bytes);
}

// =====================================================================
// Options
// =====================================================================

#[test]
fn options_defaults_and_lengths() {
    let options = RenderOptions::default();
    assert_eq!(options.format, PaperFormat::A4);
    assert!(options.print_background);
    assert!(!options.landscape);
    assert!(!options.display_header_footer);
    assert_eq!(options.margin.top, Length::px(0.0));

    let inch: Length = "1in".parse().unwrap();
    assert_eq!(inch, Length::px(96.0));
    let cm: Length = "2.54cm".parse().unwrap();
    assert!((cm.to_inches() - 1.0).abs() < 1e-9);
}

#[test]
fn options_from_json() {
    let options = RenderOptions::from_json(
        r#"{"format": "letter", "landscape": true, "margin": {"top": "1in", "bottom": 36}, "pageRanges": "1"}"#,
    )
    .unwrap();
    assert_eq!(options.format, PaperFormat::Letter);
    let (w, h) = options.paper_size_inches();
    assert_eq!((w, h), (11.0, 8.5));
    assert_eq!(options.margin.top, Length::inches(1.0));
    assert_eq!(options.margin.bottom, Length::px(36.0));
    assert!(options.validate().is_ok());

    assert!(RenderOptions::from_json(r#"{"format": "B5"}"#).is_err());
}

// =====================================================================
// Native engine
// =====================================================================

#[test]
fn long_documents_paginate() {
    let html = templates::multi_page_document(12);
    let layout = NativeEngine::new()
        .layout_document(&html, &RenderOptions::default())
        .unwrap();
    assert!(layout.pages.len() > 1, "expected several pages");
    assert!(layout.page_text(0).join(" ").contains("Section 1"));
    for (i, page) in layout.pages.iter().enumerate() {
        assert_eq!(page.page_index, i);
    }
}

#[test]
fn page_ranges_drop_pages() {
    let html = templates::multi_page_document(12);
    let gateway = RenderGateway::new(NativeEngine::new());
    let full = gateway.render_to_pdf(&html, None).unwrap();
    let first = gateway
        .render_to_pdf(
            &html,
            Some(&RenderOptions {
                page_ranges: Some("1".into()),
                ..RenderOptions::default()
            }),
        )
        .unwrap();
    assert_valid_pdf(&first);
    assert!(first.len() < full.len());

    let err = gateway
        .render_to_pdf(
            &html,
            Some(&RenderOptions {
                page_ranges: Some("500".into()),
                ..RenderOptions::default()
            }),
        )
        .unwrap_err();
    assert!(matches!(err, RenderError::Engine { .. }));
}

#[test]
fn hidden_content_is_skipped() {
    let html = r#"<html><body>
        <p>visible text</p>
        <div style="display: none"><p>secret text</p></div>
        <script>var hidden = 1;</script>
    </body></html>"#;
    let layout = NativeEngine::new()
        .layout_document(html, &RenderOptions::default())
        .unwrap();
    let text = all_text(&layout);
    assert!(text.contains("visible"));
    assert!(!text.contains("secret"));
    assert!(!text.contains("hidden"));
}

#[test]
fn forced_page_break() {
    let html = r#"<html><body>
        <p>first</p>
        <p style="page-break-before: always">second</p>
    </body></html>"#;
    let layout = NativeEngine::new()
        .layout_document(html, &RenderOptions::default())
        .unwrap();
    assert_eq!(layout.pages.len(), 2);
    assert_eq!(layout.page_text(1), vec!["second"]);
}

#[test]
fn header_footer_renders() {
    let options = RenderOptions {
        display_header_footer: true,
        footer_template: Some(
            r#"<div style="font-size: 9px">Page <span class="pageNumber"></span> of <span class="totalPages"></span></div>"#
                .into(),
        ),
        margin: html_press::options::Margins::uniform(Length::inches(0.5)),
        ..RenderOptions::default()
    };
    let bytes = RenderGateway::new(NativeEngine::new())
        .render_to_pdf(&templates::multi_page_document(4), Some(&options))
        .unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn deeply_nested_markup_renders() {
    let depth = 10_000;
    let html = format!(
        "<html><body>{}x{}</body></html>",
        "<div>".repeat(depth),
        "</div>".repeat(depth)
    );
    let layout = NativeEngine::new()
        .layout_document(&html, &RenderOptions::default())
        .unwrap();
    assert_eq!(all_text(&layout), "x");

    let pdf = RenderGateway::new(NativeEngine::new())
        .render_to_pdf(&html, None)
        .unwrap();
    assert_valid_pdf(&pdf);
}

#[test]
fn unclosed_cells_form_columns() {
    let html = "<html><body><table><tr><td>A<td>B</table></body></html>";
    let layout = NativeEngine::new()
        .layout_document(html, &RenderOptions::default())
        .unwrap();
    let positions: Vec<(String, f32, f32)> = layout.pages[0]
        .items
        .iter()
        .filter_map(|item| match item {
            PageItem::Text { x, y, text, .. } => Some((text.clone(), *x, *y)),
            _ => None,
        })
        .collect();
    assert_eq!(positions.len(), 2, "{positions:?}");
    let (a, b) = (&positions[0], &positions[1]);
    assert_eq!((a.0.as_str(), b.0.as_str()), ("A", "B"));
    assert!(b.1 > a.1, "B should sit right of A: {positions:?}");
    assert_eq!(a.2, b.2, "cells share a row");
}

#[test]
fn tall_table_cell_continues_on_next_page() {
    let lines: String = (0..200).map(|i| format!("<p>line {i}</p>")).collect();
    let html = format!("<html><body><table border=\"1\"><tr><td>{lines}</td></tr></table></body></html>");
    let layout = NativeEngine::new()
        .layout_document(&html, &RenderOptions::default())
        .unwrap();

    assert!(layout.pages.len() > 1, "cell content should span pages");
    let text = all_text(&layout);
    for i in [0, 99, 199] {
        assert!(text.contains(&format!("line {i}")), "line {i} lost");
    }
    let bottom = layout.page_height_pt;
    for page in &layout.pages {
        for item in &page.items {
            if let PageItem::Text { y, .. } = item {
                assert!(*y < bottom, "text below the page edge at {y}");
            }
        }
    }
}
