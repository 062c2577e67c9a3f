//! Native engine – ties together parsing, styling, layout, pagination, and
//! rendering into a [`RenderEngine`] that needs no browser.

use crate::dom::{document_title, parse_html};
use crate::error::EngineError;
use crate::gateway::RenderEngine;
use crate::layout::{compute_layout, page_background};
use crate::layout_config::LayoutConfig;
use crate::options::RenderOptions;
use crate::pagination::{paginate, PageGeometry};
use crate::render::render_pdf;
use crate::style::{build_styled_tree, ComputedStyle};

/// In-process engine covering a practical subset of HTML and inline CSS:
/// block flow, headings, lists, tables, preformatted text, colours,
/// backgrounds and page breaks. Scripts are not run, stylesheets and images
/// are ignored and text uses the PDF base-14 fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }

    /// Lay `html` out into pages without producing PDF bytes – useful for
    /// tests and `press render --dump-layout`.
    pub fn layout_document(
        &self,
        html: &str,
        options: &RenderOptions,
    ) -> Result<LayoutConfig, EngineError> {
        let (page_w, page_h) = options.paper_size_points();
        let geometry = PageGeometry {
            width: page_w as f32,
            height: page_h as f32,
            margin_top: options.margin.top.to_points() as f32,
            margin_right: options.margin.right.to_points() as f32,
            margin_bottom: options.margin.bottom.to_points() as f32,
            margin_left: options.margin.left.to_points() as f32,
        };
        if geometry.content_width() <= 0.0 || geometry.content_height() <= 0.0 {
            return Err(EngineError::Render(
                "margins leave no room for content".to_string(),
            ));
        }

        // 1. Parse HTML
        let dom = parse_html(html);

        // 2. Build styled tree
        let root = ComputedStyle::root(options.scale as f32);
        let styled = build_styled_tree(&dom, &root);

        // 3. Compute layout
        let fragments = compute_layout(&styled, &root, geometry.content_width());

        // 4. Paginate
        let mut config = paginate(fragments, &geometry);
        config.page_background = page_background(&styled).map(|c| c.to_rgb());
        config.title = options
            .title
            .clone()
            .or_else(|| document_title(&dom))
            .unwrap_or_else(LayoutConfig::default_title);

        log::debug!(
            "Native layout: {} page(s) of {:.0}x{:.0}pt",
            config.pages.len(),
            config.page_width_pt,
            config.page_height_pt
        );
        Ok(config)
    }
}

impl RenderEngine for NativeEngine {
    fn name(&self) -> &str {
        "native"
    }

    fn render(&self, html: &str, options: &RenderOptions) -> Result<Vec<u8>, EngineError> {
        // 5. Render PDF
        let layout = self.layout_document(html, options)?;
        render_pdf(&layout, options)
    }
}
