//! # html-press – HTML template composition and PDF rendering
//!
//! Documents are assembled from HTML fragments and then handed to a
//! pluggable engine:
//!
//! 1. **Compose** – load, concatenate and inject fragments, substitute
//!    placeholders, encode values ([`compose`], [`placeholders`])
//! 2. **Validate** – structural presence check for `<html>`, `<body>` and
//!    `</body>` ([`compose::validate`])
//! 3. **Render** – a [`RenderGateway`] checks input and options, calls a
//!    [`RenderEngine`] and verifies the result is a PDF ([`gateway`])
//!
//! Two engines ship with the crate:
//!
//! - [`ChromeEngine`] prints through headless Chrome ([`chrome`])
//! - [`NativeEngine`] runs an in-process parse → style → layout → paginate →
//!   printpdf pipeline ([`dom`], [`style`], [`layout`], [`pagination`],
//!   [`render`], [`pipeline`])

pub mod chrome;
pub mod compose;
pub mod dom;
pub mod error;
pub mod fonts;
pub mod gateway;
pub mod layout;
pub mod layout_config;
pub mod options;
pub mod pagination;
pub mod pipeline;
pub mod placeholders;
pub mod render;
pub mod style;
pub mod templates;

// Re-exports for convenience
pub use chrome::{ChromeConfig, ChromeEngine};
pub use compose::{
    concat_fragments, decode, encode, inject_fragment, load_fragment, substitute_placeholders,
    substitute_placeholders_with, validate, PlaceholderMap, Substitution,
};
pub use error::{ComposeError, EngineError, OptionsError, RenderError, StructuralError};
pub use gateway::{RenderEngine, RenderGateway, PDF_MAGIC};
pub use options::{Length, Margins, PaperFormat, RenderOptions};
pub use pipeline::NativeEngine;
