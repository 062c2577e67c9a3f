//! Error types shared by the composer, the render options and the engines.

use std::io;

use thiserror::Error;

/// A composed document is missing one of the markers every engine relies on.
///
/// Always a caller error: fix the template and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("HTML content is empty")]
    Empty,

    #[error("missing <html> tag")]
    MissingHtml,

    #[error("missing <body> tag")]
    MissingBody,

    #[error("missing </body> closing tag")]
    MissingBodyClose,
}

/// Failure reported by a [`RenderEngine`](crate::gateway::RenderEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be started (browser missing, launch failure).
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// Content did not finish loading within the engine's own timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Navigation or PDF export failed inside the engine.
    #[error("rendering failed: {0}")]
    Render(String),

    /// The engine returned something that is not a PDF document.
    #[error("engine returned malformed output: {0}")]
    MalformedOutput(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Invalid rendering configuration.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid length {0:?} (expected a number with px, pt, in, cm or mm)")]
    InvalidLength(String),

    #[error("unknown paper format {0:?}")]
    UnknownFormat(String),

    #[error("invalid page range {0:?}")]
    InvalidPageRange(String),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("invalid options JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Error returned by [`RenderGateway::render_to_pdf`](crate::gateway::RenderGateway::render_to_pdf).
#[derive(Debug, Error)]
pub enum RenderError {
    /// Rejected before any rendering attempt.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// Rejected before any rendering attempt.
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// The engine ran and failed. Never retried.
    #[error("{engine} engine: {source}")]
    Engine {
        engine: String,
        #[source]
        source: EngineError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RenderError {
    /// True when the caller can fix the failure by changing its input.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, RenderError::Structural(_) | RenderError::Options(_))
    }
}

/// Failure while loading placeholder data.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid placeholder JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid placeholder data: {0}")]
    InvalidData(String),
}
