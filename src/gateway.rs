//! Render gateway – the seam between composed HTML and whatever engine turns
//! it into PDF bytes.

use std::path::Path;

use crate::compose::validate;
use crate::error::{EngineError, RenderError};
use crate::options::RenderOptions;

/// Magic bytes every PDF document starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Something that can turn a complete HTML document into PDF bytes.
///
/// Implementations may block on I/O or on an external process. An engine
/// must not share mutable rendering state between concurrent calls.
pub trait RenderEngine: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Render `html` with `options`. Input has already passed structural and
    /// option validation.
    fn render(&self, html: &str, options: &RenderOptions) -> Result<Vec<u8>, EngineError>;
}

impl<T: RenderEngine + ?Sized> RenderEngine for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn render(&self, html: &str, options: &RenderOptions) -> Result<Vec<u8>, EngineError> {
        (**self).render(html, options)
    }
}

impl<T: RenderEngine + ?Sized> RenderEngine for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn render(&self, html: &str, options: &RenderOptions) -> Result<Vec<u8>, EngineError> {
        (**self).render(html, options)
    }
}

/// Validates input and hands it to a [`RenderEngine`].
///
/// Each call is independent; the gateway keeps no state between renders.
#[derive(Debug, Clone)]
pub struct RenderGateway<E> {
    engine: E,
}

impl<E: RenderEngine> RenderGateway<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Render `html` to PDF bytes.
    ///
    /// Structurally invalid HTML and invalid options are rejected before the
    /// engine is touched. Engine failures are returned as-is and never
    /// retried; there is no partial output.
    pub fn render_to_pdf(
        &self,
        html: &str,
        options: Option<&RenderOptions>,
    ) -> Result<Vec<u8>, RenderError> {
        validate(html)?;

        let defaults;
        let options = match options {
            Some(o) => o,
            None => {
                defaults = RenderOptions::default();
                &defaults
            }
        };
        options.validate()?;

        let engine = self.engine.name();
        log::debug!(
            "Rendering {} bytes of HTML with the {engine} engine ({}, landscape={})",
            html.len(),
            options.format,
            options.landscape
        );

        let bytes = self
            .engine
            .render(html, options)
            .and_then(check_pdf)
            .map_err(|source| {
                log::warn!("{engine} engine failed: {source}");
                RenderError::Engine {
                    engine: engine.to_string(),
                    source,
                }
            })?;

        log::info!("Rendered PDF ({} bytes) with the {engine} engine", bytes.len());
        Ok(bytes)
    }

    /// Render and write the PDF to `path`, creating parent directories.
    pub fn render_to_file(
        &self,
        html: &str,
        options: Option<&RenderOptions>,
        path: impl AsRef<Path>,
    ) -> Result<usize, RenderError> {
        let bytes = self.render_to_pdf(html, options)?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &bytes)?;
        Ok(bytes.len())
    }
}

fn check_pdf(bytes: Vec<u8>) -> Result<Vec<u8>, EngineError> {
    if bytes.is_empty() {
        return Err(EngineError::MalformedOutput("empty output".to_string()));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(16)]).into_owned();
        return Err(EngineError::MalformedOutput(format!(
            "missing %PDF- header (starts with {head:?})"
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructuralError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        calls: AtomicUsize,
        output: Vec<u8>,
    }

    impl Fixed {
        fn new(output: &[u8]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                output: output.to_vec(),
            }
        }
    }

    impl RenderEngine for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn render(&self, _html: &str, _options: &RenderOptions) -> Result<Vec<u8>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }
    }

    const DOC: &str = "<html><body>hi</body></html>";

    #[test]
    fn invalid_html_never_reaches_engine() {
        let gateway = RenderGateway::new(Fixed::new(b"%PDF-1.7"));
        let err = gateway.render_to_pdf("<html><body>hi", None).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Structural(StructuralError::MissingBodyClose)
        ));
        assert!(err.is_caller_error());
        assert_eq!(gateway.engine().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_engine_output_is_rejected() {
        let gateway = RenderGateway::new(Fixed::new(b"<html>"));
        let err = gateway.render_to_pdf(DOC, None).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Engine {
                source: EngineError::MalformedOutput(_),
                ..
            }
        ));

        let gateway = RenderGateway::new(Fixed::new(b""));
        assert!(gateway.render_to_pdf(DOC, None).is_err());
    }

    #[test]
    fn boxed_engines_work() {
        let engine: Box<dyn RenderEngine> = Box::new(Fixed::new(b"%PDF-1.7\n"));
        let gateway = RenderGateway::new(engine);
        assert_eq!(gateway.render_to_pdf(DOC, None).unwrap(), b"%PDF-1.7\n");
    }
}
