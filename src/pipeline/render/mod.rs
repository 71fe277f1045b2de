//! HTML document → PDF bytes.
//!
//! Rendering is split in two: [`layout`] turns the parsed HTML ([`html`])
//! and the [`StyleSheet`] into positioned drawing operations per page (pure,
//! no native code), and [`pdfium`] paints those operations into a new PDF
//! with the standard Times and Courier fonts plus an embedded fallback face
//! for other scripts ([`metrics`]).
//!
//! [`DocumentRenderer`] is the seam: the conversion pipeline only sees the
//! trait, so callers and tests can substitute their own engine.

pub mod html;
pub mod layout;
pub mod metrics;
pub mod pdfium;

use crate::error::Md2PdfError;
use crate::style::StyleSheet;

pub use self::metrics::{FallbackFont, FontMetrics};
pub use self::pdfium::PdfiumRenderer;

/// Bytes of a finished PDF plus its page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Turns a complete HTML document into a paginated PDF.
///
/// Implementations must be deterministic for identical input and must not
/// touch the filesystem; the pipeline owns all output writes.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, html: &str, stylesheet: &StyleSheet)
        -> Result<RenderedDocument, Md2PdfError>;
}
