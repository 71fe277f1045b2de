//! Error types for the edgequake-md2pdf library.
//!
//! Every failure is fatal: the pipeline either writes the complete PDF or
//! writes nothing. [`Md2PdfError`] groups failures by the stage that raised
//! them so the CLI can map each one to a clear message and a non-zero exit.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source markdown file was not found at the given path.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'\nTry: chmod +r {path:?}", path.display())]
    PermissionDenied { path: PathBuf },

    /// The path exists but is a directory or another non-regular file.
    #[error("Not a regular file: '{}'", path.display())]
    NotAFile { path: PathBuf },

    /// The file exists but could not be read as UTF-8 text.
    #[error("Failed to read markdown from '{}': {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the directory that will hold the output file.
    #[error("Failed to create output directory '{}': {source}", path.display())]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{}': {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Render errors ─────────────────────────────────────────────────────
    /// Layout or PDF generation failed.
    #[error("Rendering failed: {detail}")]
    RenderFailed { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
The PDF backend needs the pdfium shared library at runtime. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the md2pdf binary or in the working directory.\n\
  • Install it system-wide (e.g. from bblanchon/pdfium-binaries).\n"
    )]
    PdfiumBindingFailed(String),

    /// The fallback font for non-Latin text could not be read or parsed.
    #[error(
        "Failed to load fallback font '{}': {detail}\n\
Point MD2PDF_FONT (or --font) at a TrueType (.ttf) file.",
        path.display()
    )]
    FontLoadFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Md2PdfError {
    /// True for failures caused by the user-supplied source path.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Md2PdfError::FileNotFound { .. }
                | Md2PdfError::PermissionDenied { .. }
                | Md2PdfError::NotAFile { .. }
                | Md2PdfError::ReadFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display() {
        let e = Md2PdfError::FileNotFound {
            path: PathBuf::from("whitepapers/markdown/missing.md"),
        };
        assert_eq!(
            e.to_string(),
            "File not found: whitepapers/markdown/missing.md"
        );
        assert!(e.is_input_error());
    }

    #[test]
    fn render_failed_display() {
        let e = Md2PdfError::RenderFailed {
            detail: "page content stream rejected".into(),
        };
        assert!(e.to_string().contains("page content stream rejected"));
        assert!(!e.is_input_error());
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = Md2PdfError::OutputWriteFailed {
            path: PathBuf::from("/ro/out.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        assert!(e.to_string().contains("/ro/out.pdf"));
        assert!(e.source().is_some());
    }

    #[test]
    fn font_load_failed_names_the_file() {
        let e = Md2PdfError::FontLoadFailed {
            path: PathBuf::from("/fonts/broken.ttf"),
            detail: "unknown magic".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("/fonts/broken.ttf"));
        assert!(msg.contains("MD2PDF_FONT"));
        assert!(!e.is_input_error());
    }

    #[test]
    fn pdfium_binding_hint_mentions_env_var() {
        let e = Md2PdfError::PdfiumBindingFailed("dlopen failed".into());
        let msg = e.to_string();
        assert!(msg.contains("dlopen failed"));
        assert!(msg.contains("PDFIUM_LIB_PATH"));
    }
}
