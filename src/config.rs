//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The typographic rules themselves are
//! fixed (see [`crate::style`]); the config only covers the page setup, the
//! document title, where output goes and which collaborators run.

use crate::error::Md2PdfError;
use crate::pipeline::render::DocumentRenderer;
use crate::progress::ProgressCallback;
use crate::style::{StyleSheet, INCH};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::{ConversionConfig, PageSize};
///
/// let config = ConversionConfig::builder()
///     .title("The Disconnected Pipeline")
///     .page_size(PageSize::A4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Document title written into the HTML `<title>`. Default: "Whitepaper".
    pub title: String,

    /// Paper size. Default: [`PageSize::Letter`].
    pub page_size: PageSize,

    /// Margin on all four sides, in inches. Range: 0.25–3.0. Default: 1.0.
    pub margin_in: f32,

    /// Print the page number centred in the bottom margin. Default: true.
    pub page_numbers: bool,

    /// Markdown extensions. Default: tables and newline-to-break enabled.
    pub markdown: MarkdownOptions,

    /// Name of the sibling directory derived output paths land in. Default: "pdf".
    ///
    /// A source at `whitepapers/markdown/notes.md` resolves to
    /// `whitepapers/<output_dir_name>/notes.pdf`.
    pub output_dir_name: String,

    /// Also write the assembled HTML (with the style sheet embedded) next to
    /// the PDF. Default: false.
    pub write_html: bool,

    /// Pre-constructed renderer. If None, a [`crate::PdfiumRenderer`] bound
    /// from `PDFIUM_LIB_PATH` or the system library is used.
    pub renderer: Option<Arc<dyn DocumentRenderer>>,

    /// Optional progress callback for per-stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            title: "Whitepaper".to_string(),
            page_size: PageSize::default(),
            margin_in: 1.0,
            page_numbers: true,
            markdown: MarkdownOptions::default(),
            output_dir_name: "pdf".to_string(),
            write_html: false,
            renderer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("title", &self.title)
            .field("page_size", &self.page_size)
            .field("margin_in", &self.margin_in)
            .field("page_numbers", &self.page_numbers)
            .field("markdown", &self.markdown)
            .field("output_dir_name", &self.output_dir_name)
            .field("write_html", &self.write_html)
            .field(
                "renderer",
                &self.renderer.as_ref().map(|_| "<dyn DocumentRenderer>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The style sheet with this config's page setup applied.
    pub fn stylesheet(&self) -> StyleSheet {
        let mut sheet = StyleSheet::default();
        sheet.page.size = self.page_size;
        sheet.page.margin = self.margin_in * INCH;
        sheet.page.page_numbers = self.page_numbers;
        sheet
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn margin_in(mut self, inches: f32) -> Self {
        self.config.margin_in = inches;
        self
    }

    pub fn page_numbers(mut self, v: bool) -> Self {
        self.config.page_numbers = v;
        self
    }

    pub fn markdown(mut self, options: MarkdownOptions) -> Self {
        self.config.markdown = options;
        self
    }

    pub fn output_dir_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_dir_name = name.into();
        self
    }

    pub fn write_html(mut self, v: bool) -> Self {
        self.config.write_html = v;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if !(0.25..=3.0).contains(&c.margin_in) {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Margin must be 0.25–3.0 inches, got {}",
                c.margin_in
            )));
        }
        if c.title.trim().is_empty() {
            return Err(Md2PdfError::InvalidConfig("Title must not be empty".into()));
        }
        let dir = c.output_dir_name.as_str();
        if dir.is_empty() || dir == "." || dir == ".." || dir.contains(['/', '\\']) {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Output directory name must be a single path component, got '{dir}'"
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Paper size for every page of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// US Letter, 8.5 × 11 in. (default)
    #[default]
    Letter,
    /// ISO A4, 210 × 297 mm.
    A4,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
        }
    }

    /// Name used in the CSS `size` descriptor.
    pub fn css_name(self) -> &'static str {
        match self {
            PageSize::Letter => "letter",
            PageSize::A4 => "A4",
        }
    }
}

/// Markdown extensions applied by the markup converter.
///
/// Fenced code blocks are part of CommonMark and always enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownOptions {
    /// Pipe tables (`| a | b |`).
    pub tables: bool,
    /// Turn every newline inside a paragraph into a `<br />`.
    pub hard_breaks: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            hard_breaks: true,
        }
    }
}
