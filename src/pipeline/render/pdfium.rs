//! Paint a [`DocumentLayout`] into a new PDF via pdfium.
//!
//! ## Library lookup
//!
//! pdfium is loaded at runtime. [`PdfiumRenderer`] tries, in order:
//!
//! 1. an explicit path ([`PdfiumRenderer::with_library_path`], or
//!    `PDFIUM_LIB_PATH` via [`PdfiumRenderer::from_env`]);
//! 2. the platform library name next to the running executable;
//! 3. the platform library name in the working directory;
//! 4. the system library search path.
//!
//! ## Fonts
//!
//! Latin text is set in the base-14 Times and Courier faces. Characters
//! those faces cannot encode are set in a TrueType fallback font embedded
//! into the PDF: [`PdfiumRenderer::with_fallback_font`] (or `MD2PDF_FONT`),
//! else the first font found in the usual system locations. Layout measures
//! with the same fonts it paints with.

use super::layout::{layout_document_with_metrics, DocumentLayout, DrawOp};
use super::metrics::{is_standard, FallbackFont, FontMetrics};
use super::{DocumentRenderer, RenderedDocument};
use crate::error::Md2PdfError;
use crate::style::{Color, FontFace, FontFamily, StyleSheet};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The default renderer: in-crate layout, pdfium for PDF generation.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library_path: Option<PathBuf>,
    fallback_font: Option<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Honour `PDFIUM_LIB_PATH` and `MD2PDF_FONT` when set and non-empty.
    pub fn from_env() -> Self {
        let var = |name| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            library_path: var("PDFIUM_LIB_PATH"),
            fallback_font: var("MD2PDF_FONT"),
        }
    }

    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
            fallback_font: None,
        }
    }

    /// Use this TrueType file for characters outside WinAnsi.
    pub fn with_fallback_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_font = Some(path.into());
        self
    }

    pub fn library_path(&self) -> Option<&Path> {
        self.library_path.as_deref()
    }

    pub fn fallback_font(&self) -> Option<&Path> {
        self.fallback_font.as_deref()
    }

    /// Metrics for layout. A configured font must load; otherwise the
    /// system locations are tried and a miss leaves the standard fonts only.
    fn metrics(&self) -> Result<FontMetrics, Md2PdfError> {
        let font = match &self.fallback_font {
            Some(path) => Some(FallbackFont::load(path)?),
            None => FallbackFont::discover(),
        };
        Ok(font.map_or_else(FontMetrics::standard, FontMetrics::with_fallback))
    }

    /// Bind to pdfium following the lookup order above.
    fn bind(&self) -> Result<Pdfium, Md2PdfError> {
        if let Some(path) = &self.library_path {
            debug!("Binding pdfium from {}", path.display());
            return Pdfium::bind_to_library(path)
                .map(Pdfium::new)
                .map_err(|e| {
                    Md2PdfError::PdfiumBindingFailed(format!("{}: {:?}", path.display(), e))
                });
        }

        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let candidates = exe_dir
            .into_iter()
            .chain(std::iter::once(PathBuf::from("./")))
            .map(|dir| Pdfium::pdfium_platform_library_name_at_path(&dir));

        for candidate in candidates {
            if !candidate.is_file() {
                continue;
            }
            match Pdfium::bind_to_library(&candidate) {
                Ok(bindings) => {
                    debug!("Bound pdfium from {}", candidate.display());
                    return Ok(Pdfium::new(bindings));
                }
                Err(e) => debug!("Skipping {}: {:?}", candidate.display(), e),
            }
        }

        Pdfium::bind_to_system_library()
            .map(Pdfium::new)
            .map_err(|e| Md2PdfError::PdfiumBindingFailed(format!("{:?}", e)))
    }
}

impl DocumentRenderer for PdfiumRenderer {
    fn render(&self, html: &str, stylesheet: &StyleSheet) -> Result<RenderedDocument, Md2PdfError> {
        let metrics = self.metrics()?;
        let layout = layout_document_with_metrics(html, stylesheet, &metrics);
        if metrics.fallback().is_none() && layout.texts().any(|t| !t.chars().all(is_standard)) {
            warn!("Text outside Latin-1 found but no fallback font is available; set MD2PDF_FONT");
        }
        let pdfium = self.bind()?;
        let bytes = paint(&pdfium, &layout, &metrics)?;
        info!(
            "Rendered {} page(s), {} bytes",
            layout.page_count(),
            bytes.len()
        );
        Ok(RenderedDocument {
            bytes,
            page_count: layout.page_count(),
        })
    }
}

fn render_err(stage: &str, e: PdfiumError) -> Md2PdfError {
    Md2PdfError::RenderFailed {
        detail: format!("{stage}: {e:?}"),
    }
}

fn pdf_color(c: Color) -> PdfColor {
    PdfColor::new(c.r, c.g, c.b, 255)
}

/// Font tokens: one per standard face the layout engine can ask for, plus
/// the embedded fallback face.
struct Fonts {
    serif: [PdfFontToken; 4],
    mono: [PdfFontToken; 4],
    fallback: Option<PdfFontToken>,
}

impl Fonts {
    fn load(document: &mut PdfDocument<'_>, metrics: &FontMetrics) -> Result<Self, Md2PdfError> {
        let fonts = document.fonts_mut();
        let fallback = match metrics.fallback() {
            Some(font) => {
                debug!("Embedding fallback font {}", font.name());
                Some(
                    fonts
                        .load_true_type_from_bytes(font.data(), true)
                        .map_err(|e| render_err("embed fallback font", e))?,
                )
            }
            None => None,
        };
        Ok(Self {
            serif: [
                fonts.times_roman(),
                fonts.times_bold(),
                fonts.times_italic(),
                fonts.times_bold_italic(),
            ],
            mono: [
                fonts.courier(),
                fonts.courier_bold(),
                fonts.courier_oblique(),
                fonts.courier_bold_oblique(),
            ],
            fallback,
        })
    }

    fn get(&self, face: FontFace) -> PdfFontToken {
        let index = match (face.bold, face.italic) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        };
        match face.family {
            FontFamily::Serif => self.serif[index],
            FontFamily::Monospace => self.mono[index],
        }
    }
}

/// Produce PDF bytes for `layout`.
fn paint(
    pdfium: &Pdfium,
    layout: &DocumentLayout,
    metrics: &FontMetrics,
) -> Result<Vec<u8>, Md2PdfError> {
    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| render_err("create document", e))?;
    let fonts = Fonts::load(&mut document, metrics)?;
    let height = layout.height;

    for (index, page_layout) in layout.pages.iter().enumerate() {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::new_custom(
                PdfPoints::new(layout.width),
                PdfPoints::new(height),
            ))
            .map_err(|e| render_err("create page", e))?;

        for op in &page_layout.ops {
            match op {
                DrawOp::Text {
                    x,
                    baseline,
                    text,
                    face,
                    size,
                    color,
                } => {
                    let mut pen = *x;
                    for (fallback, run) in metrics.font_runs(text) {
                        let font = match (fallback, fonts.fallback) {
                            (true, Some(token)) => token,
                            _ => fonts.get(*face),
                        };
                        let mut object =
                            PdfPageTextObject::new(&document, run, font, PdfPoints::new(*size))
                                .map_err(|e| render_err("create text", e))?;
                        object
                            .set_fill_color(pdf_color(*color))
                            .map_err(|e| render_err("text colour", e))?;
                        object
                            .translate(PdfPoints::new(pen), PdfPoints::new(height - baseline))
                            .map_err(|e| render_err("position text", e))?;
                        page.objects_mut()
                            .add_text_object(object)
                            .map_err(|e| render_err("add text", e))?;
                        pen += metrics.text_width(run, *face, *size);
                    }
                }
                DrawOp::Rect {
                    x,
                    top,
                    width,
                    height: rect_height,
                    fill,
                    stroke,
                } => {
                    let rect = PdfRect::new_from_values(
                        height - (top + rect_height),
                        *x,
                        height - top,
                        x + width,
                    );
                    page.objects_mut()
                        .create_path_object_rect(
                            rect,
                            stroke.map(|b| pdf_color(b.color)),
                            stroke.map(|b| PdfPoints::new(b.width)),
                            fill.map(pdf_color),
                        )
                        .map_err(|e| render_err("draw rectangle", e))?;
                }
                DrawOp::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    border,
                } => {
                    page.objects_mut()
                        .create_path_object_line(
                            PdfPoints::new(*x1),
                            PdfPoints::new(height - y1),
                            PdfPoints::new(*x2),
                            PdfPoints::new(height - y2),
                            pdf_color(border.color),
                            PdfPoints::new(border.width),
                        )
                        .map_err(|e| render_err("draw line", e))?;
                }
            }
        }
        debug!("Painted page {} ({} ops)", index + 1, page_layout.ops.len());
    }

    document
        .save_to_bytes()
        .map_err(|e| render_err("serialise document", e))
}
