//! Conversion entry points.
//!
//! [`convert_to_file`] is the full pipeline the CLI runs: resolve paths,
//! read, convert, render, then write the PDF atomically. [`convert`] and
//! [`render_markdown`] do the same work in memory for callers that handle
//! their own I/O.

use crate::config::ConversionConfig;
use crate::error::Md2PdfError;
use crate::output::{ConversionOutput, ConversionStats, RenderedPdf};
use crate::pipeline::render::{DocumentRenderer, PdfiumRenderer};
use crate::pipeline::{assemble, input, markup};
use crate::progress::Stage;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Convert a markdown file and write the PDF.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `source`: Path to the markdown file
/// * `output`: Explicit output path; `None` derives one next to the source
///   (see [`crate::pipeline::input::derive_output_path`])
/// * `config`: Conversion configuration
///
/// # Errors
/// - Source missing, unreadable or not a regular file. Nothing is created.
/// - Output directory or file cannot be written.
/// - The renderer fails (including pdfium not being available).
///
/// On error no PDF exists at the output path: every output is written to a
/// temporary sibling first and renamed into place only once all of them
/// are complete.
pub fn convert_to_file(
    source: &Path,
    output: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    let total_start = Instant::now();
    let cb = config.progress_callback.as_ref();

    // ── Step 1: Resolve paths ────────────────────────────────────────────
    let source = input::resolve_source(source)?;
    let output_path = input::resolve_output(&source, output, &config.output_dir_name);
    info!(
        "Converting {} → {}",
        source.display(),
        output_path.display()
    );

    // ── Step 2: Read ─────────────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_read_start(&source);
    }
    let read_start = Instant::now();
    let markdown = input::read_source(&source)?;
    let read_duration_ms = elapsed_ms(read_start);
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Read, read_duration_ms);
    }

    // ── Step 3: Output directory ─────────────────────────────────────────
    input::ensure_output_dir(&output_path)?;

    // ── Step 4: Markup, assemble, render ─────────────────────────────────
    let (rendered, markup_duration_ms, render_duration_ms) =
        run_pipeline(&markdown, config, Some(&output_path))?;

    // ── Step 5: Write ────────────────────────────────────────────────────
    let write_start = Instant::now();
    let staged_pdf = stage_file(&output_path, &rendered.pdf)?;
    let staged_html = if config.write_html {
        let path = output_path.with_extension("html");
        let styled = assemble::assemble_with_style(
            &markup::markdown_to_html(&markdown, &config.markdown),
            &config.title,
            Some(&config.stylesheet().to_css()),
        );
        let staged = stage_file(&path, styled.as_bytes())?;
        Some((path, staged))
    } else {
        None
    };

    // Sidecar first: if it cannot be placed, the PDF is never renamed in.
    let html_path = match staged_html {
        Some((path, staged)) => {
            commit_file(staged, &path)?;
            debug!("Wrote HTML sidecar {}", path.display());
            Some(path)
        }
        None => None,
    };
    if let Err(e) = commit_file(staged_pdf, &output_path) {
        if let Some(path) = &html_path {
            if let Err(rm) = std::fs::remove_file(path) {
                warn!("Could not remove HTML sidecar {}: {rm}", path.display());
            }
        }
        return Err(e);
    }
    let write_duration_ms = elapsed_ms(write_start);
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Write, write_duration_ms);
    }

    // ── Step 6: Stats ────────────────────────────────────────────────────
    let stats = ConversionStats {
        source_bytes: markdown.len(),
        html_bytes: rendered.html.len(),
        pdf_bytes: rendered.pdf.len(),
        page_count: rendered.page_count,
        read_duration_ms,
        markup_duration_ms,
        render_duration_ms,
        write_duration_ms,
        total_duration_ms: elapsed_ms(total_start),
    };
    info!(
        "Wrote {} ({} pages, {} bytes) in {}ms",
        output_path.display(),
        stats.page_count,
        stats.pdf_bytes,
        stats.total_duration_ms
    );
    if let Some(cb) = cb {
        cb.on_conversion_complete(&output_path, &stats);
    }

    Ok(ConversionOutput {
        output_path,
        html_path,
        html: rendered.html,
        pdf: rendered.pdf,
        stats,
    })
}

/// Convert a markdown file to PDF bytes without writing anything.
pub fn convert(source: &Path, config: &ConversionConfig) -> Result<RenderedPdf, Md2PdfError> {
    let source = input::resolve_source(source)?;
    if let Some(cb) = &config.progress_callback {
        cb.on_read_start(&source);
    }
    let markdown = input::read_source(&source)?;
    render_markdown(&markdown, config)
}

/// Render markdown text to PDF bytes in memory.
///
/// # Example
/// ```rust,no_run
/// use edgequake_md2pdf::{render_markdown, ConversionConfig};
///
/// let pdf = render_markdown("# Hello\n\nWorld", &ConversionConfig::default()).unwrap();
/// assert!(pdf.pdf.starts_with(b"%PDF"));
/// ```
pub fn render_markdown(
    markdown: &str,
    config: &ConversionConfig,
) -> Result<RenderedPdf, Md2PdfError> {
    let (rendered, _, _) = run_pipeline(markdown, config, None)?;
    Ok(rendered)
}

/// The complete HTML document the renderer receives for `markdown`.
pub fn markdown_to_document(markdown: &str, config: &ConversionConfig) -> String {
    let fragment = markup::markdown_to_html(markdown, &config.markdown);
    assemble::assemble_document(&fragment, &config.title)
}

/// Markup → assemble → render. Returns the result plus markup and render
/// durations.
fn run_pipeline(
    markdown: &str,
    config: &ConversionConfig,
    output: Option<&Path>,
) -> Result<(RenderedPdf, u64, u64), Md2PdfError> {
    let cb = config.progress_callback.as_ref();

    let markup_start = Instant::now();
    let fragment = markup::markdown_to_html(markdown, &config.markdown);
    let markup_duration_ms = elapsed_ms(markup_start);
    debug!("Markup produced {} bytes of HTML", fragment.len());
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Markup, markup_duration_ms);
    }

    let assemble_start = Instant::now();
    let html = assemble::assemble_document(&fragment, &config.title);
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Assemble, elapsed_ms(assemble_start));
    }

    let renderer = resolve_renderer(config);
    if let Some(cb) = cb {
        cb.on_render_start(output);
    }
    let render_start = Instant::now();
    let document = renderer.render(&html, &config.stylesheet())?;
    let render_duration_ms = elapsed_ms(render_start);
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Render, render_duration_ms);
    }

    Ok((
        RenderedPdf {
            html,
            pdf: document.bytes,
            page_count: document.page_count,
        },
        markup_duration_ms,
        render_duration_ms,
    ))
}

/// Resolve which renderer to use.
///
/// Fallback chain:
/// 1. `config.renderer` (caller-supplied)
/// 2. [`PdfiumRenderer::from_env`] (`PDFIUM_LIB_PATH`, then standard locations)
fn resolve_renderer(config: &ConversionConfig) -> Arc<dyn DocumentRenderer> {
    match &config.renderer {
        Some(renderer) => Arc::clone(renderer),
        None => Arc::new(PdfiumRenderer::from_env()),
    }
}

/// Write `bytes` to a temporary file beside `path`. Dropping the result
/// without [`commit_file`] deletes it.
fn stage_file(path: &Path, bytes: &[u8]) -> Result<NamedTempFile, Md2PdfError> {
    let write_err = |source| Md2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let dir = input::parent_or_current(path);
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    Ok(tmp)
}

/// Rename a staged file into place, replacing any existing file.
fn commit_file(staged: NamedTempFile, path: &Path) -> Result<(), Md2PdfError> {
    staged
        .persist(path)
        .map_err(|e| Md2PdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e.error,
        })?;
    Ok(())
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
