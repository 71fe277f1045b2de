//! # edgequake-md2pdf
//!
//! Convert markdown whitepapers into styled, paginated PDF documents.
//!
//! Every document gets the same print layout: a centred title with a rule
//! under it, a lead paragraph and byline, justified body text, shaded code
//! blocks, accented blockquotes, bordered tables and page numbers in the
//! footer. The typography is fixed ([`style`]); only page setup and the
//! document title are configurable.
//!
//! ## Pipeline Overview
//!
//! ```text
//! markdown file
//!  │
//!  ├─ 1. Input     validate the source, derive the output path
//!  ├─ 2. Markup    CommonMark + tables + hard line breaks → HTML fragment
//!  ├─ 3. Assemble  fragment → complete HTML document
//!  ├─ 4. Render    layout with the built-in style sheet → PDF via pdfium
//!  └─ 5. Write     atomic temp-file + rename
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{convert_to_file, ConversionConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     // Writes whitepapers/pdf/02-the-disconnected-pipeline.pdf
//!     let output = convert_to_file(
//!         Path::new("whitepapers/markdown/02_The Disconnected Pipeline.md"),
//!         None,
//!         &config,
//!     )?;
//!     eprintln!("{} pages → {}", output.stats.page_count, output.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! The default [`PdfiumRenderer`] loads the pdfium shared library at
//! runtime. Point `PDFIUM_LIB_PATH` at it, or place it next to the binary,
//! in the working directory, or on the system library path.
//!
//! Text outside Latin-1 is set in an embedded TrueType fallback font. Point
//! `MD2PDF_FONT` at a `.ttf` file (e.g. a CJK face) to choose it; otherwise
//! a common system serif such as DejaVu Serif is used when installed.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod style;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, MarkdownOptions, PageSize};
pub use convert::{convert, convert_to_file, markdown_to_document, render_markdown};
pub use error::Md2PdfError;
pub use output::{ConversionOutput, ConversionStats, RenderedPdf};
pub use pipeline::render::{DocumentRenderer, PdfiumRenderer, RenderedDocument};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use style::StyleSheet;
