//! Progress-callback trait for conversion stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages. The `md2pdf` binary uses
//! it to print the familiar "Reading markdown from: …" lines and to drive a
//! spinner while the renderer works.
//!
//! # Example
//!
//! ```rust
//! use edgequake_md2pdf::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         eprintln!("{stage} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ConversionStats;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Read the markdown source.
    Read,
    /// Markdown → HTML fragment.
    Markup,
    /// Fragment → complete HTML document.
    Assemble,
    /// HTML + style sheet → PDF bytes.
    Render,
    /// Persist the PDF (and optional HTML sidecar).
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Markup => "markup",
            Stage::Assemble => "assemble",
            Stage::Render => "render",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// Called by the conversion pipeline as it runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is single-threaded, but the trait is
/// `Send + Sync` so a config holding it can be shared freely.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called before the source file is read.
    fn on_read_start(&self, source: &Path) {
        let _ = source;
    }

    /// Called before the renderer is invoked.
    ///
    /// `output` is `None` for in-memory conversions.
    fn on_render_start(&self, output: Option<&Path>) {
        let _ = output;
    }

    /// Called after each stage finishes.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called once the output file has been written.
    fn on_conversion_complete(&self, output: &Path, stats: &ConversionStats) {
        let _ = (output, stats);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
