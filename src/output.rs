//! Conversion results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a finished file conversion produced.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Where the PDF was written.
    pub output_path: PathBuf,
    /// Where the HTML sidecar was written, if requested.
    pub html_path: Option<PathBuf>,
    /// The assembled HTML document handed to the renderer.
    pub html: String,
    /// The PDF bytes as written to `output_path`.
    pub pdf: Vec<u8>,
    pub stats: ConversionStats,
}

/// A PDF rendered in memory, without touching the filesystem.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub html: String,
    pub pdf: Vec<u8>,
    pub page_count: usize,
}

/// Sizes and per-stage timings for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub source_bytes: usize,
    pub html_bytes: usize,
    pub pdf_bytes: usize,
    pub page_count: usize,
    pub read_duration_ms: u64,
    pub markup_duration_ms: u64,
    pub render_duration_ms: u64,
    pub write_duration_ms: u64,
    pub total_duration_ms: u64,
}
