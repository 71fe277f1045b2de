//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate that maps CLI arguments to
//! `ConversionConfig`, prints progress and reports the result.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use edgequake_md2pdf::{
    convert_to_file, ConversionConfig, ConversionProgressCallback, ConversionStats, PageSize,
    PdfiumRenderer, ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: md2pdf <markdown_file> [output_file]";
const USAGE_EXAMPLE: &str =
    "Example: md2pdf whitepapers/markdown/02_The\\ Disconnected\\ Pipeline.md";

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────
// Colour only reaches terminals; piped output stays plain.

fn green(s: &str, colour: bool) -> String {
    if colour {
        format!("\x1b[32m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}
fn dim(s: &str, colour: bool) -> String {
    if colour {
        format!("\x1b[2m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

fn success_line(output: &Path, colour: bool) -> String {
    format!("{} PDF generated successfully: {}", green("✓", colour), output.display())
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Prints the stage messages on stdout and spins on stderr while the
/// renderer works.
struct CliProgressCallback {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
        })
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_read_start(&self, source: &Path) {
        println!("Reading markdown from: {}", source.display());
    }

    fn on_render_start(&self, output: Option<&Path>) {
        if let Some(output) = output {
            println!("Generating PDF: {}", output.display());
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Laying out pages…");
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(bar);
        }
    }

    fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
        if stage == Stage::Render {
            self.stop_spinner();
        }
    }

    fn on_conversion_complete(&self, output: &Path, _stats: &ConversionStats) {
        self.stop_spinner();
        println!("{}", success_line(output, io::stdout().is_terminal()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Derive the output path: whitepapers/pdf/02-the-disconnected-pipeline.pdf
  md2pdf "whitepapers/markdown/02_The Disconnected Pipeline.md"

  # Explicit output path
  md2pdf notes.md out/notes.pdf

  # A4 paper, custom title, keep the styled HTML next to the PDF
  md2pdf --page-size a4 --title "Field Notes" --html notes.md

  # Machine-readable stats
  md2pdf --json notes.md

OUTPUT NAMING:
  A source stem of the form <digits>_<name> becomes <digits>-<name>.pdf with
  spaces replaced by hyphens and the name lowercased. Any other stem keeps its
  name. Derived paths land in a "pdf" directory next to the source's parent.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to the pdfium shared library
  MD2PDF_FONT       TrueType fallback font for non-Latin text
  MD2PDF_TITLE      Default document title
  RUST_LOG          Override the log filter (e.g. edgequake_md2pdf=debug)
"#;

/// Convert markdown whitepapers to styled PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert markdown whitepapers to styled PDF documents",
    long_about = "Convert a markdown file into a paginated PDF with a fixed whitepaper \
layout: centred title, lead paragraph and byline, justified body text, shaded code \
blocks, accented quotes, bordered tables and page numbers.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown source file.
    markdown_file: Option<PathBuf>,

    /// Output PDF path. Derived from the source name when omitted.
    output_file: Option<PathBuf>,

    /// Document title written into the HTML head.
    #[arg(long, env = "MD2PDF_TITLE", default_value = "Whitepaper")]
    title: String,

    /// Paper size.
    #[arg(long, env = "MD2PDF_PAGE_SIZE", value_enum, default_value = "letter")]
    page_size: PageSizeArg,

    /// Page margin in inches (0.25–3.0).
    #[arg(long, env = "MD2PDF_MARGIN", default_value_t = 1.0)]
    margin: f32,

    /// Omit the page-number footer.
    #[arg(long, env = "MD2PDF_NO_PAGE_NUMBERS")]
    no_page_numbers: bool,

    /// Also write the styled HTML document next to the PDF.
    #[arg(long, env = "MD2PDF_HTML")]
    html: bool,

    /// Print conversion stats as JSON on stdout instead of progress lines.
    #[arg(long, env = "MD2PDF_JSON")]
    json: bool,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// TrueType font for characters outside Latin-1 (Greek, arrows, CJK…).
    #[arg(long, env = "MD2PDF_FONT")]
    font: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    Letter,
    A4,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::A4 => PageSize::A4,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return Ok(ExitCode::from(1));
        }
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // Progress lines carry the user-facing output; library logs stay at
    // error level unless asked for.
    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let Some(source) = cli.markdown_file.clone() else {
        println!("{USAGE}");
        println!("{USAGE_EXAMPLE}");
        return Ok(ExitCode::from(1));
    };

    let show_progress = !cli.quiet && !cli.json;
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = match convert_to_file(&source, cli.output_file.as_deref(), &config) {
        Ok(output) => output,
        Err(e) if e.is_input_error() => {
            println!("Error: {e}");
            return Ok(ExitCode::from(1));
        }
        Err(e) => return Err(e).context("Conversion failed"),
    };

    if cli.json {
        let json =
            serde_json::to_string_pretty(&output.stats).context("Failed to serialise stats")?;
        println!("{json}");
    } else if !cli.quiet {
        if let Some(html_path) = &output.html_path {
            println!("  HTML: {}", html_path.display());
        }
        eprintln!(
            "{}",
            dim(
                &format!(
                    "   {} page(s), {} bytes, {}ms",
                    output.stats.page_count, output.stats.pdf_bytes, output.stats.total_duration_ms
                ),
                io::stderr().is_terminal()
            )
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut renderer = match &cli.pdfium_lib {
        Some(path) => PdfiumRenderer::with_library_path(path),
        None => PdfiumRenderer::new(),
    };
    if let Some(font) = &cli.font {
        renderer = renderer.with_fallback_font(font);
    }

    let mut builder = ConversionConfig::builder()
        .title(cli.title.clone())
        .page_size(cli.page_size.into())
        .margin_in(cli.margin)
        .page_numbers(!cli.no_page_numbers)
        .write_html(cli.html)
        .renderer(Arc::new(renderer));

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_line_is_plain_when_piped() {
        let line = success_line(Path::new("pdf/notes.pdf"), false);
        assert_eq!(line, "✓ PDF generated successfully: pdf/notes.pdf");
    }

    #[test]
    fn success_line_is_green_on_a_terminal() {
        let line = success_line(Path::new("pdf/notes.pdf"), true);
        assert!(line.starts_with("\x1b[32m✓\x1b[0m "));
        assert!(line.ends_with("PDF generated successfully: pdf/notes.pdf"));
    }

    #[test]
    fn font_flag_reaches_renderer_config() {
        let cli = Cli::try_parse_from(["md2pdf", "--font", "/fonts/cjk.ttf", "notes.md"]).unwrap();
        assert_eq!(cli.font.as_deref(), Some(Path::new("/fonts/cjk.ttf")));
        assert!(build_config(&cli, None).is_ok());
    }
}
