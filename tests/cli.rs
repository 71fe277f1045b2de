//! Tests for the `md2pdf` binary.
//!
//! Argument and input errors never reach the renderer, so those run
//! everywhere. The full conversion needs libpdfium and is gated behind
//! `PDFIUM_LIB_PATH`.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test cli -- --nocapture

use std::process::{Command, Output};

fn md2pdf(args: &[&str], cwd: &std::path::Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_md2pdf"))
        .args(args)
        .current_dir(cwd)
        .env_remove("MD2PDF_JSON")
        .env_remove("MD2PDF_QUIET")
        .output()
        .expect("failed to spawn md2pdf")
}

#[test]
fn no_arguments_prints_usage_and_exits_1() {
    let tmp = tempfile::tempdir().unwrap();
    let out = md2pdf(&[], tmp.path());

    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Usage: md2pdf <markdown_file> [output_file]"), "{stdout}");
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn missing_file_exits_1_without_side_effects() {
    let tmp = tempfile::tempdir().unwrap();
    let out = md2pdf(&["markdown/nope.md"], tmp.path());

    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Error: File not found: markdown/nope.md"), "{stdout}");
    assert!(!tmp.path().join("pdf").exists());
}

#[test]
fn unknown_flag_exits_1() {
    let tmp = tempfile::tempdir().unwrap();
    let out = md2pdf(&["--no-such-flag", "a.md"], tmp.path());
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn help_lists_examples() {
    let tmp = tempfile::tempdir().unwrap();
    let out = md2pdf(&["--help"], tmp.path());
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("EXAMPLES:"));
    assert!(stdout.contains("--page-size"));
}

#[test]
fn converts_whitepaper_when_pdfium_available() {
    if std::env::var_os("PDFIUM_LIB_PATH").is_none() {
        println!("SKIP: set PDFIUM_LIB_PATH to run the full CLI conversion");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let markdown = tmp.path().join("whitepapers/markdown");
    std::fs::create_dir_all(&markdown).unwrap();
    std::fs::write(
        markdown.join("02_The Disconnected Pipeline.md"),
        "# The Disconnected Pipeline\n\nLead\n\nByline\n\nBody text.\n",
    )
    .unwrap();

    let out = md2pdf(
        &["whitepapers/markdown/02_The Disconnected Pipeline.md"],
        tmp.path(),
    );

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {stdout}\nstderr: {}", String::from_utf8_lossy(&out.stderr));
    let pdf = tmp
        .path()
        .join("whitepapers/pdf/02-the-disconnected-pipeline.pdf");
    assert!(stdout.contains("Reading markdown from: whitepapers/markdown/02_The Disconnected Pipeline.md"));
    assert!(stdout.contains("Generating PDF: whitepapers/pdf/02-the-disconnected-pipeline.pdf"));
    assert!(stdout.contains("✓ PDF generated successfully: whitepapers/pdf/02-the-disconnected-pipeline.pdf"));
    // Piped stdout carries no colour codes.
    assert!(!stdout.contains('\x1b'), "{stdout:?}");
    assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF-"));

    // Second run overwrites without error.
    let again = md2pdf(
        &["whitepapers/markdown/02_The Disconnected Pipeline.md"],
        tmp.path(),
    );
    assert!(again.status.success());
}
