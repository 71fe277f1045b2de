//! Input resolution: validate the markdown source and work out where the PDF goes.
//!
//! Whitepaper sources live in a `markdown/` directory next to a `pdf/`
//! directory, and are named with a numeric ordering prefix:
//!
//! ```text
//! whitepapers/
//!   markdown/02_The Disconnected Pipeline.md
//!   pdf/02-the-disconnected-pipeline.pdf      ← derived
//! ```
//!
//! When the caller supplies no output path, [`derive_output_path`] applies
//! that naming rule. Sources without a prefix keep their stem unchanged.

use crate::error::Md2PdfError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Leading decimal digits (any script), an underscore, then at least one
/// more character.
static RE_NUMBERED_STEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)_(.+)$").unwrap());

/// Validate that `path` is an existing, readable regular file.
pub fn resolve_source(path: &Path) -> Result<PathBuf, Md2PdfError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(Md2PdfError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(Md2PdfError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
    };

    if !meta.is_file() {
        return Err(Md2PdfError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    debug!("Resolved markdown source: {}", path.display());
    Ok(path.to_path_buf())
}

/// Output file name for a source stem.
///
/// `02_The Disconnected Pipeline` → `02-the-disconnected-pipeline.pdf`,
/// `notes` → `notes.pdf`.
pub fn output_file_name(stem: &str) -> String {
    match RE_NUMBERED_STEM.captures(stem) {
        Some(caps) => format!(
            "{}-{}.pdf",
            &caps[1],
            caps[2].replace(' ', "-").to_lowercase()
        ),
        None => format!("{stem}.pdf"),
    }
}

/// Derive `<source.parent.parent>/<dir_name>/<output_file_name(stem)>`.
///
/// A relative source with too few components resolves its missing parents
/// to the current directory, so `notes.md` maps to `pdf/notes.pdf`.
pub fn derive_output_path(source: &Path, dir_name: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let grandparent = parent_or_self(&parent_or_self(source));
    grandparent.join(dir_name).join(output_file_name(&stem))
}

/// Parent directory, with the root and the empty path mapping to themselves.
fn parent_or_self(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        Some(_) => PathBuf::new(),
        None => path.to_path_buf(),
    }
}

/// Directory containing `path`; `.` when it has none.
pub fn parent_or_current(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Explicit output wins; otherwise derive one next to the source tree.
pub fn resolve_output(source: &Path, explicit: Option<&Path>, dir_name: &str) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => derive_output_path(source, dir_name),
    }
}

/// Create the output file's parent directory (and its ancestors).
///
/// Succeeds when the directory already exists.
pub fn ensure_output_dir(output: &Path) -> Result<(), Md2PdfError> {
    let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|source| Md2PdfError::OutputDirFailed {
        path: parent.to_path_buf(),
        source,
    })?;
    debug!("Output directory ready: {}", parent.display());
    Ok(())
}

/// Read the source as UTF-8 text.
pub fn read_source(path: &Path) -> Result<String, Md2PdfError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => Md2PdfError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => Md2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Md2PdfError::ReadFailed {
            path: path.to_path_buf(),
            source,
        },
    })
}
