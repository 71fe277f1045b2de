//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step and can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ markup ──▶ assemble ──▶ render
//! (paths)   (md→html)  (document)   (layout + pdfium)
//! ```
//!
//! 1. [`input`]    validate the source file, derive and prepare the output path
//! 2. [`markup`]   markdown → HTML fragment
//! 3. [`assemble`] wrap the fragment in a complete document
//! 4. [`render`]   paginate with the style sheet and produce PDF bytes

pub mod assemble;
pub mod input;
pub mod markup;
pub mod render;
