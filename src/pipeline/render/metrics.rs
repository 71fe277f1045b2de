//! Advance widths for line breaking.
//!
//! Text the base-14 Times and Courier faces can encode (WinAnsi) is measured
//! with their published AFM widths (thousandths of an em); bold-italic uses
//! the bold table. Everything else (Greek, arrows, CJK, most symbols) is set
//! in an embedded TrueType [`FallbackFont`] and measured from that font's
//! `hmtx` advances, so the layout and the painted glyphs agree.

use crate::error::Md2PdfError;
use crate::style::{FontFace, FontFamily};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Widths for printable ASCII, `' '` (0x20) through `'~'` (0x7e).
type AsciiWidths = [u16; 95];

#[rustfmt::skip]
const TIMES_ROMAN: AsciiWidths = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: AsciiWidths = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC: AsciiWidths = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

/// Every Courier glyph is 600 units wide.
const COURIER_WIDTH: u16 = 600;

/// Accented Latin-1 letters (U+00C0..=U+00FF) borrow the width of their
/// base letter. `*` marks the few that have their own entry below.
const LATIN1_BASE: &[u8; 64] = b"AAAAAA*CEEEEIIIIDNOOOOO*OUUUUYPsaaaaaa*ceeeeiiiidnooooo*ouuuuypy";

/// The WinAnsi code points above Latin-1's C1 gap.
const WIN_ANSI_EXTRAS: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

/// Fonts tried, in order, when no fallback font is configured.
const SYSTEM_FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif.ttf",
    "/usr/share/fonts/truetype/noto/NotoSerif-Regular.ttf",
    "/usr/share/fonts/noto/NotoSerif-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSerif.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\arialuni.ttf",
    "C:\\Windows\\Fonts\\seguisym.ttf",
];

/// True when the base-14 fonts can encode `c`.
pub fn is_standard(c: char) -> bool {
    c.is_ascii() || ('\u{a0}'..='\u{ff}').contains(&c) || WIN_ANSI_EXTRAS.contains(c)
}

/// Width of `c` in a standard face, in thousandths of an em.
pub fn char_width(face: FontFace, c: char) -> u16 {
    if face.family == FontFamily::Monospace {
        return COURIER_WIDTH;
    }
    let table = match (face.bold, face.italic) {
        (true, _) => &TIMES_BOLD,
        (false, true) => &TIMES_ITALIC,
        (false, false) => &TIMES_ROMAN,
    };
    match c {
        ' '..='~' => table[c as usize - 0x20],
        '\u{a0}' => table[0],
        '•' => 350,
        '‘' | '’' | '‚' | '‹' | '›' => 333,
        '“' | '”' | '„' => 444,
        '–' | '€' | '†' | '‡' => 500,
        '—' | '…' | '‰' => 1000,
        '©' | '®' => 760,
        '×' | '÷' | '±' => 564,
        'Æ' => 889,
        'æ' => 667,
        'Œ' => 889,
        'œ' => 722,
        _ => latin1_base(c).map_or(500, |base| table[base as usize - 0x20]),
    }
}

fn latin1_base(c: char) -> Option<char> {
    let index = (c as u32).checked_sub(0xc0)? as usize;
    LATIN1_BASE
        .get(index)
        .map(|&b| b as char)
        .filter(|&b| b != '*')
}

/// Width of `text` set in a standard `face` at `size` points.
pub fn text_width(text: &str, face: FontFace, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(face, c))).sum();
    units as f32 * size / 1000.0
}

// ── Fallback font ────────────────────────────────────────────────────────

/// A TrueType face embedded for characters outside WinAnsi.
pub struct FallbackFont {
    name: String,
    data: Vec<u8>,
    /// Advance per mapped character, in thousandths of an em.
    widths: HashMap<char, u16>,
}

impl std::fmt::Debug for FallbackFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackFont")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .field("glyphs", &self.widths.len())
            .finish()
    }
}

impl FallbackFont {
    /// Read and parse a `.ttf` file.
    pub fn load(path: &Path) -> Result<Self, Md2PdfError> {
        let data = std::fs::read(path).map_err(|e| Md2PdfError::FontLoadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Self::from_bytes(path, data)
    }

    /// Parse an in-memory TrueType font. `origin` names it in errors and logs.
    pub fn from_bytes(origin: &Path, data: Vec<u8>) -> Result<Self, Md2PdfError> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| Md2PdfError::FontLoadFailed {
            path: origin.to_path_buf(),
            detail: e.to_string(),
        })?;
        let units_per_em = u32::from(face.units_per_em().max(1));

        let mut widths = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                subtable.codepoints(|code_point| {
                    let Some(c) = char::from_u32(code_point) else {
                        return;
                    };
                    let advance = subtable
                        .glyph_index(code_point)
                        .and_then(|glyph| face.glyph_hor_advance(glyph));
                    if let Some(advance) = advance {
                        let units = u32::from(advance) * 1000 / units_per_em;
                        widths.entry(c).or_insert(units.min(u32::from(u16::MAX)) as u16);
                    }
                });
            }
        }
        if widths.is_empty() {
            return Err(Md2PdfError::FontLoadFailed {
                path: origin.to_path_buf(),
                detail: "no Unicode character map".into(),
            });
        }

        let name = origin
            .file_name()
            .map_or_else(|| origin.display().to_string(), |n| n.to_string_lossy().into_owned());
        debug!("Fallback font {} maps {} characters", name, widths.len());
        Ok(Self { name, data, widths })
    }

    /// First readable font from the platform's usual locations.
    pub fn discover() -> Option<Self> {
        SYSTEM_FALLBACK_FONTS
            .iter()
            .map(PathBuf::from)
            .filter(|path| path.is_file())
            .find_map(|path| match Self::load(&path) {
                Ok(font) => Some(font),
                Err(e) => {
                    debug!("Skipping fallback font: {e}");
                    None
                }
            })
    }

    #[cfg(test)]
    pub(crate) fn with_widths(name: &str, widths: impl IntoIterator<Item = (char, u16)>) -> Self {
        Self {
            name: name.to_string(),
            data: Vec::new(),
            widths: widths.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw font file, for embedding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn covers(&self, c: char) -> bool {
        self.widths.contains_key(&c)
    }

    fn width(&self, c: char) -> Option<u16> {
        self.widths.get(&c).copied()
    }
}

// ── Combined metrics ─────────────────────────────────────────────────────

/// Measures text the way the painter will set it.
#[derive(Debug, Clone, Default)]
pub struct FontMetrics {
    fallback: Option<Arc<FallbackFont>>,
}

impl FontMetrics {
    /// Base-14 fonts only.
    pub fn standard() -> Self {
        Self::default()
    }

    pub fn with_fallback(font: FallbackFont) -> Self {
        Self {
            fallback: Some(Arc::new(font)),
        }
    }

    pub fn fallback(&self) -> Option<&FallbackFont> {
        self.fallback.as_deref()
    }

    /// True when `c` is painted with the fallback font.
    pub fn uses_fallback(&self, c: char) -> bool {
        !is_standard(c) && self.fallback.as_ref().is_some_and(|f| f.covers(c))
    }

    pub fn char_width(&self, face: FontFace, c: char) -> u16 {
        if self.uses_fallback(c) {
            if let Some(width) = self.fallback.as_ref().and_then(|f| f.width(c)) {
                return width;
            }
        }
        char_width(face, c)
    }

    pub fn text_width(&self, text: &str, face: FontFace, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| u32::from(self.char_width(face, c)))
            .sum();
        units as f32 * size / 1000.0
    }

    /// Split `text` into maximal runs painted with the same font.
    /// `true` marks fallback-font runs.
    pub fn font_runs<'t>(&self, text: &'t str) -> Vec<(bool, &'t str)> {
        let mut runs = Vec::new();
        let mut start = 0;
        let mut current: Option<bool> = None;
        for (i, c) in text.char_indices() {
            let fallback = self.uses_fallback(c);
            match current {
                Some(kind) if kind == fallback => {}
                Some(kind) => {
                    runs.push((kind, &text[start..i]));
                    start = i;
                    current = Some(fallback);
                }
                None => current = Some(fallback),
            }
        }
        if let Some(kind) = current {
            runs.push((kind, &text[start..]));
        }
        runs
    }
}
