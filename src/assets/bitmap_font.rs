use font8x8::{BASIC_FONTS, GREEK_FONTS, HIRAGANA_FONTS, LATIN_FONTS, MISC_FONTS, UnicodeFonts};

/// Cell size of the built-in font in font units.
pub const CELL: u32 = 8;

/// Rows of a hollow box drawn for characters the built-in font does not cover.
const MISSING_GLYPH: [u8; 8] = [0x7E, 0x42, 0x42, 0x42, 0x42, 0x42, 0x7E, 0x00];

/// Eight rows of one glyph; bit `x` of a row is the pixel at column `x`.
pub fn glyph_rows(c: char) -> [u8; 8] {
    if c == ' ' {
        return [0; 8];
    }
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| GREEK_FONTS.get(c))
        .or_else(|| HIRAGANA_FONTS.get(c))
        .or_else(|| MISC_FONTS.get(c))
        .unwrap_or(MISSING_GLYPH)
}

/// Visible characters laid out by the built-in font (control and format marks skipped).
pub fn layout_chars(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| !c.is_control() && !is_format_mark(*c))
        .collect()
}

fn is_format_mark(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' | '\u{FEFF}')
}

/// Pixel extent of `text` when each font unit is `scale` pixels.
pub fn measure(text: &str, scale: f64) -> (f64, f64) {
    let n = layout_chars(text).len() as f64;
    (n * f64::from(CELL) * scale, f64::from(CELL) * scale)
}

/// Unit squares `(col, row)` lit for `text`, in font units from the text origin.
pub fn lit_cells(text: &str) -> Vec<(u32, u32)> {
    let mut cells = Vec::new();
    for (i, c) in layout_chars(text).into_iter().enumerate() {
        let rows = glyph_rows(c);
        for (y, row) in rows.iter().enumerate() {
            for x in 0..CELL {
                if row & (1 << x) != 0 {
                    cells.push((i as u32 * CELL + x, y as u32));
                }
            }
        }
    }
    cells
}
