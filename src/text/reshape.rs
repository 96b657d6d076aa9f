//! Contextual reshaping and visual reordering for right-to-left captions.
//!
//! Caption words are laid out as a single left-to-right run, so right-to-left text is
//! converted into its final visual form up front:
//!
//! 1. Arabic-script letters are replaced by their contextual presentation forms (isolated,
//!    initial, medial, final) and lam + alef pairs by their mandatory ligatures.
//! 2. The result is reordered into visual order with the Unicode bidi algorithm.
//! 3. The visual string is wrapped in a left-to-right override so the layout engine renders
//!    it exactly as given.

use ar_reshaper::reshape_line;
use unicode_bidi::BidiInfo;

use crate::text::locale::ScriptFamily;

const LRO: char = '\u{202D}';
const PDF: char = '\u{202C}';

/// Arabic tashkil and other combining marks that do not affect joining.
fn is_harakat(c: char) -> bool {
    matches!(c, '\u{0610}'..='\u{061A}' | '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}')
}

/// Replace Arabic-script letters by their contextual presentation forms (logical order kept).
///
/// Covers the Persian, Urdu and Pashto letters as well as the lam + alef ligatures.
/// Harakat are dropped: after visual reordering they would precede their base letter.
pub fn reshape_arabic(text: &str) -> String {
    let letters: String = text.chars().filter(|c| !is_harakat(*c)).collect();
    reshape_line(letters)
}

/// Reorder logical text into visual (left-to-right display) order.
pub fn visual_order(text: &str) -> String {
    let info = BidiInfo::new(text, None);
    let mut out = String::with_capacity(text.len());
    for para in &info.paragraphs {
        out.push_str(&info.reorder_line(para, para.range.clone()));
    }
    out
}

/// Text ready for a left-to-right layout pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayText {
    /// Characters in the order they are laid out.
    pub text: String,
    /// Whether reshaping and reordering were applied.
    pub reshaped: bool,
}

impl DisplayText {
    /// Visible characters, without the directional override marks.
    pub fn visible_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.text.chars().filter(|c| *c != LRO && *c != PDF)
    }
}

/// Prepare `text` for layout under `family`'s rules. Non-RTL text passes through unchanged.
pub fn prepare_display_text(text: &str, family: ScriptFamily) -> DisplayText {
    if !family.needs_reshaping() {
        return DisplayText {
            text: text.to_string(),
            reshaped: false,
        };
    }
    let visual = visual_order(&reshape_arabic(text));
    let mut wrapped = String::with_capacity(visual.len() + 6);
    wrapped.push(LRO);
    wrapped.push_str(&visual);
    wrapped.push(PDF);
    DisplayText {
        text: wrapped,
        reshaped: true,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/reshape.rs"]
mod tests;
