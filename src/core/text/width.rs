//! Column width of graphemes and styled strings.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::{escape_at, next_escape_or_end};

pub(crate) const TAB_WIDTH: usize = 3;

/// Terminal columns occupied by one grapheme cluster.
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }
    if grapheme == "\t" {
        return TAB_WIDTH;
    }
    // RGI emoji render double-width even when their base code point is narrow.
    if emojis::get(grapheme).is_some() {
        return 2;
    }

    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return 0;
    };
    let base = UnicodeWidthChar::width(first).unwrap_or(0);
    if base == 0 {
        // Leading combiner or control: measure whatever follows.
        return chars.map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0)).sum();
    }
    // A variation selector 16 promotes a narrow base to emoji presentation.
    if base == 1 && grapheme.contains('\u{fe0f}') {
        return 2;
    }
    base
}

/// Visible column count of `input`, ignoring control sequences.
pub fn visible_width(input: &str) -> usize {
    let mut width = 0;
    let mut idx = 0;
    while idx < input.len() {
        if let Some(escape) = escape_at(input, idx) {
            idx += escape.len;
            continue;
        }
        let end = next_escape_or_end(input, idx);
        width += input[idx..end].graphemes(true).map(grapheme_width).sum::<usize>();
        idx = end;
    }
    width
}
