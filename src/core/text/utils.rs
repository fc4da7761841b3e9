//! Truncation and exact-width helpers.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{escape_at, next_escape_or_end};
use super::slice::slice_by_column;
use super::width::{grapheme_width, visible_width};

pub(crate) const RESET: &str = "\x1b[0m";

/// Shortens `text` so that it, plus `ellipsis`, fits in `max_width` columns.
///
/// Text that already fits is returned unchanged. Escape sequences are preserved up to
/// the cut, and a reset is inserted before the ellipsis so it is never styled by the
/// truncated text.
pub fn truncate_to_width(text: &str, max_width: usize, ellipsis: &str) -> String {
    if max_width == 0 {
        return String::new();
    }
    if visible_width(text) <= max_width {
        return text.to_string();
    }

    let ellipsis_width = visible_width(ellipsis);
    if ellipsis_width >= max_width {
        return slice_by_column(ellipsis, 0, max_width, true).text;
    }
    let budget = max_width - ellipsis_width;

    let mut out = String::with_capacity(text.len() + RESET.len() + ellipsis.len());
    let mut used = 0;
    let mut idx = 0;
    'scan: while idx < text.len() {
        if let Some(escape) = escape_at(text, idx) {
            out.push_str(&text[idx..idx + escape.len]);
            idx += escape.len;
            continue;
        }
        let end = next_escape_or_end(text, idx);
        for grapheme in text[idx..end].graphemes(true) {
            let width = grapheme_width(grapheme);
            if used + width > budget {
                break 'scan;
            }
            out.push_str(grapheme);
            used += width;
        }
        idx = end;
    }

    out.push_str(RESET);
    out.push_str(ellipsis);
    out
}

/// Right-pads `text` with spaces up to `width` columns. Wider text is left as is.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let current = visible_width(text);
    if current >= width {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + width - current);
    out.push_str(text);
    out.extend(std::iter::repeat(' ').take(width - current));
    out
}

/// Returns `text` occupying exactly `width` columns: padded when narrower, strictly
/// sliced when wider. A wide glyph straddling the edge becomes padding.
pub fn fit_to_width(text: &str, width: usize) -> String {
    let current = visible_width(text);
    if current == width {
        return text.to_string();
    }
    if current < width {
        return pad_to_width(text, width);
    }
    let sliced = slice_by_column(text, 0, width, true);
    let mut out = sliced.text;
    out.push_str(RESET);
    out.extend(std::iter::repeat(' ').take(width - sliced.width));
    out
}
