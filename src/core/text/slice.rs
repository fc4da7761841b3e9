//! Column-range slicing of styled strings.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{escape_at, next_escape_or_end};
use super::width::grapheme_width;

/// Result of a column slice: the text and the columns it actually occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub text: String,
    pub width: usize,
}

/// Extracts columns `start..start + len` of `line`.
///
/// Escape sequences seen before the range are carried into the result ahead of the
/// first kept grapheme; escape sequences inside the range are kept in place. With
/// `strict`, a wide grapheme that would cross the right edge is dropped.
pub fn slice_by_column(line: &str, start: usize, len: usize, strict: bool) -> Slice {
    let mut out = Slice {
        text: String::new(),
        width: 0,
    };
    if len == 0 {
        return out;
    }

    let end_col = start.saturating_add(len);
    let mut col = 0;
    let mut idx = 0;
    let mut carried = String::new();

    while idx < line.len() && col < end_col {
        if let Some(escape) = escape_at(line, idx) {
            let sequence = &line[idx..idx + escape.len];
            if col >= start {
                out.text.push_str(sequence);
            } else {
                carried.push_str(sequence);
            }
            idx += escape.len;
            continue;
        }

        let run = &line[idx..next_escape_or_end(line, idx)];
        let mut consumed = run.len();
        for (offset, grapheme) in run.grapheme_indices(true) {
            let width = grapheme_width(grapheme);
            let fits = !strict || col + width <= end_col;
            if col >= start && fits {
                if !carried.is_empty() {
                    out.text.insert_str(0, &std::mem::take(&mut carried));
                }
                out.text.push_str(grapheme);
                out.width += width;
            }
            col += width;
            if col >= end_col {
                consumed = offset + grapheme.len();
                break;
            }
        }
        idx += consumed;
    }

    // Trailing zero-width sequences at the boundary (such as the cursor marker) stay.
    while idx < line.len() && col <= end_col {
        match escape_at(line, idx) {
            Some(escape) if col >= start => {
                out.text.push_str(&line[idx..idx + escape.len]);
                idx += escape.len;
            }
            _ => break,
        }
    }

    out
}
