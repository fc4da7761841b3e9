//! Word wrapping for styled text and for plain editor lines.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{escape_at, next_escape_or_end, SgrState};
use super::utils::RESET;
use super::width::{grapheme_width, visible_width};

/// Wraps `text` into lines of at most `width` columns.
///
/// Breaks happen at spaces, and spaces at a break are dropped. A word wider than
/// `width` is split hard with no continuation marker. Styles active at a break are
/// re-opened on the next line and the broken line is closed with a reset. Each `\n`
/// starts a new line.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut carried = SgrState::default();
    for input_line in text.split('\n') {
        let mut prefixed = carried.reopen();
        prefixed.push_str(input_line);
        lines.extend(wrap_line(&prefixed, width));
        carried.apply_all(input_line);
    }
    lines
}

struct Token {
    text: String,
    is_space: bool,
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if visible_width(line) <= width {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut style = SgrState::default();
    let mut current = String::new();
    let mut current_width = 0;

    for token in tokenize(line) {
        let token_width = visible_width(&token.text);

        if token_width > width && !token.is_space {
            if current_width > 0 {
                close_line(&mut lines, &current, &style);
                current = style.reopen();
                current_width = 0;
            }
            split_word(&token.text, width, &mut style, &mut lines, &mut current, &mut current_width);
            continue;
        }

        if current_width + token_width > width && current_width > 0 {
            close_line(&mut lines, &current, &style);
            style.apply_all(&token.text);
            current = style.reopen();
            if token.is_space {
                current_width = 0;
            } else {
                current.push_str(&token.text);
                current_width = token_width;
            }
            continue;
        }

        current.push_str(&token.text);
        current_width += token_width;
        style.apply_all(&token.text);
    }

    if current_width > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn close_line(lines: &mut Vec<String>, current: &str, style: &SgrState) {
    let mut line = current.trim_end_matches(' ').to_string();
    if !style.is_plain() {
        line.push_str(RESET);
    }
    lines.push(line);
}

fn split_word(
    word: &str,
    width: usize,
    style: &mut SgrState,
    lines: &mut Vec<String>,
    current: &mut String,
    current_width: &mut usize,
) {
    let mut idx = 0;
    while idx < word.len() {
        if let Some(escape) = escape_at(word, idx) {
            let sequence = &word[idx..idx + escape.len];
            current.push_str(sequence);
            style.apply(sequence);
            idx += escape.len;
            continue;
        }
        let end = next_escape_or_end(word, idx);
        for grapheme in word[idx..end].graphemes(true) {
            let grapheme_cols = grapheme_width(grapheme);
            if *current_width + grapheme_cols > width && *current_width > 0 {
                close_line(lines, current, style);
                *current = style.reopen();
                *current_width = 0;
            }
            current.push_str(grapheme);
            *current_width += grapheme_cols;
        }
        idx = end;
    }
}

/// Splits into alternating runs of spaces and non-spaces. Escape sequences attach to
/// the token of the character that follows them.
fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut current = String::new();
    let mut current_is_space = false;
    let mut pending = String::new();
    let mut idx = 0;

    while idx < line.len() {
        if let Some(escape) = escape_at(line, idx) {
            pending.push_str(&line[idx..idx + escape.len]);
            idx += escape.len;
            continue;
        }
        let Some(ch) = line[idx..].chars().next() else {
            break;
        };
        let is_space = ch == ' ';
        if is_space != current_is_space && !current.is_empty() {
            tokens.push(Token {
                text: std::mem::take(&mut current),
                is_space: current_is_space,
            });
        }
        current.push_str(&pending);
        pending.clear();
        current_is_space = is_space;
        current.push(ch);
        idx += ch.len_utf8();
    }

    current.push_str(&pending);
    if !current.is_empty() {
        tokens.push(Token {
            text: current,
            is_space: current_is_space,
        });
    }
    tokens
}

/// Greedy word wrap of an unstyled line into contiguous byte ranges.
///
/// The ranges partition `0..line.len()`. Rows break after the last whitespace when
/// possible and hard-split otherwise. A single-column whitespace that overflows a row
/// stays at the end of that row, so a row may reach `width + 1` columns only through
/// that trailing whitespace. When the line ends exactly at such a break the last range
/// is empty.
pub fn wrap_ranges(line: &str, width: usize) -> Vec<Range<usize>> {
    if width == 0 || visible_width(line) <= width {
        return vec![0..line.len()];
    }

    let graphemes: Vec<(usize, &str)> = line.grapheme_indices(true).collect();
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut col = 0;
    let mut break_at: Option<(usize, usize)> = None;
    let mut i = 0;

    while i < graphemes.len() {
        let (idx, grapheme) = graphemes[i];
        let cols = grapheme_width(grapheme);
        let is_space = grapheme.chars().all(char::is_whitespace);

        if col + cols <= width {
            col += cols;
            if is_space {
                break_at = Some((idx + grapheme.len(), col));
            }
            i += 1;
            continue;
        }

        if is_space && cols == 1 {
            let end = idx + grapheme.len();
            ranges.push(start..end);
            start = end;
            col = 0;
            break_at = None;
            i += 1;
            continue;
        }

        if let Some((pos, at_col)) = break_at.take().filter(|(pos, _)| *pos > start) {
            ranges.push(start..pos);
            start = pos;
            col -= at_col;
            continue;
        }

        if idx > start {
            ranges.push(start..idx);
            start = idx;
            col = 0;
            continue;
        }

        // A lone grapheme wider than the row gets a row of its own.
        col += cols;
        i += 1;
    }

    ranges.push(start..line.len());
    ranges
}
