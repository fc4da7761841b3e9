//! Rendered frame: the lines of one render pass plus the cursor marker found in them.

use crate::core::cursor::{extract_cursor_marker, strip_cursor_markers, CursorPos};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Frame {
    lines: Vec<String>,
    cursor: Option<CursorPos>,
}

impl Frame {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            cursor: None,
        }
    }

    /// Builds a frame from component output, taking the cursor position from the
    /// marker found in the last `height` lines. Every marker is removed.
    pub fn from_rendered_lines(mut lines: Vec<String>, height: usize) -> Self {
        let cursor = extract_cursor_marker(&mut lines, height);
        strip_cursor_markers(&mut lines);
        Self { lines, cursor }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn cursor(&self) -> Option<CursorPos> {
        self.cursor
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl From<Vec<String>> for Frame {
    fn from(lines: Vec<String>) -> Self {
        Self::new(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use crate::core::cursor::{CursorPos, CURSOR_MARKER};

    #[test]
    fn vec_strings_round_trip_preserves_bytes_exactly() {
        let input: Vec<String> = vec![
            String::new(),
            " leading and trailing ".to_string(),
            "\u{1b}[31mred\u{1b}[0m".to_string(),
            "unicode: π你好".to_string(),
        ];
        let frame: Frame = input.clone().into();
        assert_eq!(frame.cursor(), None);
        assert_eq!(frame.into_lines(), input);
    }

    #[test]
    fn rendered_lines_yield_cursor_and_lose_every_marker() {
        let lines = vec![
            format!("stale{CURSOR_MARKER}"),
            "middle".to_string(),
            format!("ab{CURSOR_MARKER}c"),
        ];
        let frame = Frame::from_rendered_lines(lines, 2);
        assert_eq!(frame.cursor(), Some(CursorPos { row: 2, col: 2 }));
        assert_eq!(frame.lines(), ["stale", "middle", "abc"]);
    }
}
