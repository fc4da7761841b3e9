//! Cursor marker protocol.

use crate::core::text::width::visible_width;

/// Zero-width APC sequence a component embeds where the hardware cursor belongs.
pub const CURSOR_MARKER: &str = "\x1b_sanbot:cursor\x07";

/// Position inside a frame, in rows and visible columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    pub row: usize,
    pub col: usize,
}

/// Finds the marker in the last `height` lines (bottom-up), removes it, and returns
/// its position. Lines above the viewport are left untouched.
pub(crate) fn extract_cursor_marker(lines: &mut [String], height: usize) -> Option<CursorPos> {
    let viewport_top = lines.len().saturating_sub(height);
    for row in (viewport_top..lines.len()).rev() {
        let Some(index) = lines[row].find(CURSOR_MARKER) else {
            continue;
        };
        let col = visible_width(&lines[row][..index]);
        lines[row].replace_range(index..index + CURSOR_MARKER.len(), "");
        return Some(CursorPos { row, col });
    }
    None
}

/// Removes every remaining marker so none can reach the terminal.
pub(crate) fn strip_cursor_markers(lines: &mut [String]) {
    for line in lines.iter_mut().filter(|line| line.contains(CURSOR_MARKER)) {
        *line = line.replace(CURSOR_MARKER, "");
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_cursor_marker, strip_cursor_markers, CursorPos, CURSOR_MARKER};

    #[test]
    fn extracts_cursor_marker_and_removes_it() {
        let mut lines = vec![format!("hello{CURSOR_MARKER}")];
        let pos = extract_cursor_marker(&mut lines, 10);
        assert_eq!(pos, Some(CursorPos { row: 0, col: 5 }));
        assert_eq!(lines[0], "hello");
    }

    #[test]
    fn column_counts_wide_glyphs_and_ignores_styles() {
        let mut lines = vec![format!("\x1b[36m│\x1b[0m 你{CURSOR_MARKER}\x1b[7m \x1b[27m")];
        let pos = extract_cursor_marker(&mut lines, 10);
        assert_eq!(pos, Some(CursorPos { row: 0, col: 4 }));
    }

    #[test]
    fn extraction_is_viewport_aware() {
        let mut lines = vec![
            format!("top{CURSOR_MARKER}"),
            "mid".to_string(),
            "bot".to_string(),
        ];
        assert_eq!(extract_cursor_marker(&mut lines, 2), None);
        assert_eq!(lines[0], format!("top{CURSOR_MARKER}"));

        strip_cursor_markers(&mut lines);
        assert_eq!(lines[0], "top");
    }
}
