//! Diff renderer.
//!
//! Turns successive frames into the smallest practical byte stream: a full
//! clear-and-redraw when the on-screen state cannot be trusted, otherwise a rewrite
//! of the changed suffix reached with relative cursor motion only.

use crate::core::output::TerminalCmd;
use crate::core::text::slice::slice_by_column;
use crate::core::text::utils::RESET;
use crate::core::text::width::visible_width;
use crate::render::Frame;

pub(crate) const SYNC_START: &str = "\x1b[?2026h";
pub(crate) const SYNC_END: &str = "\x1b[?2026l";
pub(crate) const CLEAR_ALL: &str = "\x1b[3J\x1b[2J\x1b[H";
const CLEAR_LINE: &str = "\x1b[2K";

#[derive(Debug, Default)]
pub struct DiffRenderer {
    previous_lines: Vec<String>,
    previous_width: usize,
    /// Last content row of the previous frame.
    cursor_row: usize,
    /// Row the terminal cursor physically sits on, in frame coordinates.
    hardware_cursor_row: usize,
    max_lines_rendered: usize,
    force_full_render: bool,
    strict_width: bool,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Panic on lines wider than the terminal instead of clamping them.
    pub fn set_strict_width(&mut self, strict: bool) {
        self.strict_width = strict;
    }

    pub fn hardware_cursor_row(&self) -> usize {
        self.hardware_cursor_row
    }

    pub fn set_hardware_cursor_row(&mut self, row: usize) {
        self.hardware_cursor_row = row;
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn previous_lines_len(&self) -> usize {
        self.previous_lines.len()
    }

    pub fn previous_width(&self) -> usize {
        self.previous_width
    }

    pub fn max_lines_rendered(&self) -> usize {
        self.max_lines_rendered
    }

    /// First frame row visible on a screen `height` rows tall.
    pub fn viewport_top(&self, height: usize) -> usize {
        self.max_lines_rendered.saturating_sub(height)
    }

    /// Forget everything known about the screen; the next render is full.
    pub fn reset(&mut self) {
        *self = Self {
            force_full_render: true,
            strict_width: self.strict_width,
            ..Self::default()
        };
    }

    pub fn render(
        &mut self,
        frame: Frame,
        width: usize,
        height: usize,
        clear_on_shrink: bool,
    ) -> Vec<TerminalCmd> {
        let lines = self.prepare_lines(frame.into_lines(), width);
        let forced = std::mem::take(&mut self.force_full_render);

        if lines.is_empty() && self.previous_lines.is_empty() && !forced {
            self.previous_width = width;
            return Vec::new();
        }

        let full_reason = if forced {
            Some("forced")
        } else if self.previous_lines.is_empty() {
            Some("first render")
        } else if self.previous_width != width {
            Some("width changed")
        } else if clear_on_shrink && lines.len() < self.max_lines_rendered {
            Some("clear on shrink")
        } else {
            None
        };
        if let Some(reason) = full_reason {
            tracing::debug!(
                reason,
                previous_width = self.previous_width,
                width,
                previous_lines = self.previous_lines.len(),
                lines = lines.len(),
                "full render"
            );
            return vec![TerminalCmd::Bytes(self.full_render(lines, width))];
        }

        let Some((first_changed, last_changed)) = changed_span(&self.previous_lines, &lines) else {
            return Vec::new();
        };

        let viewport_top = self.viewport_top(height);
        if first_changed < viewport_top {
            tracing::debug!(
                reason = "change above viewport",
                first_changed,
                viewport_top,
                "full render"
            );
            return vec![TerminalCmd::Bytes(self.full_render(lines, width))];
        }

        let previous_len = self.previous_lines.len();
        // New rows directly below everything ever drawn are reached by scrolling.
        let append = first_changed == previous_len && previous_len == self.max_lines_rendered;
        let move_target = if append {
            first_changed - 1
        } else {
            first_changed
        };

        let mut buffer = String::from(SYNC_START);
        push_relative_move(&mut buffer, self.hardware_cursor_row, move_target);
        buffer.push_str(if append { "\r\n" } else { "\r" });

        let end = last_changed.max(previous_len - 1);
        for row in first_changed..=end {
            if row > first_changed {
                buffer.push_str("\r\n");
            }
            buffer.push_str(CLEAR_LINE);
            if let Some(line) = lines.get(row) {
                buffer.push_str(line);
            }
        }
        buffer.push_str(SYNC_END);

        tracing::trace!(
            first_changed,
            last_changed,
            end,
            from_row = self.hardware_cursor_row,
            "differential render"
        );

        self.cursor_row = lines.len().saturating_sub(1);
        self.hardware_cursor_row = end;
        self.max_lines_rendered = self.max_lines_rendered.max(end + 1);
        self.previous_lines = lines;
        self.previous_width = width;

        vec![TerminalCmd::Bytes(buffer)]
    }

    fn full_render(&mut self, lines: Vec<String>, width: usize) -> String {
        let mut buffer = String::from(SYNC_START);
        buffer.push_str(CLEAR_ALL);
        buffer.push_str(&lines.join("\r\n"));
        buffer.push_str(SYNC_END);

        self.cursor_row = lines.len().saturating_sub(1);
        self.hardware_cursor_row = self.cursor_row;
        self.max_lines_rendered = lines.len();
        self.previous_lines = lines;
        self.previous_width = width;

        buffer
    }

    /// Clamps over-wide lines and appends the style reset every written line carries.
    fn prepare_lines(&self, lines: Vec<String>, width: usize) -> Vec<String> {
        lines
            .into_iter()
            .enumerate()
            .map(|(row, line)| {
                let line_width = visible_width(&line);
                let mut line = if line_width > width {
                    if self.strict_width {
                        panic!(
                            "rendered line {row} exceeds terminal width ({line_width} > {width})"
                        );
                    }
                    slice_by_column(&line, 0, width, true).text
                } else {
                    line
                };
                line.push_str(RESET);
                line
            })
            .collect()
    }
}

/// First and last index where the frames differ, counting rows present in only one.
fn changed_span(previous: &[String], next: &[String]) -> Option<(usize, usize)> {
    let len = previous.len().max(next.len());
    let differs = |row: &usize| previous.get(*row) != next.get(*row);
    let first = (0..len).find(differs)?;
    let last = (first..len).rev().find(differs).unwrap_or(first);
    Some((first, last))
}

fn push_relative_move(buffer: &mut String, from: usize, to: usize) {
    if to > from {
        buffer.push_str(&format!("\x1b[{}B", to - from));
    } else if to < from {
        buffer.push_str(&format!("\x1b[{}A", from - to));
    }
}

#[cfg(test)]
mod tests {
    use super::{DiffRenderer, CLEAR_ALL, SYNC_END, SYNC_START};
    use crate::core::output::encode_all;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn render(renderer: &mut DiffRenderer, items: &[&str], width: usize) -> String {
        encode_all(&renderer.render(lines(items).into(), width, 24, false))
    }

    #[test]
    fn first_render_clears_and_writes_every_line() {
        let mut renderer = DiffRenderer::new();
        let output = render(&mut renderer, &["one", "two"], 10);
        assert_eq!(
            output,
            format!("{SYNC_START}{CLEAR_ALL}one\x1b[0m\r\ntwo\x1b[0m{SYNC_END}")
        );
        assert_eq!(renderer.hardware_cursor_row(), 1);
        assert_eq!(renderer.max_lines_rendered(), 2);
    }

    #[test]
    fn width_change_triggers_full_clear() {
        let mut renderer = DiffRenderer::new();
        render(&mut renderer, &["line"], 10);
        let output = render(&mut renderer, &["line"], 12);
        assert!(output.contains(CLEAR_ALL));
    }

    #[test]
    fn diff_rewrites_from_first_change_through_old_end() {
        let mut renderer = DiffRenderer::new();
        render(&mut renderer, &["one", "two", "three"], 20);

        let output = render(&mut renderer, &["one", "tWO", "three"], 20);
        assert_eq!(
            output,
            format!("{SYNC_START}\x1b[1A\r\x1b[2KtWO\x1b[0m\r\n\x1b[2Kthree\x1b[0m{SYNC_END}")
        );
        assert!(!output.contains("one"));
        assert_eq!(renderer.hardware_cursor_row(), 2);
    }

    #[test]
    fn shrinking_blanks_tail_without_rewriting_head() {
        let mut renderer = DiffRenderer::new();
        render(&mut renderer, &["a", "b", "c", "d", "e"], 10);

        let output = render(&mut renderer, &["a", "b", "c"], 10);
        assert_eq!(
            output,
            format!("{SYNC_START}\x1b[1A\r\x1b[2K\r\n\x1b[2K{SYNC_END}")
        );
        assert_eq!(renderer.cursor_row(), 2);
        assert_eq!(renderer.hardware_cursor_row(), 4);
        assert_eq!(renderer.max_lines_rendered(), 5);
    }

    #[test]
    fn appended_lines_scroll_in_with_newlines() {
        let mut renderer = DiffRenderer::new();
        render(&mut renderer, &["a"], 10);

        let output = render(&mut renderer, &["a", "b", "c"], 10);
        assert_eq!(
            output,
            format!("{SYNC_START}\r\n\x1b[2Kb\x1b[0m\r\n\x1b[2Kc\x1b[0m{SYNC_END}")
        );
        assert_eq!(renderer.hardware_cursor_row(), 2);
        assert_eq!(renderer.max_lines_rendered(), 3);
    }

    #[test]
    fn regrowing_into_blanked_rows_moves_down() {
        let mut renderer = DiffRenderer::new();
        render(&mut renderer, &["a", "b", "c"], 10);
        render(&mut renderer, &["a"], 10);
        assert_eq!(renderer.hardware_cursor_row(), 2);

        let output = render(&mut renderer, &["a", "b"], 10);
        assert_eq!(
            output,
            format!("{SYNC_START}\x1b[1A\r\x1b[2Kb\x1b[0m{SYNC_END}")
        );
    }

    #[test]
    fn identical_render_produces_no_output() {
        let mut renderer = DiffRenderer::new();
        render(&mut renderer, &["line"], 20);
        assert!(render(&mut renderer, &["line"], 20).is_empty());
    }

    #[test]
    fn zero_lines_with_nothing_on_screen_writes_nothing() {
        let mut renderer = DiffRenderer::new();
        assert!(render(&mut renderer, &[], 20).is_empty());
        assert_eq!(renderer.previous_width(), 20);
    }

    #[test]
    fn reset_forces_full_render_even_if_identical() {
        let mut renderer = DiffRenderer::new();
        render(&mut renderer, &["one", "two"], 20);
        renderer.reset();
        let forced = render(&mut renderer, &["one", "two"], 20);
        assert!(forced.starts_with(&format!("{SYNC_START}{CLEAR_ALL}")));
        assert!(render(&mut renderer, &["one", "two"], 20).is_empty());
    }

    #[test]
    fn change_above_viewport_falls_back_to_full_render() {
        let mut renderer = DiffRenderer::new();
        let tall: Vec<String> = (0..30).map(|i| format!("row {i}")).collect();
        renderer.render(tall.clone().into(), 20, 10, false);

        let mut changed = tall;
        changed[5] = "edited".to_string();
        let output = encode_all(&renderer.render(changed.into(), 20, 10, false));
        assert!(output.contains(CLEAR_ALL));
    }

    #[test]
    fn clear_on_shrink_turns_shrink_into_full_render() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["a", "b"]).into(), 10, 24, true);
        let output = encode_all(&renderer.render(lines(&["a"]).into(), 10, 24, true));
        assert!(output.contains(CLEAR_ALL));
        assert_eq!(renderer.max_lines_rendered(), 1);
    }

    #[test]
    fn overflow_is_clamped_by_default() {
        let mut renderer = DiffRenderer::new();
        render(&mut renderer, &["12345"], 5);
        let output = render(&mut renderer, &["abcdef"], 5);
        assert!(output.contains("abcde\x1b[0m"));
        assert!(!output.contains("abcdef"));
    }

    #[test]
    fn overflow_panics_in_strict_mode() {
        let mut renderer = DiffRenderer::new();
        renderer.set_strict_width(true);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            render(&mut renderer, &["abcdef"], 5);
        }));
        assert!(result.is_err());
    }

    #[test]
    fn reset_keeps_strict_width_setting() {
        let mut renderer = DiffRenderer::new();
        renderer.set_strict_width(true);
        renderer.reset();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            render(&mut renderer, &["abcdef"], 5);
        }));
        assert!(result.is_err());
    }
}
