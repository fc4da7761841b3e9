//! Multi-line text editor widget.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::core::component::{Component, Focusable};
use crate::core::cursor::{CursorPos, CURSOR_MARKER};
use crate::core::keys::{parse_key, Key, PASTE_END, PASTE_START};
use crate::core::text::utils::fit_to_width;
use crate::core::text::width::visible_width;
use crate::core::text::wrap::wrap_ranges;

const HINT: &str = "  Press Enter to submit, Shift+Enter for new line";
const HINT_STYLE: &str = "\x1b[90m";
const FG_RESET: &str = "\x1b[39m";
const REVERSE: &str = "\x1b[7m";
const REVERSE_OFF: &str = "\x1b[27m";

pub type EditorCallback = Box<dyn FnMut(String)>;

pub struct EditorTheme {
    pub border_color: Box<dyn Fn(&str) -> String>,
}

impl Default for EditorTheme {
    fn default() -> Self {
        Self {
            border_color: Box::new(|text| format!("\x1b[36m{text}{FG_RESET}")),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EditorOptions {
    /// Shift/Alt+Enter splits lines and pastes keep their line breaks.
    pub multiline: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self { multiline: true }
    }
}

#[derive(Debug, Clone)]
struct EditorState {
    lines: Vec<String>,
    cursor_line: usize,
    /// Byte offset into the cursor line, always on a grapheme boundary.
    cursor_col: usize,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_line: 0,
            cursor_col: 0,
        }
    }
}

pub struct Editor {
    state: EditorState,
    focused: bool,
    multiline: bool,
    border_color: Box<dyn Fn(&str) -> String>,
    /// Cursor cell in the last rendered lines, while focused.
    last_cursor: Option<CursorPos>,
    on_submit: Option<EditorCallback>,
    on_change: Option<EditorCallback>,
}

impl Editor {
    pub fn new(theme: EditorTheme, options: EditorOptions) -> Self {
        Self {
            state: EditorState::default(),
            focused: false,
            multiline: options.multiline,
            border_color: theme.border_color,
            last_cursor: None,
            on_submit: None,
            on_change: None,
        }
    }

    pub fn get_lines(&self) -> Vec<String> {
        self.state.lines.clone()
    }

    pub fn get_text(&self) -> String {
        self.state.lines.join("\n")
    }

    /// Cursor as `(line, column)` where the column counts characters.
    pub fn get_cursor(&self) -> (usize, usize) {
        let line = self.current_line();
        (
            self.state.cursor_line,
            line[..self.state.cursor_col].chars().count(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.state.lines.len() == 1 && self.state.lines[0].is_empty()
    }

    /// Replaces the buffer, normalizing `\r\n` and `\r` to `\n`. The cursor moves to
    /// the end of the text.
    pub fn set_text(&mut self, text: &str) {
        let normalized = normalize_line_endings(text);
        self.state.lines = normalized.split('\n').map(str::to_string).collect();
        self.state.cursor_line = self.state.lines.len() - 1;
        self.state.cursor_col = self.current_line().len();
    }

    pub fn clear(&mut self) {
        self.state = EditorState::default();
    }

    pub fn set_on_submit(&mut self, handler: Option<EditorCallback>) {
        self.on_submit = handler;
    }

    pub fn set_on_change(&mut self, handler: Option<EditorCallback>) {
        self.on_change = handler;
    }

    pub fn set_border_color(&mut self, border_color: Box<dyn Fn(&str) -> String>) {
        self.border_color = border_color;
    }

    fn current_line(&self) -> &str {
        &self.state.lines[self.state.cursor_line]
    }

    fn emit_change(&mut self) {
        let text = self.get_text();
        if let Some(handler) = self.on_change.as_mut() {
            handler(text);
        }
    }

    fn submit_value(&mut self) {
        let text = self.get_text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        let value = trimmed.to_string();
        tracing::debug!(chars = value.chars().count(), "editor submit");
        if let Some(handler) = self.on_submit.as_mut() {
            handler(value);
        }
        self.clear();
        self.emit_change();
    }

    /// Inserts text at the cursor; `\n` splits the line.
    fn insert_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let line_index = self.state.cursor_line;
        let col = self.state.cursor_col;
        let tail = self.state.lines[line_index].split_off(col);

        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            self.state.lines[line_index].push_str(first);
        }
        let mut current = line_index;
        for piece in pieces {
            current += 1;
            self.state.lines.insert(current, piece.to_string());
        }

        self.state.cursor_line = current;
        self.state.cursor_col = self.state.lines[current].len();
        self.state.lines[current].push_str(&tail);
        true
    }

    fn insert_printable(&mut self, data: &str) -> bool {
        let printable: String = data.chars().filter(|ch| !ch.is_control()).collect();
        self.insert_text(&printable)
    }

    fn handle_paste(&mut self, data: &str) -> bool {
        let content = data.strip_prefix(PASTE_START).unwrap_or(data);
        let content = content.strip_suffix(PASTE_END).unwrap_or(content);
        let normalized = normalize_line_endings(content);
        let break_replacement = if self.multiline { '\n' } else { ' ' };

        let mut cleaned = String::with_capacity(normalized.len());
        for ch in normalized.chars() {
            match ch {
                '\n' => cleaned.push(break_replacement),
                '\t' => cleaned.push_str("    "),
                ch if ch.is_control() => {}
                ch => cleaned.push(ch),
            }
        }
        self.insert_text(&cleaned)
    }

    fn add_new_line(&mut self) -> bool {
        if !self.multiline {
            return false;
        }
        self.insert_text("\n")
    }

    fn handle_backspace(&mut self) -> bool {
        let col = self.state.cursor_col;
        if col > 0 {
            let line = &mut self.state.lines[self.state.cursor_line];
            let len = line[..col].graphemes(true).next_back().map_or(0, str::len);
            line.replace_range(col - len..col, "");
            self.state.cursor_col = col - len;
            return true;
        }
        if self.state.cursor_line == 0 {
            return false;
        }
        let current = self.state.lines.remove(self.state.cursor_line);
        self.state.cursor_line -= 1;
        let previous = &mut self.state.lines[self.state.cursor_line];
        self.state.cursor_col = previous.len();
        previous.push_str(&current);
        true
    }

    fn handle_forward_delete(&mut self) -> bool {
        let col = self.state.cursor_col;
        let line_index = self.state.cursor_line;
        let line = &mut self.state.lines[line_index];
        if col < line.len() {
            let len = line[col..].graphemes(true).next().map_or(0, str::len);
            line.replace_range(col..col + len, "");
            return true;
        }
        if line_index + 1 >= self.state.lines.len() {
            return false;
        }
        let next = self.state.lines.remove(line_index + 1);
        self.state.lines[line_index].push_str(&next);
        true
    }

    fn delete_to_end_of_line(&mut self) -> bool {
        let col = self.state.cursor_col;
        let line = &mut self.state.lines[self.state.cursor_line];
        if col == line.len() {
            return false;
        }
        line.truncate(col);
        true
    }

    fn delete_to_start_of_line(&mut self) -> bool {
        let col = self.state.cursor_col;
        if col == 0 {
            return false;
        }
        self.state.lines[self.state.cursor_line].replace_range(..col, "");
        self.state.cursor_col = 0;
        true
    }

    fn move_vertical(&mut self, down: bool) {
        let target = if down {
            self.state.cursor_line + 1
        } else {
            match self.state.cursor_line.checked_sub(1) {
                Some(target) => target,
                None => return,
            }
        };
        if target >= self.state.lines.len() {
            return;
        }
        let (_, chars) = self.get_cursor();
        self.state.cursor_line = target;
        self.state.cursor_col = byte_offset_for_chars(self.current_line(), chars);
    }

    fn move_left(&mut self) {
        let col = self.state.cursor_col;
        if col > 0 {
            let len = self.current_line()[..col]
                .graphemes(true)
                .next_back()
                .map_or(0, str::len);
            self.state.cursor_col = col - len;
        } else if self.state.cursor_line > 0 {
            self.state.cursor_line -= 1;
            self.state.cursor_col = self.current_line().len();
        }
    }

    fn move_right(&mut self) {
        let col = self.state.cursor_col;
        let line = self.current_line();
        if col < line.len() {
            let len = line[col..].graphemes(true).next().map_or(0, str::len);
            self.state.cursor_col = col + len;
        } else if self.state.cursor_line + 1 < self.state.lines.len() {
            self.state.cursor_line += 1;
            self.state.cursor_col = 0;
        }
    }

    fn dispatch_key(&mut self, key: Key) -> bool {
        match key {
            Key::Enter => {
                self.submit_value();
                false
            }
            Key::NewLine => self.add_new_line(),
            Key::Backspace => self.handle_backspace(),
            Key::Delete | Key::Ctrl('d') => self.handle_forward_delete(),
            Key::Ctrl('k') => self.delete_to_end_of_line(),
            Key::Ctrl('u') => self.delete_to_start_of_line(),
            Key::Up => {
                self.move_vertical(false);
                false
            }
            Key::Down => {
                self.move_vertical(true);
                false
            }
            Key::Left => {
                self.move_left();
                false
            }
            Key::Right => {
                self.move_right();
                false
            }
            Key::Home | Key::Ctrl('a') => {
                self.state.cursor_col = 0;
                false
            }
            Key::End | Key::Ctrl('e') => {
                self.state.cursor_col = self.current_line().len();
                false
            }
            _ => false,
        }
    }

    /// Rows of one logical line: byte ranges plus the row holding the cursor.
    fn layout_line(&self, index: usize, layout_width: usize) -> (Vec<Range<usize>>, Option<usize>) {
        let ranges = wrap_ranges(&self.state.lines[index], layout_width);
        if index != self.state.cursor_line {
            return (ranges, None);
        }
        let col = self.state.cursor_col;
        let row = ranges
            .iter()
            .rposition(|range| range.start <= col)
            .unwrap_or(0);
        (ranges, Some(row))
    }

    fn cursor_cell(&self, before: &str, after: &str) -> String {
        let marker = if self.focused { CURSOR_MARKER } else { "" };
        match after.graphemes(true).next() {
            Some(first) => {
                let rest = &after[first.len()..];
                format!("{before}{marker}{REVERSE}{first}{REVERSE_OFF}{rest}")
            }
            None => format!("{before}{marker}{REVERSE} {REVERSE_OFF}"),
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorTheme::default(), EditorOptions::default())
    }
}

impl Component for Editor {
    fn render(&mut self, width: usize) -> Vec<String> {
        let content_width = width.saturating_sub(4);
        // One column is kept free so a cursor at the end of a row still fits.
        let layout_width = content_width.saturating_sub(1).max(1);
        let side = (self.border_color)("│");
        let horizontal = "─".repeat(width.saturating_sub(2));

        let mut result = Vec::new();
        result.push((self.border_color)(&format!("┌{horizontal}┐")));
        self.last_cursor = None;

        for index in 0..self.state.lines.len() {
            let (ranges, cursor_row) = self.layout_line(index, layout_width);
            let line = &self.state.lines[index];
            for (row, range) in ranges.iter().enumerate() {
                let segment = &line[range.clone()];
                let display = if cursor_row == Some(row) {
                    let split = self.state.cursor_col - range.start;
                    let (before, after) = segment.split_at(split);
                    if self.focused {
                        self.last_cursor = Some(CursorPos {
                            row: result.len(),
                            col: 2 + visible_width(before),
                        });
                    }
                    self.cursor_cell(before, after)
                } else {
                    segment.to_string()
                };
                let padding = " ".repeat(content_width.saturating_sub(visible_width(&display)));
                result.push(format!("{side} {display}{padding} {side}"));
            }
        }

        result.push((self.border_color)(&format!("└{horizontal}┘")));
        if self.is_empty() {
            result.push(format!("{HINT_STYLE}{HINT}{FG_RESET}"));
        }

        result
            .iter()
            .map(|line| fit_to_width(line, width))
            .collect()
    }

    fn handle_input(&mut self, data: &str) {
        let changed = if data.starts_with(PASTE_START) {
            self.handle_paste(data)
        } else if let Some(key) = parse_key(data) {
            self.dispatch_key(key)
        } else if data.starts_with('\x1b') {
            false
        } else {
            self.insert_printable(data)
        };

        if changed {
            self.emit_change();
        }
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        self.last_cursor
    }

    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }
}

impl Focusable for Editor {
    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Byte offset of the last grapheme boundary at or before `chars` characters.
fn byte_offset_for_chars(line: &str, chars: usize) -> usize {
    let mut seen = 0;
    for (offset, grapheme) in line.grapheme_indices(true) {
        let count = grapheme.chars().count();
        if seen + count > chars {
            return offset;
        }
        seen += count;
    }
    line.len()
}

#[cfg(test)]
mod tests {
    use super::{Editor, EditorOptions, EditorTheme};
    use crate::core::component::{Component, Focusable};
    use crate::core::cursor::{CursorPos, CURSOR_MARKER};
    use crate::core::text::width::visible_width;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn plain_editor() -> Editor {
        Editor::new(
            EditorTheme {
                border_color: Box::new(|text| text.to_string()),
            },
            EditorOptions::default(),
        )
    }

    fn type_keys(editor: &mut Editor, keys: &[&str]) {
        for key in keys {
            editor.handle_input(key);
        }
    }

    #[test]
    fn backspace_removes_characters_then_stops() {
        let mut editor = plain_editor();
        editor.set_text("abc");
        type_keys(&mut editor, &["\x7f", "\x7f", "\x7f"]);
        assert_eq!(editor.get_lines(), vec![""]);
        assert_eq!(editor.get_cursor(), (0, 0));
        editor.handle_input("\x7f");
        assert_eq!(editor.get_cursor(), (0, 0));
    }

    #[test]
    fn backspace_at_line_start_merges_lines() {
        let mut editor = plain_editor();
        editor.set_text("ab\ncd");
        editor.handle_input("\x01");
        assert_eq!(editor.get_cursor(), (1, 0));
        editor.handle_input("\x7f");
        assert_eq!(editor.get_lines(), vec!["abcd"]);
        assert_eq!(editor.get_cursor(), (0, 2));
    }

    #[test]
    fn delete_merges_with_next_line() {
        let mut editor = plain_editor();
        editor.set_text("ab\ncd");
        type_keys(&mut editor, &["\x1b[A", "\x05", "\x1b[3~"]);
        assert_eq!(editor.get_lines(), vec!["abcd"]);
        editor.handle_input("\x04");
        assert_eq!(editor.get_lines(), vec!["abd"]);
    }

    #[test]
    fn new_line_splits_at_cursor() {
        let mut editor = plain_editor();
        editor.set_text("hello");
        type_keys(&mut editor, &["\x1b[D", "\x1b[D", "\x1b\r"]);
        assert_eq!(editor.get_lines(), vec!["hel", "lo"]);
        assert_eq!(editor.get_cursor(), (1, 0));
    }

    #[test]
    fn single_line_mode_ignores_new_line() {
        let mut editor = Editor::new(EditorTheme::default(), EditorOptions { multiline: false });
        editor.set_text("hi");
        editor.handle_input("\x1b\r");
        editor.handle_input("\x1b[200~a\nb\x1b[201~");
        assert_eq!(editor.get_lines(), vec!["hia b"]);
    }

    #[test]
    fn arrows_wrap_across_lines_and_clamp_columns() {
        let mut editor = plain_editor();
        editor.set_text("long line\nab");
        editor.handle_input("\x1b[A");
        assert_eq!(editor.get_cursor(), (0, 2));
        editor.handle_input("\x05");
        editor.handle_input("\x1b[B");
        assert_eq!(editor.get_cursor(), (1, 2));
        editor.handle_input("\x1b[C");
        assert_eq!(editor.get_cursor(), (1, 2));
        editor.handle_input("\x01");
        editor.handle_input("\x1b[D");
        assert_eq!(editor.get_cursor(), (0, 9));
        editor.handle_input("\x1b[C");
        assert_eq!(editor.get_cursor(), (1, 0));
    }

    #[test]
    fn kill_to_end_and_start() {
        let mut editor = plain_editor();
        editor.set_text("hello world");
        type_keys(&mut editor, &["\x01", "\x1b[C", "\x1b[C", "\x0b"]);
        assert_eq!(editor.get_text(), "he");
        editor.handle_input("\x15");
        assert_eq!(editor.get_text(), "");
        assert_eq!(editor.get_cursor(), (0, 0));
    }

    #[test]
    fn graphemes_move_and_delete_as_one() {
        let mut editor = plain_editor();
        editor.set_text("a👍🏽b");
        editor.handle_input("\x1b[D");
        editor.handle_input("\x1b[D");
        assert_eq!(editor.get_cursor(), (0, 1));
        editor.handle_input("\x1b[3~");
        assert_eq!(editor.get_text(), "ab");
    }

    #[test]
    fn multi_char_chunk_skips_control_bytes() {
        let mut editor = plain_editor();
        editor.handle_input("你好\x07x");
        assert_eq!(editor.get_text(), "你好x");
        assert_eq!(editor.get_cursor(), (0, 3));
    }

    #[test]
    fn paste_keeps_line_breaks() {
        let mut editor = plain_editor();
        editor.set_text("[]");
        editor.handle_input("\x1b[D");
        editor.handle_input("\x1b[200~one\r\ntwo\x1b[201~");
        assert_eq!(editor.get_lines(), vec!["[one", "two]"]);
        assert_eq!(editor.get_cursor(), (1, 3));
    }

    #[test]
    fn submit_trims_fires_once_and_clears() {
        let submitted = Rc::new(RefCell::new(Vec::new()));
        let mut editor = plain_editor();
        editor.set_on_submit(Some(Box::new({
            let submitted = Rc::clone(&submitted);
            move |text| submitted.borrow_mut().push(text)
        })));

        editor.set_text("   \n  ");
        editor.handle_input("\r");
        assert!(submitted.borrow().is_empty());
        assert_eq!(editor.get_text(), "   \n  ");

        editor.set_text("  hi there \n");
        editor.handle_input("\r");
        assert_eq!(*submitted.borrow(), vec!["hi there"]);
        assert!(editor.is_empty());
        assert_eq!(editor.get_cursor(), (0, 0));
    }

    #[test]
    fn on_change_fires_only_when_buffer_changes() {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let mut editor = plain_editor();
        editor.set_on_change(Some(Box::new({
            let changes = Rc::clone(&changes);
            move |text| changes.borrow_mut().push(text)
        })));

        type_keys(&mut editor, &["a", "\x1b[D", "\x7f", "\x1b[A", "b"]);
        assert_eq!(*changes.borrow(), vec!["a", "ba"]);
    }

    #[test]
    fn set_text_normalizes_line_endings() {
        let mut editor = plain_editor();
        editor.set_text("a\r\nb\rc");
        assert_eq!(editor.get_text(), "a\nb\nc");
        assert_eq!(editor.get_cursor(), (2, 1));
    }

    #[test]
    fn renders_border_cursor_and_hint() {
        let mut editor = plain_editor();
        let lines = editor.render(20);
        assert_eq!(
            lines,
            vec![
                "┌──────────────────┐".to_string(),
                format!("│ \x1b[7m \x1b[27m{} │", " ".repeat(15)),
                "└──────────────────┘".to_string(),
                "\x1b[90m  Press Enter to sub\x1b[0m".to_string(),
            ]
        );
        assert!(lines.iter().all(|line| visible_width(line) == 20));
    }

    #[test]
    fn focused_editor_emits_marker_and_cursor_hint() {
        let mut editor = plain_editor();
        editor.set_focused(true);
        editor.set_text("ab\ncd");
        editor.handle_input("\x1b[D");

        let lines = editor.render(12);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], format!("│ c{CURSOR_MARKER}\x1b[7md\x1b[27m{} │", " ".repeat(6)));
        assert_eq!(editor.cursor_pos(), Some(CursorPos { row: 2, col: 3 }));

        editor.set_focused(false);
        let lines = editor.render(12);
        assert!(lines.iter().all(|line| !line.contains(CURSOR_MARKER)));
        assert_eq!(editor.cursor_pos(), None);
    }

    #[test]
    fn long_lines_wrap_with_cursor_on_the_right_row() {
        let mut editor = plain_editor();
        editor.set_focused(true);
        editor.set_text("hello brave new world");
        let lines = editor.render(14);
        // Content width 10, layout width 9.
        assert!(lines.len() > 3);
        let last_content = &lines[lines.len() - 2];
        assert!(last_content.contains(CURSOR_MARKER));
        for line in &lines {
            assert_eq!(visible_width(line), 14, "{line:?}");
        }
    }

    #[test]
    fn every_line_is_exact_width_for_tiny_widths() {
        let mut editor = plain_editor();
        editor.set_text("你好 world\nx");
        for width in 0..12 {
            for line in editor.render(width) {
                assert_eq!(visible_width(&line), width, "width {width}: {line:?}");
            }
        }
    }
}
