//! Minimal cell-grid terminal emulator for replaying renderer output.
//!
//! Understands the subset the engine emits: printable graphemes with deferred
//! wrap, CR, LF with scrolling, CUU/CUD/CHA/CUP-home, EL, ED and private modes.
//! Styles and string sequences are ignored.

use sanbot_tui::core::text::ansi::{escape_at, EscapeKind};
use sanbot_tui::core::text::width::grapheme_width;
use unicode_segmentation::UnicodeSegmentation;

const WIDE_TAIL: &str = "";

pub struct Screen {
    width: usize,
    height: usize,
    cells: Vec<Vec<String>>,
    row: usize,
    col: usize,
    pending_wrap: bool,
    cursor_visible: bool,
}

impl Screen {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: (0..height).map(|_| blank_row(width)).collect(),
            row: 0,
            col: 0,
            pending_wrap: false,
            cursor_visible: true,
        }
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Visible rows with trailing blanks trimmed.
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|cell| cell.as_str() != WIDE_TAIL)
                    .map(String::as_str)
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    pub fn feed(&mut self, data: &str) {
        let mut idx = 0;
        while idx < data.len() {
            if let Some(escape) = escape_at(data, idx) {
                let sequence = &data[idx..idx + escape.len];
                if escape.kind == EscapeKind::Csi {
                    self.csi(&sequence[2..]);
                }
                idx += escape.len;
                continue;
            }

            let rest = &data[idx..];
            let Some(grapheme) = rest.graphemes(true).next() else {
                break;
            };
            match grapheme {
                "\r" => {
                    self.col = 0;
                    self.pending_wrap = false;
                }
                "\n" => self.line_feed(),
                "\r\n" => {
                    self.col = 0;
                    self.pending_wrap = false;
                    self.line_feed();
                }
                g if g.chars().all(char::is_control) => {}
                g => self.print(g),
            }
            idx += grapheme.len();
        }
    }

    fn line_feed(&mut self) {
        self.pending_wrap = false;
        if self.row + 1 < self.height {
            self.row += 1;
        } else {
            self.cells.remove(0);
            self.cells.push(blank_row(self.width));
        }
    }

    fn print(&mut self, grapheme: &str) {
        let cols = grapheme_width(grapheme);
        if cols == 0 {
            return;
        }
        if self.pending_wrap || self.col + cols > self.width {
            self.col = 0;
            self.line_feed();
        }
        self.cells[self.row][self.col] = grapheme.to_string();
        for extra in 1..cols {
            if self.col + extra < self.width {
                self.cells[self.row][self.col + extra] = WIDE_TAIL.to_string();
            }
        }
        self.col += cols;
        if self.col >= self.width {
            self.col = self.width - 1;
            self.pending_wrap = true;
        }
    }

    fn csi(&mut self, body: &str) {
        let Some(final_byte) = body.chars().last() else {
            return;
        };
        let params = &body[..body.len() - 1];
        if params.starts_with('?') {
            match (params, final_byte) {
                ("?25", 'h') => self.cursor_visible = true,
                ("?25", 'l') => self.cursor_visible = false,
                _ => {}
            }
            return;
        }
        let n = params.parse::<usize>().ok();
        match final_byte {
            'A' => {
                self.row = self.row.saturating_sub(n.unwrap_or(1).max(1));
                self.pending_wrap = false;
            }
            'B' => {
                self.row = (self.row + n.unwrap_or(1).max(1)).min(self.height - 1);
                self.pending_wrap = false;
            }
            'G' => {
                self.col = n.unwrap_or(1).max(1).min(self.width) - 1;
                self.pending_wrap = false;
            }
            'H' => {
                self.row = 0;
                self.col = 0;
                self.pending_wrap = false;
            }
            'K' => match n.unwrap_or(0) {
                2 => self.cells[self.row] = blank_row(self.width),
                _ => {
                    for col in self.col..self.width {
                        self.cells[self.row][col] = " ".to_string();
                    }
                }
            },
            'J' => match n.unwrap_or(0) {
                2 => {
                    for row in self.cells.iter_mut() {
                        *row = blank_row(self.width);
                    }
                }
                3 => {}
                _ => {
                    for col in self.col..self.width {
                        self.cells[self.row][col] = " ".to_string();
                    }
                    for row in self.row + 1..self.height {
                        self.cells[row] = blank_row(self.width);
                    }
                }
            },
            _ => {}
        }
    }
}

fn blank_row(width: usize) -> Vec<String> {
    vec![" ".to_string(); width]
}

/// Plain text of `line` with trailing blanks trimmed, for comparing against [`Screen::rows`].
pub fn plain(line: &str) -> String {
    sanbot_tui::strip_control(line).trim_end().to_string()
}
