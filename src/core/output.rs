//! Typed terminal output commands and the single output gate.
//!
//! Invariant: all terminal writes flow through `OutputGate::flush(..)`.

use std::borrow::Cow;

use crate::core::terminal::Terminal;

pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
pub const CLEAR_FROM_CURSOR: &str = "\x1b[J";
pub const BRACKETED_PASTE_ENABLE: &str = "\x1b[?2004h";
pub const BRACKETED_PASTE_DISABLE: &str = "\x1b[?2004l";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Raw bytes/control sequences.
    Bytes(String),
    BytesStatic(&'static str),

    HideCursor,
    ShowCursor,

    /// Relative row motion; never scrolls.
    MoveUp(usize),
    MoveDown(usize),
    /// Absolute 1-based column on the current row.
    ColumnAbs(usize),

    ClearScreen,
    ClearFromCursor,

    BracketedPasteEnable,
    BracketedPasteDisable,
}

impl TerminalCmd {
    pub fn bytes(data: impl Into<String>) -> Self {
        Self::Bytes(data.into())
    }

    /// The exact bytes this command produces on the wire.
    pub fn encode(&self) -> Cow<'_, str> {
        match self {
            Self::Bytes(data) => Cow::Borrowed(data),
            Self::BytesStatic(data) => Cow::Borrowed(data),
            Self::HideCursor => Cow::Borrowed(HIDE_CURSOR),
            Self::ShowCursor => Cow::Borrowed(SHOW_CURSOR),
            Self::MoveUp(0) | Self::MoveDown(0) => Cow::Borrowed(""),
            Self::MoveUp(n) => Cow::Owned(format!("\x1b[{n}A")),
            Self::MoveDown(n) => Cow::Owned(format!("\x1b[{n}B")),
            Self::ColumnAbs(col) => Cow::Owned(format!("\x1b[{col}G")),
            Self::ClearScreen => Cow::Borrowed(CLEAR_SCREEN),
            Self::ClearFromCursor => Cow::Borrowed(CLEAR_FROM_CURSOR),
            Self::BracketedPasteEnable => Cow::Borrowed(BRACKETED_PASTE_ENABLE),
            Self::BracketedPasteDisable => Cow::Borrowed(BRACKETED_PASTE_DISABLE),
        }
    }
}

/// Concatenated wire bytes of a command list.
pub fn encode_all(cmds: &[TerminalCmd]) -> String {
    cmds.iter().map(|cmd| cmd.encode()).collect()
}

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn extend<I>(&mut self, cmds: I)
    where
        I: IntoIterator<Item = TerminalCmd>,
    {
        self.cmds.extend(cmds);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Flush buffered commands to the terminal.
    ///
    /// Cursor and clearing commands go through the terminal's own helpers so an
    /// implementation can track its state; everything else is a plain write.
    pub fn flush<T: Terminal + ?Sized>(&mut self, term: &mut T) {
        for cmd in self.cmds.drain(..) {
            match cmd {
                TerminalCmd::Bytes(data) => term.write(&data),
                TerminalCmd::BytesStatic(data) => term.write(data),
                TerminalCmd::HideCursor => term.hide_cursor(),
                TerminalCmd::ShowCursor => term.show_cursor(),
                TerminalCmd::MoveUp(n) => term.move_by(-(n.min(i32::MAX as usize) as i32)),
                TerminalCmd::MoveDown(n) => term.move_by(n.min(i32::MAX as usize) as i32),
                TerminalCmd::ClearScreen => term.clear_screen(),
                TerminalCmd::ClearFromCursor => term.clear_from_cursor(),
                other => term.write(&other.encode()),
            }
        }
    }
}
