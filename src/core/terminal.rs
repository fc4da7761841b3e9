//! Terminal trait and lifecycle guard.

use std::io;
use std::sync::Arc;

use crate::core::output::{CLEAR_FROM_CURSOR, CLEAR_SCREEN, HIDE_CURSOR, SHOW_CURSOR};

/// Columns reported when the real size cannot be queried.
pub const DEFAULT_COLUMNS: u16 = 80;
/// Rows reported when the real size cannot be queried.
pub const DEFAULT_ROWS: u16 = 24;

/// Byte-stream terminal the engine renders into.
pub trait Terminal {
    /// Enter raw mode and begin delivering input chunks and resize notifications.
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> io::Result<()>;

    /// Leave raw mode, stop callbacks, and show the cursor again.
    fn stop(&mut self) -> io::Result<()>;

    /// Swallow input for up to `max_ms`, returning early after `idle_ms` of silence.
    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}

    /// Write raw bytes.
    fn write(&mut self, data: &str);

    /// Thread-safe closure that restores the input mode saved by `start`, for crash
    /// and signal cleanup. `None` when there is nothing to restore.
    fn mode_restorer(&self) -> Option<Arc<dyn Fn() + Send + Sync>> {
        None
    }

    /// Terminal width, or [`DEFAULT_COLUMNS`] when unknown.
    fn columns(&self) -> u16;

    /// Terminal height, or [`DEFAULT_ROWS`] when unknown.
    fn rows(&self) -> u16;

    fn clear_screen(&mut self) {
        self.write(CLEAR_SCREEN);
    }

    fn clear_from_cursor(&mut self) {
        self.write(CLEAR_FROM_CURSOR);
    }

    /// Move the cursor by `lines` rows; positive is down.
    fn move_by(&mut self, lines: i32) {
        match lines {
            0 => {}
            n if n > 0 => self.write(&format!("\x1b[{n}B")),
            n => self.write(&format!("\x1b[{}A", n.unsigned_abs())),
        }
    }

    fn hide_cursor(&mut self) {
        self.write(HIDE_CURSOR);
    }

    fn show_cursor(&mut self) {
        self.write(SHOW_CURSOR);
    }
}

/// RAII guard that drains input and stops the terminal on drop.
pub struct TerminalGuard<T: Terminal> {
    terminal: Option<T>,
    max_drain_ms: u64,
    idle_drain_ms: u64,
}

impl<T: Terminal> TerminalGuard<T> {
    /// Guard with default drain timings (max 1000ms, idle 50ms).
    pub fn new(terminal: T) -> Self {
        Self {
            terminal: Some(terminal),
            max_drain_ms: 1000,
            idle_drain_ms: 50,
        }
    }

    pub fn set_drain_timings(&mut self, max_ms: u64, idle_ms: u64) {
        self.max_drain_ms = max_ms;
        self.idle_drain_ms = idle_ms;
    }

    /// The wrapped terminal, or `None` once released.
    pub fn terminal_mut(&mut self) -> Option<&mut T> {
        self.terminal.as_mut()
    }

    /// Releases the terminal without running cleanup.
    pub fn into_inner(mut self) -> Option<T> {
        self.terminal.take()
    }
}

impl<T: Terminal> Drop for TerminalGuard<T> {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.as_mut() {
            terminal.drain_input(self.max_drain_ms, self.idle_drain_ms);
            if let Err(err) = terminal.stop() {
                tracing::warn!(error = %err, "terminal stop failed during guard drop");
            }
        }
    }
}
