//! In-memory terminal for deterministic tests.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::output::{HIDE_CURSOR, SHOW_CURSOR};
use crate::core::terminal::{Terminal, DEFAULT_COLUMNS, DEFAULT_ROWS};

type InputHandler = Box<dyn FnMut(String) + Send>;
type ResizeHandler = Box<dyn FnMut() + Send>;

struct VirtualState {
    columns: u16,
    rows: u16,
    writes: String,
    raw: bool,
    started: bool,
    cursor_visible: bool,
    stop_count: usize,
    drain_calls: Vec<(u64, u64)>,
    on_input: Option<InputHandler>,
    on_resize: Option<ResizeHandler>,
}

/// Records every write and lets tests inject input and resizes.
///
/// Clones share state, so a test can keep a handle while the runtime owns the terminal.
#[derive(Clone)]
pub struct VirtualTerminal {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualTerminal {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            state: Arc::new(Mutex::new(VirtualState {
                columns,
                rows,
                writes: String::new(),
                raw: false,
                started: false,
                cursor_visible: true,
                stop_count: 0,
                drain_calls: Vec::new(),
                on_input: None,
                on_resize: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VirtualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Everything written so far.
    pub fn writes(&self) -> String {
        self.lock().writes.clone()
    }

    /// Everything written since the last call, clearing the record.
    pub fn take_writes(&self) -> String {
        std::mem::take(&mut self.lock().writes)
    }

    /// Change the reported size without notifying anyone.
    pub fn set_size(&self, columns: u16, rows: u16) {
        let mut state = self.lock();
        state.columns = columns;
        state.rows = rows;
    }

    /// Change the size and deliver a resize notification when started.
    pub fn resize(&self, columns: u16, rows: u16) {
        self.set_size(columns, rows);
        let handler = {
            let mut state = self.lock();
            if !state.started {
                return;
            }
            state.on_resize.take()
        };
        if let Some(mut handler) = handler {
            handler();
            let mut state = self.lock();
            if state.started && state.on_resize.is_none() {
                state.on_resize = Some(handler);
            }
        }
    }

    /// Deliver one raw input chunk when started.
    pub fn send_input(&self, data: &str) {
        let handler = {
            let mut state = self.lock();
            if !state.started {
                return;
            }
            state.on_input.take()
        };
        if let Some(mut handler) = handler {
            handler(data.to_string());
            let mut state = self.lock();
            if state.started && state.on_input.is_none() {
                state.on_input = Some(handler);
            }
        }
    }

    pub fn is_raw(&self) -> bool {
        self.lock().raw
    }

    pub fn is_started(&self) -> bool {
        self.lock().started
    }

    /// Visibility implied by the last show/hide sequence written.
    pub fn is_cursor_visible(&self) -> bool {
        self.lock().cursor_visible
    }

    pub fn stop_count(&self) -> usize {
        self.lock().stop_count
    }

    /// `(max_ms, idle_ms)` of every `drain_input` call.
    pub fn drain_calls(&self) -> Vec<(u64, u64)> {
        self.lock().drain_calls.clone()
    }
}

impl Default for VirtualTerminal {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMNS, DEFAULT_ROWS)
    }
}

impl Terminal for VirtualTerminal {
    fn start(&mut self, on_input: InputHandler, on_resize: ResizeHandler) -> io::Result<()> {
        let mut state = self.lock();
        state.on_input = Some(on_input);
        state.on_resize = Some(on_resize);
        state.raw = true;
        state.started = true;
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        {
            let mut state = self.lock();
            state.on_input = None;
            state.on_resize = None;
            state.raw = false;
            state.started = false;
            state.stop_count += 1;
        }
        self.write(SHOW_CURSOR);
        Ok(())
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        self.lock().drain_calls.push((max_ms, idle_ms));
    }

    fn write(&mut self, data: &str) {
        let mut state = self.lock();
        match (data.rfind(HIDE_CURSOR), data.rfind(SHOW_CURSOR)) {
            (Some(hide), Some(show)) => state.cursor_visible = show > hide,
            (Some(_), None) => state.cursor_visible = false,
            (None, Some(_)) => state.cursor_visible = true,
            (None, None) => {}
        }
        state.writes.push_str(data);
    }

    fn columns(&self) -> u16 {
        self.lock().columns
    }

    fn rows(&self) -> u16 {
        self.lock().rows
    }
}
