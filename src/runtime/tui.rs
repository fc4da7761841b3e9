//! Runtime: owns the terminal, the component tree and the renderer.

use std::io;
use std::rc::Rc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::EnvConfig;
use crate::core::component::ComponentRc;
use crate::core::keys::{split_input, Token};
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::terminal::Terminal;
use crate::render::renderer::DiffRenderer;
use crate::render::Frame;
use crate::runtime::focus::FocusState;
use crate::runtime::ime::position_hardware_cursor;

const STOP_DRAIN_MAX_MS: u64 = 1000;
const STOP_DRAIN_IDLE_MS: u64 = 50;
const COALESCE_MAX_DURATION_MS: u64 = 2;
const COALESCE_MAX_ITERATIONS: usize = 8;

/// Two presses of the same exit key within this window end the session.
pub const EXIT_KEY_WINDOW: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug)]
struct CoalesceBudget {
    max_duration: Duration,
    max_iterations: usize,
}

impl Default for CoalesceBudget {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_millis(COALESCE_MAX_DURATION_MS),
            max_iterations: COALESCE_MAX_ITERATIONS,
        }
    }
}

impl CoalesceBudget {
    fn allows(&self, start: Instant, iterations: usize) -> bool {
        start.elapsed() < self.max_duration && iterations < self.max_iterations
    }
}

/// Keys the runtime intercepts before the focused component sees them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitKey {
    Interrupt,
    Escape,
}

impl ExitKey {
    fn from_token(token: &Token<'_>) -> Option<Self> {
        match token {
            Token::Key("\x03") => Some(Self::Interrupt),
            Token::Key("\x1b") => Some(Self::Escape),
            _ => None,
        }
    }
}

#[derive(Default)]
struct RuntimeWakeState {
    pending_inputs: Vec<String>,
    pending_resize: bool,
    render_requested: bool,
    stop_requested: bool,
}

/// Mailbox shared with the terminal threads and every [`RenderHandle`].
#[derive(Default)]
struct RuntimeWake {
    state: Mutex<RuntimeWakeState>,
    cvar: Condvar,
}

impl RuntimeWake {
    fn lock(&self) -> MutexGuard<'_, RuntimeWakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_event(state: &RuntimeWakeState) -> bool {
        state.stop_requested
            || !state.pending_inputs.is_empty()
            || state.pending_resize
            || state.render_requested
    }

    /// Blocks until there is work; `false` once a stop was requested.
    fn wait_for_event(&self) -> bool {
        let mut state = self.lock();
        while !Self::has_event(&state) {
            state = self
                .cvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        !state.stop_requested
    }

    fn enqueue_input(&self, data: String) {
        self.lock().pending_inputs.push(data);
        self.cvar.notify_one();
    }

    fn signal_resize(&self) {
        self.lock().pending_resize = true;
        self.cvar.notify_one();
    }

    fn request_render(&self) {
        self.lock().render_requested = true;
        self.cvar.notify_one();
    }

    fn take_pending_resize(&self) -> bool {
        std::mem::take(&mut self.lock().pending_resize)
    }

    fn drain_inputs(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().pending_inputs)
    }

    fn take_render_requested(&self) -> bool {
        std::mem::take(&mut self.lock().render_requested)
    }

    fn peek_render_requested(&self) -> bool {
        self.lock().render_requested
    }

    fn has_pending_non_render(&self) -> bool {
        let state = self.lock();
        state.pending_resize || !state.pending_inputs.is_empty()
    }

    fn reset_for_start(&self) {
        *self.lock() = RuntimeWakeState::default();
    }

    fn request_stop(&self) {
        self.lock().stop_requested = true;
        self.cvar.notify_all();
    }
}

/// Thread-safe handle for asking the runtime to render.
///
/// Requests are coalesced: any number of calls between two runtime ticks produce
/// one render.
#[derive(Clone)]
pub struct RenderHandle {
    wake: Arc<RuntimeWake>,
}

impl RenderHandle {
    pub fn request_render(&self) {
        self.wake.request_render();
    }
}

#[cfg(all(unix, not(test)))]
struct CleanupHooks {
    _signals: crate::platform::hooks::SignalHookGuard,
    _panic: crate::platform::hooks::PanicHookGuard,
}

pub struct TuiRuntime<T: Terminal> {
    terminal: T,
    output: OutputGate,
    root: ComponentRc,
    renderer: DiffRenderer,
    focus: FocusState,
    wake: Arc<RuntimeWake>,
    coalesce_budget: CoalesceBudget,
    clear_on_shrink: bool,
    show_hardware_cursor: bool,
    stopped: bool,
    exit_requested: bool,
    last_exit_key: Option<(ExitKey, Instant)>,
    on_exit: Option<Box<dyn FnMut()>>,
    #[cfg(all(unix, not(test)))]
    cleanup_hooks: Option<CleanupHooks>,
}

impl<T: Terminal> TuiRuntime<T> {
    /// Runtime rendering `root`, configured from the environment.
    pub fn new(terminal: T, root: ComponentRc) -> Self {
        Self::with_config(terminal, root, &EnvConfig::from_env())
    }

    pub fn with_config(terminal: T, root: ComponentRc, config: &EnvConfig) -> Self {
        let mut renderer = DiffRenderer::new();
        renderer.set_strict_width(config.strict_width);
        Self {
            terminal,
            output: OutputGate::new(),
            root,
            renderer,
            focus: FocusState::new(),
            wake: Arc::new(RuntimeWake::default()),
            coalesce_budget: CoalesceBudget::default(),
            clear_on_shrink: config.clear_on_shrink,
            show_hardware_cursor: config.hardware_cursor,
            stopped: true,
            exit_requested: false,
            last_exit_key: None,
            on_exit: None,
            #[cfg(all(unix, not(test)))]
            cleanup_hooks: None,
        }
    }

    pub fn render_handle(&self) -> RenderHandle {
        RenderHandle {
            wake: Arc::clone(&self.wake),
        }
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    pub fn root(&self) -> ComponentRc {
        Rc::clone(&self.root)
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    /// True once a double exit key ended the session.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Called after a double exit key has stopped the runtime.
    pub fn set_on_exit(&mut self, handler: Option<Box<dyn FnMut()>>) {
        self.on_exit = handler;
    }

    pub fn set_show_hardware_cursor(&mut self, enabled: bool) {
        if self.show_hardware_cursor == enabled {
            return;
        }
        self.show_hardware_cursor = enabled;
        if !enabled {
            self.output.push(TerminalCmd::HideCursor);
        }
        self.request_render();
    }

    pub fn set_clear_on_shrink(&mut self, enabled: bool) {
        self.clear_on_shrink = enabled;
    }

    pub fn set_strict_width(&mut self, strict: bool) {
        self.renderer.set_strict_width(strict);
    }

    pub fn terminal_rows(&self) -> u16 {
        self.terminal.rows()
    }

    pub fn terminal_columns(&self) -> u16 {
        self.terminal.columns()
    }

    pub fn set_focus(&mut self, target: ComponentRc) {
        self.focus.set_focus(Some(target));
    }

    pub fn clear_focus(&mut self) {
        self.focus.clear();
    }

    pub fn focused(&self) -> Option<ComponentRc> {
        self.focus.focused()
    }

    /// Clears the screen and forgets the previous frame.
    pub fn clear_screen(&mut self) {
        self.output.push(TerminalCmd::ClearScreen);
        self.renderer.reset();
        self.request_render();
    }

    pub fn clear_from_cursor(&mut self) {
        self.output.push(TerminalCmd::ClearFromCursor);
    }

    /// Relative cursor motion, tracked so the next cursor placement stays correct.
    pub fn move_by(&mut self, lines: i32) {
        let row = self.renderer.hardware_cursor_row();
        if lines > 0 {
            let lines = lines as usize;
            self.output.push(TerminalCmd::MoveDown(lines));
            self.renderer.set_hardware_cursor_row(row + lines);
        } else if lines < 0 {
            let lines = lines.unsigned_abs() as usize;
            self.output.push(TerminalCmd::MoveUp(lines));
            self.renderer
                .set_hardware_cursor_row(row.saturating_sub(lines));
        }
    }

    /// Enters raw mode, enables bracketed paste, hides the cursor and schedules the
    /// first render.
    pub fn start(&mut self) -> io::Result<()> {
        if !self.stopped {
            return Ok(());
        }
        self.output.clear();
        self.wake.reset_for_start();
        self.exit_requested = false;
        self.last_exit_key = None;

        // Mark running early so Drop can attempt cleanup if `Terminal::start()` panics.
        self.stopped = false;

        let wake_input = Arc::clone(&self.wake);
        let wake_resize = Arc::clone(&self.wake);
        if let Err(err) = self.terminal.start(
            Box::new(move |data| wake_input.enqueue_input(data)),
            Box::new(move || wake_resize.signal_resize()),
        ) {
            self.stopped = true;
            return Err(err);
        }

        #[cfg(all(unix, not(test)))]
        self.install_cleanup_hooks();

        self.output.push(TerminalCmd::BracketedPasteEnable);
        self.output.push(TerminalCmd::HideCursor);
        self.flush_output();
        self.request_render();
        tracing::debug!(
            columns = self.terminal.columns(),
            rows = self.terminal.rows(),
            "runtime started"
        );
        Ok(())
    }

    /// Parks the cursor below the content, restores the terminal and shows the
    /// cursor. Safe to call more than once.
    pub fn stop(&mut self) -> io::Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.wake.request_stop();
        self.place_cursor_at_end();
        self.output.push(TerminalCmd::ShowCursor);
        self.output.push(TerminalCmd::BracketedPasteDisable);
        self.flush_output();
        self.terminal
            .drain_input(STOP_DRAIN_MAX_MS, STOP_DRAIN_IDLE_MS);
        let result = self.terminal.stop();
        self.stopped = true;
        #[cfg(all(unix, not(test)))]
        self.uninstall_cleanup_hooks();
        tracing::debug!("runtime stopped");
        result
    }

    #[cfg(all(unix, not(test)))]
    fn install_cleanup_hooks(&mut self) {
        use crate::platform::hooks::{
            install_panic_hook, install_signal_handlers, HookTerminal, OnceCleanup,
        };

        let restore_mode = self.terminal.mode_restorer();
        let cleanup = OnceCleanup::new(Arc::new(move || {
            if let Some(restore_mode) = restore_mode.as_ref() {
                restore_mode();
            }
            let mut output = OutputGate::new();
            output.push(TerminalCmd::ShowCursor);
            output.push(TerminalCmd::BracketedPasteDisable);
            output.flush(&mut HookTerminal::new());
        }));

        let signals = match install_signal_handlers(cleanup.clone()) {
            Ok(signals) => signals,
            Err(err) => {
                tracing::warn!(error = %err, "signal cleanup hooks unavailable");
                return;
            }
        };
        self.cleanup_hooks = Some(CleanupHooks {
            _signals: signals,
            _panic: install_panic_hook(cleanup),
        });
    }

    #[cfg(all(unix, not(test)))]
    fn uninstall_cleanup_hooks(&mut self) {
        self.cleanup_hooks = None;
    }

    /// Blocks until input, a resize or a render request arrives, then processes
    /// everything queued and renders at most once.
    pub fn run_blocking_once(&mut self) {
        if self.stopped {
            return;
        }
        if !self.wake.wait_for_event() {
            return;
        }
        self.run_coalesced_once();
    }

    fn run_coalesced_once(&mut self) {
        // Work that keeps arriving within the budget joins this tick; anything later
        // waits for the next one.
        let start = Instant::now();
        let mut iterations = 0;
        let mut yielded = false;

        loop {
            let did_work = self.process_pending();
            if self.stopped {
                return;
            }
            if !did_work || !self.coalesce_budget.allows(start, iterations) {
                break;
            }
            iterations += 1;

            if !yielded && !self.wake.has_pending_non_render() && self.wake.peek_render_requested()
            {
                std::thread::yield_now();
                yielded = true;
            }
        }

        self.render_if_needed();
    }

    /// Processes queued input and resizes, then renders if anything asked for it.
    /// Never blocks.
    pub fn run_once(&mut self) {
        if self.stopped {
            return;
        }
        self.process_pending();
        if self.stopped {
            return;
        }
        self.render_if_needed();
    }

    fn process_pending(&mut self) -> bool {
        let mut did_work = false;

        if self.wake.take_pending_resize() {
            tracing::debug!(
                columns = self.terminal.columns(),
                rows = self.terminal.rows(),
                "terminal resized"
            );
            self.request_render();
            did_work = true;
        }

        for data in self.wake.drain_inputs() {
            did_work = true;
            self.handle_input(&data);
            if self.stopped {
                break;
            }
        }

        did_work
    }

    /// Dispatches one raw input chunk.
    pub fn handle_input(&mut self, data: &str) {
        self.handle_input_at(data, Instant::now());
    }

    /// Like [`TuiRuntime::handle_input`] with an explicit clock, so exit-key timing
    /// can be tested.
    pub fn handle_input_at(&mut self, data: &str, now: Instant) {
        let tokens = split_input(data);
        // Multi-char chunks led by text are compositions or unbracketed pastes; the
        // focused component filters their control bytes itself.
        let text_led = data.chars().nth(1).is_some() && !data.starts_with('\x1b');
        if text_led && !tokens.iter().all(|token| ExitKey::from_token(token).is_some()) {
            if let Some(component) = self.focus.focused() {
                component.borrow_mut().handle_input(data);
                self.request_render();
            }
            return;
        }

        let mut forwarded = false;
        for token in tokens {
            if let Some(key) = ExitKey::from_token(&token) {
                if self.register_exit_key(key, now) {
                    self.exit();
                    return;
                }
                continue;
            }
            if let Token::Unknown(sequence) = token {
                tracing::trace!(?sequence, "dropping unrecognized input");
                continue;
            }
            let Some(component) = self.focus.focused() else {
                continue;
            };
            component.borrow_mut().handle_input(token.as_str());
            forwarded = true;
        }

        if forwarded {
            self.request_render();
        }
    }

    /// Records an exit key press; true when it completes a double press.
    fn register_exit_key(&mut self, key: ExitKey, now: Instant) -> bool {
        if let Some((previous, at)) = self.last_exit_key {
            if previous == key && now.saturating_duration_since(at) < EXIT_KEY_WINDOW {
                self.last_exit_key = None;
                return true;
            }
        }
        self.last_exit_key = Some((key, now));
        false
    }

    fn exit(&mut self) {
        tracing::debug!("exit key pressed twice, stopping");
        if let Err(err) = self.stop() {
            tracing::warn!(error = %err, "terminal stop failed on exit");
        }
        self.exit_requested = true;
        if let Some(on_exit) = self.on_exit.as_mut() {
            on_exit();
        }
    }

    pub fn request_render(&mut self) {
        self.wake.request_render();
    }

    /// Forgets the previous frame so the next render repaints everything.
    pub fn request_full_render(&mut self) {
        self.renderer.reset();
        self.request_render();
    }

    pub fn render_if_needed(&mut self) {
        if self.wake.take_render_requested() {
            self.do_render();
        }
        self.flush_output();
    }

    pub fn render_now(&mut self) {
        self.wake.take_render_requested();
        self.do_render();
        self.flush_output();
    }

    fn do_render(&mut self) {
        let width = self.terminal.columns() as usize;
        let height = self.terminal.rows() as usize;

        if self.renderer.previous_width() != width && self.renderer.previous_lines_len() > 0 {
            self.root.borrow_mut().invalidate();
        }

        let (lines, hint) = {
            let mut root = self.root.borrow_mut();
            let lines = root.render(width);
            (lines, root.cursor_pos())
        };

        let frame = Frame::from_rendered_lines(lines, height);
        let viewport_top = frame.len().saturating_sub(height);
        let cursor_pos = hint
            .or(frame.cursor())
            .filter(|pos| pos.row >= viewport_top && pos.row < frame.len())
            .map(|mut pos| {
                pos.col = pos.col.min(width.saturating_sub(1));
                pos
            });

        let total_lines = frame.len();
        let render_cmds = self
            .renderer
            .render(frame, width, height, self.clear_on_shrink);
        self.output.extend(render_cmds);

        let (updated_row, cursor_cmds) = position_hardware_cursor(
            cursor_pos,
            total_lines,
            self.renderer.hardware_cursor_row(),
            self.show_hardware_cursor,
        );
        self.output.extend(cursor_cmds);
        self.renderer.set_hardware_cursor_row(updated_row);
    }

    fn flush_output(&mut self) {
        if self.output.is_empty() {
            return;
        }
        self.output.flush(&mut self.terminal);
    }

    fn place_cursor_at_end(&mut self) {
        let total_lines = self.renderer.previous_lines_len();
        if total_lines == 0 {
            return;
        }
        let target_row = total_lines - 1;
        let current_row = self.renderer.hardware_cursor_row();
        if target_row > current_row {
            self.output.push(TerminalCmd::MoveDown(target_row - current_row));
        } else if target_row < current_row {
            self.output.push(TerminalCmd::MoveUp(current_row - target_row));
        }
        self.output.push(TerminalCmd::BytesStatic("\r\n"));
        self.renderer.set_hardware_cursor_row(total_lines);
    }
}

impl<T: Terminal> Drop for TuiRuntime<T> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }

        // Never panic in Drop, especially during unwind.
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = self.stop();
        }));
    }
}
