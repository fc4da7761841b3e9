//! Terminal backed by the process's stdin/stdout.

use std::io;
use std::sync::Arc;

use crate::core::terminal::Terminal;

#[cfg(unix)]
pub use unix::ProcessTerminal;

/// Splits complete UTF-8 off the front of `pending`, leaving an incomplete trailing
/// sequence for the next read. Invalid bytes are replaced.
pub(crate) fn take_utf8_prefix(pending: &mut Vec<u8>) -> Option<String> {
    if pending.is_empty() {
        return None;
    }
    match std::str::from_utf8(pending) {
        Ok(text) => {
            let text = text.to_string();
            pending.clear();
            Some(text)
        }
        Err(err) if err.error_len().is_none() => {
            let valid = err.valid_up_to();
            if valid == 0 {
                return None;
            }
            let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
            pending.drain(..valid);
            Some(text)
        }
        Err(_) => {
            let text = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            Some(text)
        }
    }
}

#[cfg(unix)]
mod unix {
    use std::fs::OpenOptions;
    use std::io::{self, Write};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use std::thread::{self, JoinHandle};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use libc::c_int;
    use signal_hook::iterator::Signals;

    use super::take_utf8_prefix;
    use crate::config::EnvConfig;
    use crate::core::output::SHOW_CURSOR;
    use crate::core::terminal::{Terminal, DEFAULT_COLUMNS, DEFAULT_ROWS};

    type InputHandler = Box<dyn FnMut(String) + Send>;
    type ResizeHandler = Box<dyn FnMut() + Send>;
    type Shared<T> = Arc<Mutex<Option<T>>>;

    const INPUT_POLL_MS: i32 = 50;

    fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }

    /// Reads stdin until `stop_flag` is set or the input reaches end of file.
    pub(super) fn read_input_loop(
        stdin_fd: c_int,
        stop_flag: &AtomicBool,
        drain_mode: &AtomicBool,
        last_input_time: &AtomicU64,
        handler: &Mutex<Option<InputHandler>>,
    ) {
        let mut buffer = [0u8; 4096];
        let mut pending = Vec::new();

        while !stop_flag.load(Ordering::SeqCst) {
            if !poll_readable(stdin_fd, INPUT_POLL_MS) {
                continue;
            }
            let read_len = unsafe {
                libc::read(stdin_fd, buffer.as_mut_ptr() as *mut libc::c_void, buffer.len())
            };
            if read_len == 0 {
                tracing::debug!("stdin closed, input thread exiting");
                break;
            }
            if read_len < 0 {
                let err = io::Error::last_os_error();
                if matches!(
                    err.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) {
                    continue;
                }
                tracing::warn!(error = %err, "stdin read failed, input thread exiting");
                break;
            }
            last_input_time.store(now_ms(), Ordering::SeqCst);
            if drain_mode.load(Ordering::SeqCst) {
                pending.clear();
                continue;
            }

            pending.extend_from_slice(&buffer[..read_len as usize]);
            let Some(chunk) = take_utf8_prefix(&mut pending) else {
                continue;
            };
            if let Some(handler) = lock(handler).as_mut() {
                handler(chunk);
            }
        }
    }

    fn wait_writable(fd: c_int) -> io::Result<()> {
        let mut fds = libc::pollfd {
            fd,
            events: libc::POLLOUT,
            revents: 0,
        };
        loop {
            let result = unsafe { libc::poll(&mut fds, 1, -1) };
            if result < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if result == 0 {
                continue;
            }
            if (fds.revents & libc::POLLOUT) != 0 {
                return Ok(());
            }
            return Err(io::Error::other(format!(
                "poll(POLLOUT) returned revents=0x{:x}",
                fds.revents
            )));
        }
    }

    /// Writes all of `bytes`, retrying on EINTR and waiting out EAGAIN.
    pub(super) fn write_all_fd_with<FWrite, FWait>(
        fd: c_int,
        bytes: &[u8],
        mut write_once: FWrite,
        mut wait_writable: FWait,
    ) -> io::Result<()>
    where
        FWrite: FnMut(c_int, &[u8]) -> io::Result<usize>,
        FWait: FnMut(c_int) -> io::Result<()>,
    {
        let mut written = 0;
        while written < bytes.len() {
            match write_once(fd, &bytes[written..]) {
                Ok(0) => {
                    return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
                }
                Ok(count) if count > bytes.len() - written => {
                    return Err(io::Error::other("write returned more bytes than requested"));
                }
                Ok(count) => written += count,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => wait_writable(fd)?,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn write_fd(fd: c_int, data: &str) -> io::Result<()> {
        write_all_fd_with(
            fd,
            data.as_bytes(),
            |fd, buf| {
                let result =
                    unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
                if result < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(result as usize)
                }
            },
            wait_writable,
        )
    }

    fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
        let mut size = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
        if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
            Some((size.ws_col, size.ws_row))
        } else {
            None
        }
    }

    pub(super) fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
        let mut fds = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        // A hung-up pipe reports POLLHUP without POLLIN; let read() surface the EOF.
        result > 0 && (fds.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR)) != 0
    }

    pub(super) fn get_termios(fd: c_int) -> io::Result<libc::termios> {
        let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
        if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(termios)
    }

    fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(test)]
    pub(super) struct StopTestHooks {
        pub(super) before_flush_ready: std::sync::mpsc::Sender<()>,
        pub(super) before_flush_go: std::sync::mpsc::Receiver<()>,
        pub(super) after_flush_ready: std::sync::mpsc::Sender<()>,
        pub(super) after_flush_go: std::sync::mpsc::Receiver<()>,
    }

    #[cfg(test)]
    impl StopTestHooks {
        fn before_flush(&self) {
            let _ = self.before_flush_ready.send(());
            let _ = self.before_flush_go.recv();
        }

        fn after_flush(&self) {
            let _ = self.after_flush_ready.send(());
            let _ = self.after_flush_go.recv();
        }
    }

    /// Raw-mode terminal on stdin/stdout.
    ///
    /// `start` saves the current termios, switches to `cfmakeraw`, and spawns an input
    /// reader thread plus a SIGWINCH thread. Both only call the supplied callbacks.
    pub struct ProcessTerminal {
        pub(super) stdin_fd: c_int,
        pub(super) stdout_fd: c_int,
        original_termios: Option<libc::termios>,
        input_handler: Shared<InputHandler>,
        resize_handler: Shared<ResizeHandler>,
        input_thread: Option<JoinHandle<()>>,
        stop_flag: Arc<AtomicBool>,
        drain_mode: Arc<AtomicBool>,
        last_input_time: Arc<AtomicU64>,
        write_log: Option<PathBuf>,
        write_log_failed: bool,
        resize_signal_handle: Option<signal_hook::iterator::Handle>,
        resize_thread: Option<JoinHandle<()>>,
        #[cfg(test)]
        pub(super) stop_test_hooks: Option<StopTestHooks>,
    }

    impl ProcessTerminal {
        /// Terminal on stdin/stdout, logging writes to `SANBOT_TUI_WRITE_LOG` if set.
        pub fn new() -> Self {
            Self::with_write_log(EnvConfig::from_env().write_log.map(PathBuf::from))
        }

        /// Terminal on stdin/stdout that appends every write to `write_log`.
        pub fn with_write_log(write_log: Option<PathBuf>) -> Self {
            Self {
                stdin_fd: libc::STDIN_FILENO,
                stdout_fd: libc::STDOUT_FILENO,
                original_termios: None,
                input_handler: Arc::new(Mutex::new(None)),
                resize_handler: Arc::new(Mutex::new(None)),
                input_thread: None,
                stop_flag: Arc::new(AtomicBool::new(false)),
                drain_mode: Arc::new(AtomicBool::new(false)),
                last_input_time: Arc::new(AtomicU64::new(now_ms())),
                write_log,
                write_log_failed: false,
                resize_signal_handle: None,
                resize_thread: None,
                #[cfg(test)]
                stop_test_hooks: None,
            }
        }

        fn enable_raw_mode(&mut self) -> io::Result<()> {
            let original = match self.original_termios {
                Some(original) => original,
                None => {
                    let original = get_termios(self.stdin_fd)?;
                    self.original_termios = Some(original);
                    original
                }
            };
            let mut raw = original;
            unsafe {
                libc::cfmakeraw(&mut raw);
            }
            set_termios(self.stdin_fd, &raw)
        }

        fn restore_mode(&mut self) -> io::Result<()> {
            match self.original_termios.as_ref() {
                Some(original) => set_termios(self.stdin_fd, original),
                None => Ok(()),
            }
        }

        fn start_input_thread(&mut self) {
            let stdin_fd = self.stdin_fd;
            let handler = Arc::clone(&self.input_handler);
            let stop_flag = Arc::clone(&self.stop_flag);
            let drain_mode = Arc::clone(&self.drain_mode);
            let last_input_time = Arc::clone(&self.last_input_time);

            self.input_thread = Some(thread::spawn(move || {
                read_input_loop(stdin_fd, &stop_flag, &drain_mode, &last_input_time, &handler);
            }));
        }

        fn stop_input_thread(&mut self) {
            self.stop_flag.store(true, Ordering::SeqCst);
            if let Some(thread) = self.input_thread.take() {
                let _ = thread.join();
            }
        }

        fn start_resize_thread(&mut self) -> io::Result<()> {
            let mut signals = Signals::new([libc::SIGWINCH])?;
            let handle = signals.handle();
            let handler = Arc::clone(&self.resize_handler);

            let thread = thread::spawn(move || {
                for _ in signals.forever() {
                    if let Some(handler) = lock(&handler).as_mut() {
                        handler();
                    }
                }
            });

            self.resize_signal_handle = Some(handle);
            self.resize_thread = Some(thread);
            Ok(())
        }

        fn stop_resize_thread(&mut self) {
            if let Some(handle) = self.resize_signal_handle.take() {
                handle.close();
            }
            if let Some(thread) = self.resize_thread.take() {
                let _ = thread.join();
            }
        }

        fn clear_handlers(&self) {
            *lock(&self.input_handler) = None;
            *lock(&self.resize_handler) = None;
        }

        fn append_write_log(&mut self, data: &str) {
            if self.write_log_failed {
                return;
            }
            let Some(path) = self.write_log.as_ref() else {
                return;
            };
            let result = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(data.as_bytes()));
            if let Err(err) = result {
                tracing::warn!(path = %path.display(), error = %err, "write log disabled");
                self.write_log_failed = true;
            }
        }
    }

    impl Default for ProcessTerminal {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Terminal for ProcessTerminal {
        fn start(&mut self, on_input: InputHandler, on_resize: ResizeHandler) -> io::Result<()> {
            *lock(&self.input_handler) = Some(on_input);
            *lock(&self.resize_handler) = Some(on_resize);
            self.stop_flag.store(false, Ordering::SeqCst);
            self.drain_mode.store(false, Ordering::SeqCst);
            self.last_input_time.store(now_ms(), Ordering::SeqCst);

            if let Err(err) = self.enable_raw_mode() {
                self.clear_handlers();
                return Err(err);
            }
            if let Err(err) = self.start_resize_thread() {
                self.clear_handlers();
                let _ = self.restore_mode();
                return Err(err);
            }
            self.start_input_thread();
            tracing::debug!(
                columns = self.columns(),
                rows = self.rows(),
                "process terminal started"
            );
            Ok(())
        }

        fn stop(&mut self) -> io::Result<()> {
            self.stop_input_thread();
            self.stop_resize_thread();
            self.clear_handlers();

            #[cfg(test)]
            if let Some(hooks) = self.stop_test_hooks.as_ref() {
                hooks.before_flush();
            }

            // Bytes typed during teardown must not leak into the shell.
            let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };

            #[cfg(test)]
            if let Some(hooks) = self.stop_test_hooks.as_ref() {
                hooks.after_flush();
            }

            let restored = self.restore_mode();
            self.write(SHOW_CURSOR);
            tracing::debug!("process terminal stopped");
            restored
        }

        fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
            self.drain_mode.store(true, Ordering::SeqCst);
            self.last_input_time.store(now_ms(), Ordering::SeqCst);

            let end_time = now_ms().saturating_add(max_ms);
            loop {
                let now = now_ms();
                if now >= end_time {
                    break;
                }
                let last_input = self.last_input_time.load(Ordering::SeqCst);
                if now.saturating_sub(last_input) >= idle_ms {
                    break;
                }
                let sleep_for = idle_ms.min(end_time - now).max(1);
                thread::sleep(Duration::from_millis(sleep_for));
            }

            self.drain_mode.store(false, Ordering::SeqCst);
        }

        fn write(&mut self, data: &str) {
            if data.is_empty() {
                return;
            }
            if let Err(err) = write_fd(self.stdout_fd, data) {
                tracing::warn!(error = %err, bytes = data.len(), "terminal write failed");
            }
            self.append_write_log(data);
        }

        fn mode_restorer(&self) -> Option<Arc<dyn Fn() + Send + Sync>> {
            let original = self.original_termios?;
            let fd = self.stdin_fd;
            Some(Arc::new(move || {
                let _ = set_termios(fd, &original);
            }))
        }

        fn columns(&self) -> u16 {
            read_winsize(self.stdout_fd)
                .map(|(columns, _)| columns)
                .unwrap_or(DEFAULT_COLUMNS)
        }

        fn rows(&self) -> u16 {
            read_winsize(self.stdout_fd)
                .map(|(_, rows)| rows)
                .unwrap_or(DEFAULT_ROWS)
        }
    }
}

/// Placeholder on platforms without termios: every lifecycle call fails.
#[cfg(not(unix))]
#[derive(Default)]
pub struct ProcessTerminal;

#[cfg(not(unix))]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(unix))]
impl Terminal for ProcessTerminal {
    fn start(
        &mut self,
        _on_input: Box<dyn FnMut(String) + Send>,
        _on_resize: Box<dyn FnMut() + Send>,
    ) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "ProcessTerminal requires a Unix platform",
        ))
    }

    fn stop(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write(&mut self, _data: &str) {}

    fn mode_restorer(&self) -> Option<Arc<dyn Fn() + Send + Sync>> {
        None
    }

    fn columns(&self) -> u16 {
        crate::core::terminal::DEFAULT_COLUMNS
    }

    fn rows(&self) -> u16 {
        crate::core::terminal::DEFAULT_ROWS
    }
}
