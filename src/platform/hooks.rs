//! Crash and signal cleanup hooks.
//!
//! A session in raw mode must hand the shell back in a usable state even when the
//! process dies from a panic or a termination signal. These hooks run a cleanup
//! closure first and then let the original behavior continue.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once, PoisonError};
use std::thread::{self, JoinHandle};

use crate::core::terminal::{Terminal, DEFAULT_COLUMNS, DEFAULT_ROWS};

/// Cleanup closure shared between the panic hook and the signal thread.
pub type CleanupFn = Arc<dyn Fn() + Send + Sync + 'static>;

/// Runs `cleanup` at most once, however many paths race to it.
#[derive(Clone)]
pub struct OnceCleanup {
    cleanup: CleanupFn,
    ran: Arc<AtomicBool>,
}

impl OnceCleanup {
    pub fn new(cleanup: CleanupFn) -> Self {
        Self {
            cleanup,
            ran: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn run(&self) {
        if !self.ran.swap(true, Ordering::SeqCst) {
            (self.cleanup)();
        }
    }

    pub fn has_run(&self) -> bool {
        self.ran.load(Ordering::SeqCst)
    }
}

/// Closes the signal iterator and joins its thread on drop.
#[cfg(unix)]
pub struct SignalHookGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl Drop for SignalHookGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Runs `cleanup` on SIGTERM, SIGHUP or SIGQUIT, then performs the signal's default
/// action so the process still terminates.
#[cfg(unix)]
pub fn install_signal_handlers(cleanup: OnceCleanup) -> io::Result<SignalHookGuard> {
    let mut signals =
        signal_hook::iterator::Signals::new([libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT])?;
    let handle = signals.handle();

    let thread = thread::spawn(move || {
        for signal in signals.forever() {
            tracing::debug!(signal, "termination signal, restoring terminal");
            cleanup.run();
            if let Err(err) = signal_hook::low_level::emulate_default_handler(signal) {
                tracing::warn!(signal, error = %err, "default signal action failed");
            }
        }
    });

    Ok(SignalHookGuard {
        handle,
        thread: Some(thread),
    })
}

static PANIC_HOOK: Once = Once::new();
static PANIC_CLEANUPS: Mutex<Vec<(u64, OnceCleanup)>> = Mutex::new(Vec::new());
static NEXT_PANIC_CLEANUP: AtomicU64 = AtomicU64::new(0);

/// Unregisters its cleanup on drop.
pub struct PanicHookGuard {
    id: u64,
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        let mut cleanups = PANIC_CLEANUPS
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        cleanups.retain(|(id, _)| *id != self.id);
    }
}

/// Registers `cleanup` to run when any thread panics, before the hook that was
/// installed when the first cleanup was registered.
///
/// The wrapping hook stays installed for the life of the process; with no cleanups
/// registered it only forwards to the previous hook.
pub fn install_panic_hook(cleanup: OnceCleanup) -> PanicHookGuard {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            run_panic_cleanups();
            previous(info);
        }));
    });

    let id = NEXT_PANIC_CLEANUP.fetch_add(1, Ordering::SeqCst);
    PANIC_CLEANUPS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push((id, cleanup));
    PanicHookGuard { id }
}

fn run_panic_cleanups() {
    // A panic raised while the registry is locked must not deadlock the hook.
    let cleanups: Vec<OnceCleanup> = match PANIC_CLEANUPS.try_lock() {
        Ok(cleanups) => cleanups.iter().map(|(_, cleanup)| cleanup.clone()).collect(),
        Err(_) => return,
    };
    for cleanup in cleanups {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cleanup.run()));
    }
}

/// Best-effort writer on the controlling tty for crash cleanup.
///
/// Never blocks and never panics; without a tty every write is dropped.
#[cfg(unix)]
pub(crate) struct HookTerminal {
    fd: libc::c_int,
    owns_fd: bool,
}

#[cfg(unix)]
impl HookTerminal {
    pub(crate) fn new() -> Self {
        let flags = libc::O_WRONLY | libc::O_NONBLOCK | libc::O_NOCTTY | libc::O_CLOEXEC;
        let fd = unsafe { libc::open(c"/dev/tty".as_ptr(), flags) };
        Self {
            fd,
            owns_fd: fd >= 0,
        }
    }

    fn write_best_effort(&self, data: &str) {
        if self.fd < 0 {
            return;
        }
        let mut remaining = data.as_bytes();
        while !remaining.is_empty() {
            let result = unsafe {
                libc::write(
                    self.fd,
                    remaining.as_ptr() as *const libc::c_void,
                    remaining.len(),
                )
            };
            if result > 0 {
                remaining = &remaining[result as usize..];
                continue;
            }
            if result < 0 && io::Error::last_os_error().kind() == io::ErrorKind::Interrupted {
                continue;
            }
            break;
        }
    }
}

#[cfg(unix)]
impl Drop for HookTerminal {
    fn drop(&mut self) {
        if self.owns_fd {
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

#[cfg(unix)]
impl Terminal for HookTerminal {
    fn start(
        &mut self,
        _on_input: Box<dyn FnMut(String) + Send>,
        _on_resize: Box<dyn FnMut() + Send>,
    ) -> io::Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write(&mut self, data: &str) {
        self.write_best_effort(data);
    }

    fn columns(&self) -> u16 {
        DEFAULT_COLUMNS
    }

    fn rows(&self) -> u16 {
        DEFAULT_ROWS
    }
}
