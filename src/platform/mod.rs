//! Terminal implementations and process cleanup hooks.

pub mod hooks;
pub mod process_terminal;
pub mod virtual_terminal;

#[cfg(unix)]
pub use hooks::{install_signal_handlers, SignalHookGuard};
pub use hooks::{install_panic_hook, OnceCleanup, PanicHookGuard};
pub use process_terminal::ProcessTerminal;
pub use virtual_terminal::VirtualTerminal;
