//! Environment configuration.
//!
//! Runtime setters such as `TuiRuntime::set_clear_on_shrink` override these values.

use std::env;

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// `SANBOT_TUI_HARDWARE_CURSOR=1`: show the hardware cursor at the cursor position.
    pub hardware_cursor: bool,
    /// `SANBOT_TUI_CLEAR_ON_SHRINK=1`: full render whenever the frame shrinks.
    pub clear_on_shrink: bool,
    /// `SANBOT_TUI_STRICT_WIDTH=1`: panic on over-wide lines instead of clamping.
    pub strict_width: bool,
    /// `SANBOT_TUI_WRITE_LOG`: file that receives a copy of every terminal write.
    pub write_log: Option<String>,
    /// `SANBOT_TUI_LOG`: file that receives tracing output.
    pub log_file: Option<String>,
    /// `SANBOT_TUI_LOG_FILTER`: `EnvFilter` directives for tracing output.
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            hardware_cursor: env_flag("SANBOT_TUI_HARDWARE_CURSOR"),
            clear_on_shrink: env_flag("SANBOT_TUI_CLEAR_ON_SHRINK"),
            strict_width: env_flag("SANBOT_TUI_STRICT_WIDTH"),
            write_log: env_string_opt("SANBOT_TUI_WRITE_LOG"),
            log_file: env_string_opt("SANBOT_TUI_LOG"),
            log_filter: env_string_opt("SANBOT_TUI_LOG_FILTER"),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
pub(crate) mod test_env {
    use std::env;
    use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

    pub(crate) struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }
}
