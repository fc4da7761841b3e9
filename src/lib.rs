//! Inline terminal rendering for chat-style agents.
//!
//! Invariant: single output gate. Only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - Compose widgets into a tree of [`ComponentRc`] handles and drive it with [`TUI`].
//! - Lines are diffed against the previous frame; only changed lines are rewritten.
//! - Components mark the cursor with [`CURSOR_MARKER`] or a structured [`CursorPos`] so
//!   the hardware cursor follows the caret for IME candidate windows.
//! - Use the text helpers for ANSI-safe width measurement, wrapping and truncation.

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Built-in UI components.
pub use crate::widgets::{
    Box, Container, Divider, Editor, EditorCallback, EditorOptions, EditorTheme, Loader, Spacer,
    Text,
};

/// Keyboard input parsing.
pub use crate::core::keys::{parse_key, split_input, Key, Token};

/// Terminal interfaces and implementations.
pub use crate::core::terminal::{Terminal, TerminalGuard};
pub use crate::platform::{ProcessTerminal, VirtualTerminal};

/// Component traits and cursor protocol.
pub use crate::core::component::{component_rc, Component, ComponentRc, Focusable};
pub use crate::core::cursor::{CursorPos, CURSOR_MARKER};

pub use crate::config::EnvConfig;
pub use crate::error::{Result, TuiError};
pub use crate::render::{DiffRenderer, Frame};
pub use crate::runtime::{RenderHandle, EXIT_KEY_WINDOW};

/// Alias for the main runtime type.
pub type TUI<T> = crate::runtime::tui::TuiRuntime<T>;

/// Returns whether a component exposes focus behavior via [`Focusable`].
pub fn is_focusable(component: &mut dyn Component) -> bool {
    component.as_focusable().is_some()
}

/// ANSI-aware text helpers.
pub use crate::core::text::{
    fit_to_width, pad_to_width, slice_by_column, strip_control, truncate_to_width,
    visible_width, wrap, wrap_ranges,
};
