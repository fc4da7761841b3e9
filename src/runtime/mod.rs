//! Runtime orchestration: focus, render scheduling and cursor placement.

pub mod focus;
pub mod ime;
pub mod tui;

pub use tui::{RenderHandle, TuiRuntime, EXIT_KEY_WINDOW};
