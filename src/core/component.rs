//! Component and Focusable traits.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::cursor::CursorPos;

/// Shared handle to a component in the tree.
///
/// The same handle can sit in a container and be the runtime's focus target.
pub type ComponentRc = Rc<RefCell<dyn Component>>;

/// Wraps a component into a shared handle.
pub fn component_rc<C: Component + 'static>(component: C) -> ComponentRc {
    Rc::new(RefCell::new(component))
}

/// Renderable UI node.
pub trait Component {
    /// Render to lines of exactly `width` visible columns.
    fn render(&mut self, width: usize) -> Vec<String>;

    /// Handle one decoded input token (a key, a text run, or a bracketed paste).
    fn handle_input(&mut self, _data: &str) {}

    /// Structured cursor hint relative to the lines returned by the last `render()`.
    ///
    /// Takes precedence over an embedded [`crate::CURSOR_MARKER`].
    fn cursor_pos(&self) -> Option<CursorPos> {
        None
    }

    /// Drop cached layout so the next render recomputes it.
    fn invalidate(&mut self) {}

    /// Focus behavior, for components that track focus.
    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        None
    }
}

/// Focus flag toggled by the runtime when focus moves.
pub trait Focusable {
    fn set_focused(&mut self, focused: bool);
    fn is_focused(&self) -> bool;
}
