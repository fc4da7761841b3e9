//! Focus tracking for the runtime.

use std::rc::Rc;

use crate::core::component::ComponentRc;

/// Same component, ignoring vtable pointers.
pub(crate) fn same_component(a: &ComponentRc, b: &ComponentRc) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// The component that receives input, if any.
#[derive(Default)]
pub struct FocusState {
    focused: Option<ComponentRc>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves focus, toggling the focus flag on both the old and new target.
    pub fn set_focus(&mut self, target: Option<ComponentRc>) {
        if let (Some(prev), Some(next)) = (self.focused.as_ref(), target.as_ref()) {
            if same_component(prev, next) {
                return;
            }
        }

        if let Some(prev) = self.focused.take() {
            let mut component = prev.borrow_mut();
            if let Some(focusable) = component.as_focusable() {
                focusable.set_focused(false);
            }
        }

        if let Some(next) = target {
            {
                let mut component = next.borrow_mut();
                if let Some(focusable) = component.as_focusable() {
                    focusable.set_focused(true);
                }
            }
            self.focused = Some(next);
        }
    }

    pub fn clear(&mut self) {
        self.set_focus(None);
    }

    pub fn focused(&self) -> Option<ComponentRc> {
        self.focused.as_ref().map(Rc::clone)
    }
}
