//! Container widget: renders its children one after another.

use crate::core::component::{Component, ComponentRc};
use crate::core::cursor::CursorPos;
use crate::runtime::focus::same_component;

/// Ordered list of shared children.
///
/// Never pads or truncates; each child is responsible for its own width.
#[derive(Default)]
pub struct Container {
    children: Vec<ComponentRc>,
    /// Line count of each child in the last render.
    child_heights: Vec<usize>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_child(&mut self, component: ComponentRc) {
        self.children.push(component);
    }

    /// Removes `component` by identity. Returns whether it was a child.
    pub fn remove_child(&mut self, component: &ComponentRc) -> bool {
        let Some(index) = self
            .children
            .iter()
            .position(|child| same_component(child, component))
        else {
            return false;
        };
        self.children.remove(index);
        true
    }

    pub fn remove_child_at(&mut self, index: usize) -> Option<ComponentRc> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.child_heights.clear();
    }

    pub fn children(&self) -> &[ComponentRc] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Component for Container {
    fn render(&mut self, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        self.child_heights.clear();
        for child in &self.children {
            let rendered = child.borrow_mut().render(width);
            self.child_heights.push(rendered.len());
            lines.extend(rendered);
        }
        lines
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        let mut offset = 0;
        for (child, height) in self.children.iter().zip(&self.child_heights) {
            if let Some(pos) = child.borrow().cursor_pos() {
                return Some(CursorPos {
                    row: pos.row + offset,
                    col: pos.col,
                });
            }
            offset += height;
        }
        None
    }

    fn invalidate(&mut self) {
        for child in &self.children {
            child.borrow_mut().invalidate();
        }
    }
}

impl From<Vec<ComponentRc>> for Container {
    fn from(children: Vec<ComponentRc>) -> Self {
        Self {
            children,
            child_heights: Vec::new(),
        }
    }
}
