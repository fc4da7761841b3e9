//! Bordered box widget.

use std::boxed::Box as StdBox;

use crate::core::component::{Component, ComponentRc};
use crate::core::text::utils::fit_to_width;
use crate::runtime::focus::same_component;

pub type BorderColorFn = StdBox<dyn Fn(&str) -> String>;

struct RenderCache {
    child_lines: Vec<String>,
    width: usize,
    lines: Vec<String>,
}

/// Children framed by a `┌─┐` border with inner padding.
pub struct Box {
    children: Vec<ComponentRc>,
    padding: usize,
    border_color: Option<BorderColorFn>,
    cache: Option<RenderCache>,
}

impl Box {
    pub fn new(padding: usize, border_color: Option<BorderColorFn>) -> Self {
        Self {
            children: Vec::new(),
            padding,
            border_color,
            cache: None,
        }
    }

    pub fn add_child(&mut self, component: ComponentRc) {
        self.children.push(component);
        self.invalidate_cache();
    }

    pub fn remove_child(&mut self, component: &ComponentRc) -> bool {
        let Some(index) = self
            .children
            .iter()
            .position(|child| same_component(child, component))
        else {
            return false;
        };
        self.children.remove(index);
        self.invalidate_cache();
        true
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.invalidate_cache();
    }

    pub fn set_border_color(&mut self, border_color: Option<BorderColorFn>) {
        self.border_color = border_color;
        self.invalidate_cache();
    }

    fn invalidate_cache(&mut self) {
        self.cache = None;
    }

    fn color(&self, text: &str) -> String {
        match self.border_color.as_ref() {
            Some(color) => color(text),
            None => text.to_string(),
        }
    }

    fn frame_lines(&self, child_lines: &[String], width: usize) -> Vec<String> {
        // Too narrow for a border: the children alone, fitted.
        if width < 2 {
            return child_lines
                .iter()
                .map(|line| fit_to_width(line, width))
                .collect();
        }

        let inner = width - 2;
        let horizontal = "─".repeat(inner);
        let side = self.color("│");
        let blank = format!("{side}{}{side}", " ".repeat(inner));
        let pad = " ".repeat(self.padding.min(inner / 2));
        let content_width = inner - pad.len() * 2;

        let mut lines = Vec::with_capacity(child_lines.len() + self.padding * 2 + 2);
        lines.push(self.color(&format!("┌{horizontal}┐")));
        lines.extend(std::iter::repeat(blank.clone()).take(self.padding));
        for line in child_lines {
            let content = fit_to_width(line, content_width);
            lines.push(format!("{side}{pad}{content}{pad}{side}"));
        }
        lines.extend(std::iter::repeat(blank).take(self.padding));
        lines.push(self.color(&format!("└{horizontal}┘")));
        lines
    }
}

impl Default for Box {
    fn default() -> Self {
        Self::new(1, None)
    }
}

impl Component for Box {
    fn render(&mut self, width: usize) -> Vec<String> {
        let content_width = width.saturating_sub(2 + self.padding * 2).max(1);
        let mut child_lines = Vec::new();
        for child in &self.children {
            child_lines.extend(child.borrow_mut().render(content_width));
        }

        if let Some(cache) = self.cache.as_ref() {
            if cache.width == width && cache.child_lines == child_lines {
                return cache.lines.clone();
            }
        }

        let lines = self.frame_lines(&child_lines, width);
        self.cache = Some(RenderCache {
            child_lines,
            width,
            lines: lines.clone(),
        });
        lines
    }

    fn invalidate(&mut self) {
        self.invalidate_cache();
        for child in &self.children {
            child.borrow_mut().invalidate();
        }
    }
}
