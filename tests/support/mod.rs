#![allow(dead_code)]

pub mod screen;

use std::cell::RefCell;
use std::rc::Rc;

use sanbot_tui::{Component, ComponentRc};

/// Component whose lines are replaced directly by the test.
pub struct Lines {
    pub lines: Vec<String>,
}

impl Component for Lines {
    fn render(&mut self, width: usize) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| sanbot_tui::fit_to_width(line, width))
            .collect()
    }
}

pub fn lines_component(lines: &[&str]) -> (Rc<RefCell<Lines>>, ComponentRc) {
    let component = Rc::new(RefCell::new(Lines {
        lines: lines.iter().map(|line| line.to_string()).collect(),
    }));
    let handle: ComponentRc = component.clone();
    (component, handle)
}

pub fn to_lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
