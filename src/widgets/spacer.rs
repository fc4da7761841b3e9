//! Spacer widget.

use crate::core::component::Component;

/// Blank rows.
pub struct Spacer {
    lines: usize,
}

impl Spacer {
    pub fn new() -> Self {
        Self { lines: 1 }
    }

    pub fn with_lines(lines: usize) -> Self {
        Self { lines }
    }

    pub fn set_lines(&mut self, lines: usize) {
        self.lines = lines;
    }
}

impl Default for Spacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Spacer {
    fn render(&mut self, width: usize) -> Vec<String> {
        vec![" ".repeat(width); self.lines]
    }
}

#[cfg(test)]
mod tests {
    use super::Spacer;
    use crate::core::component::Component;

    #[test]
    fn spacer_renders_blank_lines_of_full_width() {
        let mut spacer = Spacer::with_lines(3);
        let lines = spacer.render(10);
        assert_eq!(lines, vec![" ".repeat(10); 3]);
    }

    #[test]
    fn spacer_default_is_one_line() {
        let mut spacer = Spacer::new();
        assert_eq!(spacer.render(4), vec!["    "]);
    }
}
