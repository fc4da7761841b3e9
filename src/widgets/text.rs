//! Text widget.

use crate::core::component::Component;
use crate::core::text::utils::fit_to_width;
use crate::core::text::wrap::wrap;

pub type TextBgFn = Box<dyn Fn(&str) -> String>;

/// Word-wrapped text with optional padding and background.
pub struct Text {
    text: String,
    padding_x: usize,
    padding_y: usize,
    custom_bg_fn: Option<TextBgFn>,
    cached_text: Option<String>,
    cached_width: Option<usize>,
    cached_lines: Option<Vec<String>>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_padding(text, 0, 0)
    }

    pub fn with_padding(text: impl Into<String>, padding_x: usize, padding_y: usize) -> Self {
        Self {
            text: text.into(),
            padding_x,
            padding_y,
            custom_bg_fn: None,
            cached_text: None,
            cached_width: None,
            cached_lines: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.invalidate();
    }

    pub fn set_padding(&mut self, padding_x: usize, padding_y: usize) {
        self.padding_x = padding_x;
        self.padding_y = padding_y;
        self.invalidate();
    }

    /// Styles every full-width line. The function must not change visible width.
    pub fn set_custom_bg_fn(&mut self, custom_bg_fn: Option<TextBgFn>) {
        self.custom_bg_fn = custom_bg_fn;
        self.invalidate();
    }

    fn finish_line(&self, line: &str, width: usize) -> String {
        let line = fit_to_width(line, width);
        match self.custom_bg_fn.as_ref() {
            Some(bg_fn) => fit_to_width(&bg_fn(&line), width),
            None => line,
        }
    }

    fn render_lines(&self, width: usize) -> Vec<String> {
        if self.text.trim().is_empty() || width == 0 {
            return Vec::new();
        }

        let normalized = self.text.replace('\t', "   ");
        let content_width = width.saturating_sub(self.padding_x * 2).max(1);
        let margin = " ".repeat(self.padding_x);
        let blank = self.finish_line("", width);

        let mut lines = Vec::new();
        lines.extend(std::iter::repeat(blank.clone()).take(self.padding_y));
        for line in wrap(&normalized, content_width) {
            lines.push(self.finish_line(&format!("{margin}{line}"), width));
        }
        lines.extend(std::iter::repeat(blank).take(self.padding_y));
        lines
    }
}

impl Default for Text {
    fn default() -> Self {
        Self::new("")
    }
}

impl Component for Text {
    fn render(&mut self, width: usize) -> Vec<String> {
        if let Some(cached) = self.cached_lines.as_ref() {
            if self.cached_text.as_deref() == Some(self.text.as_str())
                && self.cached_width == Some(width)
            {
                return cached.clone();
            }
        }

        let lines = self.render_lines(width);
        self.cached_text = Some(self.text.clone());
        self.cached_width = Some(width);
        self.cached_lines = Some(lines.clone());
        lines
    }

    fn invalidate(&mut self) {
        self.cached_text = None;
        self.cached_width = None;
        self.cached_lines = None;
    }
}
