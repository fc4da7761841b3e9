//! Horizontal rule.

use crate::core::component::Component;
use crate::core::text::utils::fit_to_width;
use crate::core::text::width::visible_width;

pub type DividerColorFn = Box<dyn Fn(&str) -> String>;

pub struct Divider {
    glyph: String,
    color: Option<DividerColorFn>,
}

impl Divider {
    pub fn new() -> Self {
        Self::with_glyph("─", Some(Box::new(|s| format!("\x1b[36m{s}\x1b[39m"))))
    }

    pub fn with_glyph(glyph: impl Into<String>, color: Option<DividerColorFn>) -> Self {
        Self {
            glyph: glyph.into(),
            color,
        }
    }
}

impl Default for Divider {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Divider {
    fn render(&mut self, width: usize) -> Vec<String> {
        let glyph_width = visible_width(&self.glyph).max(1);
        let rule = fit_to_width(&self.glyph.repeat(width / glyph_width), width);
        let rule = match self.color.as_ref() {
            Some(color) => color(&rule),
            None => rule,
        };
        vec![rule]
    }
}

#[cfg(test)]
mod tests {
    use super::Divider;
    use crate::core::component::Component;
    use crate::core::text::width::visible_width;

    #[test]
    fn fills_the_width_in_color() {
        let lines = Divider::new().render(5);
        assert_eq!(lines, vec!["\x1b[36m─────\x1b[39m"]);
    }

    #[test]
    fn wide_glyph_is_fitted_exactly() {
        let mut divider = Divider::with_glyph("你", None);
        for width in 0..7 {
            assert_eq!(visible_width(&divider.render(width)[0]), width);
        }
    }
}
