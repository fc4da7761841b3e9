//! Text helpers: escape scanning, width measurement, slicing, wrapping, truncation.
//!
//! Everything here is pure (string in, string out) so widgets can use it without
//! touching the render layer.

pub mod ansi;
pub mod slice;
pub mod utils;
pub mod width;
pub mod wrap;

pub use ansi::strip_control;
pub use slice::slice_by_column;
pub use utils::{fit_to_width, pad_to_width, truncate_to_width};
pub use width::visible_width;
pub use wrap::{wrap, wrap_ranges};
