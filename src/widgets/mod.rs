//! Built-in widgets.

pub mod container;
pub mod divider;
pub mod editor;
pub mod loader;
pub mod r#box;
pub mod spacer;
pub mod text;

pub use container::Container;
pub use divider::Divider;
pub use editor::{Editor, EditorCallback, EditorOptions, EditorTheme};
pub use loader::Loader;
pub use r#box::Box;
pub use spacer::Spacer;
pub use text::Text;
