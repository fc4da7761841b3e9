//! Core interfaces and types.

pub mod component;
pub mod cursor;
pub mod keys;
pub mod output;
pub mod terminal;
pub mod text;
