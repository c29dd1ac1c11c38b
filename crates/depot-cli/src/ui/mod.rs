//! Terminal output helpers

pub mod list;
pub mod theme;
