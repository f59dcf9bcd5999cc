//! filemagic
//!
//! Thin command-line frontend over `magic-core`. Command bodies live here
//! (rather than in `main.rs`) so they can be exercised directly from tests.

pub mod commands;

pub use commands::*;
