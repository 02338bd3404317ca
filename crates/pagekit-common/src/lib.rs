//! Common utilities for the PageKit DOM crates.
//!
//! This crate provides shared infrastructure used by the other crates:
//! - **Warning System** - colored, deduplicated terminal output for input
//!   that is accepted but not fully supported (unknown pseudo-classes,
//!   stray end tags, ...)

pub mod warning;

pub use warning::{clear_warnings, warn_once};
