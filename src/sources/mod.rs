//! Frame source implementations.

mod pattern;

pub use pattern::PatternSource;
