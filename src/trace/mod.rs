//! Trace model: named datasets with their rendering style.

pub mod store;
pub mod style;

pub use store::{Trace, TraceStore};
pub use style::{LineStyle, NamedColor, StylePatch, StyleSpec};
