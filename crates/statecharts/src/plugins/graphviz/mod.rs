//! Graphviz output plugin

mod dot;
mod renderer;

pub use dot::{quote, DotWriter};
pub use renderer::{GraphvizRenderer, DEFAULT_PROGRAM};
