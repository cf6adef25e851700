//! Core abstractions for statechart diagrams
//!
//! The description types an introspector produces, the graph model a
//! renderer consumes, and the style and configuration shared by both.

mod config;
mod error;
mod graph;
mod introspect;
pub mod logging;
pub mod markup;
mod renderer;
mod style;
mod types;

pub use config::*;
pub use error::*;
pub use graph::*;
pub use introspect::*;
pub use logging::*;
pub use renderer::*;
pub use style::*;
pub use types::*;
