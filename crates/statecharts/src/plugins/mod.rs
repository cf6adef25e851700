//! Plugin implementations
//!
//! Introspectors that read model sources, the Graphviz renderer, and the
//! orchestrator that runs them as a batch.

pub mod aasm;
pub mod description;
pub mod graphviz;
pub mod orchestrator;

pub use aasm::AasmIntrospector;
pub use description::DescriptionIntrospector;
pub use graphviz::*;
pub use orchestrator::*;
