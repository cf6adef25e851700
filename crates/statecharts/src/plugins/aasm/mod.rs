//! AASM model source plugin
//!
//! Reads Ruby model classes that declare their state machine with the AASM
//! DSL (`aasm do ... end`) and produces [`ModelDescription`]s.
//!
//! [`ModelDescription`]: crate::core::ModelDescription

mod introspector;
mod parser;

pub use introspector::AasmIntrospector;
pub use parser::{line_and_column, Call, DslParser, Value};
