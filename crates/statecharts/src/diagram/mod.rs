//! Diagram construction
//!
//! Turns a [`ModelDescription`](crate::core::ModelDescription) into a styled
//! [`GraphModel`](crate::core::GraphModel): label synthesis, guard text,
//! graph building, the transition table, and final assembly.

pub mod assembler;
pub mod builder;
pub mod guard;
pub mod label;
pub mod table;

pub use assembler::{footer_text, Diagram, DiagramAssembler, DiagramOptions, GENERATOR};
pub use builder::GraphModelBuilder;
pub use guard::{match_anonymous_function, GuardTextExtractor};
pub use label::LabelSynthesizer;
pub use table::{TransitionTable, TransitionTableBuilder, TransitionTableRow};
