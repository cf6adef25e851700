//! Statecharts - Diagrams of declared state machines
//!
//! Turns the states, events and transitions a model declares into a styled
//! graph: one node per state, start and end pseudo-nodes, one labelled edge
//! per transition, a title, a footer, and optionally a transition table.
//!
//! # Quick Start
//!
//! ```rust
//! use statecharts::prelude::*;
//!
//! let model = ModelDescription::new(
//!     "Door",
//!     StateMachineDescription::new()
//!         .with_state(StateDescriptor::new("open").initial())
//!         .with_state(StateDescriptor::new("closed"))
//!         .with_event(
//!             EventDescriptor::new("close")
//!                 .with_transition(TransitionDescriptor::new("open", "closed")),
//!         ),
//! );
//!
//! let diagram = DiagramAssembler::new()
//!     .assemble(&model, &DiagramOptions::new())
//!     .unwrap();
//! assert_eq!(diagram.graph.edge_count(), 2);
//! ```
//!
//! # Model files
//!
//! ```rust
//! let yaml = "name: Door\nstate_machine:\n  states:\n    - name: open\n      initial: true\n";
//! let dot = statecharts::render_dot(yaml, std::path::Path::new("door.yml")).unwrap();
//! assert!(dot.starts_with("digraph statechart"));
//! ```

pub mod core;
pub mod diagram;
pub mod plugins;

pub use crate::core::*;

use std::path::Path;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        AttrValue, Attributes, DiagramError, EventDescriptor, GraphEdge, GraphModel, GraphNode,
        GuardRef, Introspector, LabelConfig, ModelDescription, NodeKind, OutputFormat, Renderer,
        Settings, StateDescriptor, StateMachineDescription, StyleCategory, StyleConfig,
        StyleResolver, TransitionDescriptor,
    };
    pub use crate::diagram::{
        Diagram, DiagramAssembler, DiagramOptions, GraphModelBuilder, GuardTextExtractor,
        LabelSynthesizer, TransitionTable, TransitionTableBuilder,
    };
    pub use crate::plugins::{
        AasmIntrospector, BatchReport, BatchRequest, DescriptionIntrospector, DotWriter,
        GraphvizRenderer, Orchestrator,
    };
}

/// Describe the models in a source text
///
/// The introspector is picked from the extension of `origin`: `.rb` for AASM
/// models, `.yml`/`.yaml`/`.json` for description files.
pub fn describe(input: &str, origin: &Path) -> anyhow::Result<Vec<ModelDescription>> {
    use crate::plugins::{AasmIntrospector, DescriptionIntrospector};

    let aasm = AasmIntrospector::new();
    if aasm.can_describe(origin) {
        return aasm.describe(input, origin);
    }
    let description = DescriptionIntrospector::new();
    if description.can_describe(origin) {
        return description.describe(input, origin);
    }
    Err(anyhow::anyhow!(
        "No introspector can read {}",
        origin.display()
    ))
}

/// Assemble the first model in a source text with default styles and
/// return its DOT text
pub fn render_dot(input: &str, origin: &Path) -> anyhow::Result<String> {
    use crate::diagram::{DiagramAssembler, DiagramOptions};
    use crate::plugins::DotWriter;

    let model = describe(input, origin)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("{} declares no models", origin.display()))?;
    let diagram = DiagramAssembler::new().assemble(&model, &DiagramOptions::new())?;
    Ok(DotWriter::new().write(&diagram.graph))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_picks_introspector_by_extension() {
        let models = describe("name: Plain\n", Path::new("plain.yml")).unwrap();
        assert_eq!(models[0].name, "Plain");

        let models = describe("class Plain\nend\n", Path::new("plain.rb")).unwrap();
        assert_eq!(models[0].name, "Plain");

        assert!(describe("", Path::new("plain.txt")).is_err());
    }

    #[test]
    fn test_render_dot_reports_structural_errors() {
        let err = render_dot("name: Plain\n", Path::new("plain.yml")).unwrap_err();
        assert!(err.to_string().contains("does not declare a state machine"));
    }
}
