//! Top-level diagram assembly
//!
//! Builds the state graph, optionally the transition table, and adds the
//! decorative title and footer nodes. Final node order is title, states (with
//! pseudo-nodes where first used), table, footer.

use chrono::{DateTime, Utc};
use tracing::{debug, info, span, Level};

use crate::core::{
    titleize, GraphModel, GraphNode, LabelConfig, ModelDescription, NodeKind, Result, Settings,
    StyleCategory, StyleConfig, StyleResolver, StyleOverrides,
};

use super::builder::GraphModelBuilder;
use super::table::{TransitionTable, TransitionTableBuilder};

/// Name used in the footer of every diagram
pub const GENERATOR: &str = "statecharts";

/// Per-diagram options
#[derive(Debug, Clone, Default)]
pub struct DiagramOptions {
    /// Add the transition table as an extra node
    pub include_table: bool,
    /// Footer timestamp; now when unset
    pub generated_at: Option<DateTime<Utc>>,
}

impl DiagramOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, include_table: bool) -> Self {
        self.include_table = include_table;
        self
    }

    pub fn generated_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.generated_at = Some(timestamp);
        self
    }
}

/// A finished diagram: the graph and, if requested, the table it embeds
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub graph: GraphModel,
    pub table: Option<TransitionTable>,
}

/// Assembles complete diagrams with one effective style
#[derive(Debug, Clone, Default)]
pub struct DiagramAssembler {
    style: StyleConfig,
    labels: LabelConfig,
}

impl DiagramAssembler {
    /// Assembler using the built-in styles
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembler with user style overrides and label settings
    pub fn with_overrides(overrides: &StyleOverrides, labels: LabelConfig) -> Self {
        Self {
            style: StyleResolver::new().resolve(overrides),
            labels,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_overrides(&settings.styles, settings.labels.clone())
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Assemble the diagram for one model
    ///
    /// # Errors
    ///
    /// Structural errors from graph construction; nothing is assembled when
    /// one occurs.
    pub fn assemble(&self, model: &ModelDescription, options: &DiagramOptions) -> Result<Diagram> {
        let assemble_span = span!(
            Level::INFO,
            "assemble_diagram",
            model = %model.name,
            include_table = options.include_table
        );
        let _enter = assemble_span.enter();

        let mut graph = GraphModelBuilder::new(&self.style, &self.labels).build(model)?;

        let title = GraphNode::synthetic(
            NodeKind::Title,
            titleize(&model.name),
            self.style.get(StyleCategory::Title),
        );
        graph.insert_node_at(0, title);

        let table = if options.include_table {
            let events = model
                .machine
                .as_ref()
                .map(|m| m.events.as_slice())
                .unwrap_or_default();
            let builder = TransitionTableBuilder::new(&self.style);
            let table = builder.build(events);
            graph.add_node(GraphNode::synthetic(
                NodeKind::Table,
                builder.render(&table),
                self.style.get(StyleCategory::Table),
            ));
            debug!(rows = table.len(), "Attached transition table");
            Some(table)
        } else {
            None
        };

        let timestamp = options.generated_at.unwrap_or_else(Utc::now);
        graph.add_node(GraphNode::synthetic(
            NodeKind::Footer,
            footer_text(&timestamp),
            self.style.get(StyleCategory::Footer),
        ));

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Assembled diagram"
        );
        Ok(Diagram { graph, table })
    }
}

/// Footer text: generator, version and UTC timestamp
pub fn footer_text(timestamp: &DateTime<Utc>) -> String {
    format!(
        "Generated by {} {} on {} UTC",
        GENERATOR,
        env!("CARGO_PKG_VERSION"),
        timestamp.format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventDescriptor, StateDescriptor, StateMachineDescription, TransitionDescriptor};
    use chrono::TimeZone;

    fn two_states() -> ModelDescription {
        ModelDescription::new(
            "TwoSimpleStates",
            StateMachineDescription::new()
                .with_state(StateDescriptor::new("a").initial())
                .with_state(StateDescriptor::new("b").final_state())
                .with_event(
                    EventDescriptor::new("go").with_transition(TransitionDescriptor::new("a", "b")),
                ),
        )
    }

    #[test]
    fn test_node_order_without_table() {
        let diagram = DiagramAssembler::new()
            .assemble(&two_states(), &DiagramOptions::new())
            .unwrap();
        let kinds: Vec<_> = diagram.graph.nodes().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Title,
                NodeKind::State,
                NodeKind::Start,
                NodeKind::State,
                NodeKind::End,
                NodeKind::Footer
            ]
        );
        assert!(diagram.table.is_none());
    }

    #[test]
    fn test_table_node_precedes_footer() {
        let diagram = DiagramAssembler::new()
            .assemble(&two_states(), &DiagramOptions::new().with_table(true))
            .unwrap();
        let kinds: Vec<_> = diagram.graph.nodes().map(|n| n.kind).collect();
        assert_eq!(kinds[kinds.len() - 2], NodeKind::Table);
        assert_eq!(kinds[kinds.len() - 1], NodeKind::Footer);

        let table_node = diagram.graph.nodes_of_kind(NodeKind::Table).next().unwrap();
        assert!(table_node.label.starts_with("<<TABLE CELLPADDING=\"2\""));
        assert_eq!(table_node.attributes.get("shape").map(|v| v.to_string()).as_deref(), Some("plaintext"));
        assert_eq!(diagram.graph.edges_touching(&table_node.id).count(), 0);
        assert_eq!(diagram.table.unwrap().len(), 1);
    }

    #[test]
    fn test_title_and_footer() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let diagram = DiagramAssembler::new()
            .assemble(&two_states(), &DiagramOptions::new().generated_at(timestamp))
            .unwrap();

        let title = diagram.graph.nodes().next().unwrap();
        assert_eq!(title.label, "Two Simple States");

        let footer = diagram.graph.nodes().last().unwrap();
        assert_eq!(
            footer.label,
            format!(
                "Generated by statecharts {} on 2024-03-09 14:05:07 UTC",
                env!("CARGO_PKG_VERSION")
            )
        );
        assert_eq!(diagram.graph.edges_touching(&footer.id).count(), 0);
    }

    #[test]
    fn test_style_label_does_not_replace_table_or_title() {
        let settings = Settings::from_yaml_str(
            "styles:\n  table:\n    shape: plaintext\n    label: ignored\n  title:\n    label: ignored\n",
        )
        .unwrap();
        let diagram = DiagramAssembler::from_settings(&settings)
            .assemble(&two_states(), &DiagramOptions::new().with_table(true))
            .unwrap();

        let table_node = diagram.graph.nodes_of_kind(NodeKind::Table).next().unwrap();
        assert!(table_node.label.contains("State Transition Table"));
        assert!(table_node.attributes.get("label").is_none());
        let title = diagram.graph.nodes_of_kind(NodeKind::Title).next().unwrap();
        assert_eq!(title.label, "Two Simple States");
    }

    #[test]
    fn test_structural_error_assembles_nothing() {
        let err = DiagramAssembler::new()
            .assemble(
                &ModelDescription::without_machine("Plain"),
                &DiagramOptions::new().with_table(true),
            )
            .unwrap_err();
        assert!(err.is_structural());
    }
}
