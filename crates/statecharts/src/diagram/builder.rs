//! Graph model construction from a state machine description

use tracing::{debug, info, span, trace, Level};

use crate::core::{
    GraphEdge, GraphModel, GraphNode, LabelConfig, ModelDescription, NodeKind, DiagramError,
    Result, StateMachineDescription, StyleCategory, StyleConfig,
};

use super::label::LabelSynthesizer;

/// Builds the node and edge set of a diagram
///
/// One node per declared state, shared start and end pseudo-nodes created on
/// first use, and one edge per transition.
#[derive(Debug, Clone, Copy)]
pub struct GraphModelBuilder<'a> {
    style: &'a StyleConfig,
    labels: LabelSynthesizer<'a>,
}

/// Working state of one build
struct BuildState {
    graph: GraphModel,
    start_node: Option<String>,
    end_node: Option<String>,
}

impl<'a> GraphModelBuilder<'a> {
    pub fn new(style: &'a StyleConfig, labels: &'a LabelConfig) -> Self {
        Self {
            style,
            labels: LabelSynthesizer::new(style, labels),
        }
    }

    /// Build the graph for one model
    ///
    /// # Errors
    ///
    /// `NoStateMachine` and `NoStates` are detected before anything is built.
    /// `UnknownState` is returned when a transition names an undeclared state.
    pub fn build(&self, model: &ModelDescription) -> Result<GraphModel> {
        let machine = model
            .machine
            .as_ref()
            .ok_or_else(|| DiagramError::no_state_machine(&model.name))?;
        self.build_machine(&model.name, machine)
    }

    /// Build the graph for a state machine belonging to `model_name`
    pub fn build_machine(
        &self,
        model_name: &str,
        machine: &StateMachineDescription,
    ) -> Result<GraphModel> {
        let build_span = span!(
            Level::INFO,
            "build_graph",
            model = model_name,
            states = machine.states.len(),
            events = machine.events.len()
        );
        let _enter = build_span.enter();

        if machine.states.is_empty() {
            return Err(DiagramError::no_states(model_name));
        }

        let mut state = BuildState {
            graph: GraphModel::new(model_name),
            start_node: None,
            end_node: None,
        };

        for descriptor in &machine.states {
            trace!(state = %descriptor.name, "Adding state node");
            state.graph.add_node(GraphNode::state(
                &descriptor.name,
                self.labels.state_label(descriptor),
            ));

            if descriptor.is_initial {
                let start = self.start_node(&mut state);
                state
                    .graph
                    .add_edge(GraphEdge::new(start, &descriptor.name, ""))?;
            }
            if descriptor.is_final {
                let end = self.end_node(&mut state);
                state
                    .graph
                    .add_edge(GraphEdge::new(&descriptor.name, end, ""))?;
            }
        }

        for event in &machine.events {
            if event.transitions.is_empty() {
                debug!(event = %event.name, "Event has no transitions");
                continue;
            }
            for transition in &event.transitions {
                trace!(
                    event = %event.name,
                    from = %transition.from,
                    to = %transition.to,
                    "Adding transition edge"
                );
                state.graph.add_edge(GraphEdge::new(
                    &transition.from,
                    &transition.to,
                    self.labels.edge_label(event, transition),
                ))?;
            }
        }

        let mut graph = state.graph;
        graph.graph_attributes = self.style.get(StyleCategory::Graph).clone();
        graph.node_defaults = self.style.get(StyleCategory::Node).clone();
        graph.edge_defaults = self.style.get(StyleCategory::Edge).clone();

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built graph model"
        );
        Ok(graph)
    }

    fn start_node(&self, state: &mut BuildState) -> String {
        if let Some(id) = &state.start_node {
            return id.clone();
        }
        let node = GraphNode::pseudo(
            NodeKind::Start,
            "start",
            self.style.get(StyleCategory::StartNode),
        );
        let id = node.id.clone();
        debug!(id = %id, "Created start pseudo-node");
        state.graph.add_node(node);
        state.start_node = Some(id.clone());
        id
    }

    fn end_node(&self, state: &mut BuildState) -> String {
        if let Some(id) = &state.end_node {
            return id.clone();
        }
        let node = GraphNode::pseudo(
            NodeKind::End,
            "",
            self.style.get(StyleCategory::EndNode),
        );
        let id = node.id.clone();
        debug!(id = %id, "Created end pseudo-node");
        state.graph.add_node(node);
        state.end_node = Some(id.clone());
        id
    }
}
