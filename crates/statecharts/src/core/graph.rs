//! Abstract graph model handed to the rendering collaborator
//!
//! Nodes keep insertion order; the rendering engine lays them out top to
//! bottom in that order, so it is part of the output contract.

use std::fmt;

use indexmap::IndexMap;
use uuid::Uuid;

use super::error::{DiagramError, Result};
use super::style::{AttrValue, Attributes};

/// What a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Synthetic start marker
    Start,
    /// Synthetic end marker
    End,
    /// A declared state
    State,
    /// The transition table
    Table,
    Title,
    Footer,
}

impl NodeKind {
    /// True for nodes that do not correspond to a declared state
    pub fn is_synthetic(&self) -> bool {
        !matches!(self, NodeKind::State)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Start => "start-pseudo",
            NodeKind::End => "end-pseudo",
            NodeKind::State => "state",
            NodeKind::Table => "table",
            NodeKind::Title => "title",
            NodeKind::Footer => "footer",
        };
        f.write_str(name)
    }
}

/// A graph node with its pre-rendered label
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// Per-node attributes, excluding `label`
    pub attributes: Attributes,
}

impl GraphNode {
    /// A node for a declared state; the id is the state name
    pub fn state(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: name.into(),
            label: label.into(),
            kind: NodeKind::State,
            attributes: Attributes::new(),
        }
    }

    /// A decorative node (title, table, footer) with a fresh unique id
    ///
    /// The node label is always `label`; a `label` entry in `style` is
    /// dropped.
    pub fn synthetic(kind: NodeKind, label: impl Into<String>, style: &Attributes) -> Self {
        let mut attributes = style.clone();
        attributes.shift_remove("label");
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            kind,
            attributes,
        }
    }

    /// A start or end pseudo-node with a fresh unique id
    ///
    /// A `label` entry in `style` becomes the node label (falling back to
    /// `default_label`) and is removed from the node's attribute map.
    pub fn pseudo(kind: NodeKind, default_label: &str, style: &Attributes) -> Self {
        let label = style
            .get("label")
            .map(AttrValue::to_string)
            .unwrap_or_else(|| default_label.to_string());
        Self::synthetic(kind, label, style)
    }

    /// All attributes including the label, as handed to the renderer
    pub fn render_attributes(&self) -> Attributes {
        let mut all = Attributes::new();
        all.insert("label".to_string(), AttrValue::Str(self.label.clone()));
        all.extend(self.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        all
    }
}

/// A directed edge with its pre-rendered label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub label: String,
}

impl GraphEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: label.into(),
        }
    }
}

/// Nodes, edges and the three global attribute maps of one diagram
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphModel {
    /// Model the graph was built for; used in error messages
    pub name: String,
    nodes: IndexMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
    pub graph_attributes: Attributes,
    pub node_defaults: Attributes,
    pub edge_defaults: Attributes,
}

impl GraphModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a node; a node with an existing id is replaced in place
    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert a node at a position in the node order
    pub fn insert_node_at(&mut self, index: usize, node: GraphNode) {
        let index = index.min(self.nodes.len());
        self.nodes.shift_insert(index, node.id.clone(), node);
    }

    /// Append an edge; both endpoints must already be nodes
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<()> {
        for endpoint in [&edge.from, &edge.to] {
            if !self.nodes.contains_key(endpoint) {
                return Err(DiagramError::unknown_state(&self.name, endpoint));
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    /// Edges leaving or entering a node
    pub fn edges_touching<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges.iter().filter(move |e| e.from == id || e.to == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
