//! DOT serialisation of a [`GraphModel`]

use std::fmt::Write;

use crate::core::markup::is_markup_label;
use crate::core::{AttrValue, Attributes, GraphModel};

/// Writes graph models as Graphviz DOT text
#[derive(Debug, Clone)]
pub struct DotWriter {
    indent: String,
}

impl Default for DotWriter {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
        }
    }
}

impl DotWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, graph: &GraphModel) -> String {
        let mut out = String::new();
        out.push_str("digraph statechart {\n");

        for (keyword, attributes) in [
            ("graph", &graph.graph_attributes),
            ("node", &graph.node_defaults),
            ("edge", &graph.edge_defaults),
        ] {
            if !attributes.is_empty() {
                let _ = writeln!(out, "{}{} [{}];", self.indent, keyword, attribute_list(attributes));
            }
        }

        for node in graph.nodes() {
            let _ = writeln!(
                out,
                "{}{} [{}];",
                self.indent,
                quote(&node.id),
                attribute_list(&node.render_attributes())
            );
        }

        for edge in graph.edges() {
            let _ = write!(out, "{}{} -> {}", self.indent, quote(&edge.from), quote(&edge.to));
            if !edge.label.is_empty() {
                let _ = write!(out, " [label={}]", quote(&edge.label));
            }
            out.push_str(";\n");
        }

        out.push_str("}\n");
        out
    }
}

fn attribute_list(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(name, value)| format!("{}={}", name, attribute_value(name, value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn attribute_value(name: &str, value: &AttrValue) -> String {
    match value {
        AttrValue::Str(s) if name == "label" && is_markup_label(s) => s.clone(),
        AttrValue::Str(s) => quote(s),
        other => other.to_string(),
    }
}

/// Quote a DOT id or string value
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
