//! Graphviz renderer
//!
//! DOT formats are produced in-process. Everything else is piped through
//! the Graphviz layout program.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::Result;
use tracing::{debug, span, Level};

use super::dot::DotWriter;
use crate::core::{DiagramError, GraphModel, OutputFormat, Renderer};

/// Default Graphviz program
pub const DEFAULT_PROGRAM: &str = "dot";

/// Renders graph models with Graphviz
#[derive(Debug, Clone)]
pub struct GraphvizRenderer {
    program: String,
    writer: DotWriter,
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphvizRenderer {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Use another layout program, e.g. a full path to `dot`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            writer: DotWriter::new(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// DOT text of a graph
    pub fn dot(&self, graph: &GraphModel) -> String {
        self.writer.write(graph)
    }

    fn run_program(&self, dot: &str, format: OutputFormat) -> Result<Vec<u8>, DiagramError> {
        let mut child = Command::new(&self.program)
            .arg(format!("-T{}", format.name()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DiagramError::render_error(format!(
                    "could not run '{}' ({}); is Graphviz installed?",
                    self.program, e
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(dot.as_bytes()).map_err(|e| {
                DiagramError::render_error(format!("failed to write to '{}': {}", self.program, e))
            })?;
        }

        let output = child.wait_with_output().map_err(|e| {
            DiagramError::render_error(format!("failed to read from '{}': {}", self.program, e))
        })?;

        if !output.status.success() {
            return Err(DiagramError::render_error(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(output.stdout)
    }
}

impl Renderer for GraphvizRenderer {
    fn render(&self, graph: &GraphModel, format: OutputFormat) -> Result<Vec<u8>> {
        let render_span = span!(
            Level::INFO,
            "render_graph",
            graph = %graph.name,
            format = %format
        );
        let _enter = render_span.enter();

        let dot = self.dot(graph);
        if format.is_graph_source() {
            debug!(bytes = dot.len(), "Wrote DOT source");
            return Ok(dot.into_bytes());
        }

        debug!(program = %self.program, "Running Graphviz");
        let bytes = self.run_program(&dot, format)?;
        debug!(bytes = bytes.len(), "Graphviz finished");
        Ok(bytes)
    }

    fn name(&self) -> &'static str {
        "graphviz"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn supports(&self, _format: OutputFormat) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GraphNode;

    #[test]
    fn test_dot_format_needs_no_program() {
        let renderer = GraphvizRenderer::with_program("/nonexistent/dot");
        let mut graph = GraphModel::new("Door");
        graph.add_node(GraphNode::state("open", "Open"));

        let bytes = renderer.render(&graph, OutputFormat::Dot).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"open\" [label=\"Open\"];"));
    }

    #[test]
    fn test_missing_program_is_render_error() {
        let renderer = GraphvizRenderer::with_program("/nonexistent/dot");
        let graph = GraphModel::new("Door");

        let err = renderer.render(&graph, OutputFormat::Png).unwrap_err();
        let err = err.downcast::<DiagramError>().unwrap();
        assert!(matches!(err, DiagramError::RenderError { .. }));
        assert!(err.to_string().contains("Graphviz"));
    }
}
