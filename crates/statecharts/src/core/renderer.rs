//! Rendering collaborator trait and output formats

use anyhow::Result;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::error::DiagramError;
use super::graph::GraphModel;

/// Output formats accepted by the rendering engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Bmp,
    Canon,
    Dot,
    Eps,
    Gif,
    Gv,
    Jpeg,
    Jpg,
    Json,
    Pdf,
    Plain,
    Png,
    Ps,
    Svg,
    Svgz,
    Tif,
    Tiff,
    Webp,
    Xdot,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 19] = [
        OutputFormat::Bmp,
        OutputFormat::Canon,
        OutputFormat::Dot,
        OutputFormat::Eps,
        OutputFormat::Gif,
        OutputFormat::Gv,
        OutputFormat::Jpeg,
        OutputFormat::Jpg,
        OutputFormat::Json,
        OutputFormat::Pdf,
        OutputFormat::Plain,
        OutputFormat::Png,
        OutputFormat::Ps,
        OutputFormat::Svg,
        OutputFormat::Svgz,
        OutputFormat::Tif,
        OutputFormat::Tiff,
        OutputFormat::Webp,
        OutputFormat::Xdot,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Bmp => "bmp",
            OutputFormat::Canon => "canon",
            OutputFormat::Dot => "dot",
            OutputFormat::Eps => "eps",
            OutputFormat::Gif => "gif",
            OutputFormat::Gv => "gv",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Json => "json",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Plain => "plain",
            OutputFormat::Png => "png",
            OutputFormat::Ps => "ps",
            OutputFormat::Svg => "svg",
            OutputFormat::Svgz => "svgz",
            OutputFormat::Tif => "tif",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Webp => "webp",
            OutputFormat::Xdot => "xdot",
        }
    }

    /// File extension for output files
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Plain => "txt",
            other => other.name(),
        }
    }

    /// True for formats that are the graph description itself
    pub fn is_graph_source(&self) -> bool {
        matches!(self, OutputFormat::Dot | OutputFormat::Gv)
    }

    /// Comma separated list of every format name
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|f| f.name() == wanted)
            .copied()
            .ok_or_else(|| DiagramError::UnsupportedOutputFormat {
                format: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

/// Turns a graph model into an output document
pub trait Renderer: Send + Sync {
    /// Render the graph in the given format
    fn render(&self, graph: &GraphModel, format: OutputFormat) -> Result<Vec<u8>>;

    /// Render the graph and write it to `path`
    fn output(&self, graph: &GraphModel, path: &Path, format: OutputFormat) -> Result<()> {
        let bytes = self.render(graph, format)?;
        std::fs::write(path, bytes).map_err(DiagramError::from)?;
        Ok(())
    }

    /// Get the name of this renderer
    fn name(&self) -> &'static str;

    /// Get the version of this renderer
    fn version(&self) -> &'static str;

    /// Check if this renderer can produce the format
    fn supports(&self, format: OutputFormat) -> bool;
}
