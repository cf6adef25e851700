//! Batch orchestration of the diagram pipeline
//!
//! The orchestrator wires the pieces together for a batch of models:
//! Resolve → Introspect → Assemble → Render. A failure in one model is
//! recorded in the [`BatchReport`] and the remaining models still run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info, span, trace, warn, Level};

use super::aasm::AasmIntrospector;
use super::description::DescriptionIntrospector;
use super::graphviz::GraphvizRenderer;
use crate::core::{
    snake_case, DiagramError, Introspector, ModelDescription, OutputFormat, Renderer, Settings,
};
use crate::diagram::{DiagramAssembler, DiagramOptions};

/// What to diagram and where to put it
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Model names or paths to model files
    pub models: Vec<String>,
    /// Diagram every model found in the include paths
    pub all: bool,
    /// Directories searched for model files
    pub include_paths: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub options: DiagramOptions,
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            all: false,
            include_paths: vec![PathBuf::from(".")],
            output_dir: PathBuf::from("doc"),
            format: OutputFormat::Png,
            options: DiagramOptions::default(),
        }
    }
}

/// A model that was diagrammed
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramSummary {
    pub model: String,
    /// Written file; `None` when only validating
    pub output: Option<PathBuf>,
    pub nodes: usize,
    pub edges: usize,
}

/// A model that could not be diagrammed
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFailure {
    pub model: String,
    pub message: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub successes: Vec<DiagramSummary>,
    pub failures: Vec<ModelFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, model: impl Into<String>, err: &anyhow::Error) {
        let model = model.into();
        error!(model = %model, error = %err, "Model failed");
        self.failures.push(ModelFailure {
            model,
            message: format!("{:#}", err),
        });
    }
}

/// Plugin orchestrator that coordinates the batch pipeline
pub struct Orchestrator {
    introspectors: Vec<Box<dyn Introspector>>,
    renderer: Box<dyn Renderer>,
    assembler: DiagramAssembler,
}

impl Orchestrator {
    /// Create an orchestrator with no introspectors registered
    pub fn new(assembler: DiagramAssembler, renderer: Box<dyn Renderer>) -> Self {
        Self {
            introspectors: Vec::new(),
            renderer,
            assembler,
        }
    }

    /// Create an orchestrator with the built-in plugins and the given settings
    pub fn with_default_plugins(settings: &Settings) -> Self {
        let mut orchestrator = Self::new(
            DiagramAssembler::from_settings(settings),
            Box::new(GraphvizRenderer::new()),
        );
        orchestrator.register_introspector(Box::new(AasmIntrospector::new()));
        orchestrator.register_introspector(Box::new(DescriptionIntrospector::new()));
        orchestrator
    }

    /// Register an introspector plugin
    pub fn register_introspector(&mut self, introspector: Box<dyn Introspector>) {
        debug!(
            introspector = introspector.name(),
            version = introspector.version(),
            "Registered introspector"
        );
        self.introspectors.push(introspector);
    }

    /// Replace the renderer
    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = renderer;
    }

    /// Names of the registered introspectors
    pub fn get_introspectors(&self) -> Vec<&'static str> {
        self.introspectors.iter().map(|i| i.name()).collect()
    }

    pub fn assembler(&self) -> &DiagramAssembler {
        &self.assembler
    }

    fn introspector_for(&self, path: &Path) -> Option<&dyn Introspector> {
        self.introspectors
            .iter()
            .find(|i| i.can_describe(path))
            .map(|i| i.as_ref())
    }

    fn extensions(&self) -> Vec<&'static str> {
        self.introspectors
            .iter()
            .flat_map(|i| i.extensions().iter().copied())
            .collect()
    }

    /// Describe every model in one file
    pub fn describe_file(&self, path: &Path) -> Result<Vec<ModelDescription>> {
        let introspector = self
            .introspector_for(path)
            .ok_or_else(|| anyhow::anyhow!("No introspector can read {}", path.display()))?;
        trace!(introspector = introspector.name(), path = %path.display(), "Describing file");

        let input = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        introspector.describe(&input, path)
    }

    /// Find the file for a model name
    ///
    /// A name that is itself an existing file wins. Otherwise each include
    /// path is searched for the name, then its snake_case form, with each
    /// supported extension.
    pub fn resolve(&self, name: &str, include_paths: &[PathBuf]) -> Result<PathBuf, DiagramError> {
        let direct = Path::new(name);
        if direct.is_file() && self.introspector_for(direct).is_some() {
            return Ok(direct.to_path_buf());
        }

        let mut stems = vec![name.to_string()];
        let snake = snake_case(name);
        if snake != name {
            stems.push(snake);
        }

        for dir in include_paths {
            for stem in &stems {
                let bare = dir.join(stem);
                if bare.is_file() && self.introspector_for(&bare).is_some() {
                    return Ok(bare);
                }
                for ext in self.extensions() {
                    let candidate = dir.join(format!("{}.{}", stem, ext));
                    trace!(candidate = %candidate.display(), "Trying model file");
                    if candidate.is_file() {
                        return Ok(candidate);
                    }
                }
            }
        }

        Err(DiagramError::ModelNotFound {
            name: name.to_string(),
            searched: include_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Every supported file directly inside the include paths, sorted per directory
    pub fn discover(&self, include_paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for dir in include_paths {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping include path");
                    continue;
                }
            };
            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && self.introspector_for(path).is_some())
                .collect();
            files.sort();
            found.extend(files);
        }
        debug!(files = found.len(), "Discovered model files");
        found
    }

    /// Resolve and describe one named model
    pub fn load_model(&self, name: &str, include_paths: &[PathBuf]) -> Result<ModelDescription> {
        let path = self.resolve(name, include_paths)?;
        let mut models = self.describe_file(&path)?;

        let wanted = snake_case(name);
        let stem_matches = |m: &ModelDescription| {
            m.file_stem() == wanted
                || Path::new(name).file_stem().and_then(|s| s.to_str()) == Some(m.file_stem().as_str())
        };

        if let Some(index) = models.iter().position(|m| m.name == name || stem_matches(m)) {
            return Ok(models.swap_remove(index));
        }
        if models.len() == 1 {
            return Ok(models.remove(0));
        }
        Err(DiagramError::ModelNotFound {
            name: name.to_string(),
            searched: path.display().to_string(),
        }
        .into())
    }

    /// Diagram and render every requested model
    pub fn run(&self, request: &BatchRequest) -> BatchReport {
        self.run_batch(request, true)
    }

    /// Assemble every requested model without rendering
    pub fn validate(&self, request: &BatchRequest) -> BatchReport {
        self.run_batch(request, false)
    }

    fn run_batch(&self, request: &BatchRequest, render: bool) -> BatchReport {
        let batch_span = span!(
            Level::INFO,
            "run_batch",
            models = request.models.len(),
            all = request.all,
            render
        );
        let _enter = batch_span.enter();

        let mut report = BatchReport::default();

        if render {
            if let Err(e) = fs::create_dir_all(&request.output_dir) {
                let err = anyhow::Error::new(e).context(format!(
                    "Could not create output directory {}",
                    request.output_dir.display()
                ));
                report.fail(request.output_dir.display().to_string(), &err);
                return report;
            }
        }

        let mut models = Vec::new();
        if request.all {
            for path in self.discover(&request.include_paths) {
                match self.describe_file(&path) {
                    Ok(found) => models.extend(found),
                    Err(err) => report.fail(path.display().to_string(), &err),
                }
            }
        }
        for name in &request.models {
            match self.load_model(name, &request.include_paths) {
                Ok(model) => models.push(model),
                Err(err) => report.fail(name.clone(), &err),
            }
        }

        for model in &models {
            match self.diagram(model, request, render) {
                Ok(summary) => report.successes.push(summary),
                Err(err) => report.fail(model.name.clone(), &err),
            }
        }

        info!(
            successes = report.successes.len(),
            failures = report.failures.len(),
            "Batch completed"
        );
        report
    }

    fn diagram(
        &self,
        model: &ModelDescription,
        request: &BatchRequest,
        render: bool,
    ) -> Result<DiagramSummary> {
        let diagram = self.assembler.assemble(model, &request.options)?;

        let output = if render {
            let path = request
                .output_dir
                .join(format!("{}.{}", model.file_stem(), request.format.extension()));
            self.renderer.output(&diagram.graph, &path, request.format)?;
            info!(model = %model.name, path = %path.display(), "Saved diagram");
            Some(path)
        } else {
            None
        };

        Ok(DiagramSummary {
            model: model.name.clone(),
            output,
            nodes: diagram.graph.node_count(),
            edges: diagram.graph.edge_count(),
        })
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::with_default_plugins(&Settings::default())
    }
}
