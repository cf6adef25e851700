//! Command-line interface for the statecharts utility
//!
//! Draws diagrams of the state machines declared by AASM models or model
//! description files.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, info};

use statecharts::core::logging::{init_logging, LOG_FORMAT_ENV, LOG_LEVEL_ENV};
use statecharts::diagram::DiagramOptions;
use statecharts::plugins::{BatchReport, BatchRequest, GraphvizRenderer, Orchestrator};
use statecharts::{OutputFormat, Settings};

/// Statecharts - Draw diagrams of declared state machines
#[derive(Parser)]
#[command(name = "statecharts")]
#[command(about = "Generate statechart diagrams of AASM models and state machine descriptions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Set log level (off|trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Model selection shared by `render` and `validate`
#[derive(clap::Args, Debug, Clone)]
pub struct ModelArgs {
    /// Model names or model files to diagram
    pub models: Vec<String>,

    /// Diagram every model found in the include paths
    #[arg(short, long)]
    pub all: bool,

    /// Directories to search for model files
    #[arg(short, long = "include", value_name = "PATH", default_value = ".")]
    pub include: Vec<PathBuf>,

    /// Add a table of all transitions to each diagram
    #[arg(short = 't', long)]
    pub transition_table: bool,

    /// YAML file with style and label settings
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render diagrams to files
    Render {
        #[command(flatten)]
        models: ModelArgs,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "doc")]
        directory: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "png")]
        format: OutputFormat,

        /// Graphviz program used for non-DOT formats
        #[arg(long, value_name = "PROG", default_value = statecharts::plugins::DEFAULT_PROGRAM)]
        dot_program: String,
    },

    /// Build diagrams without rendering and report their sizes
    Validate {
        #[command(flatten)]
        models: ModelArgs,
    },

    /// Show supported output formats
    Formats {
        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the effective style configuration as YAML
    Styles {
        /// YAML file with style and label settings
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

/// Main CLI application
#[derive(Default)]
pub struct StatechartsApp;

impl StatechartsApp {
    pub fn new() -> Self {
        Self
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level_str = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| cli.log_level.as_str().to_string());

        let log_format_str = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .unwrap_or_else(|| cli.log_format.as_str().to_string());

        if let Err(e) = init_logging(Some(&log_level_str), Some(&log_format_str)) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("statecharts v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Render {
                models,
                directory,
                format,
                dot_program,
            } => self.render_command(models, directory, format, dot_program, cli.verbose),
            Commands::Validate { models } => self.validate_command(models, cli.verbose),
            Commands::Formats { json } => self.formats_command(json),
            Commands::Styles { config } => self.styles_command(config),
        }
    }

    fn load_settings(config: Option<&PathBuf>) -> Result<Settings> {
        match config {
            Some(path) => Ok(Settings::from_file(path)?),
            None => Ok(Settings::default()),
        }
    }

    fn request(models: &ModelArgs) -> Result<BatchRequest> {
        if models.models.is_empty() && !models.all {
            return Err(anyhow!(
                "No model names given. Pass one or more models, or --all"
            ));
        }
        Ok(BatchRequest {
            models: models.models.clone(),
            all: models.all,
            include_paths: models.include.clone(),
            options: DiagramOptions::new().with_table(models.transition_table),
            ..BatchRequest::default()
        })
    }

    /// Handle the render command
    fn render_command(
        &mut self,
        models: ModelArgs,
        directory: PathBuf,
        format: OutputFormat,
        dot_program: String,
        verbose: bool,
    ) -> Result<()> {
        let settings = Self::load_settings(models.config.as_ref())?;
        let mut orchestrator = Orchestrator::with_default_plugins(&settings);
        orchestrator.set_renderer(Box::new(GraphvizRenderer::with_program(dot_program)));

        let request = BatchRequest {
            output_dir: directory,
            format,
            ..Self::request(&models)?
        };
        if verbose {
            eprintln!(
                "Rendering {} to {}",
                format,
                request.output_dir.display()
            );
        }

        debug!(format = %format, dir = %request.output_dir.display(), "Rendering models");
        let report = orchestrator.run(&request);
        info!(
            rendered = report.successes.len(),
            failed = report.failures.len(),
            "Render finished"
        );
        for success in &report.successes {
            if let Some(output) = &success.output {
                println!(" * diagrammed {} and saved to {}", success.model, output.display());
            }
        }
        Self::finish(&report)
    }

    /// Handle the validate command
    fn validate_command(&mut self, models: ModelArgs, verbose: bool) -> Result<()> {
        let settings = Self::load_settings(models.config.as_ref())?;
        let orchestrator = Orchestrator::with_default_plugins(&settings);
        let request = Self::request(&models)?;
        if verbose {
            eprintln!("Validating without rendering");
        }

        let report = orchestrator.validate(&request);
        for success in &report.successes {
            println!(
                "✓ {}: {} nodes, {} edges",
                success.model, success.nodes, success.edges
            );
        }
        Self::finish(&report)
    }

    fn finish(report: &BatchReport) -> Result<()> {
        for failure in &report.failures {
            eprintln!("✗ {}: {}", failure.model, failure.message);
        }
        if report.is_success() {
            Ok(())
        } else {
            Err(anyhow!(
                "{} of {} models failed",
                report.failures.len(),
                report.failures.len() + report.successes.len()
            ))
        }
    }

    /// Handle the formats command
    fn formats_command(&self, json: bool) -> Result<()> {
        let names: Vec<&str> = OutputFormat::ALL.iter().map(|f| f.name()).collect();

        if json {
            let formats = serde_json::json!({
                "formats": names,
                "total": names.len()
            });
            println!("{}", serde_json::to_string_pretty(&formats)?);
        } else {
            println!("Supported output formats:");
            for name in &names {
                println!("  {}", name);
            }
            println!();
            println!("Total: {} formats supported", names.len());
        }

        Ok(())
    }

    /// Handle the styles command
    fn styles_command(&self, config: Option<PathBuf>) -> Result<()> {
        let settings = Self::load_settings(config.as_ref())?;
        print!("{}", serde_yaml::to_string(&settings.resolved_style())?);
        Ok(())
    }
}
