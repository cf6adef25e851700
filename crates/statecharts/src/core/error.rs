//! Core error types for diagram construction
//!
//! Structural problems (no state machine, no states, dangling transition
//! endpoints) abort the diagram for one model. Guard source problems are
//! reported through [`DiagramError::GuardSourceUnreadable`] but callers in
//! this crate only log them and carry on without the guard text.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the diagram core
pub type Result<T, E = DiagramError> = std::result::Result<T, E>;

/// Core error types for diagram construction
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("{model} does not declare a state machine. No diagram generated.")]
    NoStateMachine { model: String },

    #[error("No states found for {model}! No diagram generated.")]
    NoStates { model: String },

    #[error("{model}: a transition references state '{state}', which is not declared. No diagram generated.")]
    UnknownState { model: String, state: String },

    #[error("Could not read guard source {}:{line}: {reason}", .path.display())]
    GuardSourceUnreadable {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("File format '{format}' is not a valid format. These are the valid formats: {supported}")]
    UnsupportedOutputFormat { format: String, supported: String },

    #[error("The config file {} doesn't exist.", .path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Could not parse config file {}: {message}", .path.display())]
    BadConfig { path: PathBuf, message: String },

    #[error("Parse error: {message} at line {line}, column {column}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Could not find model '{name}' (looked in: {searched})")]
    ModelNotFound { name: String, searched: String },

    #[error("Render error: {message}")]
    RenderError { message: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl DiagramError {
    /// Create a new "no state machine" error for a model
    pub fn no_state_machine(model: impl Into<String>) -> Self {
        Self::NoStateMachine {
            model: model.into(),
        }
    }

    /// Create a new "no states" error for a model
    pub fn no_states(model: impl Into<String>) -> Self {
        Self::NoStates {
            model: model.into(),
        }
    }

    /// Create a new dangling-state error
    pub fn unknown_state(model: impl Into<String>, state: impl Into<String>) -> Self {
        Self::UnknownState {
            model: model.into(),
            state: state.into(),
        }
    }

    /// Create a new guard source error
    pub fn guard_source_unreadable(
        path: impl Into<PathBuf>,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::GuardSourceUnreadable {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Create a new parse error
    pub fn parse_error(message: String, line: usize, column: usize) -> Self {
        Self::ParseError {
            message,
            line,
            column,
        }
    }

    /// Create a new render error
    pub fn render_error(message: String) -> Self {
        Self::RenderError { message }
    }

    /// True for errors that abort the diagram of a single model
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::NoStateMachine { .. } | Self::NoStates { .. } | Self::UnknownState { .. }
        )
    }
}
