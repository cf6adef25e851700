//! Introspection collaborator trait
//!
//! An introspector reads some source (a description file, model source code)
//! and reports the state machines it declares.

use anyhow::Result;
use std::path::Path;

use super::types::ModelDescription;

/// Produces state machine descriptions from a model source
pub trait Introspector: Send + Sync {
    /// Describe every model declared in `input`
    ///
    /// `origin` is the path `input` was read from; relative paths found in
    /// the input resolve against its directory. A model without a state
    /// machine is reported with `machine: None`, not as an error.
    fn describe(&self, input: &str, origin: &Path) -> Result<Vec<ModelDescription>>;

    /// Get the name of this introspector
    fn name(&self) -> &'static str;

    /// Get the version of this introspector
    fn version(&self) -> &'static str;

    /// Check if this introspector handles the given file
    fn can_describe(&self, path: &Path) -> bool;

    /// File extensions handled, without the dot
    fn extensions(&self) -> &'static [&'static str];
}
