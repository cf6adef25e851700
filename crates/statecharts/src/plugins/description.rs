//! Declarative model description files
//!
//! YAML or JSON documents that describe one model, or a list of models,
//! without any host source code.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, span, Level};

use crate::core::{
    EventDescriptor, GuardRef, Introspector, ModelDescription, StateDescriptor,
    StateMachineDescription, TransitionDescriptor,
};

/// A single value or a list of them
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelDoc {
    name: String,
    #[serde(default, alias = "machine")]
    state_machine: Option<MachineDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MachineDoc {
    states: Vec<StateEntry>,
    events: Vec<EventDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StateEntry {
    Name(String),
    Full(StateDoc),
}

#[derive(Debug, Deserialize)]
struct StateDoc {
    name: String,
    #[serde(default)]
    initial: bool,
    #[serde(default, rename = "final")]
    is_final: bool,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    enter: OneOrMany<String>,
    #[serde(default)]
    exit: OneOrMany<String>,
}

#[derive(Debug, Deserialize)]
struct EventDoc {
    name: String,
    #[serde(default)]
    transitions: Vec<TransitionDoc>,
}

#[derive(Debug, Deserialize)]
struct TransitionDoc {
    from: OneOrMany<String>,
    to: String,
    #[serde(default, alias = "guard", alias = "if")]
    guards: OneOrMany<GuardDoc>,
    #[serde(default)]
    before: OneOrMany<String>,
    #[serde(default)]
    on_transition: OneOrMany<String>,
    #[serde(default)]
    after: OneOrMany<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GuardDoc {
    Named(String),
    Source { file: PathBuf, line: usize },
}

impl GuardDoc {
    fn into_ref(self, base: &Path) -> GuardRef {
        match self {
            GuardDoc::Named(name) => GuardRef::named(name),
            GuardDoc::Source { file, line } if file.is_relative() => {
                GuardRef::source(base.join(file), line)
            }
            GuardDoc::Source { file, line } => GuardRef::source(file, line),
        }
    }
}

impl StateEntry {
    fn into_descriptor(self) -> StateDescriptor {
        match self {
            StateEntry::Name(name) => StateDescriptor::new(name),
            StateEntry::Full(doc) => {
                let mut state = StateDescriptor::new(doc.name)
                    .with_enter(doc.enter.into_vec())
                    .with_exit(doc.exit.into_vec());
                if doc.initial {
                    state = state.initial();
                }
                if doc.is_final {
                    state = state.final_state();
                }
                if let Some(display_name) = doc.display_name {
                    state = state.with_display_name(display_name);
                }
                state
            }
        }
    }
}

impl MachineDoc {
    fn into_description(self, base: &Path) -> StateMachineDescription {
        let states = self
            .states
            .into_iter()
            .map(StateEntry::into_descriptor)
            .collect();

        let events = self
            .events
            .into_iter()
            .map(|event| {
                let mut descriptor = EventDescriptor::new(event.name);
                for doc in event.transitions {
                    let guards: Vec<GuardRef> = doc
                        .guards
                        .into_vec()
                        .into_iter()
                        .map(|guard| guard.into_ref(base))
                        .collect();
                    let before = doc.before.into_vec();
                    let on_transition = doc.on_transition.into_vec();
                    let after = doc.after.into_vec();

                    for from in doc.from.into_vec() {
                        let mut transition = TransitionDescriptor::new(from, doc.to.clone())
                            .with_before(before.iter().cloned())
                            .with_on_transition(on_transition.iter().cloned())
                            .with_after(after.iter().cloned());
                        transition.guards = guards.clone();
                        descriptor.transitions.push(transition);
                    }
                }
                descriptor
            })
            .collect();

        StateMachineDescription { states, events }
    }
}

impl ModelDoc {
    fn into_description(self, base: &Path) -> ModelDescription {
        match self.state_machine {
            Some(machine) => ModelDescription::new(self.name, machine.into_description(base)),
            None => ModelDescription::without_machine(self.name),
        }
    }
}

/// Introspector for YAML and JSON model description files
#[derive(Debug, Default, Clone, Copy)]
pub struct DescriptionIntrospector;

impl DescriptionIntrospector {
    pub fn new() -> Self {
        Self
    }

    fn documents(input: &str, origin: &Path) -> Result<Vec<ModelDoc>> {
        let is_json = origin.extension().is_some_and(|ext| ext == "json");
        let docs: OneOrMany<ModelDoc> = if is_json {
            serde_json::from_str(input)
                .with_context(|| format!("invalid JSON description {}", origin.display()))?
        } else {
            serde_yaml::from_str(input)
                .with_context(|| format!("invalid YAML description {}", origin.display()))?
        };
        Ok(docs.into_vec())
    }
}

impl Introspector for DescriptionIntrospector {
    fn describe(&self, input: &str, origin: &Path) -> Result<Vec<ModelDescription>> {
        let describe_span = span!(Level::INFO, "describe_file", origin = %origin.display());
        let _enter = describe_span.enter();

        let base = origin.parent().unwrap_or_else(|| Path::new(""));
        let models: Vec<ModelDescription> = Self::documents(input, origin)?
            .into_iter()
            .map(|doc| doc.into_description(base))
            .collect();

        for model in &models {
            debug!(
                model = %model.name,
                has_state_machine = model.has_state_machine(),
                "Described model"
            );
        }
        info!(models = models.len(), "Described models from file");
        Ok(models)
    }

    fn name(&self) -> &'static str {
        "description"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_describe(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext))
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yml", "yaml", "json"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLAIM: &str = r#"
name: Claim
state_machine:
  states:
    - name: unsubmitted
      initial: true
      enter: notify
    - submitted
    - name: paid
      final: true
      display_name: Paid Out
  events:
    - name: submit
      transitions:
        - from: [unsubmitted, submitted]
          to: submitted
          if: [ok?, { file: claim.rb, line: 12 }]
          after: log
    - name: pay
      transitions:
        - from: submitted
          to: paid
"#;

    #[test]
    fn test_yaml_description() {
        let models = DescriptionIntrospector::new()
            .describe(CLAIM, Path::new("models/claim.yml"))
            .unwrap();
        assert_eq!(models.len(), 1);

        let machine = models[0].machine.as_ref().unwrap();
        assert_eq!(machine.states.len(), 3);
        assert!(machine.states[0].is_initial);
        assert_eq!(machine.states[0].enter_callbacks, vec!["notify"]);
        assert_eq!(machine.states[1].display_name, "Submitted");
        assert!(machine.states[2].is_final);
        assert_eq!(machine.states[2].display_name, "Paid Out");

        let submit = &machine.events[0];
        assert_eq!(submit.transitions.len(), 2);
        assert_eq!(submit.transitions[1].from, "submitted");
        assert_eq!(
            submit.transitions[0].guards,
            vec![
                GuardRef::named("ok?"),
                GuardRef::source("models/claim.rb", 12)
            ]
        );
        assert_eq!(submit.transitions[0].after, vec!["log"]);
    }

    #[test]
    fn test_missing_machine() {
        let models = DescriptionIntrospector::new()
            .describe("name: Plain\n", Path::new("plain.yaml"))
            .unwrap();
        assert!(!models[0].has_state_machine());
    }

    #[test]
    fn test_json_list_of_models() {
        let input = r#"[
            {"name": "A", "state_machine": {"states": ["x"]}},
            {"name": "B"}
        ]"#;
        let models = DescriptionIntrospector::new()
            .describe(input, Path::new("models.json"))
            .unwrap();
        assert_eq!(models.len(), 2);
        assert!(models[0].has_state_machine());
        assert!(!models[1].has_state_machine());
    }

    #[test]
    fn test_can_describe() {
        let introspector = DescriptionIntrospector::new();
        assert!(introspector.can_describe(Path::new("a.yml")));
        assert!(introspector.can_describe(Path::new("a.json")));
        assert!(!introspector.can_describe(Path::new("a.rb")));
    }

    #[test]
    fn test_invalid_document() {
        let err = DescriptionIntrospector::new()
            .describe("states: [", Path::new("broken.yml"))
            .unwrap_err();
        assert!(err.to_string().contains("broken.yml"));
    }
}
