//! State machine description types
//!
//! These are the values an introspection adapter hands to the diagram core:
//! the declared states, the events and their transitions, and the guard and
//! callback references attached to them. They are read once and never
//! mutated by the core.

use std::fmt;
use std::path::PathBuf;

/// A reference to a guard condition on a transition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GuardRef {
    /// A guard referenced by name (`guard: :ready?`)
    Named(String),
    /// An anonymous function, located by the source line where it was defined
    Source {
        /// Source file containing the function
        file: PathBuf,
        /// 1-based line number where the function starts
        line: usize,
    },
}

impl GuardRef {
    /// Create a named guard reference
    pub fn named(name: impl Into<String>) -> Self {
        GuardRef::Named(name.into())
    }

    /// Create an anonymous-function guard reference
    pub fn source(file: impl Into<PathBuf>, line: usize) -> Self {
        GuardRef::Source {
            file: file.into(),
            line,
        }
    }

    /// Returns true if this guard is an anonymous function
    pub fn is_anonymous(&self) -> bool {
        matches!(self, GuardRef::Source { .. })
    }
}

impl fmt::Display for GuardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardRef::Named(name) => write!(f, "{}", name),
            GuardRef::Source { file, line } => write!(f, "<lambda {}:{}>", file.display(), line),
        }
    }
}

/// A declared state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDescriptor {
    /// Identifier of the state, unique within its machine
    pub name: String,
    /// Human readable name
    pub display_name: String,
    pub is_initial: bool,
    pub is_final: bool,
    /// Callbacks run when entering the state, in declaration order
    pub enter_callbacks: Vec<String>,
    /// Callbacks run when leaving the state, in declaration order
    pub exit_callbacks: Vec<String>,
}

impl StateDescriptor {
    /// Create a plain state whose display name is derived from its name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: humanize(&name),
            name,
            is_initial: false,
            is_final: false,
            enter_callbacks: Vec::new(),
            exit_callbacks: Vec::new(),
        }
    }

    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    pub fn final_state(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_enter<I, S>(mut self, callbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enter_callbacks.extend(callbacks.into_iter().map(Into::into));
        self
    }

    pub fn with_exit<I, S>(mut self, callbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exit_callbacks.extend(callbacks.into_iter().map(Into::into));
        self
    }
}

/// One from/to pair of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDescriptor {
    pub from: String,
    pub to: String,
    pub guards: Vec<GuardRef>,
    pub before: Vec<String>,
    pub on_transition: Vec<String>,
    pub after: Vec<String>,
}

impl TransitionDescriptor {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            guards: Vec::new(),
            before: Vec::new(),
            on_transition: Vec::new(),
            after: Vec::new(),
        }
    }

    pub fn with_guard(mut self, guard: GuardRef) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn with_before<I, S>(mut self, callbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before.extend(callbacks.into_iter().map(Into::into));
        self
    }

    pub fn with_on_transition<I, S>(mut self, callbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on_transition
            .extend(callbacks.into_iter().map(Into::into));
        self
    }

    pub fn with_after<I, S>(mut self, callbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(callbacks.into_iter().map(Into::into));
        self
    }

    /// All transition callbacks: before, then on-transition, then after
    pub fn callbacks(&self) -> impl Iterator<Item = &str> {
        self.before
            .iter()
            .chain(&self.on_transition)
            .chain(&self.after)
            .map(String::as_str)
    }
}

/// A declared event with its transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDescriptor {
    pub name: String,
    pub transitions: Vec<TransitionDescriptor>,
}

impl EventDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transitions: Vec::new(),
        }
    }

    pub fn with_transition(mut self, transition: TransitionDescriptor) -> Self {
        self.transitions.push(transition);
        self
    }
}

/// The states and events declared by one state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateMachineDescription {
    pub states: Vec<StateDescriptor>,
    pub events: Vec<EventDescriptor>,
}

impl StateMachineDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: StateDescriptor) -> Self {
        self.states.push(state);
        self
    }

    pub fn with_event(mut self, event: EventDescriptor) -> Self {
        self.events.push(event);
        self
    }

    pub fn state(&self, name: &str) -> Option<&StateDescriptor> {
        self.states.iter().find(|s| s.name == name)
    }

    /// Total number of transitions over all events
    pub fn transition_count(&self) -> usize {
        self.events.iter().map(|e| e.transitions.len()).sum()
    }
}

/// A host type as reported by an introspection adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescription {
    /// Name of the host type (e.g. `PivotalTrackerFeature`)
    pub name: String,
    /// `None` when the host type has no state machine at all
    pub machine: Option<StateMachineDescription>,
}

impl ModelDescription {
    pub fn new(name: impl Into<String>, machine: StateMachineDescription) -> Self {
        Self {
            name: name.into(),
            machine: Some(machine),
        }
    }

    /// A host type without a state machine
    pub fn without_machine(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            machine: None,
        }
    }

    pub fn has_state_machine(&self) -> bool {
        self.machine.is_some()
    }

    /// File stem used for output files (`PivotalTrackerFeature` -> `pivotal_tracker_feature`)
    pub fn file_stem(&self) -> String {
        snake_case(&self.name)
    }
}

/// Human readable form of a state name: `waiting_for_review` -> `Waiting for review`
pub fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Title-cased words of a type name: `NoRailsClaim` / `no_rails_claim` -> `No Rails Claim`
pub fn titleize(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Snake case form of a type name: `Admin::NoRailsClaim` -> `admin_no_rails_claim`
pub fn snake_case(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Split CamelCase, snake_case and `::` separated names into words
fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = name.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev_lower = chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = chars[i - 1].is_uppercase();
            // "HTTPServer" splits as "HTTP" + "Server"
            if prev_lower || (prev_upper && next_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}
