//! AASM model source introspection
//!
//! A line-oriented scanner over Ruby source. It tracks `do`/`end` block depth
//! to find `class` declarations and their `aasm ... do` blocks, joins
//! statements continued over several lines, and hands each `state`, `event`
//! and `transitions` statement to [`DslParser`].

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, info, span, trace, warn, Level};

use super::parser::{Call, DslParser, Value};
use crate::core::{
    DiagramError, EventDescriptor, GuardRef, Introspector, ModelDescription, StateDescriptor,
    StateMachineDescription, TransitionDescriptor,
};

const ENTER_CALLBACKS: [&str; 4] = ["before_enter", "enter", "after_enter", "after_commit"];
const EXIT_CALLBACKS: [&str; 3] = ["before_exit", "exit", "after_exit"];
const TRANSITION_CALLBACKS: [&str; 3] = ["before", "on_transition", "after"];
const TRANSITION_GUARDS: [&str; 3] = ["guards", "guard", "if"];

fn class_decl() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^class\s+([A-Z][A-Za-z0-9_]*(?:::[A-Z][A-Za-z0-9_]*)*)")
            .expect("class pattern must compile")
    })
}

fn keyword_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:module|def|if|unless|case|while|until|begin|for)\b")
            .expect("keyword pattern must compile")
    })
}

fn block_opener() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|\s)do(?:\s*\|[^|]*\|)?\s*$")
            .expect("block pattern must compile")
    })
}

fn block_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^end\b").expect("end pattern must compile"))
}

fn inline_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:;|\s)end\s*$").expect("end pattern must compile"))
}

fn lambda_do() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:lambda|proc)\s+do\b").expect("lambda pattern must compile"))
}

fn end_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bend\b").expect("end pattern must compile"))
}

fn method_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z_][A-Za-z0-9_]*)").expect("method pattern must compile"))
}

/// Introspector for Ruby classes using the AASM state machine DSL
pub struct AasmIntrospector {
    parser: DslParser,
}

impl AasmIntrospector {
    pub fn new() -> Self {
        Self {
            parser: DslParser::new(),
        }
    }
}

impl Default for AasmIntrospector {
    fn default() -> Self {
        Self::new()
    }
}

impl Introspector for AasmIntrospector {
    fn describe(&self, input: &str, origin: &Path) -> Result<Vec<ModelDescription>> {
        let describe_span = span!(
            Level::INFO,
            "describe_aasm",
            origin = %origin.display(),
            input_len = input.len()
        );
        let _enter = describe_span.enter();

        let mut scanner = Scanner::new(&self.parser, origin);
        for statement in logical_statements(input) {
            trace!(line = statement.line, text = %statement.text, "Scanning statement");
            scanner.statement(&statement)?;
        }
        let models = scanner.finish();

        info!(models = models.len(), "Described AASM models");
        Ok(models)
    }

    fn name(&self) -> &'static str {
        "aasm"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_describe(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "rb")
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rb"]
    }
}

/// One logical statement and the physical line it starts on
#[derive(Debug, Clone, PartialEq)]
struct Statement {
    text: String,
    line: usize,
}

/// Split source into statements, joining continuation lines
///
/// Joined lines keep their newlines so offsets map back to physical lines.
fn logical_statements(source: &str) -> Vec<Statement> {
    let lines: Vec<&str> = source.lines().collect();
    let mut statements = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let first = strip_comment(lines[index]).trim();
        let line = index + 1;
        index += 1;
        if first.is_empty() {
            continue;
        }

        let mut text = first.to_string();
        while is_incomplete(&text) && index < lines.len() {
            text.push('\n');
            text.push_str(strip_comment(lines[index]).trim_end());
            index += 1;
        }

        statements.push(Statement {
            text: text.trim_end().to_string(),
            line,
        });
    }

    statements
}

/// Remove a trailing `#` comment that is not inside a string literal
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if std::mem::take(&mut escaped) {
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '#') => return &line[..i],
            _ => {}
        }
    }
    line
}

fn is_incomplete(text: &str) -> bool {
    let trimmed = text.trim_end();
    if trimmed.ends_with(',') || trimmed.ends_with('\\') {
        return true;
    }

    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in trimmed.chars() {
        if std::mem::take(&mut escaped) {
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth -= 1,
            _ => {}
        }
    }
    if depth > 0 {
        return true;
    }

    lambda_do().find_iter(trimmed).count() > end_word().find_iter(trimmed).count()
}

struct ScanTransition {
    /// `None` means from any state
    from: Option<Vec<String>>,
    template: TransitionDescriptor,
}

struct ScanEvent {
    name: String,
    transitions: Vec<ScanTransition>,
}

#[derive(Default)]
struct MachineScan {
    states: Vec<StateDescriptor>,
    events: Vec<ScanEvent>,
}

impl MachineScan {
    fn finish(self) -> StateMachineDescription {
        let state_names: Vec<String> = self.states.iter().map(|s| s.name.clone()).collect();
        let events = self
            .events
            .into_iter()
            .map(|event| {
                let mut descriptor = EventDescriptor::new(event.name);
                for scan in event.transitions {
                    let sources = scan.from.as_ref().unwrap_or(&state_names);
                    for from in sources {
                        let mut transition = scan.template.clone();
                        transition.from = from.clone();
                        descriptor.transitions.push(transition);
                    }
                }
                descriptor
            })
            .collect();

        StateMachineDescription {
            states: self.states,
            events,
        }
    }
}

struct ClassScan {
    name: String,
    order: usize,
    machine: Option<MachineScan>,
}

impl ClassScan {
    fn finish(self) -> ModelDescription {
        match self.machine {
            Some(machine) => ModelDescription::new(self.name, machine.finish()),
            None => ModelDescription::without_machine(self.name),
        }
    }
}

enum Block {
    Class(ClassScan),
    Aasm,
    /// Index of the event in the enclosing machine
    Event(usize),
    Other,
}

#[derive(Clone, Copy)]
enum Context {
    Class,
    Aasm,
    Event(usize),
    Other,
}

struct Scanner<'a> {
    parser: &'a DslParser,
    origin: &'a Path,
    stack: Vec<Block>,
    finished: Vec<ClassScan>,
    classes_seen: usize,
}

impl<'a> Scanner<'a> {
    fn new(parser: &'a DslParser, origin: &'a Path) -> Self {
        Self {
            parser,
            origin,
            stack: Vec::new(),
            finished: Vec::new(),
            classes_seen: 0,
        }
    }

    fn statement(&mut self, statement: &Statement) -> std::result::Result<(), DiagramError> {
        let text = statement.text.as_str();

        if block_end().is_match(text) {
            self.close_block(statement.line);
            return Ok(());
        }

        if let Some(caps) = class_decl().captures(text) {
            let class = ClassScan {
                name: caps[1].to_string(),
                order: self.classes_seen,
                machine: None,
            };
            self.classes_seen += 1;
            debug!(class = %class.name, line = statement.line, "Found class");
            if inline_end().is_match(text) {
                self.finished.push(class);
            } else {
                self.stack.push(Block::Class(class));
            }
            return Ok(());
        }

        if keyword_block().is_match(text) {
            if !inline_end().is_match(text) {
                self.stack.push(Block::Other);
            }
            return Ok(());
        }

        let opener = block_opener().find(text);
        let body = match opener {
            Some(m) => text[..m.start()].trim_end(),
            None => text,
        };
        let method = method_name()
            .captures(body)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();
        let opens_block = opener.is_some();

        let context = match self.stack.last() {
            Some(Block::Class(_)) => Context::Class,
            Some(Block::Aasm) => Context::Aasm,
            Some(Block::Event(index)) => Context::Event(*index),
            _ => Context::Other,
        };

        match (context, method.as_str()) {
            (Context::Class, "aasm") if opens_block => {
                if let Some(Block::Class(class)) = self.stack.last_mut() {
                    debug!(class = %class.name, line = statement.line, "Found aasm block");
                    class.machine.get_or_insert_with(MachineScan::default);
                }
                self.stack.push(Block::Aasm);
            }
            (Context::Aasm, "state" | "states") => {
                let call = self.parse(body, statement.line)?;
                self.add_states(&call);
                if opens_block {
                    self.stack.push(Block::Other);
                }
            }
            (Context::Aasm, "event") => {
                let call = self.parse(body, statement.line)?;
                let index = self.add_event(&call, statement.line)?;
                if opens_block {
                    self.stack.push(Block::Event(index));
                }
            }
            (Context::Event(index), "transitions") => {
                let call = self.parse(body, statement.line)?;
                let location = Location {
                    text: body,
                    line: statement.line,
                };
                self.add_transitions(index, &call, &location)?;
                if opens_block {
                    self.stack.push(Block::Other);
                }
            }
            _ if opens_block => self.stack.push(Block::Other),
            _ => {}
        }

        Ok(())
    }

    fn close_block(&mut self, line: usize) {
        match self.stack.pop() {
            Some(Block::Class(class)) => {
                debug!(class = %class.name, line, "Closed class");
                self.finished.push(class);
            }
            Some(_) => {}
            None => warn!(line, origin = %self.origin.display(), "Unbalanced `end`"),
        }
    }

    fn parse(&self, text: &str, line: usize) -> std::result::Result<Call, DiagramError> {
        self.parser.parse_call(text).map_err(|e| match e {
            DiagramError::ParseError {
                message,
                line: relative,
                column,
            } => DiagramError::parse_error(
                format!("{}: {}", self.origin.display(), message),
                line + relative - 1,
                column,
            ),
            other => other,
        })
    }

    fn machine(&mut self) -> Option<&mut MachineScan> {
        self.stack.iter_mut().rev().find_map(|block| match block {
            Block::Class(class) => class.machine.as_mut(),
            _ => None,
        })
    }

    fn add_states(&mut self, call: &Call) {
        let initial = call.option(&["initial"]).and_then(Value::as_bool) == Some(true);
        let is_final = call.option(&["final"]).and_then(Value::as_bool) == Some(true);
        let display = call
            .option(&["display"])
            .and_then(Value::as_text)
            .map(str::to_string);
        let enter: Vec<String> = call.options_for(&ENTER_CALLBACKS).flat_map(Value::names).collect();
        let exit: Vec<String> = call.options_for(&EXIT_CALLBACKS).flat_map(Value::names).collect();

        let Some(machine) = self.machine() else {
            return;
        };

        let mut names = Vec::new();
        for arg in &call.args {
            match arg.literal_names() {
                Some(literals) => names.extend(literals),
                None => warn!(
                    argument = ?arg,
                    "Ignoring state argument that is not a symbol or string"
                ),
            }
        }

        for name in names {
            let mut state = StateDescriptor::new(&name)
                .with_enter(enter.iter().cloned())
                .with_exit(exit.iter().cloned());
            if initial {
                state = state.initial();
            }
            if is_final {
                state = state.final_state();
            }
            if let Some(display) = &display {
                state = state.with_display_name(display);
            }
            trace!(state = %state.name, "Declared state");

            // A repeated declaration replaces the earlier one
            match machine.states.iter_mut().find(|s| s.name == name) {
                Some(existing) => *existing = state,
                None => machine.states.push(state),
            }
        }
    }

    fn add_event(&mut self, call: &Call, line: usize) -> std::result::Result<usize, DiagramError> {
        let name = call
            .args
            .first()
            .and_then(Value::as_text)
            .map(str::to_string)
            .ok_or_else(|| {
                DiagramError::parse_error(
                    format!("{}: event without a name", self.origin.display()),
                    line,
                    1,
                )
            })?;

        let machine = self.machine().ok_or_else(|| {
            DiagramError::parse_error("event outside of an aasm block".to_string(), line, 1)
        })?;
        trace!(event = %name, "Declared event");
        machine.events.push(ScanEvent {
            name,
            transitions: Vec::new(),
        });
        Ok(machine.events.len() - 1)
    }

    fn add_transitions(
        &mut self,
        event: usize,
        call: &Call,
        location: &Location<'_>,
    ) -> std::result::Result<(), DiagramError> {
        let origin: PathBuf = self.origin.to_path_buf();
        let line = location.line;

        let to = call
            .option(&["to"])
            .and_then(Value::as_text)
            .map(str::to_string)
            .ok_or_else(|| {
                DiagramError::parse_error(
                    format!("{}: transitions without a target state", origin.display()),
                    line,
                    1,
                )
            })?;
        let from = call.option(&["from"]).map(Value::names);

        let mut template = TransitionDescriptor::new("", to);
        for value in call.options_for(&TRANSITION_GUARDS) {
            template.guards.extend(guard_refs(value, &origin, location));
        }
        template.before = call.options_for(&["before"]).flat_map(Value::names).collect();
        template.on_transition = call
            .options_for(&["on_transition"])
            .flat_map(Value::names)
            .collect();
        template.after = call.options_for(&["after"]).flat_map(Value::names).collect();

        let Some(scan) = self.machine().and_then(|m| m.events.get_mut(event)) else {
            return Ok(());
        };
        scan.transitions.push(ScanTransition { from, template });
        Ok(())
    }

    fn finish(mut self) -> Vec<ModelDescription> {
        while let Some(block) = self.stack.pop() {
            if let Block::Class(class) = block {
                warn!(class = %class.name, "Class not closed before end of file");
                self.finished.push(class);
            }
        }
        self.finished.sort_by_key(|class| class.order);
        self.finished.into_iter().map(ClassScan::finish).collect()
    }
}

/// Guard references of an option value
///
/// Anonymous functions point at the physical line they start on.
fn guard_refs(value: &Value, origin: &Path, location: &Location<'_>) -> Vec<GuardRef> {
    match value {
        Value::Symbol(s) | Value::Str(s) | Value::Expr(s) => vec![GuardRef::named(s.clone())],
        Value::Lambda { offset, .. } => {
            vec![GuardRef::source(origin, location.line_of(*offset))]
        }
        Value::Array(items) => items
            .iter()
            .flat_map(|item| guard_refs(item, origin, location))
            .collect(),
        Value::Bool(_) => Vec::new(),
    }
}

/// Parsed statement text and the physical line it starts on
struct Location<'t> {
    text: &'t str,
    line: usize,
}

impl Location<'_> {
    /// Physical line of a byte offset into the statement text
    fn line_of(&self, offset: usize) -> usize {
        let end = offset.min(self.text.len());
        self.line + self.text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(source: &str) -> Vec<ModelDescription> {
        AasmIntrospector::new()
            .describe(source, Path::new("models/claim.rb"))
            .unwrap()
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("state :a # the first"), "state :a ");
        assert_eq!(strip_comment("display: 'Room #1'"), "display: 'Room #1'");
        assert_eq!(strip_comment("# whole line"), "");
    }

    #[test]
    fn test_continuation_lines_are_joined() {
        let statements = logical_statements(
            "state :single,\n      initial: true,\n      enter: [:foo, :bar]\nstate :other\n",
        );
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].line, 1);
        assert!(statements[0].text.contains("enter: [:foo, :bar]"));
        assert_eq!(statements[1].line, 4);
    }

    #[test]
    fn test_class_without_aasm() {
        let models = describe("class Plain\n  def go\n  end\nend\n");
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "Plain");
        assert!(!models[0].has_state_machine());
    }

    #[test]
    fn test_simple_machine() {
        let models = describe(
            r#"
class TwoSimpleStates < ActiveRecord::Base
  include AASM

  aasm do
    state :first,
          initial: true
    state :second

    event :from_1_to_2 do
      transitions from: :first, to: :second, if: :forwards_is_allowed
    end
  end
end
"#,
        );
        assert_eq!(models.len(), 1);
        let machine = models[0].machine.as_ref().unwrap();
        assert_eq!(machine.states.len(), 2);
        assert!(machine.states[0].is_initial);
        assert_eq!(machine.events.len(), 1);
        let transition = &machine.events[0].transitions[0];
        assert_eq!(transition.from, "first");
        assert_eq!(transition.to, "second");
        assert_eq!(transition.guards, vec![GuardRef::named("forwards_is_allowed")]);
    }

    #[test]
    fn test_from_any_state_expands_to_all_states() {
        let models = describe(
            "class Door\n  include AASM\n  aasm do\n    state :open, initial: true\n    state :closed\n    event :reset do\n      transitions to: :open\n    end\n  end\nend\n",
        );
        let machine = models[0].machine.as_ref().unwrap();
        let froms: Vec<_> = machine.events[0]
            .transitions
            .iter()
            .map(|t| t.from.as_str())
            .collect();
        assert_eq!(froms, vec!["open", "closed"]);
    }

    #[test]
    fn test_lambda_guard_points_at_source_line() {
        let models = describe(
            "class Door\n  include AASM\n  aasm do\n    state :open, initial: true\n    state :closed\n    event :close do\n      transitions from: :open, to: :closed, guard: lambda { |d| d.empty? }\n    end\n  end\nend\n",
        );
        let machine = models[0].machine.as_ref().unwrap();
        assert_eq!(
            machine.events[0].transitions[0].guards,
            vec![GuardRef::source("models/claim.rb", 7)]
        );
    }

    #[test]
    fn test_parse_error_reports_physical_line() {
        let err = AasmIntrospector::new()
            .describe(
                "class Door\n  include AASM\n  aasm do\n    state :open, enter: [:a\n\n  end\nend\n",
                Path::new("door.rb"),
            )
            .unwrap_err();
        let err = err.downcast::<DiagramError>().unwrap();
        assert!(matches!(err, DiagramError::ParseError { line, .. } if line >= 4));
    }

    #[test]
    fn test_unparseable_option_is_not_a_state() {
        let err = AasmIntrospector::new()
            .describe(
                "class Door\n  include AASM\n  aasm do\n    state :open, initial: true, enter: { notify: true }\n    state :closed\n  end\nend\n",
                Path::new("door.rb"),
            )
            .unwrap_err();
        let err = err.downcast::<DiagramError>().unwrap();
        assert!(matches!(err, DiagramError::ParseError { line: 4, .. }));
    }

    #[test]
    fn test_escaped_quote_in_display_name() {
        let models = AasmIntrospector::new()
            .describe(
                "class Door\n  include AASM\n  aasm do\n    state :open, initial: true, display: 'Don\\'t # close'\n    state :closed\n  end\nend\n",
                Path::new("door.rb"),
            )
            .unwrap();
        let machine = models[0].machine.as_ref().unwrap();
        let names: Vec<&str> = machine.states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["open", "closed"]);
        assert_eq!(machine.states[0].display_name, "Don't # close");
    }
}
