//! AASM DSL statement parser using chumsky
//!
//! Parses one logical DSL statement (`state ...`, `event ...`,
//! `transitions ...`, `aasm ...`) into a method call with positional
//! arguments and keyword options. Block openers (`do`) are stripped by the
//! caller before parsing.

use chumsky::prelude::*;

use crate::core::DiagramError;

type ParserExtra<'src> = extra::Err<Rich<'src, char>>;

/// An argument or option value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `:name`
    Symbol(String),
    /// `'text'` or `"text"`
    Str(String),
    Bool(bool),
    /// `[value, ...]`
    Array(Vec<Value>),
    /// An anonymous function; `offset` is its byte offset in the statement
    Lambda { text: String, offset: usize },
    /// Anything else, kept as source text
    Expr(String),
}

impl Value {
    /// Flatten into names: symbols, strings and expressions as written,
    /// anonymous functions as their source text
    pub fn names(&self) -> Vec<String> {
        match self {
            Value::Symbol(s) | Value::Str(s) | Value::Expr(s) => vec![s.clone()],
            Value::Lambda { text, .. } => vec![text.clone()],
            Value::Array(items) => items.iter().flat_map(Value::names).collect(),
            Value::Bool(_) => Vec::new(),
        }
    }

    /// Names of a symbol, a string, or an array of them; `None` for anything else
    pub fn literal_names(&self) -> Option<Vec<String>> {
        match self {
            Value::Symbol(s) | Value::Str(s) => Some(vec![s.clone()]),
            Value::Array(items) => items
                .iter()
                .map(Value::literal_names)
                .collect::<Option<Vec<_>>>()
                .map(|names| names.concat()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text of a single-valued symbol or string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) | Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A parsed DSL call: `method arg, arg, key: value, ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub args: Vec<Value>,
    pub options: Vec<(String, Value)>,
}

impl Call {
    /// First option value under any of `keys`, in key order
    pub fn option(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .find_map(|key| self.options.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v)
    }

    /// All option values under `keys`, in key order
    pub fn options_for<'a>(&'a self, keys: &'a [&'a str]) -> impl Iterator<Item = &'a Value> + 'a {
        keys.iter().flat_map(move |key| {
            self.options
                .iter()
                .filter(move |(k, _)| k == key)
                .map(|(_, v)| v)
        })
    }
}

enum Arg {
    Positional(Value),
    Option(String, Value),
}

/// Chumsky-based AASM statement parser
pub struct DslParser;

impl DslParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one statement
    ///
    /// Error positions are 1-based and relative to `input`.
    pub fn parse_call(&self, input: &str) -> Result<Call, DiagramError> {
        Self::call_parser()
            .parse(input)
            .into_result()
            .map_err(|errors| {
                let (message, offset) = errors
                    .first()
                    .map(|e| (e.to_string(), e.span().start))
                    .unwrap_or_else(|| ("unknown parse error".to_string(), 0));
                let (line, column) = line_and_column(input, offset);
                DiagramError::parse_error(message, line, column)
            })
    }

    fn ws<'src>() -> impl Parser<'src, &'src str, (), ParserExtra<'src>> + Clone {
        one_of(" \t\r\n").repeated().ignored()
    }

    fn ident<'src>() -> impl Parser<'src, &'src str, String, ParserExtra<'src>> + Clone {
        any()
            .filter(|c: &char| c.is_alphanumeric() || *c == '_')
            .repeated()
            .at_least(1)
            .then(one_of("?!").or_not())
            .to_slice()
            .map(|s: &str| s.to_string())
    }

    /// `'text'` or `"text"`; a backslash escapes the next character
    fn quoted<'src>() -> impl Parser<'src, &'src str, String, ParserExtra<'src>> + Clone {
        let body = |delimiter: char| {
            just('\\')
                .then(any())
                .ignored()
                .or(any().filter(move |c: &char| *c != delimiter && *c != '\\').ignored())
                .repeated()
                .to_slice()
                .delimited_by(just(delimiter), just(delimiter))
        };
        body('\'').or(body('"')).map(unescape)
    }

    fn symbol<'src>() -> impl Parser<'src, &'src str, String, ParserExtra<'src>> + Clone {
        just(':').ignore_then(Self::ident().or(Self::quoted()))
    }

    /// `{ ... }` with nested braces
    fn braced<'src>() -> impl Parser<'src, &'src str, (), ParserExtra<'src>> + Clone {
        recursive(|braced| {
            just('{')
                .then(choice((braced, none_of("{}").ignored())).repeated())
                .then(just('}'))
                .ignored()
        })
    }

    fn lambda<'src>() -> impl Parser<'src, &'src str, Value, ParserExtra<'src>> + Clone {
        let ws = Self::ws();
        let params = just('(')
            .then(none_of(")").repeated())
            .then(just(')'))
            .ignored();

        let brace_form = text::keyword("lambda")
            .or(text::keyword("proc"))
            .then(ws.clone())
            .then(params.clone().or_not())
            .then(ws.clone())
            .then(Self::braced())
            .ignored();

        let arrow_form = just("->")
            .then(ws.clone())
            .then(params.or_not())
            .then(ws.clone())
            .then(Self::braced())
            .ignored();

        let do_form = text::keyword("lambda")
            .or(text::keyword("proc"))
            .then(ws.clone())
            .then(text::keyword("do"))
            .then(any().and_is(text::keyword("end").not()).repeated())
            .then(text::keyword("end"))
            .ignored();

        choice((do_form, brace_form, arrow_form))
            .to_slice()
            .map_with(|text: &str, e| Value::Lambda {
                text: text.to_string(),
                offset: e.span().start,
            })
    }

    fn value<'src>() -> impl Parser<'src, &'src str, Value, ParserExtra<'src>> + Clone {
        recursive(|value| {
            let ws = Self::ws();

            let boolean = text::keyword("true")
                .to(Value::Bool(true))
                .or(text::keyword("false").to(Value::Bool(false)));

            let array = value
                .separated_by(just(',').padded_by(ws.clone()))
                .allow_trailing()
                .collect::<Vec<_>>()
                .padded_by(ws)
                .delimited_by(just('['), just(']'))
                .map(Value::Array);

            // `key: value` is never a positional expression
            let expr = Self::key()
                .not()
                .ignore_then(none_of(",[]{}:'\""))
                .then(none_of(",]").repeated())
                .to_slice()
                .map(|s: &str| Value::Expr(s.trim().to_string()));

            choice((
                Self::lambda(),
                Self::symbol().map(Value::Symbol),
                Self::quoted().map(Value::Str),
                array,
                boolean,
                expr,
            ))
        })
    }

    /// `key:` or `:key =>` or `"key" =>`
    fn key<'src>() -> impl Parser<'src, &'src str, String, ParserExtra<'src>> + Clone {
        let label = Self::ident()
            .then_ignore(just(':'))
            .then_ignore(just(':').not());
        let rocket = Self::symbol()
            .or(Self::quoted())
            .then_ignore(Self::ws())
            .then_ignore(just("=>"));
        label.or(rocket)
    }

    fn call_parser<'src>() -> impl Parser<'src, &'src str, Call, ParserExtra<'src>> {
        let ws = Self::ws();

        let option = Self::key()
            .then_ignore(ws.clone())
            .then(Self::value())
            .map(|(key, value)| Arg::Option(key, value));

        let arg = option.or(Self::value().map(Arg::Positional));

        let args = arg
            .separated_by(just(',').padded_by(ws.clone()))
            .allow_trailing()
            .collect::<Vec<_>>();

        ws.clone()
            .ignore_then(Self::ident())
            .then(
                one_of(" \t")
                    .repeated()
                    .at_least(1)
                    .ignore_then(args)
                    .or_not(),
            )
            .then_ignore(ws)
            .then_ignore(end())
            .map(|(method, args)| {
                let mut call = Call {
                    method,
                    args: Vec::new(),
                    options: Vec::new(),
                };
                for arg in args.unwrap_or_default() {
                    match arg {
                        Arg::Positional(value) => call.args.push(value),
                        Arg::Option(key, value) => call.options.push((key, value)),
                    }
                }
                call
            })
    }
}

impl Default for DslParser {
    fn default() -> Self {
        Self::new()
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            _ => out.push(c),
        }
    }
    out
}

/// 1-based line and column of a byte offset
pub fn line_and_column(input: &str, offset: usize) -> (usize, usize) {
    let before = &input[..offset.min(input.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|nl| before.len() - nl)
        .unwrap_or(before.len() + 1);
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Call {
        DslParser::new().parse_call(input).unwrap()
    }

    #[test]
    fn test_state_with_options() {
        let call = parse("state :a, initial: true, exit: :a_exit");
        assert_eq!(call.method, "state");
        assert_eq!(call.args, vec![Value::Symbol("a".into())]);
        assert_eq!(call.option(&["initial"]), Some(&Value::Bool(true)));
        assert_eq!(call.option(&["exit"]), Some(&Value::Symbol("a_exit".into())));
    }

    #[test]
    fn test_hash_rocket_options() {
        let call = parse("state :new, :initial => true");
        assert_eq!(call.args, vec![Value::Symbol("new".into())]);
        assert_eq!(call.option(&["initial"]), Some(&Value::Bool(true)));

        let call = parse("aasm :column => 'state'");
        assert_eq!(call.method, "aasm");
        assert_eq!(call.option(&["column"]), Some(&Value::Str("state".into())));
    }

    #[test]
    fn test_bare_call() {
        let call = parse("aasm");
        assert_eq!(call.method, "aasm");
        assert!(call.args.is_empty());
        assert!(call.options.is_empty());
    }

    #[test]
    fn test_arrays_across_lines() {
        let call = parse("state :b, enter: [:b1_enter, :b2_enter],\n          exit: [ :b1_exit, :b2_exit ]");
        assert_eq!(
            call.option(&["enter"]).map(Value::names),
            Some(vec!["b1_enter".to_string(), "b2_enter".to_string()])
        );
        assert_eq!(
            call.option(&["exit"]).map(Value::names),
            Some(vec!["b1_exit".to_string(), "b2_exit".to_string()])
        );
    }

    #[test]
    fn test_transitions_with_guards_and_callbacks() {
        let call = parse(
            "transitions from: [:a, :b], to: :c, before: :y_before, after: [:z1, :z2], if: :y_is_ok?",
        );
        assert_eq!(call.method, "transitions");
        assert_eq!(
            call.option(&["from"]).map(Value::names),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(call.option(&["guards", "guard", "if"]).and_then(Value::as_text), Some("y_is_ok?"));
        let callbacks: Vec<String> = call
            .options_for(&["before", "on_transition", "after"])
            .flat_map(Value::names)
            .collect();
        assert_eq!(callbacks, vec!["y_before", "z1", "z2"]);
    }

    #[test]
    fn test_lambda_forms() {
        let call = parse("transitions from: :a, to: :b, guard: lambda { |c| c.ok? { 1 } }");
        match call.option(&["guard"]) {
            Some(Value::Lambda { text, offset }) => {
                assert_eq!(text, "lambda { |c| c.ok? { 1 } }");
                assert_eq!(*offset, 37);
            }
            other => panic!("expected lambda, got {:?}", other),
        }

        let call = parse("transitions from: :a, to: :b, if: ->(c) { c.ready? }");
        assert!(matches!(call.option(&["if"]), Some(Value::Lambda { text, .. }) if text == "->(c) { c.ready? }"));

        let call = parse("transitions from: :a, to: :b, guard: lambda do |c| c.ok? end");
        assert!(matches!(call.option(&["guard"]), Some(Value::Lambda { text, .. }) if text == "lambda do |c| c.ok? end"));
    }

    #[test]
    fn test_expression_values() {
        let call = parse("state :a, display: 'Alpha', after_commit: notify_later");
        assert_eq!(call.option(&["display"]).and_then(Value::as_text), Some("Alpha"));
        assert_eq!(
            call.option(&["after_commit"]),
            Some(&Value::Expr("notify_later".into()))
        );
    }

    #[test]
    fn test_parse_error_position() {
        let err = DslParser::new().parse_call("state :a,\n  enter: [:x").unwrap_err();
        match err {
            DiagramError::ParseError { line, .. } => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_line_and_column() {
        assert_eq!(line_and_column("abc", 0), (1, 1));
        assert_eq!(line_and_column("abc\ndef", 5), (2, 2));
    }

    #[test]
    fn test_keyword_option_is_never_positional() {
        let err = DslParser::new()
            .parse_call("state :open, initial: true, enter: { notify: true }")
            .unwrap_err();
        assert!(matches!(err, DiagramError::ParseError { line: 1, .. }));

        assert!(DslParser::new().parse_call("state :a, enter: [:x").is_err());
    }

    #[test]
    fn test_escaped_quotes() {
        let call = parse(r#"state :a, display: 'Don\'t', after: "say \"hi\"""#);
        assert_eq!(call.option(&["display"]).and_then(Value::as_text), Some("Don't"));
        assert_eq!(call.option(&["after"]).and_then(Value::as_text), Some("say \"hi\""));
    }

    #[test]
    fn test_literal_names() {
        let call = parse("state :a, 'b', [:c, :d], OTHER");
        let names: Vec<Option<Vec<String>>> = call.args.iter().map(Value::literal_names).collect();
        assert_eq!(names[0], Some(vec!["a".to_string()]));
        assert_eq!(names[1], Some(vec!["b".to_string()]));
        assert_eq!(names[2], Some(vec!["c".to_string(), "d".to_string()]));
        assert_eq!(names[3], None);
    }
}
