//! Display text for guard references
//!
//! Named guards display as their name. Anonymous-function guards display as
//! the function's source text, scraped from the single source line where the
//! function was defined. Only three anonymous-function idioms are recognised
//! and only that one physical line is inspected, so a function whose body
//! continues on later lines yields partial text or none.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{trace, warn};

use crate::core::{DiagramError, GuardRef, Result};

fn brace_lambda() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)lambda ?\{ ?\|.*\|.*\}")
            .expect("guard pattern must compile")
    })
}

fn arrow_lambda() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)-> ?\(?.*\)? ?\{.*\}").expect("guard pattern must compile"))
}

fn do_end_lambda() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)lambda do \|?.*\|?.* end")
            .expect("guard pattern must compile")
    })
}

/// Extracts display text for guard references
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardTextExtractor;

impl GuardTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Display text for one guard
    ///
    /// `Ok(None)` means the source line was read but matched none of the
    /// recognised idioms.
    ///
    /// # Errors
    ///
    /// [`DiagramError::GuardSourceUnreadable`] when the source file cannot be
    /// read or has no such line.
    pub fn text_for(&self, guard: &GuardRef) -> Result<Option<String>> {
        match guard {
            GuardRef::Named(name) => Ok(Some(name.clone())),
            GuardRef::Source { file, line } => {
                let source_line = read_line(file, *line)?;
                Ok(match_anonymous_function(&source_line))
            }
        }
    }

    /// Space-joined text of all guards of a transition
    ///
    /// Guards whose text cannot be extracted are logged and skipped. Returns
    /// `None` when there are no guards or none produced text.
    pub fn conditions_text(&self, guards: &[GuardRef]) -> Option<String> {
        let texts: Vec<String> = guards
            .iter()
            .filter_map(|guard| match self.text_for(guard) {
                Ok(Some(text)) => Some(text),
                Ok(None) => {
                    warn!(guard = %guard, "No recognisable anonymous function on guard source line");
                    None
                }
                Err(e) => {
                    warn!(guard = %guard, error = %e, "Skipping guard text");
                    None
                }
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.join(" "))
        }
    }
}

/// Try the three anonymous-function idioms in order; first match wins
pub fn match_anonymous_function(source_line: &str) -> Option<String> {
    [brace_lambda(), arrow_lambda(), do_end_lambda()]
        .iter()
        .find_map(|pattern| pattern.find(source_line))
        .map(|m| {
            trace!(matched = m.as_str(), "Matched anonymous function");
            m.as_str().to_string()
        })
}

fn read_line(path: &Path, line: usize) -> Result<String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| DiagramError::guard_source_unreadable(path, line, e.to_string()))?;

    line.checked_sub(1)
        .and_then(|index| contents.lines().nth(index))
        .map(str::to_string)
        .ok_or_else(|| {
            DiagramError::guard_source_unreadable(
                path,
                line,
                format!("file has {} lines", contents.lines().count()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_named_guard_is_verbatim() {
        let extractor = GuardTextExtractor::new();
        let text = extractor.text_for(&GuardRef::named("is_ok?")).unwrap();
        assert_eq!(text.as_deref(), Some("is_ok?"));
    }

    #[test]
    fn test_brace_lambda() {
        assert_eq!(
            match_anonymous_function("      transitions from: :a, to: :b, guard: lambda { |c| c.ok? }").as_deref(),
            Some("lambda { |c| c.ok? }")
        );
    }

    #[test]
    fn test_arrow_lambda() {
        assert_eq!(
            match_anonymous_function("transitions from: :a, to: :b, if: ->(c) { c.ok? }").as_deref(),
            Some("->(c) { c.ok? }")
        );
        assert_eq!(
            match_anonymous_function("guard: -> { ready }").as_deref(),
            Some("-> { ready }")
        );
    }

    #[test]
    fn test_do_end_lambda() {
        assert_eq!(
            match_anonymous_function("guard: lambda do |c| c.ok? end").as_deref(),
            Some("lambda do |c| c.ok? end")
        );
    }

    #[test]
    fn test_multi_line_function_under_extracts() {
        // Only the opening line is seen, which has no closing brace
        assert_eq!(match_anonymous_function("guard: lambda { |claim|"), None);
        assert_eq!(match_anonymous_function("guard: :named_guard"), None);
    }

    #[test]
    fn test_reads_recorded_line() {
        let file = source_file(&[
            "class Claim",
            "  transitions from: :a, to: :b, guard: lambda { |c| c.ready? }",
            "end",
        ]);
        let extractor = GuardTextExtractor::new();
        let text = extractor
            .text_for(&GuardRef::source(file.path(), 2))
            .unwrap();
        assert_eq!(text.as_deref(), Some("lambda { |c| c.ready? }"));
    }

    #[test]
    fn test_out_of_range_line_is_an_error() {
        let file = source_file(&["one line"]);
        let extractor = GuardTextExtractor::new();
        for line in [0, 2] {
            let err = extractor
                .text_for(&GuardRef::source(file.path(), line))
                .unwrap_err();
            assert!(matches!(err, DiagramError::GuardSourceUnreadable { .. }));
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = GuardTextExtractor::new()
            .text_for(&GuardRef::source("/no/such/model.rb", 3))
            .unwrap_err();
        assert!(err.to_string().contains("/no/such/model.rb:3"));
    }

    #[test]
    fn test_conditions_text_joins_and_degrades() {
        let file = source_file(&["guard: ->(c) { c.ok? }"]);
        let extractor = GuardTextExtractor::new();
        let guards = vec![
            GuardRef::named("g1"),
            GuardRef::source("/no/such/model.rb", 1),
            GuardRef::source(file.path(), 1),
            GuardRef::named("g2"),
        ];
        assert_eq!(
            extractor.conditions_text(&guards).as_deref(),
            Some("g1 ->(c) { c.ok? } g2")
        );
        assert_eq!(extractor.conditions_text(&[]), None);
        assert_eq!(
            extractor.conditions_text(&[GuardRef::source("/no/such/model.rb", 1)]),
            None
        );
    }
}
