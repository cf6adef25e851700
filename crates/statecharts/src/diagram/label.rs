//! State and transition label synthesis

use crate::core::markup::{markup_label, Tag};
use crate::core::{
    EventDescriptor, LabelConfig, StateDescriptor, StyleCategory, StyleConfig,
    TransitionDescriptor,
};

use super::guard::GuardTextExtractor;

/// Builds node and edge labels from descriptors and the effective style
#[derive(Debug, Clone, Copy)]
pub struct LabelSynthesizer<'a> {
    style: &'a StyleConfig,
    labels: &'a LabelConfig,
    guards: GuardTextExtractor,
}

impl<'a> LabelSynthesizer<'a> {
    pub fn new(style: &'a StyleConfig, labels: &'a LabelConfig) -> Self {
        Self {
            style,
            labels,
            guards: GuardTextExtractor::new(),
        }
    }

    /// Markup label of a state node
    ///
    /// An enter row (if any enter callbacks), the display name, then an exit
    /// row (if any exit callbacks).
    pub fn state_label(&self, state: &StateDescriptor) -> String {
        let mut table = Tag::new("table")
            .attr("border", 0)
            .attr("cellborder", 0)
            .attr("cellspacing", 0);

        if !state.enter_callbacks.is_empty() {
            table = table.child(self.callback_row(
                StyleCategory::EnterLabel,
                &self.labels.enter_prefix,
                &state.enter_callbacks,
            ));
        }

        table = table.child(Tag::new("tr").child(Tag::new("td").text(&state.display_name)));

        if !state.exit_callbacks.is_empty() {
            table = table.child(self.callback_row(
                StyleCategory::ExitLabel,
                &self.labels.exit_prefix,
                &state.exit_callbacks,
            ));
        }

        markup_label(&table)
    }

    /// Plain-text label of a transition edge: `" event [guards] / callbacks "`
    ///
    /// The guard and callback segments are left out when empty.
    pub fn edge_label(&self, event: &EventDescriptor, transition: &TransitionDescriptor) -> String {
        let mut chunks = vec![event.name.clone()];

        if let Some(conditions) = self.guards.conditions_text(&transition.guards) {
            chunks.push(format!("[{}]", conditions));
        }

        let callbacks: Vec<&str> = transition.callbacks().collect();
        if !callbacks.is_empty() {
            chunks.push(format!("/ {}", callbacks.join(&self.labels.callback_separator)));
        }

        format!(" {} ", chunks.join(" "))
    }

    fn callback_row(&self, category: StyleCategory, prefix: &str, callbacks: &[String]) -> Tag {
        let text = format!("{}{}", prefix, callbacks.join(&self.labels.callback_separator));
        Tag::new("tr").child(Tag::new("td").attrs(self.style.get(category)).text(text))
    }
}
