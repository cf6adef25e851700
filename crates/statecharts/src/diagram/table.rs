//! Transition table construction and rendering
//!
//! The table lists every transition in event order. Rows are rendered with
//! the columns `event, old state, new state, conditions`, which is not the
//! order the row fields are declared in.

use tracing::debug;

use crate::core::markup::{markup_label, Tag};
use crate::core::{Attributes, EventDescriptor, StyleCategory, StyleConfig};

use super::guard::GuardTextExtractor;

/// Column headers, in presentation order
pub const TABLE_HEADERS: [&str; 4] = [
    "Triggering Event",
    "Old State",
    "New State",
    "Only If All These Are True",
];

/// Title attribute of the rendered table
pub const TABLE_TITLE: &str = "State Transition Table";

/// One transition of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTableRow {
    pub old_state: String,
    pub new_state: String,
    pub triggering_event: String,
    /// `None` when the transition has no guard text at all
    pub conditions: Option<String>,
}

impl TransitionTableRow {
    /// Cell texts in presentation order
    pub fn cells(&self) -> [&str; 4] {
        [
            self.triggering_event.as_str(),
            self.old_state.as_str(),
            self.new_state.as_str(),
            self.conditions.as_deref().unwrap_or(""),
        ]
    }
}

/// Ordered rows of the transition table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitionTable {
    rows: Vec<TransitionTableRow>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, row: TransitionTableRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[TransitionTableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as one markup label; `cell_style` is added to every cell
    pub fn render(&self, cell_style: &Attributes) -> String {
        let cell = |text: &str| Tag::new("td").attrs(cell_style).text(text);

        let header = Tag::new("tr").children(TABLE_HEADERS.iter().map(|h| cell(*h)));
        let body = self
            .rows
            .iter()
            .map(|row| Tag::new("tr").children(row.cells().into_iter().map(cell)));

        let table = Tag::new("table")
            .attr("cellpadding", 2)
            .attr("cellspacing", 0)
            .attr("title", TABLE_TITLE)
            .child(header)
            .children(body);

        markup_label(&table)
    }
}

/// Builds the transition table from the declared events
#[derive(Debug, Clone, Copy)]
pub struct TransitionTableBuilder<'a> {
    style: &'a StyleConfig,
    guards: GuardTextExtractor,
}

impl<'a> TransitionTableBuilder<'a> {
    pub fn new(style: &'a StyleConfig) -> Self {
        Self {
            style,
            guards: GuardTextExtractor::new(),
        }
    }

    /// One row per transition, events and transitions in declaration order
    pub fn build(&self, events: &[EventDescriptor]) -> TransitionTable {
        let mut table = TransitionTable::new();
        for event in events {
            for transition in &event.transitions {
                table.add_row(TransitionTableRow {
                    old_state: transition.from.clone(),
                    new_state: transition.to.clone(),
                    triggering_event: event.name.clone(),
                    conditions: self.guards.conditions_text(&transition.guards),
                });
            }
        }
        debug!(rows = table.len(), "Built transition table");
        table
    }

    /// Render a table with this builder's `table-cell` style
    pub fn render(&self, table: &TransitionTable) -> String {
        table.render(self.style.get(StyleCategory::TableCell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attrs;
    use crate::core::{GuardRef, TransitionDescriptor};

    const HEADER: &str = concat!(
        r#"<<TABLE CELLPADDING="2" CELLSPACING="0" TITLE="State Transition Table">"#,
        "<TR><TD>Triggering Event</TD><TD>Old State</TD><TD>New State</TD>",
        "<TD>Only If All These Are True</TD></TR>"
    );

    #[test]
    fn test_empty_table_template() {
        let table = TransitionTable::new();
        assert_eq!(
            table.render(&Attributes::new()),
            format!("{}</TABLE>>", HEADER)
        );
    }

    #[test]
    fn test_presentation_column_order() {
        let mut table = TransitionTable::new();
        table.add_row(TransitionTableRow {
            old_state: "a".into(),
            new_state: "b".into(),
            triggering_event: "go".into(),
            conditions: Some("g1 g2".into()),
        });
        assert_eq!(
            table.render(&Attributes::new()),
            format!(
                "{}<TR><TD>go</TD><TD>a</TD><TD>b</TD><TD>g1 g2</TD></TR></TABLE>>",
                HEADER
            )
        );
    }

    #[test]
    fn test_absent_conditions_render_empty_cell() {
        let mut table = TransitionTable::new();
        table.add_row(TransitionTableRow {
            old_state: "a".into(),
            new_state: "b".into(),
            triggering_event: "go".into(),
            conditions: None,
        });
        assert!(table
            .render(&Attributes::new())
            .contains("<TR><TD>go</TD><TD>a</TD><TD>b</TD><TD></TD></TR>"));
    }

    #[test]
    fn test_builder_rows() {
        let events = vec![
            EventDescriptor::new("x")
                .with_transition(
                    TransitionDescriptor::new("a", "a").with_guard(GuardRef::named("x_guard")),
                )
                .with_transition(TransitionDescriptor::new("a", "b")),
            EventDescriptor::new("empty"),
            EventDescriptor::new("y").with_transition(
                TransitionDescriptor::new("b", "a")
                    .with_guard(GuardRef::named("g1"))
                    .with_guard(GuardRef::named("g2")),
            ),
        ];
        let style = StyleConfig::defaults();
        let table = TransitionTableBuilder::new(&style).build(&events);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0].conditions.as_deref(), Some("x_guard"));
        assert_eq!(table.rows()[1].conditions, None);
        assert_eq!(table.rows()[2].conditions.as_deref(), Some("g1 g2"));
        assert_eq!(table.rows()[2].triggering_event, "y");
    }

    #[test]
    fn test_cell_style_applies_to_every_cell() {
        let mut table = TransitionTable::new();
        table.add_row(TransitionTableRow {
            old_state: "a".into(),
            new_state: "b".into(),
            triggering_event: "go".into(),
            conditions: None,
        });
        let rendered = table.render(&attrs([("align", "left")]));
        assert_eq!(rendered.matches(r#"<TD ALIGN="left">"#).count(), 8);
    }
}
