//! Writer for the tag/row/cell label mini-markup
//!
//! Labels are built as `<NAME ATTR="value">children</NAME>` trees. A label
//! that is markup is wrapped in one outer `<` `>` pair, which is how the
//! rendering engine tells markup labels apart from plain ones.

use super::style::Attributes;

/// One markup element
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq)]
enum Content {
    Text(String),
    Tag(Tag),
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_uppercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add one attribute; names are upper-cased
    pub fn attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attributes
            .push((name.to_uppercase(), value.to_string()));
        self
    }

    /// Add every attribute of a style map, in map order
    pub fn attrs(mut self, attributes: &Attributes) -> Self {
        for (name, value) in attributes {
            self = self.attr(name, value);
        }
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Content::Text(text.into()));
        self
    }

    pub fn child(mut self, tag: Tag) -> Self {
        self.children.push(Content::Tag(tag));
        self
    }

    pub fn children<I: IntoIterator<Item = Tag>>(mut self, tags: I) -> Self {
        self.children.extend(tags.into_iter().map(Content::Tag));
        self
    }

    /// Serialize this element
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push('"');
        }
        out.push('>');
        for child in &self.children {
            match child {
                Content::Text(text) => out.push_str(&escape(text)),
                Content::Tag(tag) => tag.write_to(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// Wrap rendered markup as a markup label
pub fn markup_label(tag: &Tag) -> String {
    format!("<{}>", tag.render())
}

/// True if a label is markup rather than plain text
pub fn is_markup_label(label: &str) -> bool {
    label.starts_with("<<") && label.ends_with(">>")
}

/// Escape text for use inside markup
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::style::{attrs, AttrValue};

    #[test]
    fn test_nested_tags() {
        let table = Tag::new("table")
            .attr("border", 0)
            .child(Tag::new("tr").child(Tag::new("td").text("Single")));
        assert_eq!(
            table.render(),
            r#"<TABLE BORDER="0"><TR><TD>Single</TD></TR></TABLE>"#
        );
    }

    #[test]
    fn test_style_attributes_keep_map_order() {
        let style = attrs::<_, _, AttrValue>([
            ("align", "left".into()),
            ("sides", "B".into()),
            ("border", AttrValue::Int(1)),
        ]);
        let td = Tag::new("td").attrs(&style).text("entry: foo");
        assert_eq!(
            td.render(),
            r#"<TD ALIGN="left" SIDES="B" BORDER="1">entry: foo</TD>"#
        );
    }

    #[test]
    fn test_escaping() {
        let td = Tag::new("td").attr("title", "a\"b").text("x < y && z");
        assert_eq!(
            td.render(),
            r#"<TD TITLE="a&quot;b">x &lt; y &amp;&amp; z</TD>"#
        );
    }

    #[test]
    fn test_markup_label() {
        let label = markup_label(&Tag::new("table"));
        assert_eq!(label, "<<TABLE></TABLE>>");
        assert!(is_markup_label(&label));
        assert!(!is_markup_label(" go "));
    }
}
