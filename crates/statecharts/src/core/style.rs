//! Style categories, attribute values and style resolution
//!
//! Every element of a diagram is decorated from one of a fixed set of style
//! categories. The built-in defaults cover every category; user overrides
//! replace a category's attribute map wholesale.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Style categories known to the diagram core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleCategory {
    Graph,
    Node,
    Edge,
    StartNode,
    EndNode,
    Table,
    Title,
    Footer,
    EnterLabel,
    ExitLabel,
    TableCell,
}

impl StyleCategory {
    /// All categories, in canonical order
    pub const ALL: [StyleCategory; 11] = [
        StyleCategory::Graph,
        StyleCategory::Node,
        StyleCategory::Edge,
        StyleCategory::StartNode,
        StyleCategory::EndNode,
        StyleCategory::Table,
        StyleCategory::Title,
        StyleCategory::Footer,
        StyleCategory::EnterLabel,
        StyleCategory::ExitLabel,
        StyleCategory::TableCell,
    ];

    /// Canonical (kebab-case) category name
    pub fn name(&self) -> &'static str {
        match self {
            StyleCategory::Graph => "graph",
            StyleCategory::Node => "node",
            StyleCategory::Edge => "edge",
            StyleCategory::StartNode => "start-node",
            StyleCategory::EndNode => "end-node",
            StyleCategory::Table => "table",
            StyleCategory::Title => "title",
            StyleCategory::Footer => "footer",
            StyleCategory::EnterLabel => "enter-label",
            StyleCategory::ExitLabel => "exit-label",
            StyleCategory::TableCell => "table-cell",
        }
    }
}

impl fmt::Display for StyleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StyleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        StyleCategory::ALL
            .iter()
            .find(|c| c.name() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown style category: {}", s))
    }
}

/// An attribute value: string, integer, float or boolean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value.into())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Attribute name to value, in insertion order
pub type Attributes = IndexMap<String, AttrValue>;

/// Raw user overrides: category name to attribute map
///
/// Keys are category names as written in the configuration file; unknown
/// names are ignored at resolution time.
pub type StyleOverrides = IndexMap<String, Attributes>;

/// Build an attribute map from `(name, value)` pairs
pub fn attrs<I, K, V>(pairs: I) -> Attributes
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn empty_attributes() -> &'static Attributes {
    static EMPTY: OnceLock<Attributes> = OnceLock::new();
    EMPTY.get_or_init(Attributes::new)
}

/// Effective style: one attribute map per category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StyleConfig {
    categories: IndexMap<StyleCategory, Attributes>,
}

impl StyleConfig {
    /// The built-in defaults, as a fresh copy
    pub fn defaults() -> Self {
        let mut categories = IndexMap::new();
        categories.insert(StyleCategory::Graph, attrs([("rankdir", "TB")]));
        categories.insert(
            StyleCategory::Node,
            attrs::<_, _, AttrValue>([
                ("shape", "Mrecord".into()),
                ("fontname", "Arial".into()),
                ("fontsize", AttrValue::Int(10)),
                ("penwidth", AttrValue::Float(0.7)),
            ]),
        );
        categories.insert(
            StyleCategory::Edge,
            attrs::<_, _, AttrValue>([
                ("dir", "forward".into()),
                ("fontname", "Arial".into()),
                ("fontsize", AttrValue::Int(9)),
                ("penwidth", AttrValue::Float(0.7)),
            ]),
        );
        categories.insert(
            StyleCategory::StartNode,
            attrs::<_, _, AttrValue>([
                ("shape", "doublecircle".into()),
                ("label", "start".into()),
                ("color", "black".into()),
                ("fontsize", AttrValue::Int(8)),
                ("fixedsize", AttrValue::Bool(true)),
                ("width", AttrValue::Float(0.3)),
                ("height", AttrValue::Float(0.3)),
            ]),
        );
        categories.insert(
            StyleCategory::EndNode,
            attrs::<_, _, AttrValue>([
                ("shape", "doublecircle".into()),
                ("label", "".into()),
                ("style", "filled".into()),
                ("color", "black".into()),
                ("fillcolor", "black".into()),
                ("fixedsize", AttrValue::Bool(true)),
                ("width", AttrValue::Float(0.2)),
                ("height", AttrValue::Float(0.2)),
            ]),
        );
        categories.insert(StyleCategory::Table, attrs([("shape", "plaintext")]));
        categories.insert(
            StyleCategory::Title,
            attrs::<_, _, AttrValue>([
                ("shape", "plaintext".into()),
                ("fontname", "Arial".into()),
                ("fontsize", AttrValue::Int(14)),
            ]),
        );
        categories.insert(
            StyleCategory::Footer,
            attrs::<_, _, AttrValue>([
                ("shape", "plaintext".into()),
                ("fontname", "Arial".into()),
                ("fontsize", AttrValue::Int(7)),
                ("fontcolor", "gray40".into()),
            ]),
        );
        categories.insert(
            StyleCategory::EnterLabel,
            attrs::<_, _, AttrValue>([
                ("align", "left".into()),
                ("valign", "bottom".into()),
                ("sides", "B".into()),
                ("border", AttrValue::Int(1)),
            ]),
        );
        categories.insert(
            StyleCategory::ExitLabel,
            attrs::<_, _, AttrValue>([
                ("align", "left".into()),
                ("valign", "top".into()),
                ("sides", "T".into()),
                ("border", AttrValue::Int(1)),
            ]),
        );
        categories.insert(StyleCategory::TableCell, Attributes::new());
        Self { categories }
    }

    /// Attribute map for a category
    pub fn get(&self, category: StyleCategory) -> &Attributes {
        self.categories
            .get(&category)
            .unwrap_or(empty_attributes())
    }

    /// Iterate categories with their attribute maps, in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (StyleCategory, &Attributes)> {
        self.categories.iter().map(|(c, a)| (*c, a))
    }

    fn replace(&mut self, category: StyleCategory, attributes: Attributes) {
        self.categories.insert(category, attributes);
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Merges user overrides into the built-in defaults
///
/// The merge is one level deep: an override for a category replaces that
/// category's entire attribute map. Overriding only `fontsize` for `node`
/// therefore drops the default node `shape`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleResolver;

impl StyleResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the effective style for one invocation
    pub fn resolve(&self, overrides: &StyleOverrides) -> StyleConfig {
        let mut config = StyleConfig::defaults();

        for (name, attributes) in overrides {
            match StyleCategory::from_str(name) {
                Ok(category) => {
                    debug!(
                        category = %category,
                        attribute_count = attributes.len(),
                        "Replacing style category"
                    );
                    config.replace(category, attributes.clone());
                }
                Err(_) => warn!(category = %name, "Ignoring unknown style category"),
            }
        }

        config
    }
}

/// Label text settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Separator between callback names in labels
    pub callback_separator: String,
    /// Prefix of the enter-callbacks row of a state label
    pub enter_prefix: String,
    /// Prefix of the exit-callbacks row of a state label
    pub exit_prefix: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            callback_separator: " ".to_string(),
            enter_prefix: "entry: ".to_string(),
            exit_prefix: "exit: ".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_category() {
        let config = StyleConfig::defaults();
        for category in StyleCategory::ALL {
            assert!(config.categories.contains_key(&category), "{}", category);
        }
        assert!(config.get(StyleCategory::TableCell).is_empty());
        assert_eq!(
            config.get(StyleCategory::Node).get("shape"),
            Some(&AttrValue::from("Mrecord"))
        );
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in StyleCategory::ALL {
            assert_eq!(category.name().parse::<StyleCategory>().unwrap(), category);
        }
        assert_eq!(
            "start_node".parse::<StyleCategory>().unwrap(),
            StyleCategory::StartNode
        );
        assert!("sidebar".parse::<StyleCategory>().is_err());
    }

    #[test]
    fn test_attr_value_display() {
        assert_eq!(AttrValue::from(0.7).to_string(), "0.7");
        assert_eq!(AttrValue::from(10).to_string(), "10");
        assert_eq!(AttrValue::from(true).to_string(), "true");
        assert_eq!(AttrValue::from("Arial").to_string(), "Arial");
    }

    #[test]
    fn test_resolve_without_overrides_is_defaults() {
        let resolved = StyleResolver::new().resolve(&StyleOverrides::new());
        assert_eq!(resolved, StyleConfig::defaults());
    }

    #[test]
    fn test_override_replaces_whole_category() {
        let mut overrides = StyleOverrides::new();
        overrides.insert("node".to_string(), attrs([("fontsize", AttrValue::Int(12))]));

        let resolved = StyleResolver::new().resolve(&overrides);
        let node = resolved.get(StyleCategory::Node);
        assert_eq!(node.len(), 1);
        assert_eq!(node.get("fontsize"), Some(&AttrValue::Int(12)));
        assert!(node.get("shape").is_none());
        assert_eq!(
            resolved.get(StyleCategory::Edge),
            StyleConfig::defaults().get(StyleCategory::Edge)
        );
    }

    #[test]
    fn test_unknown_category_is_ignored() {
        let mut overrides = StyleOverrides::new();
        overrides.insert("sidebar".to_string(), attrs([("color", "red")]));
        let resolved = StyleResolver::new().resolve(&overrides);
        assert_eq!(resolved, StyleConfig::defaults());
    }

    #[test]
    fn test_attr_values_deserialize_by_shape() {
        let parsed: Attributes =
            serde_yaml::from_str("fontsize: 12\npenwidth: 0.5\nfixedsize: true\nshape: box\n")
                .unwrap();
        assert_eq!(parsed["fontsize"], AttrValue::Int(12));
        assert_eq!(parsed["penwidth"], AttrValue::Float(0.5));
        assert_eq!(parsed["fixedsize"], AttrValue::Bool(true));
        assert_eq!(parsed["shape"], AttrValue::from("box"));
    }

    #[test]
    fn test_label_config_defaults() {
        let labels = LabelConfig::default();
        assert_eq!(labels.callback_separator, " ");
        assert_eq!(labels.enter_prefix, "entry: ");
        assert_eq!(labels.exit_prefix, "exit: ");
    }
}
