use serde::{Deserialize, Serialize};

/// Hierarchical name/value configuration tree attached to a node.
///
/// The serialized graph document (typically XML, parsed upstream of this
/// crate) carries one such element per node; all leaf values are strings.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct ConfigElement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ConfigElement>,
}

impl ConfigElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_child(mut self, child: ConfigElement) -> Self {
        self.children.push(child);
        self
    }

    /// Shorthand for appending a leaf child `name = value`.
    pub fn with_leaf(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_child(ConfigElement::new(name).with_value(value))
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&ConfigElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// String value of the named child, if present.
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.value.as_deref())
    }

    /// Boolean value of the named child, or `default` when the child is
    /// absent or does not parse.
    pub fn bool_child(&self, name: &str, default: bool) -> bool {
        self.child_value(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn i64_child(&self, name: &str, default: i64) -> i64 {
        self.child_value(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn f64_child(&self, name: &str, default: f64) -> f64 {
        self.child_value(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
