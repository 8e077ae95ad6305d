//! Ordered, nested argument trees carried by a command envelope.
//!
//! Arguments are not a flat map: names may repeat (several `virtual_host`
//! blocks, several `file` entries) and a node may hold attributes, a text
//! value, and child nodes at once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when an argument is added with a blank name or value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// The argument name was empty or whitespace.
    #[error("argument name must not be blank")]
    BlankName,
    /// The argument value was empty or whitespace.
    #[error("argument '{name}' must have a non-blank value")]
    BlankValue {
        /// Name of the rejected argument.
        name: String,
    },
}

/// One named node in an argument tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentNode {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Self>,
}

impl ArgumentNode {
    /// Creates an empty node.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            value: None,
            children: Vec::new(),
        }
    }

    /// Creates a leaf node holding a text value.
    #[must_use]
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name).with_value(value)
    }

    /// Sets the text value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Adds or replaces an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Appends a child node.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends a child node in place.
    pub fn push_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Text value with surrounding whitespace removed; `None` when blank.
    #[must_use]
    pub fn trimmed_value(&self) -> Option<&str> {
        self.value().map(str::trim).filter(|value| !value.is_empty())
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// All attributes, sorted by name.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Child nodes in document order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// `true` when the node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// First child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Trimmed, non-blank value of the first child with the given name.
    #[must_use]
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Self::trimmed_value)
    }
}

/// Top-level argument list of a command envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessorArguments {
    nodes: Vec<ArgumentNode>,
}

impl ProcessorArguments {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a leaf argument.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] when the name or value is blank.
    pub fn add_argument(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ArgumentError> {
        let node = ArgumentNode::leaf(name, value);
        if node.name.trim().is_empty() {
            return Err(ArgumentError::BlankName);
        }
        if node.trimmed_value().is_none() {
            return Err(ArgumentError::BlankValue { name: node.name });
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Appends an arbitrary node, typically a block with children.
    pub fn push(&mut self, node: ArgumentNode) {
        self.nodes.push(node);
    }

    /// First top-level node with the given name.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&ArgumentNode> {
        self.nodes.iter().find(|node| node.name() == name)
    }

    /// Every top-level node with the given name, in order.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ArgumentNode> + 'a {
        self.nodes.iter().filter(move |node| node.name() == name)
    }

    /// Trimmed, non-blank value of the first node with the given name.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(ArgumentNode::trimmed_value)
    }

    /// Iterates over all top-level nodes.
    pub fn iter(&self) -> std::slice::Iter<'_, ArgumentNode> {
        self.nodes.iter()
    }

    /// Number of top-level nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when no arguments are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<ArgumentNode> for ProcessorArguments {
    fn from_iter<I: IntoIterator<Item = ArgumentNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ProcessorArguments {
    type Item = &'a ArgumentNode;
    type IntoIter = std::slice::Iter<'a, ArgumentNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
