//! Renderable element tree.
//!
//! Renderers produce a single [`Element`] per call. The tree is plain data:
//! the hosting render loop owns mounting, diffing and painting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag used for text nodes.
pub const TEXT_TAG: &str = "#text";

/// A node in a rendered UI tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Element {
    /// Element kind (e.g. `"input"`, `"select"`)
    pub tag: String,
    /// Attributes in key order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Text content for text nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    /// Create an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Create a text node.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            tag: TEXT_TAG.to_string(),
            text: Some(content.into()),
            ..Self::default()
        }
    }

    /// Create an element that renders nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if this element renders nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tag.is_empty() && self.children.is_empty()
    }

    /// Set an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.insert(key.into(), value.to_string());
        self
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Get an attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Depth-first search for the first element with `tag`, including self.
    #[must_use]
    pub fn find_by_tag(&self, tag: &str) -> Option<&Self> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by_tag(tag))
    }

    /// Concatenated text of all text nodes in document order.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}
