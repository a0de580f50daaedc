//! # Owned Nodes
//!
//! Tree-independent node values. These travel inside operations (the nodes an
//! edit inserts, the nodes its inverse puts back) and are what the schema
//! builds from JSON or XML before the document tree takes ownership of them.
//!
//! JSON shape:
//!
//! ```text
//! {"type": "text", "text": "Hello"}
//! {"type": "p", "attrs": {"id": "a"}, "children": [...]}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type name reserved for text nodes
pub const TEXT_TYPE: &str = "text";

pub type Attrs = BTreeMap<String, String>;

/// A node detached from any tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum Node {
    Element(Element),
    Text(Text),
}

/// Typed node with ordered children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub kind: String,
    pub attrs: Option<Attrs>,
    pub children: Vec<Node>,
}

/// Leaf node holding a string
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text {
    pub text: String,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text { text: text.into() })
    }

    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(Element {
            kind: kind.into(),
            attrs: None,
            children,
        })
    }

    /// Type name (`"text"` for text nodes)
    pub fn kind(&self) -> &str {
        match self {
            Node::Element(elem) => &elem.kind,
            Node::Text(_) => TEXT_TYPE,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }
}

/// Wire form shared by both variants
#[derive(Serialize, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    #[serde(default, alias = "attributes", skip_serializing_if = "Option::is_none")]
    attrs: Option<Attrs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Node>>,
}

impl TryFrom<RawNode> for Node {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        if raw.kind == TEXT_TYPE {
            if raw.children.is_some() {
                return Err("text node cannot have children".to_string());
            }
            return Ok(Node::text(raw.text.unwrap_or_default()));
        }

        Ok(Node::Element(Element {
            kind: raw.kind,
            attrs: raw.attrs,
            children: raw.children.unwrap_or_default(),
        }))
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        match node {
            Node::Text(text) => RawNode {
                kind: TEXT_TYPE.to_string(),
                text: Some(text.text),
                attrs: None,
                children: None,
            },
            Node::Element(elem) => RawNode {
                kind: elem.kind,
                text: None,
                attrs: elem.attrs,
                children: Some(elem.children),
            },
        }
    }
}
