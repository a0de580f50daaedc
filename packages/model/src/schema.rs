//! # Schema
//!
//! Defines which node types a document may contain and which single child
//! type each element accepts. The schema validates itself on construction and
//! then acts as the only way to build typed nodes from plain data: JSON values
//! or XML text (tokenized by `quick-xml`).
//!
//! Content models are deliberately minimal: one child type with an optional
//! `*` or `+` quantifier. Sequences and alternation are not supported.

use crate::error::{ModelResult, SchemaError};
use crate::node::{Attrs, Element, Node, TEXT_TYPE};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mapping from type name to its spec
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSpec(pub BTreeMap<String, NodeSpec>);

/// Spec of a single node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Element { children: ContentModel },
    Text(TextSpec),
}

/// Text nodes take no options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextSpec {}

/// How many children of `child` type an element accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantifier {
    One,
    ZeroOrMore,
    OneOrMore,
}

/// Single-type content model, written `p`, `p*` or `p+`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentModel {
    pub child: String,
    pub quantifier: Quantifier,
}

impl ContentModel {
    pub fn parse(children: &str) -> Result<Self, SchemaError> {
        let (child, quantifier) = if let Some(child) = children.strip_suffix('*') {
            (child, Quantifier::ZeroOrMore)
        } else if let Some(child) = children.strip_suffix('+') {
            (child, Quantifier::OneOrMore)
        } else {
            (children, Quantifier::One)
        };

        let child = child.trim();
        if child.is_empty() || child.contains(['*', '+']) {
            return Err(SchemaError::Malformed(format!(
                "unsupported content model: {children}"
            )));
        }

        Ok(Self {
            child: child.to_string(),
            quantifier,
        })
    }
}

impl fmt::Display for ContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.quantifier {
            Quantifier::One => "",
            Quantifier::ZeroOrMore => "*",
            Quantifier::OneOrMore => "+",
        };
        write!(f, "{}{}", self.child, suffix)
    }
}

impl TryFrom<String> for ContentModel {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentModel> for String {
    fn from(model: ContentModel) -> Self {
        model.to_string()
    }
}

impl SchemaSpec {
    /// Paragraph document: `root: p+`, `p: text*`
    pub fn basic() -> Self {
        Self::paragraphs(Quantifier::OneOrMore)
    }

    /// Like [`SchemaSpec::basic`] but the root may be empty
    pub fn plain_text() -> Self {
        Self::paragraphs(Quantifier::ZeroOrMore)
    }

    fn paragraphs(root: Quantifier) -> Self {
        Self::default()
            .element("root", ContentModel { child: "p".to_string(), quantifier: root })
            .element(
                "p",
                ContentModel {
                    child: TEXT_TYPE.to_string(),
                    quantifier: Quantifier::ZeroOrMore,
                },
            )
            .text()
    }

    /// Builder: declare an element type
    pub fn element(mut self, name: impl Into<String>, children: ContentModel) -> Self {
        self.0.insert(name.into(), NodeSpec::Element { children });
        self
    }

    /// Builder: declare the text type
    pub fn text(mut self) -> Self {
        self.0.insert(TEXT_TYPE.to_string(), NodeSpec::Text(TextSpec {}));
        self
    }

    pub fn get(&self, name: &str) -> Option<&NodeSpec> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

/// Returns the single child type a content model string names
pub fn parse_children(children: &str) -> Result<String, SchemaError> {
    ContentModel::parse(children).map(|model| model.child)
}

/// Validated schema
#[derive(Debug, Clone)]
pub struct Schema {
    spec: SchemaSpec,
}

impl Schema {
    pub fn new(spec: SchemaSpec) -> Result<Self, SchemaError> {
        Self::validate(&spec)?;
        Ok(Self { spec })
    }

    /// Checks that `root` exists and every referenced child type is defined
    pub fn validate(spec: &SchemaSpec) -> Result<(), SchemaError> {
        if !spec.contains("root") {
            return Err(SchemaError::MissingRoot);
        }

        for node_spec in spec.0.values() {
            if let NodeSpec::Element { children } = node_spec {
                if !spec.contains(&children.child) {
                    return Err(SchemaError::InvalidNodeType(children.child.clone()));
                }
            }
        }

        Ok(())
    }

    pub fn spec(&self) -> &SchemaSpec {
        &self.spec
    }

    /// Content model of an element type
    pub fn content_model(&self, kind: &str) -> Option<&ContentModel> {
        match self.spec.get(kind) {
            Some(NodeSpec::Element { children }) => Some(children),
            _ => None,
        }
    }

    /// Builds a node from a bare value. Only text can be built this way.
    pub fn create(&self, kind: &str, value: &str) -> Result<Node, SchemaError> {
        self.check_type(kind)?;

        if kind == TEXT_TYPE {
            return Ok(Node::text(value));
        }

        Err(SchemaError::NotImplemented(kind.to_string()))
    }

    /// Builds a node tree from plain JSON data
    pub fn from_json(&self, json: &serde_json::Value) -> ModelResult<Node> {
        let node: Node = serde_json::from_value(json.clone())
            .map_err(|e| SchemaError::Malformed(e.to_string()))?;
        self.check(&node)?;
        Ok(node)
    }

    /// Builds a node tree from XML text
    pub fn from_xml(&self, xml: &str) -> ModelResult<Node> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Node> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| SchemaError::Malformed(e.to_string()))?;

            match event {
                Event::Start(start) => {
                    if root.is_some() {
                        return Err(malformed("content after the root element").into());
                    }
                    stack.push(self.element_from_tag(&start)?);
                }
                Event::Empty(start) => {
                    if root.is_some() {
                        return Err(malformed("content after the root element").into());
                    }
                    let elem = self.element_from_tag(&start)?;
                    close_element(elem, &mut stack, &mut root);
                }
                Event::End(_) => {
                    let elem = stack
                        .pop()
                        .ok_or_else(|| malformed("unexpected closing tag"))?;
                    close_element(elem, &mut stack, &mut root);
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|e| SchemaError::Malformed(e.to_string()))?;
                    self.push_text(&value, &mut stack)?;
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    let value = std::str::from_utf8(&bytes)
                        .map_err(|e| SchemaError::Malformed(e.to_string()))?;
                    self.push_text(value, &mut stack)?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(malformed("unclosed element").into());
        }

        root.ok_or_else(|| malformed("no root element").into())
    }

    /// Recursively checks every node type against the spec
    pub fn check(&self, node: &Node) -> Result<(), SchemaError> {
        self.check_type(node.kind())?;

        if let Node::Element(elem) = node {
            for child in &elem.children {
                self.check(child)?;
            }
        }

        Ok(())
    }

    fn check_type(&self, kind: &str) -> Result<(), SchemaError> {
        if !self.spec.contains(kind) {
            return Err(SchemaError::InvalidNodeType(kind.to_string()));
        }
        Ok(())
    }

    fn element_from_tag(&self, start: &BytesStart<'_>) -> Result<Element, SchemaError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| SchemaError::Malformed(e.to_string()))?
            .to_ascii_lowercase();

        if name == TEXT_TYPE {
            return Err(SchemaError::InvalidNodeType(name));
        }
        self.check_type(&name)?;

        let mut attrs = Attrs::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| SchemaError::Malformed(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| SchemaError::Malformed(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| SchemaError::Malformed(e.to_string()))?;
            attrs.insert(key, value.into_owned());
        }

        Ok(Element {
            kind: name,
            attrs: (!attrs.is_empty()).then_some(attrs),
            children: Vec::new(),
        })
    }

    fn push_text(&self, value: &str, stack: &mut [Element]) -> Result<(), SchemaError> {
        let Some(parent) = stack.last_mut() else {
            // Only whitespace may surround the root element
            if value.trim().is_empty() {
                return Ok(());
            }
            return Err(malformed("text outside the root element"));
        };

        if value.is_empty() {
            return Ok(());
        }
        self.check_type(TEXT_TYPE)?;

        match parent.children.last_mut() {
            Some(Node::Text(text)) => text.text.push_str(value),
            _ => parent.children.push(Node::text(value)),
        }

        Ok(())
    }
}

fn malformed(message: &str) -> SchemaError {
    SchemaError::Malformed(message.to_string())
}

fn close_element(elem: Element, stack: &mut [Element], root: &mut Option<Node>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(elem)),
        None => *root = Some(Node::Element(elem)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use serde_json::json;

    fn para_spec() -> SchemaSpec {
        serde_json::from_value(json!({
            "root": {"children": "para*"},
            "para": {"children": "text*"},
            "text": {}
        }))
        .unwrap()
    }

    #[test]
    fn test_schema_created_with_valid_spec() {
        assert!(Schema::new(para_spec()).is_ok());
        assert!(Schema::new(SchemaSpec::basic()).is_ok());
        assert!(Schema::new(SchemaSpec::plain_text()).is_ok());
    }

    #[test]
    fn test_missing_root_rejected() {
        let spec: SchemaSpec = serde_json::from_value(json!({
            "para": {"children": "text*"},
            "text": {}
        }))
        .unwrap();

        let err = Schema::new(spec).unwrap_err();
        assert_eq!(err, SchemaError::MissingRoot);
        assert_eq!(err.to_string(), "root node not defined");
    }

    #[test]
    fn test_undefined_child_type_rejected() {
        let spec: SchemaSpec = serde_json::from_value(json!({
            "root": {"children": "paragraph*"},
            "para": {"children": "text*"},
            "text": {}
        }))
        .unwrap();

        let err = Schema::new(spec).unwrap_err();
        assert_eq!(err.to_string(), "invalid node type: paragraph");
    }

    #[test]
    fn test_parse_children_strips_quantifier() {
        assert_eq!(parse_children("p+").unwrap(), "p");
        assert_eq!(parse_children("text*").unwrap(), "text");
        assert_eq!(parse_children("p").unwrap(), "p");
        assert!(parse_children("*").is_err());
    }

    #[test]
    fn test_content_model_round_trips_through_json() {
        let spec = SchemaSpec::basic();
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value,
            json!({
                "root": {"children": "p+"},
                "p": {"children": "text*"},
                "text": {}
            })
        );

        let schema = Schema::new(spec).unwrap();
        let model = schema.content_model("root").unwrap();
        assert_eq!(model.quantifier, Quantifier::OneOrMore);
        assert!(schema.content_model("text").is_none());
    }

    #[test]
    fn test_create_text_only() {
        let schema = Schema::new(para_spec()).unwrap();
        assert_eq!(schema.create("text", "hi").unwrap(), Node::text("hi"));
        assert_eq!(
            schema.create("para", "hi"),
            Err(SchemaError::NotImplemented("para".to_string()))
        );
        assert_eq!(
            schema.create("quote", "hi"),
            Err(SchemaError::InvalidNodeType("quote".to_string()))
        );
    }

    #[test]
    fn test_from_json() {
        let schema = Schema::new(para_spec()).unwrap();

        let node = schema
            .from_json(&json!({
                "type": "para",
                "children": [{"type": "text", "text": "Hello, world!"}]
            }))
            .unwrap();
        assert_eq!(
            node,
            Node::element("para", vec![Node::text("Hello, world!")])
        );

        let err = schema
            .from_json(&json!({
                "type": "paragraph",
                "children": [{"type": "invalid", "text": "Hello, world!"}]
            }))
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::Schema(SchemaError::InvalidNodeType("paragraph".to_string()))
        );
    }

    #[test]
    fn test_from_json_rejects_nested_unknown_type() {
        let schema = Schema::new(para_spec()).unwrap();
        let err = schema
            .from_json(&json!({
                "type": "root",
                "children": [{"type": "para", "children": [{"type": "em", "children": []}]}]
            }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Schema error: invalid node type: em");
    }

    #[test]
    fn test_from_xml() {
        let schema = Schema::new(SchemaSpec::plain_text()).unwrap();
        let node = schema
            .from_xml("<root><p>Hello</p><p>World!</p></root>")
            .unwrap();

        assert_eq!(
            node,
            Node::element(
                "root",
                vec![
                    Node::element("p", vec![Node::text("Hello")]),
                    Node::element("p", vec![Node::text("World!")]),
                ]
            )
        );
    }

    #[test]
    fn test_from_xml_keeps_attributes_only_when_present() {
        let schema = Schema::new(SchemaSpec::plain_text()).unwrap();
        let node = schema
            .from_xml(r#"<root><p align="left">a</p><p/></root>"#)
            .unwrap();

        let Node::Element(root) = node else {
            panic!("Expected element");
        };
        let Node::Element(first) = &root.children[0] else {
            panic!("Expected element");
        };
        let Node::Element(second) = &root.children[1] else {
            panic!("Expected element");
        };

        assert_eq!(
            first.attrs.as_ref().and_then(|a| a.get("align")).map(String::as_str),
            Some("left")
        );
        assert!(second.attrs.is_none());
        assert!(second.children.is_empty());
    }

    #[test]
    fn test_from_xml_rejects_unknown_tag() {
        let schema = Schema::new(SchemaSpec::plain_text()).unwrap();
        let err = schema.from_xml("<root><h1>Title</h1></root>").unwrap_err();
        assert_eq!(
            err,
            ModelError::Schema(SchemaError::InvalidNodeType("h1".to_string()))
        );
    }

    #[test]
    fn test_from_xml_rejects_malformed_input() {
        let schema = Schema::new(SchemaSpec::plain_text()).unwrap();

        for xml in ["<root><p>open</root>", "<root>", "", "<root/><root/>", "x<root/>"] {
            let err = schema.from_xml(xml).unwrap_err();
            assert!(
                matches!(err, ModelError::Schema(SchemaError::Malformed(_))),
                "{xml:?} should be malformed, got {err:?}"
            );
        }
    }
}
