//! Plan tree nodes
//!
//! A [`Node`] is either a text leaf or an element carrying a type name,
//! props and ordered children. The wire shape is the JSON object used by
//! planners, the apply engine, validators and the code generator:
//!
//! ```text
//! { "id": "text-3", "type": "text", "text": "Hello" }
//! { "id": "node-2", "type": "Card", "props": { "title": "Hi" }, "children": [ ... ] }
//! ```
//!
//! Decoding is lenient in the same places the plan validator is: a bare
//! string becomes a text leaf, `null` children are dropped, and a missing
//! `id` decodes as empty so the id allocator can fill it in.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Element props: a JSON object keyed by prop name, insertion ordered
pub type Props = serde_json::Map<String, Value>;

/// Type name carried by text nodes on the wire
pub const TEXT_TYPE: &str = "text";

/// A node of a plan tree
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum Node {
    /// Text leaf
    Text(TextNode),
    /// Element with a component kind or structural tag
    Element(ElementNode),
}

/// Text leaf node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    /// Node id (unique within a tree)
    pub id: String,
    /// Rendered text
    pub text: String,
}

/// Element node
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    /// Node id (unique within a tree)
    pub id: String,
    /// Component kind or structural tag
    pub node_type: String,
    /// Props rendered as attributes
    pub props: Props,
    /// Ordered children (document order)
    pub children: Vec<Node>,
    /// Text set by an update operation; kept for round-tripping, never rendered
    pub text: Option<String>,
}

impl Node {
    /// Create text node
    #[inline]
    #[must_use]
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text(TextNode {
            id: id.into(),
            text: text.into(),
        })
    }

    /// Create element node with no props or children
    #[inline]
    #[must_use]
    pub fn element(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::Element(ElementNode {
            id: id.into(),
            node_type: node_type.into(),
            props: Props::new(),
            children: Vec::new(),
            text: None,
        })
    }

    /// Add a prop (no-op on text nodes)
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Self::Element(element) = &mut self {
            element.props.insert(key.into(), value.into());
        }
        self
    }

    /// Append a child (no-op on text nodes)
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        if let Self::Element(element) = &mut self {
            element.children.push(child);
        }
        self
    }

    /// Append children (no-op on text nodes)
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        if let Self::Element(element) = &mut self {
            element.children.extend(children);
        }
        self
    }

    /// Node id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Text(t) => &t.id,
            Self::Element(e) => &e.id,
        }
    }

    /// Replace node id
    #[inline]
    pub fn set_id(&mut self, id: impl Into<String>) {
        match self {
            Self::Text(t) => t.id = id.into(),
            Self::Element(e) => e.id = id.into(),
        }
    }

    /// Type name as it appears on the wire (`"text"` for text leaves)
    #[inline]
    #[must_use]
    pub fn node_type(&self) -> &str {
        match self {
            Self::Text(_) => TEXT_TYPE,
            Self::Element(e) => &e.node_type,
        }
    }

    /// Check if this is a text leaf
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Element props, if an element
    #[inline]
    #[must_use]
    pub fn props(&self) -> Option<&Props> {
        match self {
            Self::Text(_) => None,
            Self::Element(e) => Some(&e.props),
        }
    }

    /// Children (empty for text leaves)
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Text(_) => &[],
            Self::Element(e) => &e.children,
        }
    }

    /// Mutable children, `None` for text leaves
    #[inline]
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Text(_) => None,
            Self::Element(e) => Some(&mut e.children),
        }
    }

    /// Pre-order iterator over this node and its descendants
    #[inline]
    #[must_use]
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Child-index path to the first node (pre-order) with `id`
    ///
    /// The empty path addresses `self`.
    #[must_use]
    pub fn path_to(&self, id: &str) -> Option<Vec<usize>> {
        if self.id() == id {
            return Some(Vec::new());
        }
        for (index, child) in self.children().iter().enumerate() {
            if let Some(mut path) = child.path_to(id) {
                path.insert(0, index);
                return Some(path);
            }
        }
        None
    }

    /// Node at a child-index path
    #[must_use]
    pub fn at_path(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children().get(index))
    }

    /// Mutable node at a child-index path
    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = self;
        for &index in path {
            node = node.children_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// First node (pre-order) with `id`
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Node> {
        self.iter().find(|node| node.id() == id)
    }

    /// First node (pre-order) with `id`, mutably
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        let path = self.path_to(id)?;
        self.at_path_mut(&path)
    }

    /// First node (pre-order) of the given type
    #[must_use]
    pub fn find_first_of_type(&self, node_type: &str) -> Option<&Node> {
        self.iter().find(|node| node.node_type() == node_type)
    }

    /// Total number of nodes in this subtree
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }
}

/// Pre-order traversal (parent before children, children in order)
#[derive(Debug, Clone)]
pub struct PreOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(t) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("id", &t.id)?;
                map.serialize_entry("type", TEXT_TYPE)?;
                map.serialize_entry("text", &t.text)?;
                map.end()
            }
            Self::Element(e) => {
                let len = if e.text.is_some() { 5 } else { 4 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("id", &e.id)?;
                map.serialize_entry("type", &e.node_type)?;
                map.serialize_entry("props", &e.props)?;
                map.serialize_entry("children", &e.children)?;
                if let Some(text) = &e.text {
                    map.serialize_entry("text", text)?;
                }
                map.end()
            }
        }
    }
}

/// Errors decoding a node from JSON
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeShapeError {
    /// Value is neither an object nor a string
    #[error("node must be an object or a string, got {0}")]
    NotAnObject(String),

    /// Node id is present but not a string
    #[error("node id must be a string")]
    InvalidId,

    /// Text node without a string `text`
    #[error("text node {id:?} is missing text")]
    MissingText { id: String },

    /// Element without a string `type`
    #[error("node {id:?} has no string type")]
    MissingType { id: String },

    /// Props present but not an object
    #[error("node {id:?} has props that are not an object")]
    InvalidProps { id: String },
}

impl TryFrom<Value> for Node {
    type Error = NodeShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut object = match value {
            Value::String(text) => return Ok(Self::text(String::new(), text)),
            Value::Object(object) => object,
            other => return Err(NodeShapeError::NotAnObject(kind_name(&other).to_string())),
        };

        let id = match object.remove("id") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(id)) => id,
            Some(_) => return Err(NodeShapeError::InvalidId),
        };

        let is_text = [object.get("type"), object.get("kind")]
            .into_iter()
            .flatten()
            .any(|v| v.as_str() == Some(TEXT_TYPE));

        if is_text {
            return match object.remove("text") {
                Some(Value::String(text)) => Ok(Self::text(id, text)),
                _ => Err(NodeShapeError::MissingText { id }),
            };
        }

        let node_type = match object.remove("type") {
            Some(Value::String(t)) => t,
            _ => return Err(NodeShapeError::MissingType { id }),
        };

        let props = match object.remove("props") {
            None | Some(Value::Null) => Props::new(),
            Some(Value::Object(props)) => props,
            Some(_) => return Err(NodeShapeError::InvalidProps { id }),
        };

        let children = match object.remove("children") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(Node::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        let text = match object.remove("text") {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };

        Ok(Self::Element(ElementNode {
            id,
            node_type,
            props,
            children,
            text,
        }))
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
