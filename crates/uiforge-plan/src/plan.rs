//! Plans and change plans
//!
//! A [`Plan`] is a complete snapshot of an accepted UI: a layout
//! description, the component kinds in use and the root [`Node`]. A
//! [`ChangePlan`] is an ordered list of [`Operation`]s interpreted against
//! exactly one base plan.

use crate::node::{Node, Props};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Document marker for plans (`"kind": "plan"`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    /// Full plan
    #[default]
    Plan,
}

/// Document marker for change plans (`"kind": "change_plan"`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangePlanKind {
    /// Change plan
    #[default]
    ChangePlan,
}

/// Full plan snapshot
///
/// Plans are never edited in place once produced; the apply engine works on
/// a clone and returns a new plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Document marker
    #[serde(default)]
    pub kind: PlanKind,
    /// Human-readable layout description
    #[serde(default)]
    pub layout: String,
    /// Component kinds used by the tree
    #[serde(default)]
    pub components: Vec<String>,
    /// Root node; `None` only for malformed input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<Node>,
}

impl Plan {
    /// Create plan around a root node
    #[inline]
    #[must_use]
    pub fn new(layout: impl Into<String>, components: Vec<String>, tree: Node) -> Self {
        Self {
            kind: PlanKind::Plan,
            layout: layout.into(),
            components,
            tree: Some(tree),
        }
    }

    /// Root node id, if a tree exists
    #[inline]
    #[must_use]
    pub fn root_id(&self) -> Option<&str> {
        self.tree.as_ref().map(Node::id)
    }

    /// Find node by id
    #[inline]
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Node> {
        self.tree.as_ref().and_then(|tree| tree.find(id))
    }
}

/// Ordered list of tree mutations against one base plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangePlan {
    /// Document marker
    #[serde(default)]
    pub kind: ChangePlanKind,
    /// Human-readable summary
    #[serde(default)]
    pub summary: String,
    /// Operations, applied strictly in order
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl ChangePlan {
    /// Create change plan
    #[inline]
    #[must_use]
    pub fn new(summary: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            kind: ChangePlanKind::ChangePlan,
            summary: summary.into(),
            operations,
        }
    }

    /// Check if the change plan carries no operations
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// A single tree mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    /// Insert a subtree under `parent_id`
    Add {
        /// Parent node id
        #[serde(rename = "parentId")]
        parent_id: String,
        /// Insertion point
        #[serde(default)]
        position: Position,
        /// Subtree; colliding ids are rewritten on insertion
        node: Node,
    },

    /// Remove a node and its subtree
    Remove {
        /// Node to remove
        #[serde(rename = "targetId")]
        target_id: String,
    },

    /// Merge props, replace text and/or replace children
    Update {
        /// Node to update
        #[serde(rename = "targetId")]
        target_id: String,
        /// Shallow-merged into existing props
        #[serde(default, skip_serializing_if = "Option::is_none")]
        props: Option<Props>,
        /// Replacement text
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        /// Full replacement of the child sequence
        #[serde(default, skip_serializing_if = "Option::is_none")]
        children: Option<Vec<Node>>,
    },
}

impl Operation {
    /// Add operation
    #[inline]
    #[must_use]
    pub fn add(parent_id: impl Into<String>, position: Position, node: Node) -> Self {
        Self::Add {
            parent_id: parent_id.into(),
            position,
            node,
        }
    }

    /// Remove operation
    #[inline]
    #[must_use]
    pub fn remove(target_id: impl Into<String>) -> Self {
        Self::Remove {
            target_id: target_id.into(),
        }
    }

    /// Update operation that merges props
    #[inline]
    #[must_use]
    pub fn update_props(target_id: impl Into<String>, props: Props) -> Self {
        Self::Update {
            target_id: target_id.into(),
            props: Some(props),
            text: None,
            children: None,
        }
    }

    /// Update operation that replaces children
    #[inline]
    #[must_use]
    pub fn update_children(target_id: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Update {
            target_id: target_id.into(),
            props: None,
            text: None,
            children: Some(children),
        }
    }

    /// Operation name as it appears on the wire
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Update { .. } => "update",
        }
    }
}

/// Insertion point for [`Operation::Add`]
///
/// Wire form is `"start"`, `"end"` or an integer index. A whole float reads
/// as an index; `null` and fractional numbers append.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Position {
    /// Front of the child list
    Start,
    /// Back of the child list
    #[default]
    End,
    /// Splice index; out-of-range values clamp rather than fail
    Index(i64),
}

impl Position {
    /// Resolve to a concrete insertion index for a list of `len` children
    ///
    /// Negative indices count from the end, as with an array splice.
    #[must_use]
    pub fn resolve(self, len: usize) -> usize {
        match self {
            Self::Start => 0,
            Self::End => len,
            Self::Index(index) if index < 0 => {
                let back = usize::try_from(index.unsigned_abs()).unwrap_or(usize::MAX);
                len.saturating_sub(back)
            }
            Self::Index(index) => usize::try_from(index).map_or(len, |i| i.min(len)),
        }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Start => serializer.serialize_str("start"),
            Self::End => serializer.serialize_str("end"),
            Self::Index(index) => serializer.serialize_i64(*index),
        }
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Index(i64),
            Number(f64),
            Keyword(String),
            Null,
        }

        match Raw::deserialize(deserializer)? {
            Raw::Index(index) => Ok(Self::Index(index)),
            #[allow(clippy::cast_possible_truncation)]
            Raw::Number(number) if number.is_finite() && number.fract() == 0.0 => {
                Ok(Self::Index(number as i64))
            }
            Raw::Number(_) | Raw::Null => Ok(Self::End),
            Raw::Keyword(word) => match word.as_str() {
                "start" => Ok(Self::Start),
                "end" => Ok(Self::End),
                other => Err(serde::de::Error::custom(format!(
                    "unknown position {other:?}, expected \"start\", \"end\" or an index"
                ))),
            },
        }
    }
}
