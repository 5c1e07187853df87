//! The shared, immutable [`Schema`] handle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use recast_common::{Arena, Fingerprint};
use serde_json::Value;

use crate::error::SchemaError;
use crate::node::{Primitive, SchemaId, SchemaNode};
use crate::normal_form;
use crate::parser::Parser;

/// An immutable, validated schema graph.
///
/// Cloning is an `Arc` increment. Equality is structural: two schemas are
/// equal when their normal forms are equal, regardless of how they were
/// written or whether they share storage. `Hash` is derived from the
/// fingerprint of the normal form, so equal schemas always hash equally.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaGraph>,
}

struct SchemaGraph {
    nodes: Arena<SchemaId, SchemaNode>,
    root: SchemaId,
    normal_form: String,
    fingerprint: Fingerprint,
}

impl Schema {
    /// Parses a schema from its JSON notation.
    pub fn parse_str(json: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(json)?;
        Self::parse_value(&value)
    }

    /// Parses a schema from an already-decoded JSON value.
    pub fn parse_value(json: &Value) -> Result<Self, SchemaError> {
        let mut parser = Parser::new();
        let root = parser.parse(json, None)?;
        Ok(Self::from_graph(parser.into_nodes(), root))
    }

    /// Returns the schema consisting of a single primitive type.
    pub fn primitive(primitive: Primitive) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(SchemaNode::Primitive(primitive));
        Self::from_graph(nodes, root)
    }

    fn from_graph(nodes: Arena<SchemaId, SchemaNode>, root: SchemaId) -> Self {
        let normal_form = normal_form::render(&nodes, root);
        let fingerprint = Fingerprint::from_bytes(normal_form.as_bytes());
        Self {
            inner: Arc::new(SchemaGraph {
                nodes,
                root,
                normal_form,
                fingerprint,
            }),
        }
    }

    /// Returns the ID of the top-level node.
    pub fn root(&self) -> SchemaId {
        self.inner.root
    }

    /// Returns the top-level node.
    pub fn root_node(&self) -> &SchemaNode {
        self.node(self.inner.root)
    }

    /// Returns the node with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this schema.
    pub fn node(&self, id: SchemaId) -> &SchemaNode {
        &self.inner.nodes[id]
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.inner.nodes.len()
    }

    /// Returns the normal form, a deterministic JSON rendering of the schema.
    pub fn normal_form(&self) -> &str {
        &self.inner.normal_form
    }

    /// Returns the 128-bit fingerprint of the normal form.
    pub fn fingerprint(&self) -> Fingerprint {
        self.inner.fingerprint
    }

    /// Returns `true` if both handles share the same storage.
    pub fn ptr_eq(a: &Schema, b: &Schema) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Schema::ptr_eq(self, other)
            || (self.inner.fingerprint == other.inner.fingerprint
                && self.inner.normal_form == other.inner.normal_form)
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.fingerprint.hash(state);
    }
}

impl FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Schema::parse_str(s)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.normal_form)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema({})", self.inner.normal_form)
    }
}
