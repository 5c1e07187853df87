//! The compiled resolution program.
//!
//! A [`Program`] is an arena of [`Node`]s. Each node describes how to turn a
//! value written with one schema into a value of another: read it as is,
//! widen it, remap enum ordinals, pick a union branch, or walk a record's
//! fields in writer order while skipping what the reader dropped and
//! supplying defaults for what the writer never had. Recursive records are
//! back-edges in the arena, so compilation terminates and programs stay
//! finite.

use std::sync::Arc;

use recast_common::{define_id, Arena};
use recast_schema::{Primitive, Schema};

define_id!(
    /// Identifies a node within a [`Program`].
    NodeId
);

/// A shared, immutable resolution program.
///
/// Handles are what the cache hands out; cloning one is an `Arc` increment.
pub type ProgramHandle = Arc<Program>;

/// A compiled writer-to-reader resolution.
#[derive(Debug)]
pub struct Program {
    nodes: Arena<NodeId, Node>,
    root: NodeId,
    writer: Schema,
    reader: Schema,
}

impl Program {
    pub(crate) fn new(
        nodes: Arena<NodeId, Node>,
        root: NodeId,
        writer: Schema,
        reader: Schema,
    ) -> Self {
        Self {
            nodes,
            root,
            writer,
            reader,
        }
    }

    /// Returns the entry node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this program.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Returns the number of nodes in the program.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the schema the data was written with.
    pub fn writer(&self) -> &Schema {
        &self.writer
    }

    /// Returns the schema the data is read as.
    pub fn reader(&self) -> &Schema {
        &self.reader
    }

    /// Looks up how writer enum ordinal `ordinal` maps into the reader enum
    /// at node `id`. Returns `None` if the ordinal is out of range or `id` is
    /// not an enum node.
    pub fn enum_mapping(&self, id: NodeId, ordinal: i64) -> Option<&EnumMapping> {
        match self.node(id) {
            Node::Enum { mapping } => usize::try_from(ordinal)
                .ok()
                .and_then(|index| mapping.get(index)),
            _ => None,
        }
    }
}

/// One instruction of a resolution program.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// The writer and reader agree on this primitive.
    Read(Primitive),
    /// The writer's primitive is widened to the reader's.
    Promote {
        /// What is on the wire.
        writer: Primitive,
        /// What the caller reads.
        reader: Primitive,
    },
    /// A fixed-size byte array of `size` bytes.
    Fixed {
        /// Size in bytes.
        size: usize,
    },
    /// An enum whose writer ordinals are translated to reader ordinals.
    Enum {
        /// Indexed by writer ordinal.
        mapping: Vec<EnumMapping>,
    },
    /// An array whose elements resolve through `items`.
    Array {
        /// Element program.
        items: NodeId,
    },
    /// A map whose values resolve through `values`.
    Map {
        /// Value program.
        values: NodeId,
    },
    /// A record.
    Record(RecordPlan),
    /// The writer wrote a union: the branch is chosen by the tag in the data.
    WriterUnion {
        /// Indexed by writer branch tag.
        branches: Vec<Branch>,
    },
    /// The writer wrote a plain value that the reader sees as one branch of
    /// its union.
    ReaderUnion {
        /// The reader branch the value lands in.
        index: u32,
        /// Program for the value itself.
        node: NodeId,
    },
}

/// Where a writer enum symbol lands in the reader enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumMapping {
    /// The reader ordinal.
    Symbol(u32),
    /// The reader has no such symbol and no default symbol. Reading this
    /// ordinal fails.
    Unknown(String),
}

/// How one writer union branch resolves.
#[derive(Debug, Clone, PartialEq)]
pub enum Branch {
    /// The branch resolves through this node.
    Node(NodeId),
    /// The branch cannot be read as the reader type. The message is reported
    /// if the data actually selects this branch.
    Unresolved(String),
}

/// The resolved shape of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPlan {
    /// Full name of the reader record.
    pub name: String,
    /// Steps in execution order: writer fields first, in writer order, then
    /// defaults for reader fields the writer lacks.
    pub steps: Vec<FieldStep>,
    /// Reader fields in the order their values are produced.
    pub order: Arc<[ReaderField]>,
}

impl RecordPlan {
    pub(crate) fn placeholder(name: String) -> Self {
        Self {
            name,
            steps: Vec::new(),
            order: Arc::from(Vec::new()),
        }
    }
}

/// One step of a record plan.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldStep {
    /// A writer field the reader keeps; the caller reads it.
    Read {
        /// Program for the field value.
        node: NodeId,
    },
    /// A writer field the reader dropped; its bytes are skipped.
    Skip {
        /// Program describing the writer's field type.
        node: NodeId,
    },
    /// A reader field the writer lacks; the caller reads its default.
    Default {
        /// Program for reading `value`.
        node: NodeId,
        /// The default, pre-encoded in the binary format.
        value: Arc<[u8]>,
    },
}

/// A reader field as reported by field-order queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderField {
    /// The field name in the reader schema.
    pub name: String,
    /// Zero-based declaration position in the reader record.
    pub position: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enum_program() -> Program {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::Enum {
            mapping: vec![
                EnumMapping::Symbol(1),
                EnumMapping::Unknown("PURPLE".to_string()),
            ],
        });
        let schema = Schema::primitive(Primitive::Null);
        Program::new(nodes, root, schema.clone(), schema)
    }

    #[test]
    fn enum_mapping_lookup() {
        let program = enum_program();
        let root = program.root();
        assert_eq!(
            program.enum_mapping(root, 0),
            Some(&EnumMapping::Symbol(1))
        );
        assert!(matches!(
            program.enum_mapping(root, 1),
            Some(EnumMapping::Unknown(s)) if s == "PURPLE"
        ));
        assert_eq!(program.enum_mapping(root, 2), None);
        assert_eq!(program.enum_mapping(root, -1), None);
    }

    #[test]
    fn placeholder_is_empty() {
        let plan = RecordPlan::placeholder("User".to_string());
        assert!(plan.steps.is_empty());
        assert!(plan.order.is_empty());
        assert_eq!(plan.name, "User");
    }

    #[test]
    fn accessors() {
        let program = enum_program();
        assert_eq!(program.node_count(), 1);
        assert_eq!(program.writer(), program.reader());
    }
}
