//! Compilation of writer/reader schema pairs into resolution programs.
//!
//! The compiler walks the writer and reader graphs in lockstep. Record pairs
//! are memoized by their node IDs before their fields are visited, so a
//! self-referential record compiles to a program with a back-edge instead of
//! recursing forever.
//!
//! Writer fields the reader dropped, and reader fields filled from defaults,
//! are compiled by resolving a schema against itself. Every node is
//! addressed as a [`View`] (which graph, which node) so the same walk serves
//! all three cases.

use std::collections::HashMap;
use std::sync::Arc;

use recast_common::Arena;
use recast_schema::{Field, RecordSchema, Schema, SchemaId, SchemaKind, SchemaNode};

use crate::defaults::encode_default;
use crate::error::ResolveError;
use crate::program::{
    Branch, EnumMapping, FieldStep, Node, NodeId, Program, ReaderField, RecordPlan,
};

/// Turns a writer/reader schema pair into a [`Program`].
///
/// The cache is generic over this trait so tests can observe or replace
/// compilation. Implementations must be pure: compiling the same pair twice
/// must yield equivalent programs.
pub trait ProgramCompiler: Send + Sync {
    /// Compiles the resolution of data written with `writer` into `reader`.
    fn compile(&self, writer: &Schema, reader: &Schema) -> Result<Program, ResolveError>;
}

impl<F> ProgramCompiler for F
where
    F: Fn(&Schema, &Schema) -> Result<Program, ResolveError> + Send + Sync,
{
    fn compile(&self, writer: &Schema, reader: &Schema) -> Result<Program, ResolveError> {
        self(writer, reader)
    }
}

/// The standard schema resolution rules.
///
/// - identical primitives read as is; `int` widens to `long`, `float` and
///   `double`, `long` to `float` and `double`, `float` to `double`, and
///   `string` and `bytes` convert into each other
/// - named types match by simple name or by a reader alias
/// - record fields match by name or reader field alias; dropped writer fields
///   are skipped and missing reader fields need a default
/// - a writer enum symbol unknown to the reader maps to the reader's default
///   symbol, or fails when read if there is none
/// - a writer union resolves branch by branch; branches that cannot be read
///   fail only if the data selects them
/// - a plain writer value read as a reader union lands in the first branch of
///   the same type, else the first branch it promotes to
#[derive(Debug, Default, Clone, Copy)]
pub struct ResolvingCompiler;

impl ProgramCompiler for ResolvingCompiler {
    fn compile(&self, writer: &Schema, reader: &Schema) -> Result<Program, ResolveError> {
        let mut compilation = Compilation::new(writer, reader);
        let path = reader.root_node().label();
        let root = compilation.resolve(
            View::new(Side::Writer, writer.root()),
            View::new(Side::Reader, reader.root()),
            &path,
        )?;
        Ok(Program::new(
            compilation.nodes,
            root,
            writer.clone(),
            reader.clone(),
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Side {
    Writer,
    Reader,
}

/// A node of one of the two graphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct View {
    side: Side,
    id: SchemaId,
}

impl View {
    fn new(side: Side, id: SchemaId) -> Self {
        Self { side, id }
    }

    fn with(self, id: SchemaId) -> Self {
        Self { side: self.side, id }
    }
}

struct Compilation<'s> {
    writer: &'s Schema,
    reader: &'s Schema,
    nodes: Arena<NodeId, Node>,
    records: HashMap<(View, View), NodeId>,
    /// Memo keys in insertion order, so a failed record can drop every
    /// record compiled beneath it.
    memoized: Vec<(View, View)>,
}

impl<'s> Compilation<'s> {
    fn new(writer: &'s Schema, reader: &'s Schema) -> Self {
        Self {
            writer,
            reader,
            nodes: Arena::new(),
            records: HashMap::new(),
            memoized: Vec::new(),
        }
    }

    fn graph(&self, side: Side) -> &'s Schema {
        match side {
            Side::Writer => self.writer,
            Side::Reader => self.reader,
        }
    }

    fn schema(&self, view: View) -> &'s SchemaNode {
        self.graph(view.side).node(view.id)
    }

    fn resolve(&mut self, w: View, r: View, path: &str) -> Result<NodeId, ResolveError> {
        let (wn, rn) = (self.schema(w), self.schema(r));
        match (wn, rn) {
            (SchemaNode::Union { branches }, _) => self.resolve_writer_union(w, r, branches, path),
            (_, SchemaNode::Union { branches }) => self.resolve_reader_union(w, r, branches, path),
            (SchemaNode::Primitive(wp), SchemaNode::Primitive(rp)) => {
                let node = if wp == rp {
                    Node::Read(*wp)
                } else if wp.promotes_to(*rp) {
                    Node::Promote {
                        writer: *wp,
                        reader: *rp,
                    }
                } else {
                    return Err(incompatible(path, wn, rn));
                };
                Ok(self.nodes.alloc(node))
            }
            (SchemaNode::Record(wr), SchemaNode::Record(rr)) => {
                check_names(path, wn, rn)?;
                self.resolve_record(w, r, wr, rr, path)
            }
            (SchemaNode::Enum(we), SchemaNode::Enum(re)) => {
                check_names(path, wn, rn)?;
                let fallback = re.default.as_deref().and_then(|d| re.symbol_index(d));
                let mapping = we
                    .symbols
                    .iter()
                    .map(|symbol| match re.symbol_index(symbol).or(fallback) {
                        Some(index) => EnumMapping::Symbol(index as u32),
                        None => EnumMapping::Unknown(symbol.clone()),
                    })
                    .collect();
                Ok(self.nodes.alloc(Node::Enum { mapping }))
            }
            (SchemaNode::Fixed(wf), SchemaNode::Fixed(rf)) => {
                check_names(path, wn, rn)?;
                if wf.size != rf.size {
                    return Err(ResolveError::FixedSizeMismatch {
                        path: path.to_string(),
                        writer: wf.size,
                        reader: rf.size,
                    });
                }
                Ok(self.nodes.alloc(Node::Fixed { size: rf.size }))
            }
            (SchemaNode::Array { items: wi }, SchemaNode::Array { items: ri }) => {
                let items = self.resolve(w.with(*wi), r.with(*ri), &format!("{path}[]"))?;
                Ok(self.nodes.alloc(Node::Array { items }))
            }
            (SchemaNode::Map { values: wv }, SchemaNode::Map { values: rv }) => {
                let values = self.resolve(w.with(*wv), r.with(*rv), &format!("{path}{{}}"))?;
                Ok(self.nodes.alloc(Node::Map { values }))
            }
            _ => Err(incompatible(path, wn, rn)),
        }
    }

    fn resolve_writer_union(
        &mut self,
        w: View,
        r: View,
        writer_branches: &[SchemaId],
        path: &str,
    ) -> Result<NodeId, ResolveError> {
        let mut branches = Vec::with_capacity(writer_branches.len());
        let mut resolved = 0usize;
        for branch in writer_branches {
            match self.resolve(w.with(*branch), r, path) {
                Ok(node) => {
                    resolved += 1;
                    branches.push(Branch::Node(node));
                }
                Err(e) => branches.push(Branch::Unresolved(e.to_string())),
            }
        }
        if resolved == 0 {
            return Err(incompatible(path, self.schema(w), self.schema(r)));
        }
        Ok(self.nodes.alloc(Node::WriterUnion { branches }))
    }

    fn resolve_reader_union(
        &mut self,
        w: View,
        r: View,
        reader_branches: &[SchemaId],
        path: &str,
    ) -> Result<NodeId, ResolveError> {
        let wn = self.schema(w);
        let index = self
            .select_branch(wn, r.side, reader_branches)
            .ok_or_else(|| ResolveError::NoMatchingBranch {
                path: path.to_string(),
                writer: wn.label(),
            })?;
        let node = self.resolve(w, r.with(reader_branches[index]), path)?;
        Ok(self.nodes.alloc(Node::ReaderUnion {
            index: index as u32,
            node,
        }))
    }

    /// Picks the reader branch for a non-union writer type: the first branch
    /// of the same kind (and matching name, for named types), else the first
    /// primitive the writer promotes to.
    fn select_branch(&self, wn: &SchemaNode, side: Side, branches: &[SchemaId]) -> Option<usize> {
        let graph = self.graph(side);
        let exact = branches.iter().position(|b| {
            let bn = graph.node(*b);
            bn.kind() == wn.kind() && (wn.name().is_none() || names_match(wn, bn))
        });
        exact.or_else(|| {
            let SchemaKind::Primitive(wp) = wn.kind() else {
                return None;
            };
            branches.iter().position(|b| {
                matches!(graph.node(*b).kind(), SchemaKind::Primitive(bp) if wp.promotes_to(bp))
            })
        })
    }

    fn resolve_record(
        &mut self,
        w: View,
        r: View,
        wr: &'s RecordSchema,
        rr: &'s RecordSchema,
        path: &str,
    ) -> Result<NodeId, ResolveError> {
        let key = (w, r);
        if let Some(id) = self.records.get(&key) {
            return Ok(*id);
        }
        let id = self
            .nodes
            .alloc(Node::Record(RecordPlan::placeholder(rr.name.fullname())));
        let mark = self.memoized.len();
        self.records.insert(key, id);
        self.memoized.push(key);
        match self.build_record(w, r, wr, rr, path) {
            Ok(plan) => {
                *self.nodes.get_mut(id) = Node::Record(plan);
                Ok(id)
            }
            Err(e) => {
                // Records compiled beneath this one may hold back-edges to
                // its placeholder, which is never filled in.
                for stale in self.memoized.drain(mark..) {
                    self.records.remove(&stale);
                }
                Err(e)
            }
        }
    }

    fn build_record(
        &mut self,
        w: View,
        r: View,
        wr: &'s RecordSchema,
        rr: &'s RecordSchema,
        path: &str,
    ) -> Result<RecordPlan, ResolveError> {
        let mut steps = Vec::with_capacity(wr.fields.len().max(rr.fields.len()));
        let mut order = Vec::with_capacity(rr.fields.len());
        let mut supplied = vec![false; rr.fields.len()];

        for wf in &wr.fields {
            let field_path = format!("{path}.{}", wf.name);
            let wv = w.with(wf.schema);
            match reader_field(rr, wf) {
                Some(rf) => {
                    supplied[rf.position] = true;
                    let node = self.resolve(wv, r.with(rf.schema), &field_path)?;
                    steps.push(FieldStep::Read { node });
                    order.push(ReaderField {
                        name: rf.name.clone(),
                        position: rf.position,
                    });
                }
                None => {
                    let node = self.resolve(wv, wv, &field_path)?;
                    steps.push(FieldStep::Skip { node });
                }
            }
        }

        for rf in rr.fields.iter().filter(|rf| !supplied[rf.position]) {
            let default = rf
                .default
                .as_ref()
                .ok_or_else(|| ResolveError::MissingDefault {
                    path: path.to_string(),
                    field: rf.name.clone(),
                })?;
            let value = encode_default(self.graph(r.side), rf.schema, default).map_err(|reason| {
                ResolveError::InvalidDefault {
                    path: path.to_string(),
                    field: rf.name.clone(),
                    reason,
                }
            })?;
            let rv = r.with(rf.schema);
            let node = self.resolve(rv, rv, &format!("{path}.{}", rf.name))?;
            steps.push(FieldStep::Default {
                node,
                value: Arc::from(value),
            });
            order.push(ReaderField {
                name: rf.name.clone(),
                position: rf.position,
            });
        }

        Ok(RecordPlan {
            name: rr.name.fullname(),
            steps,
            order: Arc::from(order),
        })
    }
}

/// Finds the reader field a writer field lands in: same name, or a reader
/// field listing the writer's name as an alias.
fn reader_field<'a>(reader: &'a RecordSchema, wf: &Field) -> Option<&'a Field> {
    reader
        .field(&wf.name)
        .or_else(|| reader.fields.iter().find(|rf| rf.aliases.contains(&wf.name)))
}

fn names_match(wn: &SchemaNode, rn: &SchemaNode) -> bool {
    match (wn.name(), rn.name()) {
        (Some(wname), Some(rname)) => {
            wname.matches(rname) || rn.aliases().iter().any(|a| *a == wname.fullname())
        }
        _ => false,
    }
}

fn check_names(path: &str, wn: &SchemaNode, rn: &SchemaNode) -> Result<(), ResolveError> {
    if names_match(wn, rn) {
        Ok(())
    } else {
        Err(ResolveError::NameMismatch {
            path: path.to_string(),
            writer: wn.label(),
            reader: rn.label(),
        })
    }
}

fn incompatible(path: &str, wn: &SchemaNode, rn: &SchemaNode) -> ResolveError {
    ResolveError::Incompatible {
        path: path.to_string(),
        writer: wn.label(),
        reader: rn.label(),
    }
}
