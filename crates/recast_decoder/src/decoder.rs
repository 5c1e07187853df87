//! The resolving decoder.
//!
//! The decoder keeps a stack of [`Frame`]s over the program's arena. Each
//! caller request first checks, without touching the input, whether the
//! program structure allows it; then the stack is driven forward through
//! the structural instructions (entering records, skipping dropped writer
//! fields, switching to default input, following writer union tags) until
//! the requested value is on top.

use std::sync::Arc;

use recast_codec::{BufferSource, PrimitiveSource, SourceKind};
use recast_config::DecoderLimits;
use recast_resolve::{
    Branch, EnumMapping, FieldStep, Node, NodeId, Program, ProgramHandle, ReaderField, RecordPlan,
};
use recast_schema::Primitive;
use tracing::debug;

use crate::error::{DecodeError, Violation};
use crate::expect::Expect;

type DefaultInput = BufferSource<Arc<[u8]>>;

#[derive(Clone, Copy, Debug)]
enum Frame {
    /// A value not yet started.
    Node(NodeId),
    /// A record whose steps before `next` are done.
    Record { node: NodeId, next: usize },
    /// An array block with `remaining` items not yet started.
    Array { items: NodeId, remaining: u64 },
    /// A map block with `remaining` entries not yet finished.
    Map {
        values: NodeId,
        remaining: u64,
        key_read: bool,
    },
    /// Switches input back from a default value to the source.
    DefaultEnd,
}

/// A node the caller consumes with a single call.
#[derive(Clone, Copy, Debug)]
enum Leaf {
    Read(Primitive),
    Promote { writer: Primitive, reader: Primitive },
    Fixed(usize),
    Enum(NodeId),
    Array(NodeId),
    Map(NodeId),
    ReaderUnion { index: u32, node: NodeId },
}

impl Leaf {
    fn as_expect(self) -> Expect {
        match self {
            Leaf::Read(p) | Leaf::Promote { reader: p, .. } => Expect::from(p),
            Leaf::Fixed(_) => Expect::Fixed,
            Leaf::Enum(_) => Expect::Enum,
            Leaf::Array(_) => Expect::ArrayStart,
            Leaf::Map(_) => Expect::MapStart,
            Leaf::ReaderUnion { .. } => Expect::UnionIndex,
        }
    }
}

enum Shape<'p> {
    Leaf(Leaf),
    Record(&'p RecordPlan),
    WriterUnion(&'p [Branch]),
}

fn shape(id: NodeId, node: &Node) -> Shape<'_> {
    match node {
        Node::Read(p) => Shape::Leaf(Leaf::Read(*p)),
        Node::Promote { writer, reader } => Shape::Leaf(Leaf::Promote {
            writer: *writer,
            reader: *reader,
        }),
        Node::Fixed { size } => Shape::Leaf(Leaf::Fixed(*size)),
        Node::Enum { .. } => Shape::Leaf(Leaf::Enum(id)),
        Node::Array { items } => Shape::Leaf(Leaf::Array(*items)),
        Node::Map { values } => Shape::Leaf(Leaf::Map(*values)),
        Node::ReaderUnion { index, node } => Shape::Leaf(Leaf::ReaderUnion {
            index: *index,
            node: *node,
        }),
        Node::Record(plan) => Shape::Record(plan),
        Node::WriterUnion { branches } => Shape::WriterUnion(branches),
    }
}

/// Where `advance` stopped.
enum Step {
    Leaf(Leaf),
    RecordStart(Arc<[ReaderField]>),
    ArrayNext,
    MapNext,
    MapKey,
    End,
}

impl Step {
    fn as_expect(&self) -> Expect {
        match self {
            Step::Leaf(leaf) => leaf.as_expect(),
            Step::RecordStart(_) => Expect::RecordStart,
            Step::ArrayNext => Expect::ArrayNext,
            Step::MapNext => Expect::MapNext,
            Step::MapKey => Expect::String,
            Step::End => Expect::End,
        }
    }
}

/// Result of looking ahead without reading input.
enum Peek {
    Next(Expect),
    /// Depends on a union tag not yet read.
    Unknown,
    /// Nothing left for the caller before the end of the datum.
    Empty,
}

#[derive(Clone, Copy, Debug)]
struct PendingRaw {
    kind: Expect,
    len: usize,
}

/// Decodes one stream of values through a resolution program.
///
/// The caller issues reads in the reader schema's terms. A record has no call
/// of its own unless the caller wants its field order; its fields are read
/// in the order [`read_field_order`](Self::read_field_order) reports. Once a
/// datum is complete, [`finish`](Self::finish) consumes any trailing fields
/// the reader dropped, and the decoder is ready for the next datum of the
/// same program.
///
/// A call that does not match what the reader schema has next is a contract
/// violation. It poisons the decoder: every later call fails with the same
/// violation.
pub struct Decoder<S> {
    program: ProgramHandle,
    source: S,
    default_input: Option<DefaultInput>,
    stack: Vec<Frame>,
    pending_raw: Option<PendingRaw>,
    poisoned: Option<Violation>,
    limits: DecoderLimits,
}

impl<S: PrimitiveSource> Decoder<S> {
    /// Creates a decoder with default limits.
    pub fn new(program: ProgramHandle, source: S) -> Self {
        Self::with_limits(program, source, DecoderLimits::default())
    }

    /// Creates a decoder with explicit input limits.
    pub fn with_limits(program: ProgramHandle, source: S, limits: DecoderLimits) -> Self {
        Self {
            program,
            source,
            default_input: None,
            stack: Vec::new(),
            pending_raw: None,
            poisoned: None,
            limits,
        }
    }

    /// Returns the program being executed.
    pub fn program(&self) -> &ProgramHandle {
        &self.program
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Consumes the decoder, returning the source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Returns the limits in force.
    pub fn limits(&self) -> DecoderLimits {
        self.limits
    }

    /// Returns `true` after a contract violation.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Reports what kind of storage backs the source.
    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Returns `true` when the size-then-data reads copy straight from memory.
    pub fn is_bulk_source(&self) -> bool {
        self.source.kind().is_bulk()
    }

    /// Reads a null.
    pub fn read_null(&mut self) -> Result<(), DecodeError> {
        self.leaf(Expect::Null)?;
        Ok(())
    }

    /// Reads a boolean.
    pub fn read_boolean(&mut self) -> Result<bool, DecodeError> {
        self.leaf(Expect::Boolean)?;
        Ok(self.input().read_boolean()?)
    }

    /// Reads an int.
    pub fn read_int(&mut self) -> Result<i32, DecodeError> {
        self.leaf(Expect::Int)?;
        Ok(self.input().read_int()?)
    }

    /// Reads a long, widening a written int.
    pub fn read_long(&mut self) -> Result<i64, DecodeError> {
        let leaf = self.leaf(Expect::Long)?;
        let input = self.input();
        Ok(match leaf {
            Leaf::Promote {
                writer: Primitive::Int,
                ..
            } => i64::from(input.read_int()?),
            _ => input.read_long()?,
        })
    }

    /// Reads a float, widening a written int or long.
    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        let leaf = self.leaf(Expect::Float)?;
        let input = self.input();
        Ok(match leaf {
            Leaf::Promote {
                writer: Primitive::Int,
                ..
            } => input.read_int()? as f32,
            Leaf::Promote {
                writer: Primitive::Long,
                ..
            } => input.read_long()? as f32,
            _ => input.read_float()?,
        })
    }

    /// Reads a double, widening a written int, long, or float.
    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        let leaf = self.leaf(Expect::Double)?;
        let input = self.input();
        Ok(match leaf {
            Leaf::Promote {
                writer: Primitive::Int,
                ..
            } => f64::from(input.read_int()?),
            Leaf::Promote {
                writer: Primitive::Long,
                ..
            } => input.read_long()? as f64,
            Leaf::Promote {
                writer: Primitive::Float,
                ..
            } => f64::from(input.read_float()?),
            _ => input.read_double()?,
        })
    }

    /// Reads a string, or a map key.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let bytes = self.read_len_prefixed(Expect::String)?;
        String::from_utf8(bytes).map_err(|e| DecodeError::InvalidUtf8(e.utf8_error()))
    }

    /// Reads a bytes value.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        self.read_len_prefixed(Expect::Bytes)
    }

    /// Skips a string or map key.
    pub fn skip_string(&mut self) -> Result<(), DecodeError> {
        let len = self.open_len_prefixed(Expect::String)?;
        Ok(self.input().skip(len)?)
    }

    /// Skips a bytes value.
    pub fn skip_bytes(&mut self) -> Result<(), DecodeError> {
        let len = self.open_len_prefixed(Expect::Bytes)?;
        Ok(self.input().skip(len)?)
    }

    /// Reads the length of the next string and leaves its content pending.
    ///
    /// The next call must be [`read_string_data`](Self::read_string_data)
    /// with exactly this length.
    pub fn read_string_size(&mut self) -> Result<usize, DecodeError> {
        self.open_raw(Expect::String, Expect::StringData)
    }

    /// Reads the length of the next bytes value and leaves its content
    /// pending.
    ///
    /// The next call must be [`read_bytes_data`](Self::read_bytes_data) with
    /// exactly this length.
    pub fn read_bytes_size(&mut self) -> Result<usize, DecodeError> {
        self.open_raw(Expect::Bytes, Expect::BytesData)
    }

    /// Copies the pending string content into `dst[offset..offset + len]`.
    pub fn read_string_data(
        &mut self,
        dst: &mut [u8],
        offset: usize,
        len: usize,
    ) -> Result<(), DecodeError> {
        self.read_raw(Expect::StringData, dst, offset, len)
    }

    /// Copies the pending bytes content into `dst[offset..offset + len]`.
    pub fn read_bytes_data(
        &mut self,
        dst: &mut [u8],
        offset: usize,
        len: usize,
    ) -> Result<(), DecodeError> {
        self.read_raw(Expect::BytesData, dst, offset, len)
    }

    /// Reads a fixed value.
    pub fn read_fixed(&mut self) -> Result<Vec<u8>, DecodeError> {
        let size = self.fixed_size()?;
        let mut buf = vec![0u8; size];
        self.input().read_fixed(&mut buf)?;
        Ok(buf)
    }

    /// Reads a fixed value into `dst`, which must be exactly its size.
    pub fn read_fixed_into(&mut self, dst: &mut [u8]) -> Result<(), DecodeError> {
        let size = self.fixed_size()?;
        if size != dst.len() {
            return Err(self.violate(Violation::FixedLength {
                size,
                available: dst.len(),
            }));
        }
        Ok(self.input().read_fixed(dst)?)
    }

    /// Skips a fixed value.
    pub fn skip_fixed(&mut self) -> Result<(), DecodeError> {
        let size = self.fixed_size()?;
        Ok(self.input().skip(size)?)
    }

    /// Reads an enum, returning the reader's symbol ordinal.
    pub fn read_enum(&mut self) -> Result<usize, DecodeError> {
        let leaf = self.leaf(Expect::Enum)?;
        let Leaf::Enum(id) = leaf else {
            return Err(self.unexpected(leaf.as_expect(), Expect::Enum));
        };
        let ordinal = self.input().read_long()?;
        match self.program.enum_mapping(id, ordinal) {
            Some(EnumMapping::Symbol(index)) => Ok(*index as usize),
            Some(EnumMapping::Unknown(symbol)) => Err(DecodeError::Unresolvable {
                message: format!("writer enum symbol '{symbol}' is unknown to the reader"),
            }),
            None => Err(DecodeError::InvalidEnumOrdinal { ordinal }),
        }
    }

    /// Reads the reader union branch of the next value. The value itself is
    /// read with the call matching that branch.
    pub fn read_index(&mut self) -> Result<usize, DecodeError> {
        let leaf = self.leaf(Expect::UnionIndex)?;
        let Leaf::ReaderUnion { index, node } = leaf else {
            return Err(self.unexpected(leaf.as_expect(), Expect::UnionIndex));
        };
        push(&mut self.stack, &self.limits, Frame::Node(node))?;
        Ok(index as usize)
    }

    /// Starts an array, returning the item count of its first block. Zero
    /// means the array is empty and already finished.
    pub fn read_array_start(&mut self) -> Result<u64, DecodeError> {
        let leaf = self.leaf(Expect::ArrayStart)?;
        let Leaf::Array(items) = leaf else {
            return Err(self.unexpected(leaf.as_expect(), Expect::ArrayStart));
        };
        let count = self.read_block_count()?;
        if count > 0 {
            push(
                &mut self.stack,
                &self.limits,
                Frame::Array {
                    items,
                    remaining: count,
                },
            )?;
        }
        Ok(count)
    }

    /// Moves to the next array block once every item of the current block
    /// has been read, returning its item count. Zero ends the array.
    pub fn array_next(&mut self) -> Result<u64, DecodeError> {
        let step = self.advance(Expect::ArrayNext)?;
        if !matches!(step, Step::ArrayNext) {
            return Err(self.unexpected(step.as_expect(), Expect::ArrayNext));
        }
        let count = self.read_block_count()?;
        if count == 0 {
            self.stack.pop();
        } else if let Some(Frame::Array { remaining, .. }) = self.stack.last_mut() {
            *remaining = count;
        }
        Ok(count)
    }

    /// Starts a map, returning the entry count of its first block. Each entry
    /// is a key read with [`read_string`](Self::read_string) followed by its
    /// value.
    pub fn read_map_start(&mut self) -> Result<u64, DecodeError> {
        let leaf = self.leaf(Expect::MapStart)?;
        let Leaf::Map(values) = leaf else {
            return Err(self.unexpected(leaf.as_expect(), Expect::MapStart));
        };
        let count = self.read_block_count()?;
        if count > 0 {
            push(
                &mut self.stack,
                &self.limits,
                Frame::Map {
                    values,
                    remaining: count,
                    key_read: false,
                },
            )?;
        }
        Ok(count)
    }

    /// Moves to the next map block, returning its entry count. Zero ends the
    /// map.
    pub fn map_next(&mut self) -> Result<u64, DecodeError> {
        let step = self.advance(Expect::MapNext)?;
        if !matches!(step, Step::MapNext) {
            return Err(self.unexpected(step.as_expect(), Expect::MapNext));
        }
        let count = self.read_block_count()?;
        if count == 0 {
            self.stack.pop();
        } else if let Some(Frame::Map {
            remaining,
            key_read,
            ..
        }) = self.stack.last_mut()
        {
            *remaining = count;
            *key_read = false;
        }
        Ok(count)
    }

    /// Enters the next record and returns the order in which the caller must
    /// read its fields.
    ///
    /// Calling this is optional when the caller already knows the order.
    pub fn read_field_order(&mut self) -> Result<Arc<[ReaderField]>, DecodeError> {
        match self.advance(Expect::RecordStart)? {
            Step::RecordStart(order) => Ok(order),
            other => Err(self.unexpected(other.as_expect(), Expect::RecordStart)),
        }
    }

    /// Completes the current datum, skipping trailing writer fields the
    /// reader dropped. Fails if the caller left reader fields unread.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        match self.advance(Expect::End)? {
            Step::End => Ok(()),
            other => Err(self.unexpected(other.as_expect(), Expect::End)),
        }
    }

    fn input(&mut self) -> &mut dyn PrimitiveSource {
        input_of(&mut self.source, &mut self.default_input)
    }

    fn violate(&mut self, violation: Violation) -> DecodeError {
        poison(&mut self.poisoned, violation)
    }

    fn unexpected(&mut self, expected: Expect, requested: Expect) -> DecodeError {
        self.violate(Violation::OutOfStep {
            expected,
            requested,
        })
    }

    fn leaf(&mut self, want: Expect) -> Result<Leaf, DecodeError> {
        match self.advance(want)? {
            Step::Leaf(leaf) => Ok(leaf),
            other => Err(self.unexpected(other.as_expect(), want)),
        }
    }

    fn fixed_size(&mut self) -> Result<usize, DecodeError> {
        let leaf = self.leaf(Expect::Fixed)?;
        match leaf {
            Leaf::Fixed(size) => Ok(size),
            other => Err(self.unexpected(other.as_expect(), Expect::Fixed)),
        }
    }

    fn open_len_prefixed(&mut self, want: Expect) -> Result<usize, DecodeError> {
        self.advance(want)?;
        let len = self.input().read_len()?;
        check_len(len, &self.limits)?;
        Ok(len)
    }

    fn read_len_prefixed(&mut self, want: Expect) -> Result<Vec<u8>, DecodeError> {
        let len = self.open_len_prefixed(want)?;
        Ok(self.input().read_vec(len)?)
    }

    fn open_raw(&mut self, want: Expect, kind: Expect) -> Result<usize, DecodeError> {
        let len = self.open_len_prefixed(want)?;
        self.pending_raw = Some(PendingRaw { kind, len });
        Ok(len)
    }

    fn read_raw(
        &mut self,
        kind: Expect,
        dst: &mut [u8],
        offset: usize,
        len: usize,
    ) -> Result<(), DecodeError> {
        if let Some(violation) = &self.poisoned {
            return Err(violation.clone().into());
        }
        match self.pending_raw {
            Some(pending) if pending.kind == kind && pending.len == len => {}
            Some(pending) if pending.kind == kind => {
                return Err(self.violate(Violation::RawLength {
                    kind,
                    pending: pending.len,
                    requested: len,
                }));
            }
            Some(pending) => return Err(self.unexpected(pending.kind, kind)),
            None => return Err(self.violate(Violation::NoPendingData { requested: kind })),
        }
        let available = dst.len();
        let Some(window) = offset
            .checked_add(len)
            .and_then(|end| dst.get_mut(offset..end))
        else {
            return Err(self.violate(Violation::Destination {
                needed: len,
                offset,
                available,
            }));
        };
        self.input().read_fixed(window)?;
        self.pending_raw = None;
        Ok(())
    }

    fn read_block_count(&mut self) -> Result<u64, DecodeError> {
        let limits = self.limits;
        let (count, _) = read_block_header(self.input(), &limits)?;
        Ok(count)
    }

    /// Rejects `want` up front if the program structure rules it out, so a
    /// mismatch found this way consumes no input.
    fn guard(&mut self, want: Expect) -> Result<(), DecodeError> {
        if let Some(violation) = &self.poisoned {
            return Err(violation.clone().into());
        }
        if let Some(pending) = self.pending_raw {
            return Err(self.unexpected(pending.kind, want));
        }
        let expected = match self.peek(want) {
            Peek::Next(expected) => expected,
            Peek::Empty if want != Expect::End => Expect::End,
            Peek::Empty | Peek::Unknown => return Ok(()),
        };
        if expected == want {
            Ok(())
        } else {
            Err(self.unexpected(expected, want))
        }
    }

    fn peek(&self, want: Expect) -> Peek {
        let program: &Program = &self.program;
        let budget = self.limits.max_depth;
        for frame in self.stack.iter().rev() {
            let next = match *frame {
                Frame::Node(id) => peek_node(program, id, want, budget),
                Frame::Record { node, next } => {
                    let steps = record_steps(program, node);
                    peek_steps(program, steps.get(next..).unwrap_or(&[]), want, budget)
                }
                Frame::DefaultEnd => Peek::Empty,
                Frame::Array { remaining: 0, .. } => Peek::Next(Expect::ArrayNext),
                Frame::Array { items, .. } => match peek_node(program, items, want, budget) {
                    Peek::Empty => Peek::Next(Expect::ArrayNext),
                    other => other,
                },
                Frame::Map { remaining: 0, .. } => Peek::Next(Expect::MapNext),
                Frame::Map {
                    key_read: false, ..
                } => Peek::Next(Expect::String),
                Frame::Map {
                    values, remaining, ..
                } => match peek_node(program, values, want, budget) {
                    Peek::Empty if remaining > 1 => Peek::Next(Expect::String),
                    Peek::Empty => Peek::Next(Expect::MapNext),
                    other => other,
                },
            };
            if !matches!(next, Peek::Empty) {
                return next;
            }
        }
        if want == Expect::End {
            Peek::Empty
        } else {
            peek_node(program, program.root(), want, budget)
        }
    }

    /// Drives structural instructions until the caller-visible step for
    /// `want` is on top, and returns it.
    fn advance(&mut self, want: Expect) -> Result<Step, DecodeError> {
        self.guard(want)?;
        let Self {
            program,
            source,
            default_input,
            stack,
            poisoned,
            limits,
            ..
        } = self;
        let program: &Program = program;
        let limits: &DecoderLimits = limits;

        loop {
            let Some(top) = stack.last_mut() else {
                if want == Expect::End {
                    return Ok(Step::End);
                }
                stack.push(Frame::Node(program.root()));
                continue;
            };
            match *top {
                Frame::Node(id) => match shape(id, program.node(id)) {
                    Shape::Leaf(leaf) => {
                        let expected = leaf.as_expect();
                        if expected != want {
                            return Err(poison(
                                poisoned,
                                Violation::OutOfStep {
                                    expected,
                                    requested: want,
                                },
                            ));
                        }
                        stack.pop();
                        return Ok(Step::Leaf(leaf));
                    }
                    Shape::Record(plan) => {
                        *top = Frame::Record { node: id, next: 0 };
                        if want == Expect::RecordStart {
                            return Ok(Step::RecordStart(Arc::clone(&plan.order)));
                        }
                    }
                    Shape::WriterUnion(branches) => {
                        let tag = input_of(source, default_input).read_long()?;
                        *top = Frame::Node(writer_branch(branches, tag)?);
                    }
                },
                Frame::Record { node, next } => {
                    let Some(step) = record_steps(program, node).get(next) else {
                        stack.pop();
                        continue;
                    };
                    *top = Frame::Record {
                        node,
                        next: next + 1,
                    };
                    match step {
                        FieldStep::Read { node } => push(stack, limits, Frame::Node(*node))?,
                        FieldStep::Skip { node } => {
                            skip_value(program, input_of(source, default_input), limits, *node, 0)?
                        }
                        FieldStep::Default { node, value } => {
                            push(stack, limits, Frame::DefaultEnd)?;
                            push(stack, limits, Frame::Node(*node))?;
                            *default_input = Some(BufferSource::new(Arc::clone(value)));
                        }
                    }
                }
                Frame::DefaultEnd => {
                    *default_input = None;
                    stack.pop();
                }
                Frame::Array { items, remaining } => {
                    if remaining == 0 {
                        if want == Expect::ArrayNext {
                            return Ok(Step::ArrayNext);
                        }
                        return Err(poison(
                            poisoned,
                            Violation::OutOfStep {
                                expected: Expect::ArrayNext,
                                requested: want,
                            },
                        ));
                    }
                    *top = Frame::Array {
                        items,
                        remaining: remaining - 1,
                    };
                    push(stack, limits, Frame::Node(items))?;
                }
                Frame::Map {
                    values,
                    remaining,
                    key_read,
                } => {
                    if remaining == 0 {
                        if want == Expect::MapNext {
                            return Ok(Step::MapNext);
                        }
                        return Err(poison(
                            poisoned,
                            Violation::OutOfStep {
                                expected: Expect::MapNext,
                                requested: want,
                            },
                        ));
                    }
                    if !key_read {
                        if want == Expect::String {
                            *top = Frame::Map {
                                values,
                                remaining,
                                key_read: true,
                            };
                            return Ok(Step::MapKey);
                        }
                        return Err(poison(
                            poisoned,
                            Violation::OutOfStep {
                                expected: Expect::String,
                                requested: want,
                            },
                        ));
                    }
                    *top = Frame::Map {
                        values,
                        remaining: remaining - 1,
                        key_read: false,
                    };
                    push(stack, limits, Frame::Node(values))?;
                }
            }
        }
    }
}

fn input_of<'a, S: PrimitiveSource>(
    source: &'a mut S,
    default_input: &'a mut Option<DefaultInput>,
) -> &'a mut dyn PrimitiveSource {
    match default_input {
        Some(default) => default as &mut dyn PrimitiveSource,
        None => source as &mut dyn PrimitiveSource,
    }
}

fn poison(slot: &mut Option<Violation>, violation: Violation) -> DecodeError {
    debug!(%violation, "decoder contract violation");
    *slot = Some(violation.clone());
    DecodeError::ContractViolation(violation)
}

fn push(stack: &mut Vec<Frame>, limits: &DecoderLimits, frame: Frame) -> Result<(), DecodeError> {
    if stack.len() >= limits.max_depth {
        return Err(DecodeError::LimitExceeded {
            what: "nesting depth",
            value: stack.len() as u64 + 1,
            limit: limits.max_depth as u64,
        });
    }
    stack.push(frame);
    Ok(())
}

fn check_len(len: usize, limits: &DecoderLimits) -> Result<(), DecodeError> {
    if len > limits.max_bytes_len {
        return Err(DecodeError::LimitExceeded {
            what: "length",
            value: len as u64,
            limit: limits.max_bytes_len as u64,
        });
    }
    Ok(())
}

fn record_steps(program: &Program, id: NodeId) -> &[FieldStep] {
    match program.node(id) {
        Node::Record(plan) => &plan.steps,
        _ => &[],
    }
}

fn writer_branch(branches: &[Branch], tag: i64) -> Result<NodeId, DecodeError> {
    match usize::try_from(tag).ok().and_then(|i| branches.get(i)) {
        Some(Branch::Node(node)) => Ok(*node),
        Some(Branch::Unresolved(message)) => Err(DecodeError::Unresolvable {
            message: message.clone(),
        }),
        None => Err(DecodeError::InvalidUnionTag {
            tag,
            branches: branches.len(),
        }),
    }
}

/// Reads a block header: the item count and, for negative counts, the
/// block's byte size.
fn read_block_header(
    input: &mut dyn PrimitiveSource,
    limits: &DecoderLimits,
) -> Result<(u64, Option<usize>), DecodeError> {
    let count = input.read_long()?;
    let (items, byte_size) = if count < 0 {
        (count.unsigned_abs(), Some(input.read_len()?))
    } else {
        (count as u64, None)
    };
    if items > limits.max_block_items {
        return Err(DecodeError::LimitExceeded {
            what: "block item count",
            value: items,
            limit: limits.max_block_items,
        });
    }
    Ok((items, byte_size))
}

fn peek_node(program: &Program, id: NodeId, want: Expect, budget: usize) -> Peek {
    if budget == 0 {
        return Peek::Unknown;
    }
    match shape(id, program.node(id)) {
        Shape::Leaf(leaf) => Peek::Next(leaf.as_expect()),
        Shape::Record(_) if want == Expect::RecordStart => Peek::Next(Expect::RecordStart),
        Shape::Record(plan) => peek_steps(program, &plan.steps, want, budget - 1),
        Shape::WriterUnion(_) => Peek::Unknown,
    }
}

fn peek_steps(program: &Program, steps: &[FieldStep], want: Expect, budget: usize) -> Peek {
    for step in steps {
        let node = match step {
            FieldStep::Read { node } | FieldStep::Default { node, .. } => *node,
            FieldStep::Skip { .. } => continue,
        };
        match peek_node(program, node, want, budget) {
            Peek::Empty => continue,
            other => return other,
        }
    }
    Peek::Empty
}

/// Consumes one writer value of node `id` without producing it.
fn skip_value(
    program: &Program,
    input: &mut dyn PrimitiveSource,
    limits: &DecoderLimits,
    id: NodeId,
    depth: usize,
) -> Result<(), DecodeError> {
    if depth >= limits.max_depth {
        return Err(DecodeError::LimitExceeded {
            what: "nesting depth",
            value: depth as u64 + 1,
            limit: limits.max_depth as u64,
        });
    }
    match program.node(id) {
        Node::Read(p) | Node::Promote { writer: p, .. } => skip_primitive(input, *p)?,
        Node::Fixed { size } => input.skip(*size)?,
        Node::Enum { .. } => {
            input.read_long()?;
        }
        Node::Array { items } => loop {
            let (count, byte_size) = read_block_header(input, limits)?;
            if count == 0 {
                break;
            }
            match byte_size {
                Some(size) => input.skip(size)?,
                None => {
                    for _ in 0..count {
                        skip_value(program, input, limits, *items, depth + 1)?;
                    }
                }
            }
        },
        Node::Map { values } => loop {
            let (count, byte_size) = read_block_header(input, limits)?;
            if count == 0 {
                break;
            }
            match byte_size {
                Some(size) => input.skip(size)?,
                None => {
                    for _ in 0..count {
                        skip_primitive(input, Primitive::String)?;
                        skip_value(program, input, limits, *values, depth + 1)?;
                    }
                }
            }
        },
        Node::Record(plan) => {
            for step in &plan.steps {
                if let FieldStep::Read { node } | FieldStep::Skip { node } = step {
                    skip_value(program, input, limits, *node, depth + 1)?;
                }
            }
        }
        Node::WriterUnion { branches } => {
            let tag = input.read_long()?;
            let node = writer_branch(branches, tag)?;
            skip_value(program, input, limits, node, depth + 1)?;
        }
        Node::ReaderUnion { node, .. } => skip_value(program, input, limits, *node, depth)?,
    }
    Ok(())
}

fn skip_primitive(input: &mut dyn PrimitiveSource, primitive: Primitive) -> Result<(), DecodeError> {
    match primitive {
        Primitive::Null => {}
        Primitive::Boolean => input.skip(1)?,
        Primitive::Int | Primitive::Long => {
            input.read_long()?;
        }
        Primitive::Float => input.skip(4)?,
        Primitive::Double => input.skip(8)?,
        Primitive::Bytes | Primitive::String => {
            let len = input.read_len()?;
            input.skip(len)?;
        }
    }
    Ok(())
}
