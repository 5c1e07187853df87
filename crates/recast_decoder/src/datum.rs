//! Generic reading of whole values.

use recast_codec::PrimitiveSource;
use recast_schema::{Primitive, Schema, SchemaId, SchemaNode};

use crate::decoder::Decoder;
use crate::error::DecodeError;
use crate::value::Value;

/// Reads one complete datum, shaped by the program's reader schema, and
/// finishes it.
pub fn read_datum<S: PrimitiveSource>(decoder: &mut Decoder<S>) -> Result<Value, DecodeError> {
    let reader = decoder.program().reader().clone();
    let value = read_node(decoder, &reader, reader.root())?;
    decoder.finish()?;
    Ok(value)
}

fn read_node<S: PrimitiveSource>(
    decoder: &mut Decoder<S>,
    schema: &Schema,
    id: SchemaId,
) -> Result<Value, DecodeError> {
    Ok(match schema.node(id) {
        SchemaNode::Primitive(p) => match p {
            Primitive::Null => {
                decoder.read_null()?;
                Value::Null
            }
            Primitive::Boolean => Value::Boolean(decoder.read_boolean()?),
            Primitive::Int => Value::Int(decoder.read_int()?),
            Primitive::Long => Value::Long(decoder.read_long()?),
            Primitive::Float => Value::Float(decoder.read_float()?),
            Primitive::Double => Value::Double(decoder.read_double()?),
            Primitive::Bytes => Value::Bytes(decoder.read_bytes()?),
            Primitive::String => Value::String(decoder.read_string()?),
        },
        SchemaNode::Fixed(_) => Value::Fixed(decoder.read_fixed()?),
        SchemaNode::Enum(e) => {
            let index = decoder.read_enum()?;
            let symbol = e.symbols.get(index).cloned().ok_or_else(|| {
                DecodeError::Unresolvable {
                    message: format!("enum {} has no symbol {index}", e.name),
                }
            })?;
            Value::Enum { index, symbol }
        }
        SchemaNode::Union { branches } => {
            let index = decoder.read_index()?;
            let branch = branches.get(index).ok_or_else(|| DecodeError::Unresolvable {
                message: format!("union has no branch {index}"),
            })?;
            Value::Union {
                index,
                value: Box::new(read_node(decoder, schema, *branch)?),
            }
        }
        SchemaNode::Array { items } => {
            let mut elements = Vec::new();
            let mut count = decoder.read_array_start()?;
            while count > 0 {
                for _ in 0..count {
                    elements.push(read_node(decoder, schema, *items)?);
                }
                count = decoder.array_next()?;
            }
            Value::Array(elements)
        }
        SchemaNode::Map { values } => {
            let mut entries = Vec::new();
            let mut count = decoder.read_map_start()?;
            while count > 0 {
                for _ in 0..count {
                    let key = decoder.read_string()?;
                    entries.push((key, read_node(decoder, schema, *values)?));
                }
                count = decoder.map_next()?;
            }
            Value::Map(entries)
        }
        SchemaNode::Record(record) => {
            let order = decoder.read_field_order()?;
            let mut slots: Vec<Option<Value>> = vec![None; record.fields.len()];
            for field in order.iter() {
                let schema_id = record.fields[field.position].schema;
                slots[field.position] = Some(read_node(decoder, schema, schema_id)?);
            }
            let fields = record
                .fields
                .iter()
                .zip(slots)
                .map(|(field, slot)| {
                    slot.map(|value| (field.name.clone(), value)).ok_or_else(|| {
                        DecodeError::Unresolvable {
                            message: format!(
                                "record {} produced no value for '{}'",
                                record.name, field.name
                            ),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Value::Record(fields)
        }
    })
}
