//! Encoding of JSON field defaults into the binary format.
//!
//! Defaults are encoded once at compile time so the decoder can replay them
//! through the same primitive reads it uses for real input.

use recast_codec::BinaryEncoder;
use recast_schema::{Primitive, Schema, SchemaId, SchemaNode};
use serde_json::Value;

/// Encodes `value` as an instance of node `id` of `schema`.
pub(crate) fn encode_default(
    schema: &Schema,
    id: SchemaId,
    value: &Value,
) -> Result<Vec<u8>, String> {
    let mut enc = BinaryEncoder::new();
    write_value(schema, id, value, &mut enc)?;
    Ok(enc.into_bytes())
}

fn write_value(
    schema: &Schema,
    id: SchemaId,
    value: &Value,
    enc: &mut BinaryEncoder,
) -> Result<(), String> {
    let node = schema.node(id);
    match (node, value) {
        (SchemaNode::Primitive(Primitive::Null), Value::Null) => enc.write_null(),
        (SchemaNode::Primitive(Primitive::Boolean), Value::Bool(b)) => enc.write_boolean(*b),
        (SchemaNode::Primitive(Primitive::Int), Value::Number(n)) => {
            let v = n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| format!("{n} is not a valid int"))?;
            enc.write_int(v);
        }
        (SchemaNode::Primitive(Primitive::Long), Value::Number(n)) => {
            let v = n.as_i64().ok_or_else(|| format!("{n} is not a valid long"))?;
            enc.write_long(v);
        }
        (SchemaNode::Primitive(Primitive::Float), Value::Number(n)) => {
            let v = n.as_f64().ok_or_else(|| format!("{n} is not a valid float"))?;
            enc.write_float(v as f32);
        }
        (SchemaNode::Primitive(Primitive::Double), Value::Number(n)) => {
            let v = n.as_f64().ok_or_else(|| format!("{n} is not a valid double"))?;
            enc.write_double(v);
        }
        (SchemaNode::Primitive(Primitive::String), Value::String(s)) => enc.write_string(s),
        (SchemaNode::Primitive(Primitive::Bytes), Value::String(s)) => {
            enc.write_bytes(&code_points(s)?);
        }
        (SchemaNode::Fixed(fixed), Value::String(s)) => {
            let bytes = code_points(s)?;
            if bytes.len() != fixed.size {
                return Err(format!(
                    "default has {} bytes, fixed {} needs {}",
                    bytes.len(),
                    fixed.name,
                    fixed.size
                ));
            }
            enc.write_fixed(&bytes);
        }
        (SchemaNode::Enum(e), Value::String(s)) => {
            let ordinal = e
                .symbol_index(s)
                .ok_or_else(|| format!("'{s}' is not a symbol of {}", e.name))?;
            enc.write_enum(ordinal as u32);
        }
        (SchemaNode::Array { items }, Value::Array(elements)) => {
            if !elements.is_empty() {
                enc.write_count(elements.len());
                for element in elements {
                    write_value(schema, *items, element, enc)?;
                }
            }
            enc.write_end();
        }
        (SchemaNode::Map { values }, Value::Object(entries)) => {
            if !entries.is_empty() {
                enc.write_count(entries.len());
                for (key, entry) in entries {
                    enc.write_string(key);
                    write_value(schema, *values, entry, enc)?;
                }
            }
            enc.write_end();
        }
        (SchemaNode::Record(record), Value::Object(entries)) => {
            for field in &record.fields {
                let field_value = entries
                    .get(&field.name)
                    .or(field.default.as_ref())
                    .ok_or_else(|| format!("record {} needs field '{}'", record.name, field.name))?;
                write_value(schema, field.schema, field_value, enc)?;
            }
        }
        (SchemaNode::Union { branches }, _) => write_union(schema, branches, value, enc)?,
        (node, value) => return Err(format!("{value} is not a valid {}", node.label())),
    }
    Ok(())
}

/// The first branch that accepts the value wins; by convention that is the
/// first branch of the union.
fn write_union(
    schema: &Schema,
    branches: &[SchemaId],
    value: &Value,
    enc: &mut BinaryEncoder,
) -> Result<(), String> {
    let mut first_error = None;
    for (index, branch) in branches.iter().enumerate() {
        let mut attempt = BinaryEncoder::new();
        attempt.write_index(index as u32);
        match write_value(schema, *branch, value, &mut attempt) {
            Ok(()) => {
                enc.write_fixed(attempt.as_bytes());
                return Ok(());
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or_else(|| "union has no branches".to_string()))
}

/// Bytes and fixed defaults are strings whose code points are the byte values.
fn code_points(s: &str) -> Result<Vec<u8>, String> {
    s.chars()
        .map(|c| u8::try_from(c).map_err(|_| format!("character {c:?} is not a byte value")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(schema: &str, value: Value) -> Result<Vec<u8>, String> {
        let schema = Schema::parse_str(schema).unwrap();
        encode_default(&schema, schema.root(), &value)
    }

    #[test]
    fn primitives() {
        assert_eq!(encode(r#""int""#, json!(30)).unwrap(), vec![0x3c]);
        assert_eq!(encode(r#""boolean""#, json!(true)).unwrap(), vec![1]);
        assert!(encode(r#""null""#, Value::Null).unwrap().is_empty());
        assert_eq!(
            encode(r#""string""#, json!("hi")).unwrap(),
            vec![0x04, b'h', b'i']
        );
        assert_eq!(
            encode(r#""double""#, json!(1.5)).unwrap(),
            1.5f64.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn int_out_of_range() {
        let err = encode(r#""int""#, json!(1u64 << 40)).unwrap_err();
        assert!(err.contains("not a valid int"));
    }

    #[test]
    fn type_mismatch() {
        let err = encode(r#""int""#, json!("thirty")).unwrap_err();
        assert!(err.contains("is not a valid int"));
    }

    #[test]
    fn bytes_from_code_points() {
        assert_eq!(
            encode(r#""bytes""#, json!("\u{00ff}A")).unwrap(),
            vec![0x04, 0xff, b'A']
        );
        assert!(encode(r#""bytes""#, json!("\u{0100}")).is_err());
    }

    #[test]
    fn fixed_size_checked() {
        let schema = r#"{"type":"fixed","name":"Two","size":2}"#;
        assert_eq!(encode(schema, json!("ab")).unwrap(), b"ab".to_vec());
        assert!(encode(schema, json!("abc")).is_err());
    }

    #[test]
    fn enum_symbol() {
        let schema = r#"{"type":"enum","name":"Color","symbols":["RED","GREEN"]}"#;
        assert_eq!(encode(schema, json!("GREEN")).unwrap(), vec![0x02]);
        assert!(encode(schema, json!("BLUE")).is_err());
    }

    #[test]
    fn union_uses_first_accepting_branch() {
        assert_eq!(encode(r#"["null","int"]"#, Value::Null).unwrap(), vec![0x00]);
        assert_eq!(encode(r#"["null","int"]"#, json!(5)).unwrap(), vec![0x02, 0x0a]);
    }

    #[test]
    fn arrays_and_maps() {
        assert_eq!(
            encode(r#"{"type":"array","items":"int"}"#, json!([1, 2])).unwrap(),
            vec![0x04, 0x02, 0x04, 0x00]
        );
        assert_eq!(
            encode(r#"{"type":"array","items":"int"}"#, json!([])).unwrap(),
            vec![0x00]
        );
        assert_eq!(
            encode(r#"{"type":"map","values":"int"}"#, json!({"a": 1})).unwrap(),
            vec![0x02, 0x02, b'a', 0x02, 0x00]
        );
    }

    #[test]
    fn record_uses_nested_defaults() {
        let schema = r#"{"type":"record","name":"P","fields":[
            {"name":"x","type":"int"},
            {"name":"y","type":"int","default":7}
        ]}"#;
        assert_eq!(encode(schema, json!({"x": 1})).unwrap(), vec![0x02, 0x0e]);
        assert!(encode(schema, json!({"y": 1})).is_err());
    }
}
