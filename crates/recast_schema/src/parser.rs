//! JSON schema notation parser.
//!
//! Builds the schema arena in a single pass. Named types get their ID before
//! their body is parsed, so a record can refer to itself (directly or through
//! a union, array, or map) and the reference resolves to a back-edge.

use std::collections::{HashMap, HashSet};

use recast_common::Arena;
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::node::{
    EnumSchema, Field, FixedSchema, Name, Primitive, RecordSchema, SchemaId, SchemaNode,
};

type JsonObject = Map<String, Value>;

pub(crate) struct Parser {
    nodes: Arena<SchemaId, SchemaNode>,
    /// Full name to definition.
    names: HashMap<String, SchemaId>,
    /// Definition to full name; also covers definitions still being parsed.
    named: HashMap<SchemaId, String>,
}

impl Parser {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Arena::new(),
            names: HashMap::new(),
            named: HashMap::new(),
        }
    }

    pub(crate) fn into_nodes(self) -> Arena<SchemaId, SchemaNode> {
        self.nodes
    }

    pub(crate) fn parse(&mut self, json: &Value, ns: Option<&str>) -> Result<SchemaId, SchemaError> {
        match json {
            Value::String(name) => self.parse_reference(name, ns),
            Value::Array(branches) => self.parse_union(branches, ns),
            Value::Object(obj) => self.parse_object(obj, ns),
            other => Err(SchemaError::InvalidSchema {
                reason: format!("expected a type name, union, or object, found {other}"),
            }),
        }
    }

    fn parse_reference(&mut self, name: &str, ns: Option<&str>) -> Result<SchemaId, SchemaError> {
        if let Some(p) = Primitive::from_name(name) {
            return Ok(self.nodes.alloc(SchemaNode::Primitive(p)));
        }
        self.lookup(name, ns).ok_or_else(|| SchemaError::UnknownType {
            name: name.to_string(),
        })
    }

    fn lookup(&self, name: &str, ns: Option<&str>) -> Option<SchemaId> {
        if !name.contains('.') {
            if let Some(ns) = ns.filter(|ns| !ns.is_empty()) {
                if let Some(id) = self.names.get(&format!("{ns}.{name}")) {
                    return Some(*id);
                }
            }
        }
        self.names.get(name).copied()
    }

    fn parse_object(&mut self, obj: &JsonObject, ns: Option<&str>) -> Result<SchemaId, SchemaError> {
        let ty = obj.get("type").ok_or_else(|| SchemaError::MissingAttribute {
            attribute: "type",
            context: "schema object".to_string(),
        })?;
        let Value::String(ty) = ty else {
            return self.parse(ty, ns);
        };
        match ty.as_str() {
            "record" | "error" => self.parse_record(obj, ns),
            "enum" => self.parse_enum(obj, ns),
            "fixed" => self.parse_fixed(obj, ns),
            "array" => {
                let items = obj.get("items").ok_or_else(|| SchemaError::MissingAttribute {
                    attribute: "items",
                    context: "array".to_string(),
                })?;
                let items = self.parse(items, ns)?;
                Ok(self.nodes.alloc(SchemaNode::Array { items }))
            }
            "map" => {
                let values = obj.get("values").ok_or_else(|| SchemaError::MissingAttribute {
                    attribute: "values",
                    context: "map".to_string(),
                })?;
                let values = self.parse(values, ns)?;
                Ok(self.nodes.alloc(SchemaNode::Map { values }))
            }
            other => self.parse_reference(other, ns),
        }
    }

    /// Registers a named type and reserves its slot.
    fn declare(
        &mut self,
        obj: &JsonObject,
        ns: Option<&str>,
        kind: &str,
    ) -> Result<(Name, Vec<String>, SchemaId), SchemaError> {
        let raw = required_str(obj, "name", || kind.to_string())?;
        let explicit_ns = obj.get("namespace").and_then(Value::as_str);
        let name = Name::parse(raw, explicit_ns.or(ns));
        validate_name(&name)?;

        let fullname = name.fullname();
        if Primitive::from_name(&fullname).is_some() {
            return Err(SchemaError::InvalidName { name: fullname });
        }
        if self.names.contains_key(&fullname) {
            return Err(SchemaError::DuplicateName { name: fullname });
        }

        let id = self.nodes.alloc(SchemaNode::Primitive(Primitive::Null));
        self.names.insert(fullname.clone(), id);
        self.named.insert(id, fullname);

        let aliases = string_list(obj, "aliases")?
            .into_iter()
            .map(|alias| Name::parse(&alias, name.namespace.as_deref()).fullname())
            .collect();
        Ok((name, aliases, id))
    }

    fn parse_record(&mut self, obj: &JsonObject, ns: Option<&str>) -> Result<SchemaId, SchemaError> {
        let (name, aliases, id) = self.declare(obj, ns, "record")?;
        let fields_json = obj
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::MissingAttribute {
                attribute: "fields",
                context: format!("record '{name}'"),
            })?;

        let record_ns = name.namespace.clone();
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(fields_json.len());
        for (position, field_json) in fields_json.iter().enumerate() {
            let field_obj = field_json
                .as_object()
                .ok_or_else(|| SchemaError::InvalidSchema {
                    reason: format!("field {position} of record '{name}' is not an object"),
                })?;
            let field_name = required_str(field_obj, "name", || format!("field of record '{name}'"))?;
            validate_identifier(field_name)?;
            if !seen.insert(field_name.to_string()) {
                return Err(SchemaError::DuplicateField {
                    record: name.fullname(),
                    field: field_name.to_string(),
                });
            }
            let field_type = field_obj
                .get("type")
                .ok_or_else(|| SchemaError::MissingAttribute {
                    attribute: "type",
                    context: format!("field '{field_name}' of record '{name}'"),
                })?;
            let schema = self.parse(field_type, record_ns.as_deref())?;
            fields.push(Field {
                name: field_name.to_string(),
                schema,
                default: field_obj.get("default").cloned(),
                aliases: string_list(field_obj, "aliases")?,
                position,
            });
        }

        *self.nodes.get_mut(id) = SchemaNode::Record(RecordSchema {
            name,
            aliases,
            fields,
        });
        Ok(id)
    }

    fn parse_enum(&mut self, obj: &JsonObject, ns: Option<&str>) -> Result<SchemaId, SchemaError> {
        let (name, aliases, id) = self.declare(obj, ns, "enum")?;
        let symbols_json = obj
            .get("symbols")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::MissingAttribute {
                attribute: "symbols",
                context: format!("enum '{name}'"),
            })?;

        let mut symbols: Vec<String> = Vec::with_capacity(symbols_json.len());
        for symbol in symbols_json {
            let symbol = symbol.as_str().ok_or_else(|| SchemaError::InvalidSchema {
                reason: format!("enum '{name}' has a non-string symbol"),
            })?;
            validate_identifier(symbol)?;
            if symbols.iter().any(|s| s == symbol) {
                return Err(SchemaError::DuplicateSymbol {
                    name: name.fullname(),
                    symbol: symbol.to_string(),
                });
            }
            symbols.push(symbol.to_string());
        }

        let default = obj.get("default").and_then(Value::as_str).map(str::to_string);
        if let Some(default) = &default {
            if !symbols.contains(default) {
                return Err(SchemaError::InvalidEnumDefault {
                    name: name.fullname(),
                    symbol: default.clone(),
                });
            }
        }

        *self.nodes.get_mut(id) = SchemaNode::Enum(EnumSchema {
            name,
            aliases,
            symbols,
            default,
        });
        Ok(id)
    }

    fn parse_fixed(&mut self, obj: &JsonObject, ns: Option<&str>) -> Result<SchemaId, SchemaError> {
        let (name, aliases, id) = self.declare(obj, ns, "fixed")?;
        let size = obj
            .get("size")
            .and_then(Value::as_u64)
            .and_then(|s| usize::try_from(s).ok())
            .ok_or_else(|| SchemaError::InvalidSize {
                name: name.fullname(),
            })?;
        *self.nodes.get_mut(id) = SchemaNode::Fixed(FixedSchema {
            name,
            aliases,
            size,
        });
        Ok(id)
    }

    fn parse_union(&mut self, branches_json: &[Value], ns: Option<&str>) -> Result<SchemaId, SchemaError> {
        let mut seen = HashSet::new();
        let mut branches = Vec::with_capacity(branches_json.len());
        for branch_json in branches_json {
            let branch = self.parse(branch_json, ns)?;
            let key = match self.named.get(&branch) {
                Some(fullname) => fullname.clone(),
                None => {
                    let kind = self.nodes[branch].kind();
                    if matches!(self.nodes[branch], SchemaNode::Union { .. }) {
                        return Err(SchemaError::InvalidUnion {
                            reason: "unions may not immediately contain other unions".to_string(),
                        });
                    }
                    kind.to_string()
                }
            };
            if !seen.insert(key.clone()) {
                return Err(SchemaError::InvalidUnion {
                    reason: format!("duplicate branch '{key}'"),
                });
            }
            branches.push(branch);
        }
        Ok(self.nodes.alloc(SchemaNode::Union { branches }))
    }
}

fn required_str<'a>(
    obj: &'a JsonObject,
    attribute: &'static str,
    context: impl FnOnce() -> String,
) -> Result<&'a str, SchemaError> {
    obj.get(attribute)
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaError::MissingAttribute {
            attribute,
            context: context(),
        })
}

fn string_list(obj: &JsonObject, attribute: &str) -> Result<Vec<String>, SchemaError> {
    match obj.get(attribute) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| SchemaError::InvalidSchema {
                        reason: format!("'{attribute}' must contain only strings"),
                    })
            })
            .collect(),
        Some(_) => Err(SchemaError::InvalidSchema {
            reason: format!("'{attribute}' must be an array"),
        }),
    }
}

fn validate_name(name: &Name) -> Result<(), SchemaError> {
    validate_identifier(&name.name)?;
    if let Some(ns) = &name.namespace {
        for segment in ns.split('.') {
            validate_identifier(segment).map_err(|_| SchemaError::InvalidName {
                name: name.fullname(),
            })?;
        }
    }
    Ok(())
}

fn validate_identifier(ident: &str) -> Result<(), SchemaError> {
    let mut chars = ident.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidName {
            name: ident.to_string(),
        })
    }
}
