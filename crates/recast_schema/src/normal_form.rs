//! Deterministic JSON rendering used for schema identity.
//!
//! The normal form keeps everything that can change how data resolves
//! (full names, field order, defaults, aliases, enum defaults) and drops
//! documentation. Each named type is written in full on first occurrence and
//! by full name afterwards, which also terminates recursion.

use std::collections::HashSet;

use recast_common::Arena;
use serde_json::Value;

use crate::node::{SchemaId, SchemaNode};

pub(crate) fn render(nodes: &Arena<SchemaId, SchemaNode>, root: SchemaId) -> String {
    let mut out = String::new();
    let mut seen = HashSet::new();
    write_node(nodes, root, &mut seen, &mut out);
    out
}

fn write_node(
    nodes: &Arena<SchemaId, SchemaNode>,
    id: SchemaId,
    seen: &mut HashSet<String>,
    out: &mut String,
) {
    let node = &nodes[id];
    if let Some(name) = node.name() {
        let fullname = name.fullname();
        if !seen.insert(fullname.clone()) {
            write_str(out, &fullname);
            return;
        }
    }

    match node {
        SchemaNode::Primitive(p) => write_str(out, p.name()),
        SchemaNode::Record(record) => {
            out.push_str("{\"name\":");
            write_str(out, &record.name.fullname());
            out.push_str(",\"type\":\"record\"");
            write_aliases(out, &record.aliases);
            out.push_str(",\"fields\":[");
            for (i, field) in record.fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str("{\"name\":");
                write_str(out, &field.name);
                out.push_str(",\"type\":");
                write_node(nodes, field.schema, seen, out);
                if let Some(default) = &field.default {
                    out.push_str(",\"default\":");
                    out.push_str(&default.to_string());
                }
                write_aliases(out, &field.aliases);
                out.push('}');
            }
            out.push_str("]}");
        }
        SchemaNode::Enum(e) => {
            out.push_str("{\"name\":");
            write_str(out, &e.name.fullname());
            out.push_str(",\"type\":\"enum\",\"symbols\":[");
            for (i, symbol) in e.symbols.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_str(out, symbol);
            }
            out.push(']');
            if let Some(default) = &e.default {
                out.push_str(",\"default\":");
                write_str(out, default);
            }
            write_aliases(out, &e.aliases);
            out.push('}');
        }
        SchemaNode::Fixed(f) => {
            out.push_str("{\"name\":");
            write_str(out, &f.name.fullname());
            out.push_str(&format!(",\"type\":\"fixed\",\"size\":{}", f.size));
            write_aliases(out, &f.aliases);
            out.push('}');
        }
        SchemaNode::Array { items } => {
            out.push_str("{\"type\":\"array\",\"items\":");
            write_node(nodes, *items, seen, out);
            out.push('}');
        }
        SchemaNode::Map { values } => {
            out.push_str("{\"type\":\"map\",\"values\":");
            write_node(nodes, *values, seen, out);
            out.push('}');
        }
        SchemaNode::Union { branches } => {
            out.push('[');
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_node(nodes, *branch, seen, out);
            }
            out.push(']');
        }
    }
}

fn write_aliases(out: &mut String, aliases: &[String]) {
    if aliases.is_empty() {
        return;
    }
    out.push_str(",\"aliases\":[");
    for (i, alias) in aliases.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_str(out, alias);
    }
    out.push(']');
}

fn write_str(out: &mut String, s: &str) {
    out.push_str(&Value::String(s.to_string()).to_string());
}
