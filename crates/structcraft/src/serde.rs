//! JSON-deserializable structure definitions.
//!
//! These types describe structure layouts as data, for example a definitions
//! file shipped with an application, and are compiled into [StructType]s with
//! [compile_defs]. Definitions are compiled in order, so parents and nested
//! structures must appear before the structures that use them.
//!
//! ```json
//! [
//!   { "name": "Point", "field_order": ["x", "y"],
//!     "fields": [ { "name": "x", "type": "Leaf", "code": "d" },
//!                 { "name": "y", "type": "Leaf", "code": "d" } ] },
//!   { "name": "Box", "field_order": ["nw", "se"],
//!     "fields": [ { "name": "nw", "type": "Nested", "structure": "Point" },
//!                 { "name": "se", "type": "Nested", "structure": "Point" } ] }
//! ]
//! ```
//!
//! With this feature enabled, [Instance] and [Value] also implement
//! `Serialize`: an instance becomes a map from field name to value.

use std::collections::BTreeMap;

use serde::{
    Deserialize, Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};

use crate::{
    errors::DefinitionError,
    field::FieldDescriptor,
    instance::Instance,
    layout::{ByteOrder, Code},
    structure::{Binding, StructType},
    value::Value,
};

/// Byte order of a structure definition.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub enum ByteOrderDef {
    Native,
    LittleEndian,
    BigEndian,
    Network,
}

impl From<ByteOrderDef> for ByteOrder {
    fn from(value: ByteOrderDef) -> Self {
        match value {
            ByteOrderDef::Native => ByteOrder::Native,
            ByteOrderDef::LittleEndian => ByteOrder::LittleEndian,
            ByteOrderDef::BigEndian => ByteOrder::BigEndian,
            ByteOrderDef::Network => ByteOrder::Network,
        }
    }
}

/// A scalar literal used for defaults and constant values.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ScalarDef {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl From<ScalarDef> for Value {
    fn from(value: ScalarDef) -> Self {
        match value {
            ScalarDef::Bool(b) => Value::Bool(b),
            ScalarDef::Int(i) => Value::Int(i),
            ScalarDef::UInt(u) => Value::UInt(u),
            ScalarDef::Float(f) => Value::Float(f),
            ScalarDef::Str(s) => Value::Str(s),
        }
    }
}

/// What a declared field is bound to.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum BindingDef {
    /// Scalar field given by its struct format character.
    Leaf {
        code: char,
        #[serde(default)]
        default: Option<ScalarDef>,
        /// Makes the field constant: the default, and the only accepted value.
        #[serde(default)]
        value: Option<ScalarDef>,
    },
    /// Nested structure, by the name of an earlier definition.
    Nested { structure: String },
    /// Declared but left for a descendant to resolve.
    Abstract,
}

/// One declared field binding.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub binding: BindingDef,
}

/// Definition of a single structure type.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StructDef {
    pub name: String,
    /// Name of an earlier definition to inherit from.
    #[serde(default)]
    pub parent: Option<String>,
    /// Required on first-generation structures, forbidden on descendants.
    #[serde(default)]
    pub field_order: Option<Vec<String>>,
    #[serde(default)]
    pub byte_order: Option<ByteOrderDef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// Compiles definitions, in order, into structure types keyed by name.
pub fn compile_defs(defs: &[StructDef]) -> Result<BTreeMap<String, StructType>, DefinitionError> {
    let mut compiled: BTreeMap<String, StructType> = BTreeMap::new();

    for def in defs {
        let lookup = |name: &str| {
            compiled
                .get(name)
                .ok_or_else(|| DefinitionError::UnknownStructure(name.to_string()))
        };

        let mut builder = StructType::builder(def.name.clone());
        if let Some(parent) = &def.parent {
            builder = builder.parent(lookup(parent)?);
        }
        if let Some(order) = &def.field_order {
            builder = builder.field_order(order.iter().cloned());
        }
        if let Some(byte_order) = def.byte_order {
            builder = builder.byte_order(byte_order.into());
        }

        for field in &def.fields {
            let binding = match &field.binding {
                BindingDef::Abstract => Binding::Unresolved,
                BindingDef::Nested { structure } => Binding::Nested(lookup(structure)?.clone()),
                BindingDef::Leaf {
                    code,
                    default,
                    value,
                } => {
                    let code = Code::from_format_char(*code).ok_or(DefinitionError::UnknownCode(*code))?;
                    let invalid = |reason: String| DefinitionError::InvalidDefault {
                        name: def.name.clone(),
                        field: field.name.clone(),
                        reason,
                    };
                    match (value, default) {
                        (Some(_), Some(_)) => {
                            return Err(invalid("a constant field takes its value as its default".to_string()));
                        }
                        (Some(value), None) => Binding::Leaf(
                            FieldDescriptor::constant(code, value.clone()).map_err(|e| invalid(e.to_string()))?,
                        ),
                        (None, Some(default)) => {
                            Binding::Leaf(FieldDescriptor::new(code).with_default(default.clone()))
                        }
                        (None, None) => Binding::Leaf(FieldDescriptor::new(code)),
                    }
                }
            };
            builder = builder.bind(field.name.clone(), binding);
        }

        let struct_type = builder.build()?;
        compiled.insert(def.name.clone(), struct_type);
    }

    Ok(compiled)
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Char(c) => serializer.serialize_char(*c as char),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Struct(instance) => instance.serialize(serializer),
        }
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
