//! Dynamic values stored in, and passed into, structure instances.

use std::{collections::BTreeMap, fmt};

use crate::instance::Instance;

/// A value held by a leaf slot, or handed to a constructor or setter.
///
/// `List` and `Map` only appear as inputs (positional or named argument
/// bundles, slice results); leaf slots always store a scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value. Assigning it to a slot selects the slot's default.
    None,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// A single byte, as stored by `char` fields.
    Char(u8),
    Str(String),
    List(Vec<Value>),
    /// Ordered name/value pairs.
    Map(Vec<(String, Value)>),
    Struct(Instance),
}

impl Value {
    /// Builds a [`Value::Map`] from name/value pairs, preserving their order.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a [`Value::List`] from anything convertible to values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Short description of the value's kind, used in error messages.
    pub fn kind(&self) -> String {
        match self {
            Value::None => "none".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::UInt(_) => "uint".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Char(_) => "char".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Struct(instance) => format!("structure '{}'", instance.struct_type().name()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of the value, if it is an integer that fits `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Char(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Integer view of the value, if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::UInt(v) => Some(*v),
            Value::Char(v) => Some(*v as u64),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Instance> {
        match self {
            Value::Struct(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Char(c) => write!(f, "{:?}", *c as char),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Struct(instance) => write!(f, "{instance}"),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident, $target:ty => $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )+
    };
}

impl_from!(Int, i64 => i8, i16, i32, i64, isize);
impl_from!(UInt, u64 => u8, u16, u32, u64, usize);
impl_from!(Float, f64 => f32, f64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Value::Struct(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::list(v)
    }
}

impl<V: Into<Value>> From<BTreeMap<String, V>> for Value {
    fn from(v: BTreeMap<String, V>) -> Self {
        Value::map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_numeric() {
        assert_eq!(Value::from(-3i8), Value::Int(-3));
        assert_eq!(Value::from(7u16), Value::UInt(7));
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::UInt(5).as_i64(), Some(5));
        assert_eq!(Value::Int(-1).as_u64(), None);
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::Str("a".into()).as_f64(), None);
    }

    #[test]
    fn test_map_preserves_order() {
        let v = Value::map([("y", 1.0), ("x", 2.0)]);
        assert_eq!(
            v,
            Value::Map(vec![
                ("y".to_string(), Value::Float(1.0)),
                ("x".to_string(), Value::Float(2.0)),
            ])
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::list([1.0, 2.5]).to_string(), "[1.0, 2.5]");
        assert_eq!(Value::None.to_string(), "None");
    }
}
