//! Item keys: integer index, slice or dot-delimited path.

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::{errors::Error, value::Value};

/// Addresses one or more slots of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Position in the field order.
    Index(i64),
    /// Half-open range over the field order; bounds are clamped to its length.
    Slice {
        start: Option<usize>,
        end: Option<usize>,
    },
    /// A field name, or names joined with `.` descending into nested instances.
    Path(String),
}

impl Key {
    /// Resolves a slice key to concrete bounds for a structure of `len` fields.
    pub(crate) fn bounds(start: Option<usize>, end: Option<usize>, len: usize) -> Range<usize> {
        let end = end.unwrap_or(len).min(len);
        let start = start.unwrap_or(0).min(end);
        start..end
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Index(v as i64)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Index(v)
    }
}

impl From<usize> for Key {
    fn from(v: usize) -> Self {
        Key::Index(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Path(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Path(v)
    }
}

impl From<RangeFull> for Key {
    fn from(_: RangeFull) -> Self {
        Key::Slice {
            start: None,
            end: None,
        }
    }
}

impl From<Range<usize>> for Key {
    fn from(r: Range<usize>) -> Self {
        Key::Slice {
            start: Some(r.start),
            end: Some(r.end),
        }
    }
}

impl From<RangeFrom<usize>> for Key {
    fn from(r: RangeFrom<usize>) -> Self {
        Key::Slice {
            start: Some(r.start),
            end: None,
        }
    }
}

impl From<RangeTo<usize>> for Key {
    fn from(r: RangeTo<usize>) -> Self {
        Key::Slice {
            start: None,
            end: Some(r.end),
        }
    }
}

/// Keys arriving as dynamic values: integers index, strings are paths,
/// anything else is rejected.
impl TryFrom<&Value> for Key {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(i) => Ok(Key::Index(*i)),
            Value::UInt(u) => Ok(Key::from(*u as usize)),
            Value::Str(s) => Ok(Key::Path(s.clone())),
            other => Err(Error::UnsupportedKey(other.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_clamp() {
        assert_eq!(Key::bounds(None, None, 2), 0..2);
        assert_eq!(Key::bounds(None, Some(1), 2), 0..1);
        assert_eq!(Key::bounds(Some(1), None, 2), 1..2);
        assert_eq!(Key::bounds(Some(5), Some(9), 2), 2..2);
        assert_eq!(Key::bounds(Some(2), Some(1), 3), 1..1);
    }

    #[test]
    fn test_dynamic_keys() {
        assert_eq!(Key::try_from(&Value::Int(1)), Ok(Key::Index(1)));
        assert_eq!(
            Key::try_from(&Value::from("a.b")),
            Ok(Key::Path("a.b".to_string()))
        );
        assert_eq!(
            Key::try_from(&Value::Float(1.0)),
            Err(Error::UnsupportedKey("float".to_string()))
        );
    }

    #[test]
    fn test_range_conversions() {
        assert_eq!(
            Key::from(..1),
            Key::Slice {
                start: None,
                end: Some(1)
            }
        );
        assert_eq!(
            Key::from(1..),
            Key::Slice {
                start: Some(1),
                end: None
            }
        );
    }
}
