//! Scalar encoding codes and byte orders.
//!
//! Both map one-to-one onto the format characters and byte-order prefixes of
//! C-style `struct` format strings, always with standard sizes and no
//! alignment.

use crate::{
    errors::{Error, Result},
    value::Value,
};

/// How multi-byte leaf fields of a structure are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Host byte order, standard sizes, no alignment (`=`).
    #[default]
    Native,
    /// `<`
    LittleEndian,
    /// `>`
    BigEndian,
    /// Same layout as big-endian (`!`).
    Network,
}

impl ByteOrder {
    pub fn prefix(&self) -> char {
        match self {
            ByteOrder::Native => '=',
            ByteOrder::LittleEndian => '<',
            ByteOrder::BigEndian => '>',
            ByteOrder::Network => '!',
        }
    }

    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            '=' => Some(ByteOrder::Native),
            '<' => Some(ByteOrder::LittleEndian),
            '>' => Some(ByteOrder::BigEndian),
            '!' => Some(ByteOrder::Network),
            _ => None,
        }
    }
}

/// The binary encoding tag of a leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// One zero byte; carries no value.
    Pad,
    /// A single raw byte.
    Char,
    I8,
    U8,
    Bool,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl Code {
    /// Encoded width in bytes.
    pub fn size(&self) -> usize {
        match self {
            Code::Pad | Code::Char | Code::I8 | Code::U8 | Code::Bool => 1,
            Code::I16 | Code::U16 => 2,
            Code::I32 | Code::U32 | Code::F32 => 4,
            Code::I64 | Code::U64 | Code::F64 => 8,
        }
    }

    pub fn format_char(&self) -> char {
        match self {
            Code::Pad => 'x',
            Code::Char => 'c',
            Code::I8 => 'b',
            Code::U8 => 'B',
            Code::Bool => '?',
            Code::I16 => 'h',
            Code::U16 => 'H',
            Code::I32 => 'i',
            Code::U32 => 'I',
            Code::I64 => 'q',
            Code::U64 => 'Q',
            Code::F32 => 'f',
            Code::F64 => 'd',
        }
    }

    /// Parses a format character. `l`/`L` use their standard 4-byte size.
    pub fn from_format_char(c: char) -> Option<Self> {
        match c {
            'x' => Some(Code::Pad),
            'c' => Some(Code::Char),
            'b' => Some(Code::I8),
            'B' => Some(Code::U8),
            '?' => Some(Code::Bool),
            'h' => Some(Code::I16),
            'H' => Some(Code::U16),
            'i' | 'l' => Some(Code::I32),
            'I' | 'L' => Some(Code::U32),
            'q' => Some(Code::I64),
            'Q' => Some(Code::U64),
            'f' => Some(Code::F32),
            'd' => Some(Code::F64),
            _ => None,
        }
    }

    /// Value stored by a field of this code when no default is declared.
    pub fn zero(&self) -> Value {
        match self {
            Code::Pad => Value::None,
            Code::Char => Value::Char(0),
            Code::Bool => Value::Bool(false),
            Code::I8 | Code::I16 | Code::I32 | Code::I64 => Value::Int(0),
            Code::U8 | Code::U16 | Code::U32 | Code::U64 => Value::UInt(0),
            Code::F32 | Code::F64 => Value::Float(0.0),
        }
    }

    fn int_range(&self) -> Option<(i128, i128)> {
        match self {
            Code::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Code::U8 | Code::Char => Some((0, u8::MAX as i128)),
            Code::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Code::U16 => Some((0, u16::MAX as i128)),
            Code::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Code::U32 => Some((0, u32::MAX as i128)),
            Code::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Code::U64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Code::Pad => "padding (no value)",
            Code::Char => "a single byte",
            Code::Bool => "bool",
            Code::I8 | Code::I16 | Code::I32 | Code::I64 => "signed integer",
            Code::U8 | Code::U16 | Code::U32 | Code::U64 => "unsigned integer",
            Code::F32 | Code::F64 => "float",
        }
    }

    /// Converts `value` into the canonical representation stored for this code.
    ///
    /// Signed integer codes store [`Value::Int`], unsigned ones [`Value::UInt`],
    /// float codes [`Value::Float`] (integers are widened).
    pub fn coerce(&self, field: &str, value: Value) -> Result<Value> {
        let mismatch = |value: &Value| Error::type_mismatch(field, self.expected(), value.kind());
        let out_of_range = |value: &Value| Error::OutOfRange {
            field: field.to_string(),
            code: self.format_char(),
            value: value.to_string(),
        };

        match self {
            Code::Pad => match value {
                Value::None => Ok(Value::None),
                other => Err(mismatch(&other)),
            },
            Code::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                other => Err(mismatch(&other)),
            },
            Code::F32 | Code::F64 => {
                let v = match value {
                    Value::Float(v) => v,
                    Value::Int(v) => v as f64,
                    Value::UInt(v) => v as f64,
                    other => return Err(mismatch(&other)),
                };
                // Finite values must stay finite at single precision.
                if *self == Code::F32 && v.is_finite() && (v as f32).is_infinite() {
                    return Err(out_of_range(&Value::Float(v)));
                }
                Ok(Value::Float(v))
            }
            Code::Char => match value {
                Value::Char(c) => Ok(Value::Char(c)),
                Value::Str(ref s) if s.len() == 1 => Ok(Value::Char(s.as_bytes()[0])),
                Value::Int(_) | Value::UInt(_) => {
                    let v = self.checked_int(&value).ok_or_else(|| out_of_range(&value))?;
                    Ok(Value::Char(v as u8))
                }
                other => Err(mismatch(&other)),
            },
            _ => match value {
                Value::Int(_) | Value::UInt(_) | Value::Char(_) => {
                    let v = self.checked_int(&value).ok_or_else(|| out_of_range(&value))?;
                    if self.is_signed() {
                        Ok(Value::Int(v as i64))
                    } else {
                        Ok(Value::UInt(v as u64))
                    }
                }
                other => Err(mismatch(&other)),
            },
        }
    }

    fn is_signed(&self) -> bool {
        matches!(self, Code::I8 | Code::I16 | Code::I32 | Code::I64)
    }

    fn checked_int(&self, value: &Value) -> Option<i128> {
        let v = match value {
            Value::Int(v) => *v as i128,
            Value::UInt(v) => *v as i128,
            Value::Char(v) => *v as i128,
            _ => return None,
        };
        let (min, max) = self.int_range()?;
        (min..=max).contains(&v).then_some(v)
    }
}
