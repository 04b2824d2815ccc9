//! Recursive, byte-order aware serialization of instances.
//!
//! Each leaf is encoded at its code's fixed width using the byte order of the
//! structure that owns it. Nested instances are packed with their own type's
//! byte order. Runs are concatenated in field order with no implicit padding.

use byteorder::{BigEndian, ByteOrder as Endian, LittleEndian, NativeEndian};

use crate::{
    errors::{Error, Result},
    instance::{Instance, Slot},
    layout::{ByteOrder, Code},
    structure::Binding,
    value::Value,
};

impl Instance {
    /// Serializes the instance. Setters run on each leaf value; the instance
    /// itself is not modified.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.packed_size());
        self.pack_into(&mut buf)?;
        tracing::trace!(
            structure = %self.struct_type().name(),
            bytes = buf.len(),
            "packed instance"
        );
        Ok(buf)
    }

    /// Appends the packed bytes to `buf`.
    pub fn pack_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        let struct_type = self.struct_type();
        let byte_order = struct_type.byte_order();

        for ((name, binding), slot) in struct_type
            .field_order()
            .iter()
            .zip(struct_type.bindings())
            .zip(&self.slots)
        {
            match (binding, slot) {
                (Binding::Leaf(field), Slot::Leaf(value)) => {
                    let prepped = field.prep(value);
                    encode_leaf(buf, byte_order, name, field.code(), prepped)?;
                }
                (_, Slot::Nested(nested)) => nested.pack_into(buf)?,
                (_, Slot::Leaf(_)) => {
                    return Err(Error::AbstractField {
                        structure: struct_type.name().to_string(),
                        field: name.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Length of [`Instance::pack`]'s output.
    pub fn packed_size(&self) -> usize {
        self.struct_type()
            .bindings()
            .iter()
            .zip(&self.slots)
            .map(|(binding, slot)| match (binding, slot) {
                (Binding::Leaf(field), _) => field.size(),
                (_, Slot::Nested(nested)) => nested.packed_size(),
                _ => 0,
            })
            .sum()
    }
}

/// Encodes one prepared leaf value.
pub fn encode_leaf(
    buf: &mut Vec<u8>,
    byte_order: ByteOrder,
    field: &str,
    code: Code,
    value: Value,
) -> Result<()> {
    let value = code.coerce(field, value).map_err(|e| match e {
        Error::TypeMismatch { found, .. } => Error::Encode {
            field: field.to_string(),
            code: code.format_char(),
            value: found,
        },
        other => other,
    })?;

    match byte_order {
        ByteOrder::Native => write_scalar::<NativeEndian>(buf, code, &value),
        ByteOrder::LittleEndian => write_scalar::<LittleEndian>(buf, code, &value),
        ByteOrder::BigEndian | ByteOrder::Network => write_scalar::<BigEndian>(buf, code, &value),
    }

    Ok(())
}

/// Writes a value already coerced to `code`.
fn write_scalar<E: Endian>(buf: &mut Vec<u8>, code: Code, value: &Value) {
    let mut scratch = [0u8; 8];
    let out = &mut scratch[..code.size()];

    let int = value.as_i64().unwrap_or(0);
    let uint = value.as_u64().unwrap_or(0);
    let float = value.as_f64().unwrap_or(0.0);

    match code {
        Code::Pad => {}
        Code::Char | Code::U8 => out[0] = uint as u8,
        Code::I8 => out[0] = int as i8 as u8,
        Code::Bool => out[0] = value.as_bool().unwrap_or(false) as u8,
        Code::I16 => E::write_i16(out, int as i16),
        Code::U16 => E::write_u16(out, uint as u16),
        Code::I32 => E::write_i32(out, int as i32),
        Code::U32 => E::write_u32(out, uint as u32),
        Code::I64 => E::write_i64(out, int),
        Code::U64 => E::write_u64(out, uint),
        Code::F32 => E::write_f32(out, float as f32),
        Code::F64 => E::write_f64(out, float),
    }

    buf.extend_from_slice(out);
}
