//! Reusable setters, getters and validators for `structcraft` fields.
//!
//! A [`Transform`] maps between the value a field stores and the value that
//! is encoded:
//! - **Numeric modifiers**: `scale` and `offset`, encoded as `value * scale + offset`.
//! - **Clamp**: optional bounds applied to the encoded value.
//! - **Round**: encode to the nearest integer, for integer-coded fields.
//!
//! ## Transform order
//!
//! Encoding applies, in order:
//! 1. Numeric modifiers (scale, offset)
//! 2. Clamp
//! 3. Round
//!
//! Decoding applies the inverse of the numeric modifiers, then rounds when
//! configured. Clamping is not reversible and is skipped on decode.
//!
//! # Example
//!
//! ```
//! use structcraft::{FieldDescriptor, StructType, Value};
//! use structcraft_transform::Transform;
//!
//! // Stores degrees Celsius, encodes Kelvin.
//! let mut kelvin = Transform::new();
//! kelvin.set_offset(273.15);
//! let field = kelvin.apply_to(FieldDescriptor::f64()).unwrap();
//!
//! let t = StructType::builder("Reading")
//!     .field_order(["temp"])
//!     .field("temp", field)
//!     .build()
//!     .unwrap();
//! let r = t.from_value(20.0).unwrap();
//! assert_eq!(r.get("temp").unwrap(), Value::Float(20.0));
//! assert_eq!(r.pack().unwrap(), 293.15f64.to_ne_bytes());
//! ```

use structcraft::{FieldDescriptor, Validator, Value};
use thiserror::Error;

/// Errors raised when a [`Transform`] is configured inconsistently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Scale or offset is non-finite (NaN or infinity).
    #[error("scale and offset must be finite")]
    InvalidScaleOffset,
    /// Scale is zero, so the transform cannot be inverted.
    #[error("scale must not be zero")]
    ZeroScale,
    /// Clamp bounds are non-finite or `min > max`.
    #[error("invalid clamp bounds [{min}, {max}]")]
    InvalidClamp { min: f64, max: f64 },
}

/// Configuration for mapping stored values to encoded values and back.
///
/// Use the builder-style setters (`set_scale`, `set_clamp`, etc.) to
/// configure, then [`apply_to`](Transform::apply_to) a field descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transform {
    /// If set, multiply the stored value by this before adding offset.
    pub scale: Option<f64>,
    /// If set, add this to the (possibly scaled) value.
    pub offset: Option<f64>,
    /// If set, restrict the encoded value to `[min, max]`.
    pub clamp: Option<(f64, f64)>,
    /// If true, produce integers in both directions.
    pub round: Option<bool>,
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scale factor: encoded = value * scale + offset.
    pub fn set_scale(&mut self, scale: f64) -> &mut Self {
        self.scale = Some(scale);
        self
    }

    /// Sets the offset: encoded = value * scale + offset.
    pub fn set_offset(&mut self, offset: f64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn set_clamp(&mut self, min: f64, max: f64) -> &mut Self {
        self.clamp = Some((min, max));
        self
    }

    pub fn set_round(&mut self, round: bool) -> &mut Self {
        self.round = Some(round);
        self
    }

    /// Checks that scale, offset and clamp are usable.
    pub fn validate(&self) -> Result<(), TransformError> {
        let scale = self.scale.unwrap_or(1.0);
        let offset = self.offset.unwrap_or(0.0);

        if !scale.is_finite() || !offset.is_finite() {
            return Err(TransformError::InvalidScaleOffset);
        }
        if scale == 0.0 {
            return Err(TransformError::ZeroScale);
        }
        if let Some((min, max)) = self.clamp {
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(TransformError::InvalidClamp { min, max });
            }
        }

        Ok(())
    }

    /// Maps a stored value to the value handed to the encoder. Non-numeric
    /// values pass through unchanged.
    pub fn encode(&self, value: Value) -> Value {
        let Some(mut v) = value.as_f64() else {
            return value;
        };

        v = v * self.scale.unwrap_or(1.0) + self.offset.unwrap_or(0.0);
        if let Some((min, max)) = self.clamp {
            v = v.clamp(min, max);
        }

        self.finish(v)
    }

    /// Maps a decoded value back to the value to store.
    pub fn decode(&self, value: Value) -> Value {
        let Some(v) = value.as_f64() else {
            return value;
        };

        self.finish((v - self.offset.unwrap_or(0.0)) / self.scale.unwrap_or(1.0))
    }

    /// Rounds to an integer when configured. Values with no integer
    /// representation stay floats, so an integer-coded field rejects them at
    /// pack time instead of storing a saturated number.
    fn finish(&self, v: f64) -> Value {
        const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;
        const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

        if !self.round.unwrap_or(false) {
            return Value::Float(v);
        }

        let r = v.round();
        if (-I64_LIMIT..I64_LIMIT).contains(&r) {
            Value::Int(r as i64)
        } else if (0.0..U64_LIMIT).contains(&r) {
            Value::UInt(r as u64)
        } else {
            Value::Float(r)
        }
    }

    /// Installs this transform as a setter and its inverse as a getter.
    pub fn apply_to(&self, field: FieldDescriptor) -> Result<FieldDescriptor, TransformError> {
        self.validate()?;

        let encoder = self.clone();
        let decoder = self.clone();
        Ok(field
            .add_setter(move |v| encoder.encode(v))
            .add_getter(move |v| decoder.decode(v)))
    }
}

/// Accepts numeric values within `[min, max]`.
pub fn in_range(min: f64, max: f64) -> Validator {
    Validator::new("in_range", move |v| {
        v.as_f64().is_some_and(|x| (min..=max).contains(&x))
    })
}

/// Accepts values equal to one of `allowed`.
pub fn one_of<I, V>(allowed: I) -> Validator
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
    Validator::new("one_of", move |v| {
        allowed
            .iter()
            .any(|a| a == v || (a.as_f64().is_some() && a.as_f64() == v.as_f64()))
    })
}

/// Rejects NaN and infinities.
pub fn finite() -> Validator {
    Validator::new("finite", |v| v.as_f64().is_some_and(f64::is_finite))
}
