//! Leaf field descriptors: how a single scalar slot is validated, transformed,
//! sized and encoded.

use std::{fmt, sync::Arc};

use crate::{
    errors::{Error, Result},
    layout::Code,
    value::Value,
};

/// A pure value transform, run as a setter before encoding or as a getter
/// after decoding.
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A named predicate a value must satisfy before it is stored.
#[derive(Clone)]
pub struct Validator {
    name: String,
    check: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Validator {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Validator {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.name).finish()
    }
}

/// Describes one scalar slot of a structure.
///
/// The code is fixed at creation. Setters, getters and validators are
/// appended with the builder-style methods before the descriptor is bound
/// into a [crate::structure::StructType]; once bound it is shared and never
/// mutated again.
///
/// Values are stored raw: validators run on assignment, setters only run
/// when the value is prepared for encoding.
#[derive(Clone)]
pub struct FieldDescriptor {
    code: Code,
    default: Value,
    setters: Vec<Transform>,
    getters: Vec<Transform>,
    validators: Vec<Validator>,
}

impl FieldDescriptor {
    /// Creates a descriptor whose default is the code's zero value.
    pub fn new(code: Code) -> Self {
        FieldDescriptor {
            code,
            default: code.zero(),
            setters: Vec::new(),
            getters: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// A field that always holds `value`: it becomes the default and any other
    /// value fails the `match_value` validator.
    pub fn constant(code: Code, value: impl Into<Value>) -> Result<Self> {
        let expected = code.coerce("constant", value.into())?;
        let matcher = expected.clone();
        Ok(FieldDescriptor::new(code)
            .with_default(expected)
            .add_validator(Validator::new("match_value", move |v| *v == matcher)))
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn add_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.setters.push(Arc::new(setter));
        self
    }

    pub fn add_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.getters.push(Arc::new(getter));
        self
    }

    pub fn add_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Encoded width in bytes.
    pub fn size(&self) -> usize {
        self.code.size()
    }

    /// Returns the value currently stored in `slot`.
    pub fn get(&self, slot: &Value) -> Value {
        slot.clone()
    }

    /// Stores `value` into `slot`.
    ///
    /// [`Value::None`] selects the default. Anything else is coerced to the
    /// field's code and must pass every validator, in declaration order.
    pub fn set(&self, field: &str, slot: &mut Value, value: Value) -> Result<()> {
        if value.is_none() {
            *slot = self.default.clone();
            return Ok(());
        }

        let value = self.code.coerce(field, value)?;
        self.validate(field, &value)?;
        *slot = value;
        Ok(())
    }

    /// Runs every validator against `value`, failing on the first rejection.
    pub fn validate(&self, field: &str, value: &Value) -> Result<()> {
        match self.validators.iter().find(|v| !v.check(value)) {
            Some(validator) => Err(Error::Validation {
                field: field.to_string(),
                validator: validator.name().to_string(),
                value: value.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Applies the setters, in order, to the stored value.
    pub fn prep(&self, slot: &Value) -> Value {
        self.setters
            .iter()
            .fold(slot.clone(), |acc, setter| setter(acc))
    }

    /// Applies the getters, in order, to a decoded value and stores the result
    /// through [`FieldDescriptor::set`].
    pub fn unprep(&self, field: &str, slot: &mut Value, decoded: Value) -> Result<()> {
        let value = self
            .getters
            .iter()
            .fold(decoded, |acc, getter| getter(acc));
        self.set(field, slot, value)
    }

    /// Checks the declared default against the code and stores its canonical form.
    pub(crate) fn normalized(mut self, field: &str) -> Result<Self> {
        self.default = match self.default {
            Value::None => self.code.zero(),
            default => self.code.coerce(field, default)?,
        };
        Ok(self)
    }
}

macro_rules! code_constructors {
    ($($name:ident => $code:ident, $doc:literal;)+) => {
        impl FieldDescriptor {
            $(
                #[doc = $doc]
                pub fn $name() -> Self {
                    FieldDescriptor::new(Code::$code)
                }
            )+
        }
    };
}

code_constructors! {
    pad => Pad, "Padding byte.";
    char => Char, "String of length 1.";
    i8 => I8, "Signed char.";
    u8 => U8, "Unsigned char.";
    bool => Bool, "Boolean value.";
    i16 => I16, "Short.";
    u16 => U16, "Unsigned short.";
    i32 => I32, "Signed integer.";
    u32 => U32, "Unsigned integer.";
    i64 => I64, "Long long.";
    u64 => U64, "Unsigned long long.";
    f32 => F32, "Single precision float.";
    f64 => F64, "Double precision float.";
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("code", &self.code)
            .field("default", &self.default)
            .field("setters", &self.setters.len())
            .field("getters", &self.getters.len())
            .field("validators", &self.validators)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_none_stores_default() {
        let field = FieldDescriptor::i32().with_default(42);
        let mut slot = Value::Int(7);
        field.set("n", &mut slot, Value::None).unwrap();
        assert_eq!(slot, Value::from(42));
    }

    #[test]
    fn test_set_stores_raw_value() {
        let field = FieldDescriptor::f64().add_setter(|v| Value::Float(v.as_f64().unwrap() * 2.0));
        let mut slot = Value::Float(0.0);
        field.set("x", &mut slot, Value::Float(1.5)).unwrap();
        assert_eq!(field.get(&slot), Value::Float(1.5));
        assert_eq!(field.prep(&slot), Value::Float(3.0));
    }

    #[test]
    fn test_setters_run_in_order() {
        let field = FieldDescriptor::i64()
            .add_setter(|v| Value::Int(v.as_i64().unwrap() + 1))
            .add_setter(|v| Value::Int(v.as_i64().unwrap() * 10));
        assert_eq!(field.prep(&Value::Int(2)), Value::Int(30));
    }

    #[test]
    fn test_validator_failure_names_validator() {
        let field = FieldDescriptor::u8()
            .add_validator(Validator::new("even", |v| v.as_u64().is_some_and(|n| n % 2 == 0)));
        let mut slot = Value::UInt(0);

        assert!(field.set("n", &mut slot, Value::UInt(4)).is_ok());
        assert_eq!(
            field.set("n", &mut slot, Value::UInt(5)),
            Err(Error::Validation {
                field: "n".to_string(),
                validator: "even".to_string(),
                value: "5".to_string(),
            })
        );
        assert_eq!(slot, Value::UInt(4));
    }

    #[test]
    fn test_constant_field() {
        let field = FieldDescriptor::constant(Code::U16, 0xCAFEu16).unwrap();
        assert_eq!(field.default_value(), &Value::UInt(0xCAFE));

        let mut slot = Value::None;
        assert!(field.set("magic", &mut slot, Value::Int(0xCAFE)).is_ok());
        assert!(matches!(
            field.set("magic", &mut slot, Value::Int(1)),
            Err(Error::Validation { ref validator, .. }) if validator == "match_value"
        ));
    }

    #[test]
    fn test_unprep_runs_getters_then_set() {
        let field = FieldDescriptor::f32()
            .add_getter(|v| Value::Float(v.as_f64().unwrap() / 100.0))
            .add_validator(Validator::new("small", |v| v.as_f64().is_some_and(|f| f < 10.0)));
        let mut slot = Value::Float(0.0);

        field.unprep("t", &mut slot, Value::Int(250)).unwrap();
        assert_eq!(slot, Value::Float(2.5));
        assert!(field.unprep("t", &mut slot, Value::Int(5000)).is_err());
    }

    #[test]
    fn test_size_follows_code() {
        assert_eq!(FieldDescriptor::pad().size(), 1);
        assert_eq!(FieldDescriptor::u16().size(), 2);
        assert_eq!(FieldDescriptor::f64().size(), 8);
    }

    #[test]
    fn test_normalized_rejects_bad_default() {
        assert!(FieldDescriptor::u8().with_default(-1).normalized("n").is_err());
        let field = FieldDescriptor::f64().with_default(3).normalized("x").unwrap();
        assert_eq!(field.default_value(), &Value::Float(3.0));
    }
}
