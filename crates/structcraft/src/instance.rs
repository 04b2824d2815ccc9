//! Structure instances and their construction and access protocol.
//!
//! An [Instance] owns one slot per name in its type's field order. Leaf slots
//! hold a scalar [Value]; nested slots exclusively own another [Instance].
//! The per-slot metadata lives in the shared [StructType].

use std::fmt;

use crate::{
    errors::{Error, Result},
    key::Key,
    structure::{Binding, StructType},
    value::Value,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Leaf(Value),
    Nested(Instance),
}

/// A concrete value of a [StructType].
#[derive(Clone)]
pub struct Instance {
    struct_type: StructType,
    pub(crate) slots: Vec<Slot>,
}

/// Collects name/value pairs into the named-argument form taken by
/// [`StructType::new_instance`] and [`Instance::update`].
pub fn named<I, K, V>(pairs: I) -> Vec<(String, Value)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl StructType {
    /// Creates an instance with every slot set to its default.
    pub fn instance(&self) -> Result<Instance> {
        self.new_instance(Vec::new(), Vec::new())
    }

    /// Creates an instance from positional and named arguments.
    ///
    /// A single positional list is spread into positional arguments and a
    /// single positional map is treated as named arguments, with any explicit
    /// named arguments applied after the map's entries. Otherwise positional
    /// values fill slots in field order, named values are applied afterwards
    /// and win over positional ones, and untouched slots receive their default.
    pub fn new_instance(&self, positional: Vec<Value>, named: Vec<(String, Value)>) -> Result<Instance> {
        let (positional, named) = match <[Value; 1]>::try_from(positional) {
            Ok([Value::List(items)]) => (items, named),
            Ok([Value::Map(mut pairs)]) => {
                pairs.extend(named);
                (Vec::new(), pairs)
            }
            Ok([other]) => (vec![other], named),
            Err(positional) => (positional, named),
        };

        self.construct(positional, named)
    }

    /// Creates an instance from one value, the way a nested slot is filled:
    /// a list is positional, a map is named, an instance of this exact type is
    /// taken as-is, and anything else becomes the first positional argument.
    pub fn from_value(&self, value: impl Into<Value>) -> Result<Instance> {
        match value.into() {
            Value::Struct(instance) if instance.struct_type.same_as(self) => Ok(instance),
            Value::None => self.instance(),
            Value::List(items) => self.construct(items, Vec::new()),
            Value::Map(pairs) => self.construct(Vec::new(), pairs),
            other => self.construct(vec![other], Vec::new()),
        }
    }

    fn construct(&self, positional: Vec<Value>, named: Vec<(String, Value)>) -> Result<Instance> {
        if let Some(field) = self.abstract_fields().next() {
            return Err(Error::AbstractField {
                structure: self.name().to_string(),
                field: field.to_string(),
            });
        }

        if positional.len() > self.len() {
            return Err(Error::Arity {
                call: self.name().to_string(),
                expected: self.len(),
                got: positional.len(),
            });
        }

        let mut positional = positional.into_iter();
        let mut slots = Vec::with_capacity(self.len());
        for (name, binding) in self.field_order().iter().zip(self.bindings()) {
            let value = positional.next().unwrap_or(Value::None);
            slots.push(make_slot(self, name, binding, value)?);
        }

        let mut instance = Instance {
            struct_type: self.clone(),
            slots,
        };
        for (name, value) in named {
            instance.set(&name, value)?;
        }

        Ok(instance)
    }
}

fn make_slot(owner: &StructType, name: &str, binding: &Binding, value: Value) -> Result<Slot> {
    match binding {
        Binding::Unresolved => Err(Error::AbstractField {
            structure: owner.name().to_string(),
            field: name.to_string(),
        }),
        Binding::Leaf(field) => {
            let mut slot = Value::None;
            field.set(name, &mut slot, value)?;
            Ok(Slot::Leaf(slot))
        }
        Binding::Nested(nested) => coerce_nested(nested, name, value).map(Slot::Nested),
    }
}

fn coerce_nested(nested: &StructType, name: &str, value: Value) -> Result<Instance> {
    match value {
        Value::Struct(instance) if !instance.struct_type.same_as(nested) => Err(Error::type_mismatch(
            name,
            format!("structure '{}'", nested.name()),
            format!("structure '{}'", instance.struct_type.name()),
        )),
        value => nested.from_value(value),
    }
}

impl Instance {
    pub fn struct_type(&self) -> &StructType {
        &self.struct_type
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.struct_type.index_of(name).is_some()
    }

    pub fn keys(&self) -> &[String] {
        self.struct_type.field_order()
    }

    /// Slot values in field order; nested slots yield [`Value::Struct`].
    pub fn values(&self) -> Vec<Value> {
        (0..self.len()).map(|i| self.value_at(i)).collect()
    }

    pub fn items(&self) -> Vec<(String, Value)> {
        self.iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> + '_ {
        self.keys()
            .iter()
            .enumerate()
            .map(|(i, k)| (k.as_str(), self.value_at(i)))
    }

    fn index(&self, name: &str) -> Result<usize> {
        self.struct_type
            .index_of(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    fn value_at(&self, index: usize) -> Value {
        match (&self.slots[index], &self.struct_type.bindings()[index]) {
            (Slot::Leaf(value), Binding::Leaf(field)) => field.get(value),
            (Slot::Leaf(value), _) => value.clone(),
            (Slot::Nested(instance), _) => Value::Struct(instance.clone()),
        }
    }

    /// Reads a field by name.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.index(name).map(|i| self.value_at(i))
    }

    /// Borrows a nested instance by name.
    pub fn get_struct(&self, name: &str) -> Result<&Instance> {
        let index = self.index(name)?;
        match &self.slots[index] {
            Slot::Nested(instance) => Ok(instance),
            Slot::Leaf(value) => Err(Error::type_mismatch(name, "nested structure", value.kind())),
        }
    }

    pub fn get_struct_mut(&mut self, name: &str) -> Result<&mut Instance> {
        let index = self.index(name)?;
        match &mut self.slots[index] {
            Slot::Nested(instance) => Ok(instance),
            Slot::Leaf(value) => Err(Error::type_mismatch(name, "nested structure", value.kind())),
        }
    }

    /// Writes a field by name: leaves go through their descriptor's `set`,
    /// nested slots are replaced under the same type contract as construction.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index(name)?;
        self.set_at(index, value.into())
    }

    fn set_at(&mut self, index: usize, value: Value) -> Result<()> {
        let struct_type = self.struct_type.clone();
        let name = &struct_type.field_order()[index];
        match (&struct_type.bindings()[index], &mut self.slots[index]) {
            (Binding::Leaf(field), Slot::Leaf(slot)) => field.set(name, slot, value),
            (Binding::Nested(nested), slot) => {
                *slot = Slot::Nested(coerce_nested(nested, name, value)?);
                Ok(())
            }
            (binding, slot) => {
                *slot = make_slot(&struct_type, name, binding, value)?;
                Ok(())
            }
        }
    }

    /// Stores a value coming back from a decoder: the field's getters run
    /// first, then the usual `set`.
    pub fn store_decoded(&mut self, name: &str, decoded: Value) -> Result<()> {
        let index = self.index(name)?;
        let struct_type = self.struct_type.clone();
        match (&struct_type.bindings()[index], &mut self.slots[index]) {
            (Binding::Leaf(field), Slot::Leaf(slot)) => field.unprep(name, slot, decoded),
            _ => Err(Error::type_mismatch(name, "leaf field", "nested structure")),
        }
    }

    fn resolve_index(&self, index: i64) -> Result<usize> {
        usize::try_from(index)
            .ok()
            .filter(|i| *i < self.len())
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    /// Splits a path into the instance owning its last segment and that segment.
    fn walk(&self, path: &str) -> Result<(&Instance, String)> {
        let mut segments = path.split('.');
        let last = segments.next_back().unwrap_or_default();
        let mut current = self;
        for segment in segments {
            current = current.descend(path, segment)?;
        }
        check_segment(path, last, current)?;
        Ok((current, last.to_string()))
    }

    fn walk_mut(&mut self, path: &str) -> Result<(&mut Instance, String)> {
        let mut segments = path.split('.');
        let last = segments.next_back().unwrap_or_default();
        let mut current = self;
        for segment in segments {
            current.descend(path, segment)?;
            current = current.get_struct_mut(segment)?;
        }
        check_segment(path, last, current)?;
        Ok((current, last.to_string()))
    }

    fn descend(&self, path: &str, segment: &str) -> Result<&Instance> {
        check_segment(path, segment, self)?;
        self.get_struct(segment)
            .map_err(|_| Error::path(path, format!("'{segment}' is not a nested structure")))
    }

    /// Reads by index, slice or path. Slices yield a [`Value::List`].
    pub fn get_item(&self, key: impl Into<Key>) -> Result<Value> {
        match key.into() {
            Key::Index(i) => self.resolve_index(i).map(|i| self.value_at(i)),
            Key::Slice { start, end } => Ok(Value::List(
                Key::bounds(start, end, self.len())
                    .map(|i| self.value_at(i))
                    .collect(),
            )),
            Key::Path(path) => {
                let (owner, name) = self.walk(&path)?;
                owner.get(&name)
            }
        }
    }

    /// Writes by index, slice or path. Slice assignment takes a list of exactly
    /// the slice's length and is applied all-or-nothing.
    pub fn set_item(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match key.into() {
            Key::Index(i) => {
                let index = self.resolve_index(i)?;
                self.set_at(index, value)
            }
            Key::Slice { start, end } => {
                let range = Key::bounds(start, end, self.len());
                let items = match value {
                    Value::List(items) => items,
                    other => return Err(Error::type_mismatch("[slice]", "list", other.kind())),
                };
                if items.len() != range.len() {
                    return Err(Error::SliceLength {
                        expected: range.len(),
                        got: items.len(),
                    });
                }

                let mut staged = self.clone();
                for (index, item) in range.zip(items) {
                    staged.set_at(index, item)?;
                }
                *self = staged;
                Ok(())
            }
            Key::Path(path) => {
                let (owner, name) = self.walk_mut(&path)?;
                owner.set(&name, value)
            }
        }
    }

    /// Reads with a dynamically typed key; see [`Key`]'s `TryFrom<&Value>`.
    pub fn get_value_key(&self, key: &Value) -> Result<Value> {
        self.get_item(Key::try_from(key)?)
    }

    pub fn set_value_key(&mut self, key: &Value, value: impl Into<Value>) -> Result<()> {
        self.set_item(Key::try_from(key)?, value)
    }

    /// Bulk assignment. `positional` holds at most one source, either a map or
    /// a list of `[name, value]` pairs; it is applied first, then `named`.
    /// The instance is left untouched if any assignment fails.
    pub fn update(&mut self, positional: Vec<Value>, named: Vec<(String, Value)>) -> Result<()> {
        if positional.len() > 1 {
            return Err(Error::Arity {
                call: "update".to_string(),
                expected: 1,
                got: positional.len(),
            });
        }

        let source = match positional.into_iter().next() {
            None => Vec::new(),
            Some(Value::Map(pairs)) => pairs,
            Some(Value::List(items)) => items
                .into_iter()
                .map(into_pair)
                .collect::<Result<Vec<_>>>()?,
            Some(other) => return Err(Error::UpdateArgument(other.kind())),
        };

        let mut staged = self.clone();
        for (name, value) in source.into_iter().chain(named) {
            staged.set(&name, value)?;
        }
        *self = staged;
        Ok(())
    }
}

fn check_segment(path: &str, segment: &str, owner: &Instance) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::path(path, "empty path segment"));
    }
    if !owner.contains(segment) {
        return Err(Error::path(
            path,
            format!("no field '{segment}' in '{}'", owner.struct_type.name()),
        ));
    }
    Ok(())
}

fn into_pair(item: Value) -> Result<(String, Value)> {
    match item {
        Value::List(pair) if pair.len() == 2 => {
            let mut pair = pair.into_iter();
            match (pair.next(), pair.next()) {
                (Some(Value::Str(name)), Some(value)) => Ok((name, value)),
                _ => Err(Error::UpdateArgument("list".to_string())),
            }
        }
        other => Err(Error::UpdateArgument(other.kind())),
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.struct_type.same_as(&other.struct_type) && self.slots == other.slots
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.struct_type.name());
        for (name, value) in self.iter() {
            s.field(name, &value);
        }
        s.finish()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.struct_type.name())?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDescriptor, Validator};

    fn point() -> StructType {
        StructType::builder("Point")
            .field_order(["x", "y"])
            .field("x", FieldDescriptor::f64())
            .field("y", FieldDescriptor::f64())
            .build()
            .unwrap()
    }

    fn items(pairs: &[(&str, f64)]) -> Vec<(String, Value)> {
        named(pairs.iter().copied())
    }

    #[test]
    fn test_default_construction() {
        let p = point().instance().unwrap();
        assert_eq!(p.items(), items(&[("x", 0.0), ("y", 0.0)]));
        assert_eq!(p.get_item(0).unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_named_wins_over_positional() {
        let p = point()
            .new_instance(vec![1.0.into(), 2.0.into()], named([("x", 9.0)]))
            .unwrap();
        assert_eq!(p.items(), items(&[("x", 9.0), ("y", 2.0)]));
    }

    #[test]
    fn test_too_many_positional() {
        let err = point()
            .new_instance(vec![1.0.into(), 2.0.into(), 3.0.into()], Vec::new())
            .unwrap_err();
        assert_eq!(
            err,
            Error::Arity {
                call: "Point".to_string(),
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_unknown_named_argument() {
        let err = point().new_instance(Vec::new(), named([("z", 1.0)])).unwrap_err();
        assert_eq!(err, Error::UnknownField("z".to_string()));
    }

    #[test]
    fn test_single_scalar_fills_first_slot() {
        let p = point().from_value(4.0).unwrap();
        assert_eq!(p.items(), items(&[("x", 4.0), ("y", 0.0)]));
    }

    #[test]
    fn test_validation_during_construction() {
        let t = StructType::builder("Positive")
            .field_order(["n"])
            .field(
                "n",
                FieldDescriptor::i32()
                    .add_validator(Validator::new("positive", |v| v.as_i64().is_some_and(|n| n > 0)))
                    .with_default(1),
            )
            .build()
            .unwrap();

        assert!(t.instance().is_ok());
        assert!(matches!(
            t.from_value(-5),
            Err(Error::Validation { ref validator, .. }) if validator == "positive"
        ));
    }

    #[test]
    fn test_get_struct_on_leaf_fails() {
        let p = point().instance().unwrap();
        assert!(matches!(p.get_struct("x"), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_path_errors() {
        let p = point().instance().unwrap();
        assert!(matches!(p.get_item("z"), Err(Error::Path { .. })));
        assert!(matches!(p.get_item("x.y"), Err(Error::Path { .. })));
        assert!(matches!(p.get_item("x."), Err(Error::Path { .. })));
    }

    #[test]
    fn test_slice_length_mismatch_leaves_instance_unchanged() {
        let mut p = point().from_value([1.0, 2.0]).unwrap();
        assert_eq!(
            p.set_item(.., vec![5.0]),
            Err(Error::SliceLength {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(p.values(), vec![Value::Float(1.0), Value::Float(2.0)]);
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let mut p = point().instance().unwrap();
        let err = p
            .update(vec![Value::map([("x", 1.0)])], named([("y", "nope")]))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(p.get("x").unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_dynamic_key_rejected() {
        let p = point().instance().unwrap();
        assert_eq!(
            p.get_value_key(&Value::Bool(true)),
            Err(Error::UnsupportedKey("bool".to_string()))
        );
        assert_eq!(p.get_value_key(&Value::Int(1)).unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_store_decoded_runs_getters() {
        let t = StructType::builder("Reading")
            .field_order(["centi"])
            .field(
                "centi",
                FieldDescriptor::f32().add_getter(|v| Value::Float(v.as_f64().unwrap_or(0.0) / 100.0)),
            )
            .build()
            .unwrap();
        let mut r = t.instance().unwrap();
        r.store_decoded("centi", Value::Int(1250)).unwrap();
        assert_eq!(r.get("centi").unwrap(), Value::Float(12.5));
    }

    #[test]
    fn test_display() {
        let p = point().from_value([1.0, 2.5]).unwrap();
        assert_eq!(p.to_string(), "Point(x=1.0, y=2.5)");
    }
}
