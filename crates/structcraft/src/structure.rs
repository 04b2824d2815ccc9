//! Structure types: named, ordered slot layouts assembled and validated by
//! [StructBuilder].

use std::{fmt, sync::Arc};

use crate::{
    errors::DefinitionError,
    field::FieldDescriptor,
    layout::ByteOrder,
};

/// What a slot of a structure type is bound to.
#[derive(Debug, Clone)]
pub enum Binding {
    /// Declared but not yet resolved. A descendant must rebind it before the
    /// type can be instantiated.
    Unresolved,
    /// A scalar leaf field.
    Leaf(FieldDescriptor),
    /// A nested structure, packed with its own byte order.
    Nested(StructType),
}

impl Binding {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Binding::Unresolved)
    }
}

impl From<FieldDescriptor> for Binding {
    fn from(value: FieldDescriptor) -> Self {
        Binding::Leaf(value)
    }
}

impl From<&StructType> for Binding {
    fn from(value: &StructType) -> Self {
        Binding::Nested(value.clone())
    }
}

impl From<StructType> for Binding {
    fn from(value: StructType) -> Self {
        Binding::Nested(value)
    }
}

#[derive(Debug)]
struct StructTypeInner {
    name: String,
    parent: Option<StructType>,
    field_order: Vec<String>,
    byte_order: ByteOrder,
    /// Parallel to `field_order`.
    bindings: Vec<Binding>,
}

/// An immutable, validated structure layout. Cheap to clone; clones share
/// identity, which is what nested slots compare against.
#[derive(Clone)]
pub struct StructType(Arc<StructTypeInner>);

impl StructType {
    /// Starts the definition of a first-generation structure type.
    pub fn builder(name: impl Into<String>) -> StructBuilder {
        StructBuilder::new(name)
    }

    /// Starts the definition of a descendant of this type.
    pub fn derive(&self, name: impl Into<String>) -> StructBuilder {
        StructBuilder::new(name).parent(self)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&StructType> {
        self.0.parent.as_ref()
    }

    pub fn field_order(&self) -> &[String] {
        &self.0.field_order
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.0.byte_order
    }

    /// Slot bindings, in field order.
    pub fn bindings(&self) -> &[Binding] {
        &self.0.bindings
    }

    pub fn len(&self) -> usize {
        self.0.field_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.field_order.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.field_order.iter().position(|n| n == name)
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.index_of(name).map(|i| &self.0.bindings[i])
    }

    /// Names of slots that are still unresolved.
    pub fn abstract_fields(&self) -> impl Iterator<Item = &str> {
        self.0
            .field_order
            .iter()
            .zip(&self.0.bindings)
            .filter(|(_, b)| b.is_unresolved())
            .map(|(n, _)| n.as_str())
    }

    pub fn is_abstract(&self) -> bool {
        self.abstract_fields().next().is_some()
    }

    /// True if both handles refer to the same type definition.
    pub fn same_as(&self, other: &StructType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of bytes an instance packs to, or `None` while any slot, here or
    /// in a nested type, is unresolved.
    pub fn packed_size(&self) -> Option<usize> {
        self.0.bindings.iter().try_fold(0, |acc, b| match b {
            Binding::Unresolved => None,
            Binding::Leaf(field) => Some(acc + field.size()),
            Binding::Nested(nested) => nested.packed_size().map(|n| acc + n),
        })
    }

    /// Struct-style format string of this layout, for diagnostics. Nested
    /// types appear as `T{...}` with their own byte-order prefix; unresolved
    /// slots as `T{*}`.
    pub fn format(&self) -> String {
        let mut out = String::new();
        out.push(self.byte_order().prefix());
        for binding in self.bindings() {
            match binding {
                Binding::Unresolved => out.push_str("T{*}"),
                Binding::Leaf(field) => out.push(field.code().format_char()),
                Binding::Nested(nested) => {
                    out.push_str("T{");
                    out.push_str(&nested.format());
                    out.push('}');
                }
            }
        }
        out
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructType")
            .field("name", &self.0.name)
            .field("field_order", &self.0.field_order)
            .field("byte_order", &self.0.byte_order)
            .finish()
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Collects the declared attributes of a new structure type and validates
/// them in [`StructBuilder::build`].
#[derive(Debug, Clone)]
pub struct StructBuilder {
    name: String,
    parents: Vec<StructType>,
    field_order: Option<Vec<String>>,
    byte_order: Option<ByteOrder>,
    bindings: Vec<(String, Binding)>,
}

impl StructBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        StructBuilder {
            name: name.into(),
            parents: Vec::new(),
            field_order: None,
            byte_order: None,
            bindings: Vec::new(),
        }
    }

    /// Adds a direct parent. More than one is rejected at build time.
    pub fn parent(mut self, parent: &StructType) -> Self {
        self.parents.push(parent.clone());
        self
    }

    pub fn field_order<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_order = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = Some(byte_order);
        self
    }

    pub fn bind(mut self, name: impl Into<String>, binding: impl Into<Binding>) -> Self {
        self.bindings.push((name.into(), binding.into()));
        self
    }

    pub fn field(self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.bind(name, Binding::Leaf(field))
    }

    pub fn nested(self, name: impl Into<String>, struct_type: &StructType) -> Self {
        self.bind(name, Binding::Nested(struct_type.clone()))
    }

    pub fn abstract_field(self, name: impl Into<String>) -> Self {
        self.bind(name, Binding::Unresolved)
    }

    /// Validates the declaration and produces the structure type.
    pub fn build(self) -> Result<StructType, DefinitionError> {
        let name = self.name;
        if name.is_empty() {
            return Err(DefinitionError::EmptyName);
        }

        if self.parents.len() > 1 {
            return Err(DefinitionError::MultipleParents {
                name,
                count: self.parents.len(),
            });
        }
        let parent = self.parents.into_iter().next();

        let field_order = match (&parent, self.field_order) {
            (None, Some(order)) => order,
            (None, None) => return Err(DefinitionError::FieldOrderMissing { name }),
            (Some(parent), Some(_)) => {
                return Err(DefinitionError::FieldOrderRedeclared {
                    name,
                    parent: parent.name().to_string(),
                });
            }
            (Some(parent), None) => parent.field_order().to_vec(),
        };

        for (i, field) in field_order.iter().enumerate() {
            if field.is_empty() {
                return Err(DefinitionError::EmptyName);
            }
            if field_order[..i].contains(field) {
                return Err(DefinitionError::DuplicateFieldName {
                    name,
                    field: field.clone(),
                });
            }
        }

        let byte_order = self
            .byte_order
            .or(parent.as_ref().map(StructType::byte_order))
            .unwrap_or_default();

        let mut declared: Vec<Option<Binding>> = vec![None; field_order.len()];
        for (field, binding) in self.bindings {
            let Some(index) = field_order.iter().position(|n| *n == field) else {
                return Err(DefinitionError::NotInFieldOrder { name, field });
            };
            if declared[index].is_some() {
                return Err(DefinitionError::DuplicateBinding { name, field });
            }
            declared[index] = Some(binding);
        }

        let mut bindings = Vec::with_capacity(field_order.len());
        for (index, (field, binding)) in field_order.iter().zip(declared).enumerate() {
            let binding = match binding {
                Some(binding) => binding,
                None => match &parent {
                    Some(parent) => parent.bindings()[index].clone(),
                    None => {
                        return Err(DefinitionError::MissingDefinition {
                            name,
                            field: field.clone(),
                        });
                    }
                },
            };

            let binding = match binding {
                Binding::Leaf(descriptor) => {
                    Binding::Leaf(descriptor.normalized(field).map_err(|e| {
                        DefinitionError::InvalidDefault {
                            name: name.clone(),
                            field: field.clone(),
                            reason: e.to_string(),
                        }
                    })?)
                }
                other => other,
            };
            bindings.push(binding);
        }

        tracing::debug!(
            structure = %name,
            fields = field_order.len(),
            byte_order = %byte_order.prefix(),
            parent = parent.as_ref().map(StructType::name),
            "built structure type"
        );

        Ok(StructType(Arc::new(StructTypeInner {
            name,
            parent,
            field_order,
            byte_order,
            bindings,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Code;

    fn point() -> StructType {
        StructType::builder("Point")
            .field_order(["x", "y"])
            .field("x", FieldDescriptor::f64())
            .field("y", FieldDescriptor::f64())
            .build()
            .unwrap()
    }

    #[test]
    fn test_root_defaults_to_native() {
        let p = point();
        assert_eq!(p.byte_order(), ByteOrder::Native);
        assert_eq!(p.field_order(), ["x", "y"]);
        assert!(p.parent().is_none());
    }

    #[test]
    fn test_root_requires_field_order() {
        let err = StructType::builder("Point")
            .field("x", FieldDescriptor::f64())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::FieldOrderMissing {
                name: "Point".to_string()
            }
        );
    }

    #[test]
    fn test_descendant_may_not_redeclare_field_order() {
        let err = point()
            .derive("Point2")
            .field_order(["x", "y"])
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::FieldOrderRedeclared { .. }));
    }

    #[test]
    fn test_descendant_inherits_order_and_byte_order() {
        let base = StructType::builder("Header")
            .field_order(["magic", "len"])
            .byte_order(ByteOrder::Network)
            .field("magic", FieldDescriptor::u16())
            .field("len", FieldDescriptor::u16())
            .build()
            .unwrap();

        let child = base
            .derive("WideHeader")
            .field("len", FieldDescriptor::u32())
            .build()
            .unwrap();

        assert_eq!(child.field_order(), base.field_order());
        assert_eq!(child.byte_order(), ByteOrder::Network);
        assert_eq!(child.packed_size(), Some(6));
        assert!(child.parent().unwrap().same_as(&base));
    }

    #[test]
    fn test_descendant_overrides_byte_order() {
        let child = point()
            .derive("BigPoint")
            .byte_order(ByteOrder::BigEndian)
            .build()
            .unwrap();
        assert_eq!(child.byte_order(), ByteOrder::BigEndian);
    }

    #[test]
    fn test_multiple_parents_rejected() {
        let p = point();
        let err = StructType::builder("Both")
            .parent(&p)
            .parent(&p)
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::MultipleParents { count: 2, .. }));
    }

    #[test]
    fn test_attribute_not_in_field_order() {
        let err = StructType::builder("Point")
            .field_order(["x"])
            .field("x", FieldDescriptor::f64())
            .field("z", FieldDescriptor::f64())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::NotInFieldOrder {
                name: "Point".to_string(),
                field: "z".to_string()
            }
        );
    }

    #[test]
    fn test_field_order_name_without_definition() {
        let err = StructType::builder("Point")
            .field_order(["x", "y"])
            .field("x", FieldDescriptor::f64())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::MissingDefinition {
                name: "Point".to_string(),
                field: "y".to_string()
            }
        );
    }

    #[test]
    fn test_duplicates_rejected() {
        let err = StructType::builder("P")
            .field_order(["x", "x"])
            .field("x", FieldDescriptor::f64())
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateFieldName { .. }));

        let err = StructType::builder("P")
            .field_order(["x"])
            .field("x", FieldDescriptor::f64())
            .field("x", FieldDescriptor::f32())
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateBinding { .. }));
    }

    #[test]
    fn test_invalid_default_rejected_at_definition() {
        let err = StructType::builder("P")
            .field_order(["n"])
            .field("n", FieldDescriptor::u8().with_default(300))
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidDefault { .. }));
    }

    #[test]
    fn test_abstract_slots_carried_and_resolved() {
        let generic = StructType::builder("GenericBox")
            .field_order(["northwest", "southeast"])
            .abstract_field("northwest")
            .abstract_field("southeast")
            .build()
            .unwrap();
        assert!(generic.is_abstract());
        assert_eq!(generic.packed_size(), None);

        let half = generic.derive("HalfBox").nested("northwest", &point()).build().unwrap();
        assert_eq!(half.abstract_fields().collect::<Vec<_>>(), ["southeast"]);

        let full = half.derive("Box").nested("southeast", &point()).build().unwrap();
        assert!(!full.is_abstract());
        assert_eq!(full.packed_size(), Some(32));
    }

    #[test]
    fn test_format() {
        let p = point();
        let header = StructType::builder("Tagged")
            .field_order(["tag", "pad", "at"])
            .byte_order(ByteOrder::LittleEndian)
            .field("tag", FieldDescriptor::new(Code::U16))
            .field("pad", FieldDescriptor::pad())
            .nested("at", &p)
            .build()
            .unwrap();
        assert_eq!(header.format(), "<HxT{=dd}");
        assert_eq!(header.packed_size(), Some(19));
    }

    #[test]
    fn test_identity() {
        let a = point();
        let b = point();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
