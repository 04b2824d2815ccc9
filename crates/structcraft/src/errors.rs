//! Error types for structure definition and instance access.

use thiserror::Error;

/// Errors produced when building a [crate::structure::StructType].
///
/// All of these surface while the type is being defined, never while an
/// instance is being constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// More than one parent was supplied; only single inheritance is supported.
    #[error("structure '{name}' declares {count} parents, only one is allowed")]
    MultipleParents { name: String, count: usize },
    /// A descendant tried to declare its own field order.
    #[error("structure '{name}' may not redeclare field order inherited from '{parent}'")]
    FieldOrderRedeclared { name: String, parent: String },
    /// A first-generation structure did not declare a field order.
    #[error("structure '{name}' must declare a field order")]
    FieldOrderMissing { name: String },
    /// The same name appears twice in a field order.
    #[error("field '{field}' appears more than once in the field order of '{name}'")]
    DuplicateFieldName { name: String, field: String },
    /// The same name was bound twice in one definition.
    #[error("field '{field}' is bound more than once in '{name}'")]
    DuplicateBinding { name: String, field: String },
    /// A binding was declared for a name that is not in the field order.
    #[error("attribute '{field}' not included in the field order of '{name}'")]
    NotInFieldOrder { name: String, field: String },
    /// A field order entry has no binding, neither declared nor inherited.
    #[error("attribute '{field}' included in the field order of '{name}' but not defined")]
    MissingDefinition { name: String, field: String },
    /// A leaf field's default does not satisfy its own code.
    #[error("default for field '{field}' of '{name}' is invalid: {reason}")]
    InvalidDefault {
        name: String,
        field: String,
        reason: String,
    },
    /// Structure or field name is empty.
    #[error("structure and field names must not be empty")]
    EmptyName,
    /// A definition refers to a structure that has not been defined yet.
    #[error("unknown structure '{0}'")]
    UnknownStructure(String),
    /// A definition uses a format character with no scalar code.
    #[error("unknown format character '{0}'")]
    UnknownCode(char),
}

/// Errors produced while constructing, accessing or packing an [crate::instance::Instance].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The structure still carries an abstract slot and cannot be instantiated.
    #[error("field '{field}' of '{structure}' is abstract and must be overridden before instantiation")]
    AbstractField { structure: String, field: String },
    /// A value failed one of the field's validators.
    #[error("failed validator '{validator}' for field '{field}' with value {value}")]
    Validation {
        field: String,
        validator: String,
        value: String,
    },
    /// A value cannot satisfy the slot's declared type.
    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
    /// A value has the right kind but does not fit the slot's code.
    #[error("value {value} does not fit field '{field}' of type '{code}'")]
    OutOfRange {
        field: String,
        code: char,
        value: String,
    },
    /// Integer index past the end of the field order.
    #[error("index {index} out of range for structure with {len} fields")]
    IndexOutOfRange { index: i64, len: usize },
    /// Slice assignment with a sequence of the wrong length.
    #[error("slice assignment expects {expected} values, got {got}")]
    SliceLength { expected: usize, got: usize },
    /// A dot-delimited path could not be resolved.
    #[error("cannot resolve path '{path}': {reason}")]
    Path { path: String, reason: String },
    /// The key is not an integer, a slice or a string.
    #[error("unsupported key type {0}")]
    UnsupportedKey(String),
    /// The name is not part of the structure's field order.
    #[error("attribute '{0}' undefined for structure")]
    UnknownField(String),
    /// Too many positional arguments for a constructor or `update`.
    #[error("{call} expected at most {expected} arguments, got {got}")]
    Arity {
        call: String,
        expected: usize,
        got: usize,
    },
    /// The positional source is neither a mapping nor a sequence of pairs.
    #[error("update source must be a mapping or a sequence of name/value pairs, got {0}")]
    UpdateArgument(String),
    /// A prepared value could not be encoded with the field's code.
    #[error("field '{field}' cannot encode {value} as '{code}'")]
    Encode {
        field: String,
        code: char,
        value: String,
    },
}

impl Error {
    pub(crate) fn type_mismatch(
        field: &str,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            field: field.to_string(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn path(path: &str, reason: impl Into<String>) -> Self {
        Error::Path {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
