//! # structcraft
//!
//! Declarative fixed-layout binary records.
//!
//! A [StructType] is an ordered set of named slots, each bound to a scalar
//! [FieldDescriptor] or to another structure type. Types are validated once,
//! when built, and support single inheritance: a descendant keeps its
//! parent's field order and may rebind slots, which is how abstract slots get
//! resolved. [Instance]s are built from positional, named, list or map
//! arguments, accessed by name, index, slice or dot path, and packed to bytes
//! with each structure's own byte order.
//!
//! ## Example
//!
//! ```
//! use structcraft::{FieldDescriptor, StructType, Value};
//!
//! let point = StructType::builder("Point")
//!     .field_order(["x", "y"])
//!     .field("x", FieldDescriptor::f64())
//!     .field("y", FieldDescriptor::f64())
//!     .build()
//!     .unwrap();
//! let bbox = StructType::builder("BoundingBox")
//!     .field_order(["northwest", "southeast"])
//!     .nested("northwest", &point)
//!     .nested("southeast", &point)
//!     .build()
//!     .unwrap();
//!
//! let mut bb = bbox.from_value(Value::list([[0.0, 10.0], [15.0, 0.0]])).unwrap();
//! bb.set_item("northwest.y", 15.0).unwrap();
//! assert_eq!(bb.get_struct("northwest").unwrap().get("y").unwrap(), Value::Float(15.0));
//! assert_eq!(bb.pack().unwrap().len(), 32);
//! ```

pub mod errors;
pub mod field;
pub mod instance;
pub mod key;
pub mod layout;
pub mod pack;
#[cfg(feature = "serde")]
pub mod serde;
pub mod structure;
pub mod value;

pub use errors::{DefinitionError, Error, Result};
pub use field::{FieldDescriptor, Transform, Validator};
pub use instance::{Instance, named};
pub use key::Key;
pub use layout::{ByteOrder, Code};
pub use structure::{Binding, StructBuilder, StructType};
pub use value::Value;
