//! User-supplied constructor arguments and their declared types.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

/// Identity of a reference type carried by [`Value::Object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectType {
    id: TypeId,
    name: &'static str,
}

impl ObjectType {
    /// Returns the identity of `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the Rust type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

/// Declared type of a value parameter.
///
/// Primitive types accept only their own [`Value`] variant. `String` and
/// `Object` are reference types: they also accept [`Value::Null`] and default
/// to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `boolean`.
    Bool,
    /// `byte`.
    Byte,
    /// `short`.
    Short,
    /// `int`.
    Int,
    /// `long`.
    Long,
    /// `float`.
    Float,
    /// `double`.
    Double,
    /// `char`.
    Char,
    /// `String`.
    String,
    /// An arbitrary shared object of the given type.
    Object(ObjectType),
}

impl ValueType {
    /// Returns the object type for `T`.
    #[must_use]
    pub fn object<T: Any>() -> Self {
        Self::Object(ObjectType::of::<T>())
    }

    /// Returns `true` for types that cannot hold [`Value::Null`].
    #[must_use]
    pub const fn is_primitive(self) -> bool {
        !matches!(self, Self::String | Self::Object(_))
    }

    /// Returns `true` when `value` may be bound to a parameter of this type.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::String | Self::Object(_), Value::Null)
            | (Self::Bool, Value::Bool(_))
            | (Self::Byte, Value::Byte(_))
            | (Self::Short, Value::Short(_))
            | (Self::Int, Value::Int(_))
            | (Self::Long, Value::Long(_))
            | (Self::Float, Value::Float(_))
            | (Self::Double, Value::Double(_))
            | (Self::Char, Value::Char(_))
            | (Self::String, Value::String(_)) => true,
            (Self::Object(expected), Value::Object(object)) => expected.id == object.ty.id,
            _ => false,
        }
    }

    /// Returns the value bound when no argument is supplied.
    #[must_use]
    pub const fn zero(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Byte => Value::Byte(0),
            Self::Short => Value::Short(0),
            Self::Int => Value::Int(0),
            Self::Long => Value::Long(0),
            Self::Float => Value::Float(0.0),
            Self::Double => Value::Double(0.0),
            Self::Char => Value::Char('\0'),
            Self::String | Self::Object(_) => Value::Null,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::String => "String",
            Self::Object(object) => object.name,
        };
        f.write_str(name)
    }
}

/// A shared object passed as a constructor argument.
#[derive(Clone)]
pub struct ObjectValue {
    ty: ObjectType,
    value: Arc<dyn Any + Send + Sync>,
}

impl ObjectValue {
    /// Wraps `value`.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value without cloning it.
    #[must_use]
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            ty: ObjectType::of::<T>(),
            value,
        }
    }

    /// Returns the type of the wrapped value.
    #[must_use]
    pub const fn object_type(&self) -> ObjectType {
        self.ty
    }

    /// Returns the wrapped value when it is a `T`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectValue")
            .field("type", &self.ty.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// A constructor argument declared by a plugin.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent reference.
    Null,
    /// `boolean`.
    Bool(bool),
    /// `byte`.
    Byte(i8),
    /// `short`.
    Short(i16),
    /// `int`.
    Int(i32),
    /// `long`.
    Long(i64),
    /// `float`.
    Float(f32),
    /// `double`.
    Double(f64),
    /// `char`.
    Char(char),
    /// `String`.
    String(String),
    /// Shared object.
    Object(ObjectValue),
}

impl Value {
    /// Wraps an arbitrary object.
    #[must_use]
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(ObjectValue::new(value))
    }

    /// Returns the runtime type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Bool(_) => ValueType::Bool.to_string(),
            Self::Byte(_) => ValueType::Byte.to_string(),
            Self::Short(_) => ValueType::Short.to_string(),
            Self::Int(_) => ValueType::Int.to_string(),
            Self::Long(_) => ValueType::Long.to_string(),
            Self::Float(_) => ValueType::Float.to_string(),
            Self::Double(_) => ValueType::Double.to_string(),
            Self::Char(_) => ValueType::Char.to_string(),
            Self::String(_) => ValueType::String.to_string(),
            Self::Object(object) => object.ty.name.to_owned(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Self::Byte(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Self::Short(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
