//! Typed cursor over the arguments bound for one constructor.

use std::any::Any;
use std::sync::Arc;

use crate::ambient::{
    AmbientValue, ByteCodeInstrumentor, InstrumentClass, MethodDescriptor, MethodInfo,
    TraceContext,
};
use crate::context::PluginContext;
use crate::error::ConstructionCause;

use super::value::Value;

/// One argument chosen for a constructor parameter.
#[derive(Debug, Clone)]
pub enum BoundArg {
    /// Taken from the ambient context.
    Ambient(AmbientValue),
    /// A user argument or the parameter type's zero value.
    Value(Value),
}

impl BoundArg {
    fn describe(&self) -> String {
        match self {
            Self::Ambient(value) => value.kind().to_string(),
            Self::Value(value) => value.type_name(),
        }
    }
}

/// Hands bound arguments to a constructor factory in parameter order.
///
/// Each `next_*` call consumes one argument. Asking for a type other than the
/// one the signature declared at that position is a factory bug and fails
/// with [`ConstructionCause::Factory`].
#[derive(Debug)]
pub struct ConstructorArgs {
    args: std::vec::IntoIter<BoundArg>,
    position: usize,
}

macro_rules! primitive_accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty, $label:literal) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns [`ConstructionCause::Factory`] when the next argument has a
        /// different type or the arguments are exhausted.
        pub fn $name(&mut self) -> Result<$ty, ConstructionCause> {
            match self.next_bound($label)? {
                BoundArg::Value(Value::$variant(value)) => Ok(value),
                other => Err(self.mismatch($label, &other)),
            }
        }
    };
}

macro_rules! ambient_accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns [`ConstructionCause::Factory`] when the next argument has a
        /// different type or the arguments are exhausted.
        pub fn $name(&mut self) -> Result<Option<Arc<$ty>>, ConstructionCause> {
            let label = stringify!($variant);
            match self.next_bound(label)? {
                BoundArg::Ambient(AmbientValue::$variant(value)) => Ok(value),
                other => Err(self.mismatch(label, &other)),
            }
        }
    };
}

impl ConstructorArgs {
    pub(crate) fn new(args: Vec<BoundArg>) -> Self {
        Self {
            args: args.into_iter(),
            position: 0,
        }
    }

    /// Returns the number of arguments not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.args.len()
    }

    fn next_bound(&mut self, expected: &str) -> Result<BoundArg, ConstructionCause> {
        let bound = self.args.next().ok_or_else(|| ConstructionCause::Factory {
            message: format!(
                "parameter {} ({expected}) requested but only {} were bound",
                self.position, self.position
            ),
        })?;
        self.position += 1;
        Ok(bound)
    }

    fn mismatch(&self, expected: &str, actual: &BoundArg) -> ConstructionCause {
        ConstructionCause::Factory {
            message: format!(
                "parameter {} is {}, not {expected}",
                self.position.saturating_sub(1),
                actual.describe()
            ),
        }
    }

    ambient_accessor!(
        /// Takes the tracing context.
        next_trace_context, TraceContext, dyn TraceContext
    );
    ambient_accessor!(
        /// Takes the plugin context.
        next_plugin_context, PluginContext, PluginContext
    );
    ambient_accessor!(
        /// Takes the code-editing facility.
        next_instrumentor, Instrumentor, dyn ByteCodeInstrumentor
    );
    ambient_accessor!(
        /// Takes the class being edited.
        next_target_class, TargetClass, dyn InstrumentClass
    );
    ambient_accessor!(
        /// Takes the intercepted method.
        next_target_method, TargetMethod, dyn MethodInfo
    );
    ambient_accessor!(
        /// Takes the descriptor of the intercepted method.
        next_method_descriptor, MethodDescriptor, dyn MethodDescriptor
    );

    primitive_accessor!(
        /// Takes a `boolean`.
        next_bool, Bool, bool, "boolean"
    );
    primitive_accessor!(
        /// Takes a `byte`.
        next_byte, Byte, i8, "byte"
    );
    primitive_accessor!(
        /// Takes a `short`.
        next_short, Short, i16, "short"
    );
    primitive_accessor!(
        /// Takes an `int`.
        next_int, Int, i32, "int"
    );
    primitive_accessor!(
        /// Takes a `long`.
        next_long, Long, i64, "long"
    );
    primitive_accessor!(
        /// Takes a `float`.
        next_float, Float, f32, "float"
    );
    primitive_accessor!(
        /// Takes a `double`.
        next_double, Double, f64, "double"
    );
    primitive_accessor!(
        /// Takes a `char`.
        next_char, Char, char, "char"
    );

    /// Takes a `String`, which may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionCause::Factory`] when the next argument has a
    /// different type or the arguments are exhausted.
    pub fn next_string(&mut self) -> Result<Option<String>, ConstructionCause> {
        match self.next_bound("String")? {
            BoundArg::Value(Value::String(value)) => Ok(Some(value)),
            BoundArg::Value(Value::Null) => Ok(None),
            other => Err(self.mismatch("String", &other)),
        }
    }

    /// Takes a shared object of type `T`, which may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionCause::Factory`] when the next argument is not a
    /// `T` or the arguments are exhausted.
    pub fn next_object<T: Any + Send + Sync>(
        &mut self,
    ) -> Result<Option<Arc<T>>, ConstructionCause> {
        let expected = std::any::type_name::<T>();
        match self.next_bound(expected)? {
            BoundArg::Value(Value::Null) => Ok(None),
            BoundArg::Value(Value::Object(object)) => match object.downcast::<T>() {
                Some(value) => Ok(Some(value)),
                None => Err(self.mismatch(expected, &BoundArg::Value(Value::Object(object)))),
            },
            other => Err(self.mismatch(expected, &other)),
        }
    }
}
