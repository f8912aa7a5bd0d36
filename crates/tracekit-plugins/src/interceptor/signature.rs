//! Interceptor types and their registered constructor signatures.

use std::fmt;
use std::sync::Arc;

use crate::ambient::AmbientKind;
use crate::error::{ConstructionCause, PluginError};

use super::Interceptor;
use super::args::ConstructorArgs;
use super::value::ValueType;

/// One declared constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// Bound from the ambient context, even when the ambient value is absent.
    Ambient(AmbientKind),
    /// Bound from the user arguments by type.
    Value {
        /// Declared type.
        ty: ValueType,
        /// Whether a matching argument must be supplied. Optional parameters
        /// receive the type's zero value instead.
        required: bool,
    },
}

impl Param {
    /// An ambient parameter.
    #[must_use]
    pub const fn ambient(kind: AmbientKind) -> Self {
        Self::Ambient(kind)
    }

    /// An optional value parameter.
    #[must_use]
    pub const fn value(ty: ValueType) -> Self {
        Self::Value {
            ty,
            required: false,
        }
    }

    /// A value parameter that must be supplied by the caller.
    #[must_use]
    pub const fn required(ty: ValueType) -> Self {
        Self::Value { ty, required: true }
    }

    /// Returns `true` for ambient parameters.
    #[must_use]
    pub const fn is_ambient(self) -> bool {
        matches!(self, Self::Ambient(_))
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ambient(kind) => write!(f, "{kind}"),
            Self::Value { ty, required: true } => write!(f, "{ty}!"),
            Self::Value { ty, .. } => write!(f, "{ty}"),
        }
    }
}

/// Builds an interceptor from arguments bound to a constructor signature.
pub type InterceptorFactory =
    dyn Fn(&mut ConstructorArgs) -> Result<Box<dyn Interceptor>, ConstructionCause> + Send + Sync;

/// A parameter list paired with the factory that consumes it.
#[derive(Clone)]
pub struct Constructor {
    params: Vec<Param>,
    factory: Arc<InterceptorFactory>,
}

impl Constructor {
    /// Returns the declared parameters.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns the number of non-ambient parameters.
    #[must_use]
    pub fn value_param_count(&self) -> usize {
        self.params.iter().filter(|param| !param.is_ambient()).count()
    }

    pub(crate) fn invoke(
        &self,
        args: &mut ConstructorArgs,
    ) -> Result<Box<dyn Interceptor>, ConstructionCause> {
        (self.factory)(args)
    }
}

impl fmt::Display for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (position, param) in self.params.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// An interceptor type together with every way to construct it.
///
/// # Example
///
/// ```
/// use tracekit_plugins::interceptor::{InterceptorType, Param, ValueType};
/// use tracekit_plugins::{AmbientKind, Interceptor};
///
/// #[derive(Debug)]
/// struct SqlInterceptor {
///     max_length: i32,
/// }
///
/// impl Interceptor for SqlInterceptor {
///     fn as_any(&self) -> &dyn std::any::Any {
///         self
///     }
/// }
///
/// let ty = InterceptorType::builder("SqlInterceptor")
///     .constructor(
///         [Param::ambient(AmbientKind::TraceContext), Param::value(ValueType::Int)],
///         |args| {
///             let _trace = args.next_trace_context()?;
///             Ok(Box::new(SqlInterceptor { max_length: args.next_int()? }))
///         },
///     )
///     .build()
///     .expect("valid constructor set");
/// assert_eq!(ty.constructors().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct InterceptorType {
    name: String,
    constructors: Vec<Constructor>,
}

impl InterceptorType {
    /// Starts declaring an interceptor type.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> InterceptorTypeBuilder {
        InterceptorTypeBuilder {
            name: name.into(),
            constructors: Vec::new(),
        }
    }

    /// Returns the type name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the constructors in registration order.
    #[must_use]
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }
}

/// Collects constructors for an [`InterceptorType`].
#[derive(Debug)]
pub struct InterceptorTypeBuilder {
    name: String,
    constructors: Vec<Constructor>,
}

impl InterceptorTypeBuilder {
    /// Registers a constructor.
    #[must_use]
    pub fn constructor<P, F>(mut self, params: P, factory: F) -> Self
    where
        P: IntoIterator<Item = Param>,
        F: Fn(&mut ConstructorArgs) -> Result<Box<dyn Interceptor>, ConstructionCause>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.push(Constructor {
            params: params.into_iter().collect(),
            factory: Arc::new(factory),
        });
        self
    }

    /// Validates and finishes the declaration.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidSignature`] when no constructor was
    /// registered or two constructors declare the same parameter list.
    pub fn build(self) -> Result<InterceptorType, PluginError> {
        if self.constructors.is_empty() {
            return Err(PluginError::InvalidSignature {
                interceptor: self.name,
                message: String::from("no constructors registered"),
            });
        }

        for (position, constructor) in self.constructors.iter().enumerate() {
            let duplicate = self
                .constructors
                .iter()
                .skip(position + 1)
                .any(|other| other.params == constructor.params);
            if duplicate {
                return Err(PluginError::InvalidSignature {
                    message: format!("constructor {constructor} is registered twice"),
                    interceptor: self.name,
                });
            }
        }

        Ok(InterceptorType {
            name: self.name,
            constructors: self.constructors,
        })
    }
}
