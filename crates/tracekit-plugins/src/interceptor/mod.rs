//! Interceptor declaration and construction.
//!
//! Plugins describe each interceptor with an [`InterceptorType`]: a name and
//! one or more constructor signatures, each paired with a factory closure.
//! When a class editor installs an interceptor, the [`ArgumentResolver`]
//! picks a signature and binds its parameters from two sources:
//!
//! - ambient parameters ([`Param::Ambient`]) come from the
//!   [`AmbientContext`](crate::ambient::AmbientContext) of the call site;
//! - value parameters ([`Param::Value`]) pull the first type-compatible
//!   user argument that has not been consumed yet, so plugin authors may
//!   list arguments in any order.
//!
//! Value parameters with no remaining argument receive their type's zero
//! value unless they are [`Param::required`].

mod args;
mod resolver;
mod signature;
mod value;


use std::any::Any;
use std::fmt;

pub use self::args::{BoundArg, ConstructorArgs};
pub use self::resolver::{ArgumentResolver, bind};
pub use self::signature::{
    Constructor, InterceptorFactory, InterceptorType, InterceptorTypeBuilder, Param,
};
pub use self::value::{ObjectType, ObjectValue, Value, ValueType};

/// Behaviour installed at an instrumented call site.
pub trait Interceptor: fmt::Debug + Send + Sync + 'static {
    /// Returns `self` for downcasting to the concrete interceptor.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Interceptor {
    /// Returns the concrete interceptor when it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Interceptor>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}
