//! Signature selection and argument binding.

use tracing::{debug, warn};

use crate::ambient::AmbientContext;
use crate::error::{ConstructionCause, PluginError};

use super::Interceptor;
use super::args::{BoundArg, ConstructorArgs};
use super::signature::{Constructor, InterceptorType, Param};
use super::value::{Value, ValueType};

/// Tracing target for interceptor construction events.
const RESOLVER_TARGET: &str = "tracekit_plugins::interceptor";

/// Builds interceptors from their registered constructors.
///
/// Every constructor of the requested type is tried against the supplied
/// arguments. Among those that bind, the one with the fewest value
/// parameters wins; a tie is reported as ambiguous. An empty argument list
/// and an absent one are the same thing here.
///
/// The resolver holds no state and may be shared freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentResolver;

impl ArgumentResolver {
    /// Creates a resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Constructs an instance of `interceptor`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ConstructionFailed`] when no constructor can be
    /// bound unambiguously or the chosen factory rejects its arguments. No
    /// instance is produced in that case.
    pub fn resolve(
        &self,
        interceptor: &InterceptorType,
        ambient: &AmbientContext,
        args: &[Value],
    ) -> Result<Box<dyn Interceptor>, PluginError> {
        let (constructor, bound) = self
            .select(interceptor, ambient, args)
            .map_err(|cause| failed(interceptor, cause))?;

        debug!(
            target: RESOLVER_TARGET,
            interceptor = interceptor.name(),
            signature = %constructor,
            "constructing interceptor"
        );

        let mut cursor = ConstructorArgs::new(bound);
        constructor
            .invoke(&mut cursor)
            .map_err(|cause| failed(interceptor, cause))
    }

    /// Chooses the constructor to use and binds its arguments.
    ///
    /// # Errors
    ///
    /// Returns the [`ConstructionCause`] explaining why no single
    /// constructor could be chosen.
    pub fn select<'t>(
        &self,
        interceptor: &'t InterceptorType,
        ambient: &AmbientContext,
        args: &[Value],
    ) -> Result<(&'t Constructor, Vec<BoundArg>), ConstructionCause> {
        let constructors = interceptor.constructors();
        let mut best: Option<(&Constructor, Vec<BoundArg>)> = None;
        let mut tied = 0_usize;
        let mut first_failure = None;

        for constructor in constructors {
            match bind(constructor.params(), ambient, args) {
                Ok(bound) => {
                    let better = best.as_ref().is_none_or(|(current, _)| {
                        constructor.value_param_count() < current.value_param_count()
                    });
                    let equal = best.as_ref().is_some_and(|(current, _)| {
                        constructor.value_param_count() == current.value_param_count()
                    });
                    if better {
                        best = Some((constructor, bound));
                        tied = 1;
                    } else if equal {
                        tied += 1;
                    }
                }
                Err(cause) => {
                    if first_failure.is_none() {
                        first_failure = Some(cause);
                    }
                }
            }
        }

        match (best, first_failure) {
            (Some(_), _) if tied > 1 => Err(ConstructionCause::Ambiguous { candidates: tied }),
            (Some(chosen), _) => Ok(chosen),
            (None, Some(cause)) if constructors.len() == 1 => Err(cause),
            (None, _) if constructors.is_empty() => Err(ConstructionCause::NoConstructor),
            (None, _) => Err(ConstructionCause::NoCompatibleConstructor {
                attempted: constructors.len(),
            }),
        }
    }
}

/// Binds `args` to `params` without invoking any factory.
///
/// Ambient parameters are taken from `ambient`. Each value parameter takes the
/// first remaining argument its type accepts, falling back to the zero value
/// when the parameter is optional. A reference parameter only takes a `null`
/// argument when no non-null argument of its type remains, so a `null` meant
/// for a later parameter is not consumed early.
///
/// # Errors
///
/// Returns [`ConstructionCause::MissingArgument`] when a required parameter
/// has no match, and [`ConstructionCause::IncompatibleArgument`] for the
/// first argument left over once every parameter is bound.
pub fn bind(
    params: &[Param],
    ambient: &AmbientContext,
    args: &[Value],
) -> Result<Vec<BoundArg>, ConstructionCause> {
    let mut remaining: Vec<(usize, &Value)> = args.iter().enumerate().collect();
    let mut bound = Vec::with_capacity(params.len());

    for (position, param) in params.iter().enumerate() {
        match *param {
            Param::Ambient(kind) => bound.push(BoundArg::Ambient(ambient.get(kind))),
            Param::Value { ty, required } => {
                match take_position(&remaining, ty) {
                    Some(found) => {
                        let (_, value) = remaining.remove(found);
                        bound.push(BoundArg::Value(value.clone()));
                    }
                    None if required => {
                        return Err(ConstructionCause::MissingArgument {
                            position,
                            expected: ty,
                        });
                    }
                    None => bound.push(BoundArg::Value(ty.zero())),
                }
            }
        }
    }

    match remaining.first() {
        Some((index, value)) => Err(ConstructionCause::IncompatibleArgument {
            index: *index,
            actual: value.type_name(),
        }),
        None => Ok(bound),
    }
}

/// Returns the position in `remaining` of the argument `ty` should take.
fn take_position(remaining: &[(usize, &Value)], ty: ValueType) -> Option<usize> {
    remaining
        .iter()
        .position(|(_, value)| !matches!(value, Value::Null) && ty.accepts(value))
        .or_else(|| remaining.iter().position(|(_, value)| ty.accepts(value)))
}

fn failed(interceptor: &InterceptorType, cause: ConstructionCause) -> PluginError {
    warn!(
        target: RESOLVER_TARGET,
        interceptor = interceptor.name(),
        %cause,
        "interceptor construction failed"
    );
    PluginError::ConstructionFailed {
        interceptor: interceptor.name().to_owned(),
        cause,
    }
}
