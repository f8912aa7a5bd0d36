//! Class edit rules declared by plugins.
//!
//! A plugin describes what should happen to a class through a
//! [`ClassEditorBuilder`] obtained from the
//! [`PluginContext`](crate::PluginContext): which metadata slots to add,
//! which fields to expose, and which interceptors to install around which
//! methods. Builders are materialised into [`ClassEditor`]s once the agent
//! has its tracing context and code-editing facility, and each editor is
//! applied to the matching class as it loads.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::ambient::{
    AmbientContext, ByteCodeInstrumentor, InstrumentClass, MethodInfo, TraceContext,
};
use crate::context::PluginContext;
use crate::error::{InstrumentError, PluginError};
use crate::interceptor::{ArgumentResolver, Interceptor, InterceptorType, Value};
use crate::slot::Slot;

/// Tracing target for class editing events.
const EDITOR_TARGET: &str = "tracekit_plugins::editor";

/// Selects a declared method by name and, optionally, parameter types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSelector {
    name: String,
    parameter_types: Option<Vec<String>>,
}

impl MethodSelector {
    /// Matches any overload named `name`.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter_types: None,
        }
    }

    /// Matches the overload of `name` with exactly these parameter types.
    #[must_use]
    pub fn with_parameters<I, S>(name: impl Into<String>, parameter_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameter_types: Some(parameter_types.into_iter().map(Into::into).collect()),
        }
    }

    /// Returns the method name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the required parameter types, if any.
    #[must_use]
    pub fn parameter_types(&self) -> Option<&[String]> {
        self.parameter_types.as_deref()
    }
}

impl fmt::Display for MethodSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter_types {
            Some(types) => write!(f, "{}({})", self.name, types.join(", ")),
            None => write!(f, "{}(..)", self.name),
        }
    }
}

/// An interceptor to install around a selected method.
#[derive(Debug, Clone)]
struct Injection {
    method: MethodSelector,
    interceptor: Arc<InterceptorType>,
    args: Vec<Value>,
}

/// Deferred description of the edits to apply to one class.
#[derive(Debug, Clone, Default)]
pub struct ClassEditorBuilder {
    target: Option<String>,
    metadata: Vec<String>,
    field_snoopers: Vec<String>,
    injections: Vec<Injection>,
}

impl ClassEditorBuilder {
    /// Sets the fully qualified name of the class to edit.
    pub fn target(&mut self, class_name: impl Into<String>) -> &mut Self {
        self.target = Some(class_name.into());
        self
    }

    /// Adds the named metadata slot to the class.
    pub fn inject_metadata(&mut self, name: impl Into<String>) -> &mut Self {
        self.metadata.push(name.into());
        self
    }

    /// Exposes `field` through a field-snoop slot.
    pub fn inject_field_snooper(&mut self, field: impl Into<String>) -> &mut Self {
        self.field_snoopers.push(field.into());
        self
    }

    /// Installs `interceptor` around the selected method.
    ///
    /// `args` are matched to the interceptor's value parameters by type; an
    /// empty list means no arguments.
    pub fn inject_interceptor(
        &mut self,
        method: MethodSelector,
        interceptor: Arc<InterceptorType>,
        args: Vec<Value>,
    ) -> &mut Self {
        self.injections.push(Injection {
            method,
            interceptor,
            args,
        });
        self
    }

    /// Returns the target class name, once set.
    #[must_use]
    pub fn target_class_name(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Materialises the edit rule.
    ///
    /// Metadata and field-snoop slots are allocated through `context`; since
    /// allocation is idempotent, building the same rule twice yields the same
    /// slots.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidEditor`] when no target class was set,
    /// or [`PluginError::CapacityExceeded`] when a slot cannot be allocated.
    pub fn build(
        &self,
        context: &Arc<PluginContext>,
        trace_context: Arc<dyn TraceContext>,
        instrumentor: Arc<dyn ByteCodeInstrumentor>,
    ) -> Result<ClassEditor, PluginError> {
        let target_class = self.target.clone().ok_or_else(|| PluginError::InvalidEditor {
            message: String::from("class editor has no target class"),
        })?;

        let metadata = self
            .metadata
            .iter()
            .map(|name| {
                context
                    .allocate_metadata_slot(name)
                    .map(|slot| (name.clone(), slot))
            })
            .collect::<Result<Vec<_>, PluginError>>()?;
        let field_snoopers = self
            .field_snoopers
            .iter()
            .map(|field| {
                context
                    .allocate_field_snoop_slot(field)
                    .map(|slot| (field.clone(), slot))
            })
            .collect::<Result<Vec<_>, PluginError>>()?;

        Ok(ClassEditor {
            target_class,
            metadata,
            field_snoopers,
            injections: self.injections.clone(),
            plugin_context: Arc::clone(context),
            trace_context,
            instrumentor,
            resolver: ArgumentResolver::new(),
        })
    }
}

/// A materialised edit rule bound to the agent's services.
#[derive(Debug)]
pub struct ClassEditor {
    target_class: String,
    metadata: Vec<(String, Slot)>,
    field_snoopers: Vec<(String, Slot)>,
    injections: Vec<Injection>,
    plugin_context: Arc<PluginContext>,
    trace_context: Arc<dyn TraceContext>,
    instrumentor: Arc<dyn ByteCodeInstrumentor>,
    resolver: ArgumentResolver,
}

impl ClassEditor {
    /// Returns the class this editor applies to.
    #[must_use]
    pub const fn target_class_name(&self) -> &str {
        self.target_class.as_str()
    }

    /// Returns the metadata slots this editor adds.
    #[must_use]
    pub fn metadata_slots(&self) -> &[(String, Slot)] {
        &self.metadata
    }

    /// Returns the field-snoop slots this editor adds.
    #[must_use]
    pub fn field_snoop_slots(&self) -> &[(String, Slot)] {
        &self.field_snoopers
    }

    /// Applies the edits to `target`.
    ///
    /// Every interceptor is constructed before the class is touched, so a
    /// construction failure leaves the class unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidEditor`] when `target` is a different
    /// class, [`PluginError::MethodNotFound`] when a selected method does not
    /// exist, [`PluginError::ConstructionFailed`] when an interceptor cannot
    /// be built, and [`PluginError::Instrument`] when the editing facility
    /// rejects a change.
    pub fn edit(&self, target: &Arc<dyn InstrumentClass>) -> Result<(), PluginError> {
        if target.name() != self.target_class {
            return Err(PluginError::InvalidEditor {
                message: format!(
                    "editor for '{}' cannot edit '{}'",
                    self.target_class,
                    target.name()
                ),
            });
        }

        let prepared = self
            .injections
            .iter()
            .map(|injection| self.prepare(target, injection))
            .collect::<Result<Vec<_>, PluginError>>()?;

        for (name, slot) in &self.metadata {
            target
                .add_metadata(name, *slot)
                .map_err(|source| self.instrument_failed(source))?;
        }
        for (field, slot) in &self.field_snoopers {
            target
                .add_field_snooper(field, *slot)
                .map_err(|source| self.instrument_failed(source))?;
        }
        for (method, interceptor) in prepared {
            debug!(
                target: EDITOR_TARGET,
                class = %self.target_class,
                method = method.name(),
                "installing interceptor"
            );
            target
                .add_interceptor(&method, interceptor)
                .map_err(|source| self.instrument_failed(source))?;
        }
        Ok(())
    }

    fn prepare(
        &self,
        target: &Arc<dyn InstrumentClass>,
        injection: &Injection,
    ) -> Result<(Arc<dyn MethodInfo>, Box<dyn Interceptor>), PluginError> {
        let method = target
            .declared_method(injection.method.name(), injection.method.parameter_types())
            .ok_or_else(|| PluginError::MethodNotFound {
                class_name: self.target_class.clone(),
                method: injection.method.to_string(),
            })?;

        let ambient = AmbientContext::new()
            .with_trace_context(Some(Arc::clone(&self.trace_context)))
            .with_plugin_context(Some(Arc::clone(&self.plugin_context)))
            .with_instrumentor(Some(Arc::clone(&self.instrumentor)))
            .with_target_class(Some(Arc::clone(target)))
            .with_method_descriptor(method.descriptor())
            .with_target_method(Some(Arc::clone(&method)));

        let interceptor = self
            .resolver
            .resolve(&injection.interceptor, &ambient, &injection.args)?;
        Ok((method, interceptor))
    }

    fn instrument_failed(&self, source: InstrumentError) -> PluginError {
        PluginError::Instrument {
            class_name: self.target_class.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests;
