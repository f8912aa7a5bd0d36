//! Collaborators supplied by the embedding agent.
//!
//! The plugin layer never looks inside the tracing context or the
//! code-editing facility; it only stores them and forwards them to
//! interceptor constructors. The traits here describe the narrow surface the
//! crate needs from each collaborator. All of them are object safe and shared
//! as `Arc<dyn _>` so a single agent-wide instance can be handed to many
//! interceptors.

use std::fmt;
use std::sync::Arc;

use crate::context::PluginContext;
use crate::error::InstrumentError;
use crate::interceptor::Interceptor;
use crate::slot::Slot;

/// Agent-wide tracing context handed to interceptors.
pub trait TraceContext: fmt::Debug + Send + Sync {}

/// Agent-wide code-editing facility handed to interceptors.
pub trait ByteCodeInstrumentor: fmt::Debug + Send + Sync {}

/// Signature descriptor of an instrumented method.
pub trait MethodDescriptor: fmt::Debug + Send + Sync {
    /// Returns a human-readable rendering of the method signature.
    fn full_name(&self) -> String;
}

/// A method of a class that is being edited.
pub trait MethodInfo: fmt::Debug + Send + Sync {
    /// Returns the simple method name.
    fn name(&self) -> &str;

    /// Returns the declared parameter type names.
    fn parameter_types(&self) -> &[String];

    /// Returns the signature descriptor, when the facility provides one.
    fn descriptor(&self) -> Option<Arc<dyn MethodDescriptor>>;
}

/// A loaded class open for editing.
pub trait InstrumentClass: fmt::Debug + Send + Sync {
    /// Returns the fully qualified class name.
    fn name(&self) -> &str;

    /// Finds a declared method by name and, optionally, exact parameter
    /// types.
    fn declared_method(
        &self,
        name: &str,
        parameter_types: Option<&[String]>,
    ) -> Option<Arc<dyn MethodInfo>>;

    /// Adds a metadata slot to the class.
    ///
    /// # Errors
    ///
    /// Returns an [`InstrumentError`] when the class cannot be changed.
    fn add_metadata(&self, name: &str, slot: Slot) -> Result<(), InstrumentError>;

    /// Exposes `field` through the given field-snoop slot.
    ///
    /// # Errors
    ///
    /// Returns an [`InstrumentError`] when the field is missing or the class
    /// cannot be changed.
    fn add_field_snooper(&self, field: &str, slot: Slot) -> Result<(), InstrumentError>;

    /// Installs a constructed interceptor around `method`.
    ///
    /// # Errors
    ///
    /// Returns an [`InstrumentError`] when the method cannot be rewritten.
    fn add_interceptor(
        &self,
        method: &Arc<dyn MethodInfo>,
        interceptor: Box<dyn Interceptor>,
    ) -> Result<(), InstrumentError>;
}

/// Probe that decides which application server the agent runs in.
///
/// Detectors are registered through the plugin context and evaluated later by
/// the agent; the plugin layer never calls [`ServerTypeDetector::detect`]
/// itself.
pub trait ServerTypeDetector: fmt::Debug + Send + Sync {
    /// Returns the name of the server type this detector recognises.
    fn server_type(&self) -> String;

    /// Returns `true` when the current process runs the server type.
    fn detect(&self) -> bool;
}

/// The ambient values an interceptor constructor may ask for by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmbientKind {
    /// [`TraceContext`].
    TraceContext,
    /// [`PluginContext`].
    PluginContext,
    /// [`ByteCodeInstrumentor`].
    Instrumentor,
    /// The [`InstrumentClass`] being edited.
    TargetClass,
    /// The [`MethodInfo`] being intercepted.
    TargetMethod,
    /// The [`MethodDescriptor`] of the intercepted method.
    MethodDescriptor,
}

impl AmbientKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TraceContext => "TraceContext",
            Self::PluginContext => "PluginContext",
            Self::Instrumentor => "ByteCodeInstrumentor",
            Self::TargetClass => "InstrumentClass",
            Self::TargetMethod => "MethodInfo",
            Self::MethodDescriptor => "MethodDescriptor",
        }
    }
}

impl fmt::Display for AmbientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-invocation bag of ambient values.
///
/// Every entry is optional. An absent value still binds to a parameter that
/// asks for it; the constructor simply receives `None`.
#[derive(Debug, Clone, Default)]
pub struct AmbientContext {
    trace_context: Option<Arc<dyn TraceContext>>,
    plugin_context: Option<Arc<PluginContext>>,
    instrumentor: Option<Arc<dyn ByteCodeInstrumentor>>,
    target_class: Option<Arc<dyn InstrumentClass>>,
    target_method: Option<Arc<dyn MethodInfo>>,
    method_descriptor: Option<Arc<dyn MethodDescriptor>>,
}

impl AmbientContext {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tracing context.
    #[must_use]
    pub fn with_trace_context(mut self, value: Option<Arc<dyn TraceContext>>) -> Self {
        self.trace_context = value;
        self
    }

    /// Sets the plugin context.
    #[must_use]
    pub fn with_plugin_context(mut self, value: Option<Arc<PluginContext>>) -> Self {
        self.plugin_context = value;
        self
    }

    /// Sets the code-editing facility.
    #[must_use]
    pub fn with_instrumentor(mut self, value: Option<Arc<dyn ByteCodeInstrumentor>>) -> Self {
        self.instrumentor = value;
        self
    }

    /// Sets the class being edited.
    #[must_use]
    pub fn with_target_class(mut self, value: Option<Arc<dyn InstrumentClass>>) -> Self {
        self.target_class = value;
        self
    }

    /// Sets the intercepted method.
    #[must_use]
    pub fn with_target_method(mut self, value: Option<Arc<dyn MethodInfo>>) -> Self {
        self.target_method = value;
        self
    }

    /// Sets the descriptor of the intercepted method.
    #[must_use]
    pub fn with_method_descriptor(mut self, value: Option<Arc<dyn MethodDescriptor>>) -> Self {
        self.method_descriptor = value;
        self
    }

    /// Returns the value bound for `kind`.
    #[must_use]
    pub fn get(&self, kind: AmbientKind) -> AmbientValue {
        match kind {
            AmbientKind::TraceContext => AmbientValue::TraceContext(self.trace_context.clone()),
            AmbientKind::PluginContext => AmbientValue::PluginContext(self.plugin_context.clone()),
            AmbientKind::Instrumentor => AmbientValue::Instrumentor(self.instrumentor.clone()),
            AmbientKind::TargetClass => AmbientValue::TargetClass(self.target_class.clone()),
            AmbientKind::TargetMethod => AmbientValue::TargetMethod(self.target_method.clone()),
            AmbientKind::MethodDescriptor => {
                AmbientValue::MethodDescriptor(self.method_descriptor.clone())
            }
        }
    }
}

/// A single ambient value taken from an [`AmbientContext`].
#[derive(Debug, Clone)]
pub enum AmbientValue {
    /// See [`AmbientKind::TraceContext`].
    TraceContext(Option<Arc<dyn TraceContext>>),
    /// See [`AmbientKind::PluginContext`].
    PluginContext(Option<Arc<PluginContext>>),
    /// See [`AmbientKind::Instrumentor`].
    Instrumentor(Option<Arc<dyn ByteCodeInstrumentor>>),
    /// See [`AmbientKind::TargetClass`].
    TargetClass(Option<Arc<dyn InstrumentClass>>),
    /// See [`AmbientKind::TargetMethod`].
    TargetMethod(Option<Arc<dyn MethodInfo>>),
    /// See [`AmbientKind::MethodDescriptor`].
    MethodDescriptor(Option<Arc<dyn MethodDescriptor>>),
}

impl AmbientValue {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> AmbientKind {
        match self {
            Self::TraceContext(_) => AmbientKind::TraceContext,
            Self::PluginContext(_) => AmbientKind::PluginContext,
            Self::Instrumentor(_) => AmbientKind::Instrumentor,
            Self::TargetClass(_) => AmbientKind::TargetClass,
            Self::TargetMethod(_) => AmbientKind::TargetMethod,
            Self::MethodDescriptor(_) => AmbientKind::MethodDescriptor,
        }
    }
}
