//! Plugin registration and interceptor construction for the tracekit agent.
//!
//! The `tracekit-plugins` crate is the layer between instrumentation plugins
//! and the agent core. At start-up every plugin receives the agent's
//! [`PluginContext`] and uses it to declare what it wants to instrument:
//! class edit rules through [`ClassEditorBuilder`]s, server type probes
//! through [`ServerTypeDetector`]s, and shared state through the attribute
//! store. The context also hands out named metadata and field-snoop
//! [`Slot`]s, whose indices stay stable for the lifetime of the agent.
//!
//! When a class loads, the agent materialises the builders into
//! [`ClassEditor`]s and applies them. Each interceptor an editor installs is
//! built by the [`ArgumentResolver`], which matches plugin-supplied arguments
//! to constructor parameters by type and fills the remaining parameters from
//! the [`AmbientContext`] of the call site.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tracekit_config::AgentConfig;
//! use tracekit_plugins::PluginContext;
//!
//! let context = PluginContext::new(Arc::new(AgentConfig::default()));
//! let trace_id = context
//!     .allocate_metadata_slot("traceId")
//!     .expect("capacity available");
//! assert_eq!(context.allocate_metadata_slot("traceId").ok(), Some(trace_id));
//! ```

pub mod ambient;
pub mod attribute;
pub mod context;
pub mod editor;
pub mod error;
pub mod interceptor;
pub mod slot;

#[cfg(test)]
mod tests;

pub use self::ambient::{
    AmbientContext, AmbientKind, AmbientValue, ByteCodeInstrumentor, InstrumentClass,
    MethodDescriptor, MethodInfo, ServerTypeDetector, TraceContext,
};
pub use self::attribute::{AttributeStore, AttributeValue};
pub use self::context::PluginContext;
pub use self::editor::{ClassEditor, ClassEditorBuilder, MethodSelector};
pub use self::error::{ConstructionCause, InstrumentError, PluginError};
pub use self::interceptor::{ArgumentResolver, Interceptor, InterceptorType, Param, Value, ValueType};
pub use self::slot::{Slot, SlotAllocator, SlotKind};
