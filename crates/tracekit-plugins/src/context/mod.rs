//! The registration context shared by every plugin of an agent.
//!
//! One [`PluginContext`] exists per agent. During the single-threaded plugin
//! setup phase plugins borrow it mutably to register class editor builders
//! and server type detectors. Once setup completes the agent wraps it in an
//! `Arc` and shares it with every instrumentation thread; from then on only
//! the attribute store and the slot allocators change, and both are safe for
//! concurrent use.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracekit_config::AgentConfig;
use tracing::debug;

use crate::ambient::{ByteCodeInstrumentor, ServerTypeDetector, TraceContext};
use crate::attribute::{AttributeStore, AttributeValue};
use crate::editor::{ClassEditor, ClassEditorBuilder};
use crate::error::PluginError;
use crate::slot::{Slot, SlotAllocator, SlotKind};

/// Tracing target for plugin registration events.
const CONTEXT_TARGET: &str = "tracekit_plugins::context";

/// Registry of everything plugins declare at agent start-up.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use tracekit_config::AgentConfig;
/// use tracekit_plugins::PluginContext;
///
/// let mut context = PluginContext::new(Arc::new(AgentConfig::default()));
/// context
///     .new_class_editor_builder()
///     .target("org.apache.catalina.core.StandardHostValve")
///     .inject_metadata("traceId");
///
/// assert_eq!(context.class_editor_builder_count(), 1);
/// ```
#[derive(Debug)]
pub struct PluginContext {
    config: Arc<AgentConfig>,
    class_editor_builders: BTreeMap<usize, ClassEditorBuilder>,
    server_type_detectors: Vec<Box<dyn ServerTypeDetector>>,
    attributes: AttributeStore,
    metadata_slots: SlotAllocator,
    field_snoop_slots: SlotAllocator,
}

impl PluginContext {
    /// Creates an empty context around the agent configuration.
    #[must_use]
    pub fn new(config: Arc<AgentConfig>) -> Self {
        Self {
            config,
            class_editor_builders: BTreeMap::new(),
            server_type_detectors: Vec::new(),
            attributes: AttributeStore::new(),
            metadata_slots: SlotAllocator::new(SlotKind::Metadata),
            field_snoop_slots: SlotAllocator::new(SlotKind::FieldSnoop),
        }
    }

    /// Returns the agent configuration.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Runs `setup` for `plugin` unless the configuration disables it.
    ///
    /// Returns `true` when `setup` ran. A disabled plugin registers nothing.
    pub fn setup_plugin<F>(&mut self, plugin: &str, setup: F) -> bool
    where
        F: FnOnce(&mut Self),
    {
        if self.config.is_plugin_disabled(plugin) {
            debug!(target: CONTEXT_TARGET, plugin, "skipping disabled plugin");
            return false;
        }
        setup(self);
        debug!(target: CONTEXT_TARGET, plugin, "plugin setup complete");
        true
    }

    /// Registers a new class editor builder and returns it for configuration.
    pub fn new_class_editor_builder(&mut self) -> &mut ClassEditorBuilder {
        let position = self.class_editor_builders.len();
        debug!(
            target: CONTEXT_TARGET,
            position,
            "registered class editor builder"
        );
        self.class_editor_builders.entry(position).or_default()
    }

    /// Returns the number of registered class editor builders.
    #[must_use]
    pub fn class_editor_builder_count(&self) -> usize {
        self.class_editor_builders.len()
    }

    /// Materialises every registered builder, in registration order.
    ///
    /// Registration state is left untouched, so the editors can be rebuilt
    /// for another set of services.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a builder; see
    /// [`ClassEditorBuilder::build`].
    pub fn class_editors(
        self: &Arc<Self>,
        trace_context: &Arc<dyn TraceContext>,
        instrumentor: &Arc<dyn ByteCodeInstrumentor>,
    ) -> Result<Vec<ClassEditor>, PluginError> {
        let editors = self
            .class_editor_builders
            .values()
            .map(|builder| {
                builder.build(self, Arc::clone(trace_context), Arc::clone(instrumentor))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            target: CONTEXT_TARGET,
            count = editors.len(),
            "materialised class editors"
        );
        Ok(editors)
    }

    /// Appends server type detectors, preserving their order.
    pub fn add_server_type_detectors<I>(&mut self, detectors: I)
    where
        I: IntoIterator<Item = Box<dyn ServerTypeDetector>>,
    {
        let before = self.server_type_detectors.len();
        self.server_type_detectors.extend(detectors);
        debug!(
            target: CONTEXT_TARGET,
            added = self.server_type_detectors.len() - before,
            "registered server type detectors"
        );
    }

    /// Returns the registered detectors in registration order.
    #[must_use]
    pub fn server_type_detectors(&self) -> &[Box<dyn ServerTypeDetector>] {
        &self.server_type_detectors
    }

    /// Stores an attribute, returning the value it replaced.
    pub fn set_attribute(
        &self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.attributes.set(key, value)
    }

    /// Returns the attribute stored under `key`.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<AttributeValue> {
        self.attributes.get(key)
    }

    /// Removes the attribute stored under `key`.
    pub fn remove_attribute(&self, key: &str) -> Option<AttributeValue> {
        self.attributes.remove(key)
    }

    /// Returns the slot for metadata `name`, allocating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::CapacityExceeded`] when every metadata slot is
    /// taken.
    pub fn allocate_metadata_slot(&self, name: &str) -> Result<Slot, PluginError> {
        self.metadata_slots.allocate(name)
    }

    /// Returns the metadata slot previously allocated for `name`.
    #[must_use]
    pub fn metadata_slot(&self, name: &str) -> Option<Slot> {
        self.metadata_slots.lookup(name)
    }

    /// Returns the slot for snooped field `name`, allocating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::CapacityExceeded`] when every field-snoop slot
    /// is taken.
    pub fn allocate_field_snoop_slot(&self, name: &str) -> Result<Slot, PluginError> {
        self.field_snoop_slots.allocate(name)
    }

    /// Returns the field-snoop slot previously allocated for `name`.
    #[must_use]
    pub fn field_snoop_slot(&self, name: &str) -> Option<Slot> {
        self.field_snoop_slots.lookup(name)
    }
}
