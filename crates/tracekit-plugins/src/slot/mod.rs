//! Named slot allocation for per-object side data.
//!
//! Traced objects carry a fixed number of storage locations for agent data:
//! metadata values attached by plugins and snooped field accessors. A
//! [`SlotAllocator`] hands out indices into one of these fixed arrays by
//! name. Allocation is idempotent: the first request for a name claims the
//! next dense index, later requests return the same [`Slot`].

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PluginError;

/// Tracing target for slot allocation events.
const SLOT_TARGET: &str = "tracekit_plugins::slot";

/// Number of metadata slots a traced object can carry.
pub const METADATA_SLOT_CAPACITY: usize = 32;

/// Number of field snoopers a traced object can carry.
pub const FIELD_SNOOP_SLOT_CAPACITY: usize = 32;

/// The storage array a slot indexes into.
///
/// # Example
///
/// ```
/// use tracekit_plugins::SlotKind;
///
/// assert_eq!(SlotKind::FieldSnoop.as_str(), "field_snoop");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// Plugin-defined metadata values.
    Metadata,
    /// Accessors for snooped fields of the traced object.
    FieldSnoop,
}

impl SlotKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::FieldSnoop => "field_snoop",
        }
    }

    /// Returns the fixed number of slots of this kind.
    #[must_use]
    pub const fn capacity(self) -> usize {
        match self {
            Self::Metadata => METADATA_SLOT_CAPACITY,
            Self::FieldSnoop => FIELD_SNOOP_SLOT_CAPACITY,
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stable index into a slot array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    kind: SlotKind,
    index: usize,
}

impl Slot {
    /// Returns the array this slot belongs to.
    #[must_use]
    pub const fn kind(self) -> SlotKind {
        self.kind
    }

    /// Returns the zero-based index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.index)
    }
}

/// Thread-safe allocator mapping names to slots of one [`SlotKind`].
///
/// # Example
///
/// ```
/// use tracekit_plugins::{SlotAllocator, SlotKind};
///
/// let allocator = SlotAllocator::new(SlotKind::Metadata);
/// let first = allocator.allocate("asyncTrace").expect("capacity available");
/// let again = allocator.allocate("asyncTrace").expect("capacity available");
/// assert_eq!(first, again);
/// assert_eq!(first.index(), 0);
/// ```
#[derive(Debug)]
pub struct SlotAllocator {
    kind: SlotKind,
    capacity: usize,
    slots: RwLock<HashMap<String, Slot>>,
}

impl SlotAllocator {
    /// Creates an empty allocator sized for `kind`.
    #[must_use]
    pub fn new(kind: SlotKind) -> Self {
        Self::with_capacity(kind, kind.capacity())
    }

    pub(crate) fn with_capacity(kind: SlotKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the slot for `name`, allocating the next index on first use.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::CapacityExceeded`] when every index is taken.
    pub fn allocate(&self, name: &str) -> Result<Slot, PluginError> {
        if let Some(slot) = self.lookup(name) {
            return Ok(slot);
        }

        let mut slots = self.slots.write();
        // Another thread may have claimed the name between the two locks.
        if let Some(slot) = slots.get(name) {
            return Ok(*slot);
        }

        let index = slots.len();
        if index >= self.capacity {
            warn!(
                target: SLOT_TARGET,
                kind = %self.kind,
                name,
                capacity = self.capacity,
                "slot capacity exceeded"
            );
            return Err(PluginError::CapacityExceeded {
                kind: self.kind,
                name: name.to_owned(),
                capacity: self.capacity,
            });
        }

        let slot = Slot {
            kind: self.kind,
            index,
        };
        slots.insert(name.to_owned(), slot);
        debug!(target: SLOT_TARGET, kind = %self.kind, name, index, "allocated slot");
        Ok(slot)
    }

    /// Returns the slot previously allocated for `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Slot> {
        self.slots.read().get(name).copied()
    }

    /// Returns every allocation ordered by index.
    #[must_use]
    pub fn allocations(&self) -> Vec<(String, Slot)> {
        let mut entries: Vec<(String, Slot)> = self
            .slots
            .read()
            .iter()
            .map(|(name, slot)| (name.clone(), *slot))
            .collect();
        entries.sort_by_key(|(_, slot)| slot.index);
        entries
    }

    /// Returns the kind of slot this allocator hands out.
    #[must_use]
    pub const fn kind(&self) -> SlotKind {
        self.kind
    }

    /// Returns the maximum number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of allocated slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Returns `true` when nothing has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}
