//! Domain errors raised by plugin registration and interceptor construction.
//!
//! Every failure in this crate is deterministic for a given set of inputs:
//! exhausted slot capacity, an interceptor that cannot be built from the
//! supplied arguments, or a malformed editor declaration. Callers propagate
//! them to the plugin initialisation layer, which decides whether to skip the
//! affected instrumentation rule or abort the plugin.

use thiserror::Error;

use crate::interceptor::ValueType;
use crate::slot::SlotKind;

/// Errors arising from plugin registration and class editing.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A slot allocator ran out of indices.
    #[error("cannot allocate {kind} slot '{name}': exceeded max {capacity}")]
    CapacityExceeded {
        /// Allocator that was exhausted.
        kind: SlotKind,
        /// Name that could not be allocated.
        name: String,
        /// Fixed capacity of the allocator.
        capacity: usize,
    },

    /// No registered constructor could build the interceptor.
    #[error("failed to construct interceptor '{interceptor}': {cause}")]
    ConstructionFailed {
        /// Name of the requested interceptor type.
        interceptor: String,
        /// Why construction failed.
        #[source]
        cause: ConstructionCause,
    },

    /// An interceptor type was registered with an unusable constructor set.
    #[error("invalid constructor set for interceptor '{interceptor}': {message}")]
    InvalidSignature {
        /// Name of the interceptor type.
        interceptor: String,
        /// Description of the problem.
        message: String,
    },

    /// A class editor builder was incomplete.
    #[error("invalid class editor: {message}")]
    InvalidEditor {
        /// Description of the problem.
        message: String,
    },

    /// The method selected for interception does not exist on the class.
    #[error("method '{method}' not found in class '{class_name}'")]
    MethodNotFound {
        /// Class that was searched.
        class_name: String,
        /// Rendered method selector.
        method: String,
    },

    /// The code-editing facility rejected an edit.
    #[error("failed to edit class '{class_name}': {source}")]
    Instrument {
        /// Class being edited.
        class_name: String,
        /// Error reported by the editing facility.
        #[source]
        source: InstrumentError,
    },
}

/// Reason an interceptor could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionCause {
    /// The interceptor type has no constructors.
    #[error("no constructor is registered")]
    NoConstructor,

    /// A required parameter had no compatible argument left.
    #[error("required parameter {position} of type {expected} has no matching argument")]
    MissingArgument {
        /// Zero-based parameter position.
        position: usize,
        /// Declared parameter type.
        expected: ValueType,
    },

    /// A supplied argument matched no remaining parameter.
    #[error("argument {index} of type {actual} matches no remaining parameter")]
    IncompatibleArgument {
        /// Zero-based index in the user argument list.
        index: usize,
        /// Runtime type of the argument.
        actual: String,
    },

    /// Several constructors exist and none accepts the arguments.
    #[error("none of the {attempted} constructors accepts the supplied arguments")]
    NoCompatibleConstructor {
        /// Number of constructors attempted.
        attempted: usize,
    },

    /// More than one constructor is an equally good match.
    #[error("{candidates} constructors accept the supplied arguments equally well")]
    Ambiguous {
        /// Number of tied constructors.
        candidates: usize,
    },

    /// The constructor factory rejected the bound arguments.
    #[error("factory rejected bound arguments: {message}")]
    Factory {
        /// Description supplied by the argument cursor.
        message: String,
    },
}

/// Error reported by the external code-editing facility.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InstrumentError {
    message: String,
}

impl InstrumentError {
    /// Creates an error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the description.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}
