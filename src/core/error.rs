use crate::core::types::CircuitId;
use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by engine operations and the project codec.
///
/// Load errors (`Parse`, `UnsupportedKind`, `DuplicateId`,
/// `DanglingReference`, `DanglingInput`) are raised before any graph
/// mutation, so a failed load always leaves the current graph untouched.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Persisted payload is not structurally valid JSON
    #[error("could not parse project data: {0}")]
    Parse(#[from] serde_json::Error),

    /// Persisted payload names a circuit type this engine does not know
    #[error("'{kind}' is not a valid circuit type")]
    UnsupportedKind { kind: String },

    /// Persisted payload lists the same circuit id twice
    #[error("duplicate circuit id {id} in project data")]
    DuplicateId { id: CircuitId },

    /// Persisted wire references a circuit id not present in the payload
    #[error("wire references missing circuit {id}")]
    DanglingReference { id: CircuitId },

    /// Persisted wire references an input connector the target does not have
    #[error("circuit {id} has no input connector {index}")]
    DanglingInput { id: CircuitId, index: usize },

    /// Operation targets a circuit that is not registered
    #[error("circuit {id} not found")]
    CircuitNotFound { id: CircuitId },

    /// Connector index is outside the circuit's fixed arity
    #[error("connector index {index} out of range for circuit {id}")]
    PortOutOfRange { id: CircuitId, index: usize },

    /// Operation only applies to a specific circuit kind
    #[error("circuit {id} is not a {expected}")]
    KindMismatch {
        id: CircuitId,
        expected: &'static str,
    },
}
