use serde::{Deserialize, Serialize};

/// Unique circuit identifier, assigned monotonically by the engine and never
/// reused while the circuit is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircuitId(pub u64);

impl CircuitId {
    /// Create an output port handle for this circuit
    pub fn output(self, index: usize) -> OutputPort {
        OutputPort {
            circuit: self,
            index,
        }
    }

    /// Create an input port handle for this circuit
    pub fn input(self, index: usize) -> InputPort {
        InputPort {
            circuit: self,
            index,
        }
    }
}

impl std::fmt::Display for CircuitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire identifier, stable across pool reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(pub u64);

impl std::fmt::Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canvas placement of a circuit, persisted with the project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Handle for an output connector on a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputPort {
    pub(crate) circuit: CircuitId,
    pub(crate) index: usize,
}

impl OutputPort {
    pub fn circuit_id(&self) -> CircuitId {
        self.circuit
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Handle for an input connector on a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputPort {
    pub(crate) circuit: CircuitId,
    pub(crate) index: usize,
}

impl InputPort {
    pub fn circuit_id(&self) -> CircuitId {
        self.circuit
    }

    pub fn index(&self) -> usize {
        self.index
    }
}
