pub mod core;

// Re-export commonly used types
pub use crate::core::circuit::{Circuit, Connector};
pub use crate::core::engine::{CircuitEngine, EngineObserver};
pub use crate::core::error::{EngineError, Result};
pub use crate::core::kinds::{CircuitKind, KindData};
pub use crate::core::project_codec::{load_project, save_project, save_project_pretty};
pub use crate::core::types::{CircuitId, InputPort, OutputPort, Position, WireId};
pub use crate::core::wire::Wire;
