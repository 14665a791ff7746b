//! The circuit kind table: fixed connector arities, persisted type names,
//! initial power seeding, and the per-kind boolean evaluation rules.
//!
//! Kind names and evaluation semantics follow the classic sandbox vocabulary:
//! a `button` is an interactive power source, a `light` is a sink that mirrors
//! its input, `memory` is a one-bit SET/RESET latch, `ticker` is a
//! free-running square-wave generator, and `delay` is a pass-through buffer
//! with a configurable propagation delay.

/// All supported circuit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitKind {
    Button,
    Light,
    Not,
    Or,
    And,
    Xor,
    Nor,
    Memory,
    Ticker,
    Delay,
}

/// Kind-specific persisted state.
///
/// Only `memory` and `ticker` carry state that must survive a save/reload;
/// every other kind is fully described by its wiring and current power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindData {
    None,
    /// The latch's stored bit
    Memory { bit: bool },
    /// How many propagation units the ticker stays off between pulses
    Ticker { off_time: u64 },
}

/// Default off period for a freshly created ticker, in propagation units.
pub const DEFAULT_TICKER_OFF_TIME: u64 = 10;

impl CircuitKind {
    /// Every kind, in menu order.
    pub const ALL: [CircuitKind; 10] = [
        CircuitKind::Button,
        CircuitKind::Light,
        CircuitKind::Not,
        CircuitKind::Or,
        CircuitKind::And,
        CircuitKind::Xor,
        CircuitKind::Nor,
        CircuitKind::Memory,
        CircuitKind::Ticker,
        CircuitKind::Delay,
    ];

    /// Persisted type name, as written in project JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitKind::Button => "button",
            CircuitKind::Light => "light",
            CircuitKind::Not => "not",
            CircuitKind::Or => "or",
            CircuitKind::And => "and",
            CircuitKind::Xor => "xor",
            CircuitKind::Nor => "nor",
            CircuitKind::Memory => "memory",
            CircuitKind::Ticker => "ticker",
            CircuitKind::Delay => "delay",
        }
    }

    /// Parse a persisted type name
    pub fn parse(name: &str) -> Option<CircuitKind> {
        match name {
            "button" => Some(CircuitKind::Button),
            "light" => Some(CircuitKind::Light),
            "not" => Some(CircuitKind::Not),
            "or" => Some(CircuitKind::Or),
            "and" => Some(CircuitKind::And),
            "xor" => Some(CircuitKind::Xor),
            "nor" => Some(CircuitKind::Nor),
            "memory" => Some(CircuitKind::Memory),
            "ticker" => Some(CircuitKind::Ticker),
            "delay" => Some(CircuitKind::Delay),
            _ => None,
        }
    }

    /// Chip label for display layers, where the kind carries one
    pub fn label(&self) -> Option<&'static str> {
        match self {
            CircuitKind::Not => Some("NOT"),
            CircuitKind::Or => Some("OR"),
            CircuitKind::And => Some("AND"),
            CircuitKind::Xor => Some("XOR"),
            CircuitKind::Nor => Some("NOR"),
            _ => None,
        }
    }

    /// Number of input connectors, fixed at construction
    pub fn input_count(&self) -> usize {
        match self {
            CircuitKind::Button | CircuitKind::Ticker => 0,
            CircuitKind::Light | CircuitKind::Not | CircuitKind::Delay => 1,
            CircuitKind::Or
            | CircuitKind::And
            | CircuitKind::Xor
            | CircuitKind::Nor
            | CircuitKind::Memory => 2,
        }
    }

    /// Number of output connectors, fixed at construction
    pub fn output_count(&self) -> usize {
        match self {
            CircuitKind::Light => 0,
            _ => 1,
        }
    }

    /// Power state a freshly constructed circuit broadcasts.
    ///
    /// Unconnected inputs behave as permanently-false drivers, so inverting
    /// kinds start out true before any evaluation runs. Memory circuits seed
    /// from their stored bit instead (see [`KindData::initial_power`]).
    pub fn initial_power(&self) -> bool {
        matches!(self, CircuitKind::Not | CircuitKind::Nor)
    }

    /// Default persisted data for a freshly created circuit of this kind
    pub fn default_data(&self) -> KindData {
        match self {
            CircuitKind::Memory => KindData::Memory { bit: false },
            CircuitKind::Ticker => KindData::Ticker {
                off_time: DEFAULT_TICKER_OFF_TIME,
            },
            _ => KindData::None,
        }
    }

    /// Determine the power state from the current input powers.
    ///
    /// Missing inputs read as false. Buttons and tickers are source-driven
    /// and never re-evaluated from inputs; for them this returns false.
    /// `memory` is the one stateful rule: input 1 is SET, input 0 is RESET,
    /// and SET wins when both are asserted.
    pub fn evaluate(&self, inputs: &[bool], data: &mut KindData) -> bool {
        let in0 = inputs.first().copied().unwrap_or(false);
        let in1 = inputs.get(1).copied().unwrap_or(false);

        match self {
            CircuitKind::Button | CircuitKind::Ticker => false,
            CircuitKind::Light | CircuitKind::Delay => in0,
            CircuitKind::Not => !in0,
            CircuitKind::Or => in0 || in1,
            CircuitKind::And => in0 && in1,
            CircuitKind::Xor => in0 != in1,
            CircuitKind::Nor => !in0 && !in1,
            CircuitKind::Memory => {
                if let KindData::Memory { bit } = data {
                    if in1 {
                        *bit = true;
                    } else if in0 {
                        *bit = false;
                    }
                    *bit
                } else {
                    false
                }
            }
        }
    }
}

impl KindData {
    /// Power state a freshly constructed circuit carrying this data
    /// broadcasts, falling back to the kind's table default.
    pub fn initial_power(&self, kind: CircuitKind) -> bool {
        match self {
            KindData::Memory { bit } => *bit,
            _ => kind.initial_power(),
        }
    }
}

impl std::fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
