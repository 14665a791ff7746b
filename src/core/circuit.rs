use crate::core::kinds::{CircuitKind, KindData};
use crate::core::types::{CircuitId, Position, WireId};

/// A typed port on a circuit, holding its attached wires.
///
/// Input connectors hold at most one wire; output connectors hold any number.
/// The connector's role and index derive from its position in the owning
/// circuit's `inputs`/`outputs` sequence.
#[derive(Debug, Clone, Default)]
pub struct Connector {
    wires: Vec<WireId>,
}

impl Connector {
    pub fn new() -> Self {
        Self { wires: Vec::new() }
    }

    /// Attached wires, in attachment order
    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }

    pub fn is_empty(&self) -> bool {
        self.wires.is_empty()
    }

    pub(crate) fn attach(&mut self, wire: WireId) {
        self.wires.push(wire);
    }

    /// Detach a wire by identity; a no-op if it is not attached
    pub(crate) fn detach(&mut self, wire: WireId) {
        self.wires.retain(|w| *w != wire);
    }
}

/// A typed node in the graph: fixed connector arity, an evaluation rule
/// (via its kind), a broadcast power state, and kind-specific data.
#[derive(Debug, Clone)]
pub struct Circuit {
    id: CircuitId,
    kind: CircuitKind,
    position: Position,
    power: bool,
    delay: u64,
    data: KindData,
    inputs: Vec<Connector>,
    outputs: Vec<Connector>,
}

impl Circuit {
    /// Build a circuit with connectors per the kind's arity and power seeded
    /// from the kind table (or the persisted data for memory circuits).
    pub(crate) fn new(
        id: CircuitId,
        kind: CircuitKind,
        position: Position,
        data: KindData,
        delay: u64,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            power: data.initial_power(kind),
            delay: delay.max(1),
            data,
            inputs: (0..kind.input_count()).map(|_| Connector::new()).collect(),
            outputs: (0..kind.output_count()).map(|_| Connector::new()).collect(),
        }
    }

    pub fn id(&self) -> CircuitId {
        self.id
    }

    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Current broadcast power state
    pub fn power(&self) -> bool {
        self.power
    }

    pub(crate) fn set_power(&mut self, power: bool) {
        self.power = power;
    }

    /// Propagation units a broadcast from this circuit takes to reach each
    /// wire. Always at least 1; only adjustable on delay circuits.
    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub(crate) fn set_delay(&mut self, delay: u64) {
        self.delay = delay.max(1);
    }

    /// Kind-specific persisted data
    pub fn data(&self) -> KindData {
        self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut KindData {
        &mut self.data
    }

    pub fn inputs(&self) -> &[Connector] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Connector] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> Option<&Connector> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&Connector> {
        self.outputs.get(index)
    }

    pub(crate) fn input_mut(&mut self, index: usize) -> Option<&mut Connector> {
        self.inputs.get_mut(index)
    }

    pub(crate) fn output_mut(&mut self, index: usize) -> Option<&mut Connector> {
        self.outputs.get_mut(index)
    }
}
