use crate::core::circuit::Circuit;
use crate::core::error::{EngineError, Result};
use crate::core::event_scheduler::{Delivery, EventScheduler};
use crate::core::kinds::{CircuitKind, KindData};
use crate::core::types::{CircuitId, InputPort, OutputPort, Position, WireId};
use crate::core::wire::{Wire, WirePool};
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};

/// Observer trait for presentation layers.
///
/// The engine never renders; it reports power changes (for repaint) and
/// graph shape changes (for layout refresh) through this trait.
pub trait EngineObserver {
    /// Called when a circuit's broadcast power state changes
    fn on_power_changed(&mut self, id: CircuitId, power: bool);

    /// Called when circuits or wires are added or removed
    fn on_graph_changed(&mut self);
}

/// The discrete-event propagation engine.
///
/// Owns the circuit registry, the wire pool, and the virtual-time delivery
/// queue. All state is mutated from one logical timeline: a broadcast only
/// schedules deliveries, and each delivery callback runs to completion before
/// the next is considered, so per-wire deliveries stay causally ordered and
/// feedback loops are safe (every hop strictly advances virtual time).
///
/// Time does not advance on its own. Drive it with [`CircuitEngine::step`]
/// or [`CircuitEngine::advance`]; production code advances it off a real
/// timer, tests advance it synchronously.
pub struct CircuitEngine {
    circuits: BTreeMap<CircuitId, Circuit>,
    next_id: u64,
    wires: HashMap<WireId, Wire>,
    pool: WirePool,
    scheduler: EventScheduler,
    now: u64,
    canvas: Position,
    observers: Vec<Box<dyn EngineObserver>>,
}

impl CircuitEngine {
    pub fn new() -> Self {
        Self {
            circuits: BTreeMap::new(),
            next_id: 0,
            wires: HashMap::new(),
            pool: WirePool::new(),
            scheduler: EventScheduler::new(),
            now: 0,
            canvas: Position::default(),
            observers: Vec::new(),
        }
    }

    /// Drop the whole graph, pending deliveries, and the clock
    pub fn reset(&mut self) {
        self.circuits.clear();
        self.wires.clear();
        self.pool = WirePool::new();
        self.scheduler.clear();
        self.next_id = 0;
        self.now = 0;
        self.canvas = Position::default();
        self.notify_graph_changed();
    }

    pub fn add_observer(&mut self, observer: Box<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    // Graph construction
    // -----------------------

    /// Create a circuit of the given kind with default data and delay
    pub fn create_circuit(&mut self, kind: CircuitKind, position: Position) -> CircuitId {
        self.create_circuit_with_data(kind, position, kind.default_data(), 1)
    }

    /// Create a circuit with explicit persisted data and propagation delay
    pub fn create_circuit_with_data(
        &mut self,
        kind: CircuitKind,
        position: Position,
        data: KindData,
        delay: u64,
    ) -> CircuitId {
        let id = CircuitId(self.next_id);
        self.next_id += 1;
        self.insert_circuit(id, kind, position, data, delay);
        self.notify_graph_changed();
        id
    }

    /// Register a circuit under a caller-chosen id. Used by the project
    /// loader, which restores persisted ids; the caller is responsible for
    /// advancing the id counter afterwards via [`CircuitEngine::set_next_id`].
    pub(crate) fn insert_circuit(
        &mut self,
        id: CircuitId,
        kind: CircuitKind,
        position: Position,
        data: KindData,
        delay: u64,
    ) {
        let circuit = Circuit::new(id, kind, position, data, delay);
        trace!("create {} circuit {}", kind, id);

        // Tickers free-run from the moment they exist
        if kind == CircuitKind::Ticker {
            let off_time = match circuit.data() {
                KindData::Ticker { off_time } => off_time.max(1),
                _ => 1,
            };
            self.scheduler
                .schedule(Delivery::TickerToggle { circuit: id }, self.now + off_time);
        }

        self.circuits.insert(id, circuit);
    }

    pub(crate) fn set_next_id(&mut self, next_id: u64) {
        self.next_id = next_id;
    }

    /// Remove a circuit, recycling every wire on every connector.
    /// Idempotent: removing an id that is not registered is a no-op.
    pub fn remove_circuit(&mut self, id: CircuitId) {
        if self.remove_circuit_internal(id) {
            self.notify_graph_changed();
        }
    }

    fn remove_circuit_internal(&mut self, id: CircuitId) -> bool {
        let Some(circuit) = self.circuits.remove(&id) else {
            return false;
        };
        trace!("remove circuit {}", id);

        let attached: Vec<WireId> = circuit
            .inputs()
            .iter()
            .chain(circuit.outputs().iter())
            .flat_map(|conn| conn.wires().iter().copied())
            .collect();
        for wire in attached {
            self.recycle_wire(wire);
        }
        true
    }

    // Wiring
    // -----------------------

    /// Connect an output connector to an input connector.
    ///
    /// If the input already has a wire it is recycled first; the last
    /// connection silently wins. The source's current power is delivered to
    /// the new wire immediately, without the usual propagation delay, so the
    /// downstream circuit settles right away.
    pub fn connect(&mut self, output: OutputPort, input: InputPort) -> Result<WireId> {
        let wire = self.connect_internal(output, input)?;
        self.notify_graph_changed();
        Ok(wire)
    }

    pub(crate) fn connect_internal(
        &mut self,
        output: OutputPort,
        input: InputPort,
    ) -> Result<WireId> {
        let source = self
            .circuits
            .get(&output.circuit_id())
            .ok_or(EngineError::CircuitNotFound {
                id: output.circuit_id(),
            })?;
        if output.index() >= source.outputs().len() {
            return Err(EngineError::PortOutOfRange {
                id: output.circuit_id(),
                index: output.index(),
            });
        }
        let sink = self
            .circuits
            .get(&input.circuit_id())
            .ok_or(EngineError::CircuitNotFound {
                id: input.circuit_id(),
            })?;
        if input.index() >= sink.inputs().len() {
            return Err(EngineError::PortOutOfRange {
                id: input.circuit_id(),
                index: input.index(),
            });
        }

        // Last connection wins: drop whatever currently drives this input
        let superseded: Vec<WireId> = sink
            .inputs()[input.index()]
            .wires()
            .to_vec();
        for wire in superseded {
            self.recycle_wire(wire);
        }

        let wire = self.pool.acquire(output, input);
        let wire_id = wire.id();
        self.wires.insert(wire_id, wire);
        if let Some(circuit) = self.circuits.get_mut(&output.circuit_id()) {
            if let Some(conn) = circuit.output_mut(output.index()) {
                conn.attach(wire_id);
            }
        }
        if let Some(circuit) = self.circuits.get_mut(&input.circuit_id()) {
            if let Some(conn) = circuit.input_mut(input.index()) {
                conn.attach(wire_id);
            }
        }
        trace!(
            "connect wire {}: {}[{}] -> {}[{}]",
            wire_id,
            output.circuit_id(),
            output.index(),
            input.circuit_id(),
            input.index()
        );

        // Immediate delivery of the source's current power
        let power = self
            .circuits
            .get(&output.circuit_id())
            .map(|c| c.power())
            .unwrap_or(false);
        if let Some(wire) = self.wires.get_mut(&wire_id) {
            wire.set_power(power);
        }
        self.input_change(input.circuit_id());

        Ok(wire_id)
    }

    /// Remove every wire attached to an input connector
    pub fn disconnect_input(&mut self, port: InputPort) {
        let attached: Vec<WireId> = self
            .circuits
            .get(&port.circuit_id())
            .and_then(|c| c.input(port.index()))
            .map(|conn| conn.wires().to_vec())
            .unwrap_or_default();
        if attached.is_empty() {
            return;
        }
        for wire in attached {
            self.recycle_wire(wire);
        }
        self.notify_graph_changed();
    }

    /// Remove every wire attached to an output connector
    pub fn disconnect_output(&mut self, port: OutputPort) {
        let attached: Vec<WireId> = self
            .circuits
            .get(&port.circuit_id())
            .and_then(|c| c.output(port.index()))
            .map(|conn| conn.wires().to_vec())
            .unwrap_or_default();
        if attached.is_empty() {
            return;
        }
        for wire in attached {
            self.recycle_wire(wire);
        }
        self.notify_graph_changed();
    }

    /// Detach a wire from both connectors and return it to the pool.
    ///
    /// The former sink re-evaluates, since its effective input just dropped
    /// to false. Any delivery still in flight for the wire carries the old
    /// generation and will be dropped.
    fn recycle_wire(&mut self, wire_id: WireId) {
        let Some(wire) = self.wires.remove(&wire_id) else {
            return;
        };
        trace!("recycle wire {}", wire_id);

        let source = wire.source();
        if let Some(circuit) = self.circuits.get_mut(&source.circuit_id()) {
            if let Some(conn) = circuit.output_mut(source.index()) {
                conn.detach(wire_id);
            }
        }
        let sink = wire.sink();
        if let Some(circuit) = self.circuits.get_mut(&sink.circuit_id()) {
            if let Some(conn) = circuit.input_mut(sink.index()) {
                conn.detach(wire_id);
            }
        }

        self.pool.recycle(wire);
        self.input_change(sink.circuit_id());
    }

    // Signal flow
    // -----------------------

    /// Flip a button's power state and broadcast the change
    pub fn toggle_button(&mut self, id: CircuitId) -> Result<()> {
        let power = {
            let circuit = self
                .circuits
                .get_mut(&id)
                .ok_or(EngineError::CircuitNotFound { id })?;
            if circuit.kind() != CircuitKind::Button {
                return Err(EngineError::KindMismatch {
                    id,
                    expected: "button",
                });
            }
            circuit.set_power(!circuit.power());
            circuit.power()
        };
        debug!("button {} toggled {}", id, if power { "on" } else { "off" });
        self.notify_power_changed(id, power);
        self.broadcast(id);
        Ok(())
    }

    /// Adjust a delay circuit's propagation delay (integer units, floor 1)
    pub fn set_delay(&mut self, id: CircuitId, units: u64) -> Result<()> {
        let circuit = self
            .circuits
            .get_mut(&id)
            .ok_or(EngineError::CircuitNotFound { id })?;
        if circuit.kind() != CircuitKind::Delay {
            return Err(EngineError::KindMismatch {
                id,
                expected: "delay",
            });
        }
        circuit.set_delay(units);
        Ok(())
    }

    /// Adjust a ticker's off period (integer units, floor 1).
    /// Takes effect when the ticker next reschedules itself.
    pub fn set_off_time(&mut self, id: CircuitId, units: u64) -> Result<()> {
        let circuit = self
            .circuits
            .get_mut(&id)
            .ok_or(EngineError::CircuitNotFound { id })?;
        match circuit.data_mut() {
            KindData::Ticker { off_time } => {
                *off_time = units.max(1);
                Ok(())
            }
            _ => Err(EngineError::KindMismatch {
                id,
                expected: "ticker",
            }),
        }
    }

    /// Re-evaluate a circuit against the cached power of its input wires.
    ///
    /// Unconnected inputs read as false. If the computed power differs from
    /// the current state, the circuit updates and broadcasts; otherwise
    /// nothing is enqueued.
    pub(crate) fn input_change(&mut self, id: CircuitId) {
        let inputs: Vec<bool> = {
            let Some(circuit) = self.circuits.get(&id) else {
                return;
            };
            if circuit.kind().input_count() == 0 {
                return;
            }
            circuit
                .inputs()
                .iter()
                .map(|conn| {
                    conn.wires()
                        .first()
                        .and_then(|wire| self.wires.get(wire))
                        .map(|wire| wire.power())
                        .unwrap_or(false)
                })
                .collect()
        };

        let changed = {
            let Some(circuit) = self.circuits.get_mut(&id) else {
                return;
            };
            let kind = circuit.kind();
            let power = kind.evaluate(&inputs, circuit.data_mut());
            if power != circuit.power() {
                circuit.set_power(power);
                Some(power)
            } else {
                None
            }
        };

        if let Some(power) = changed {
            self.notify_power_changed(id, power);
            self.broadcast(id);
        }
    }

    /// Schedule delivery of the circuit's current power to every wire on
    /// every output connector, one delivery per wire, each after the
    /// circuit's propagation delay.
    fn broadcast(&mut self, id: CircuitId) {
        let Some(circuit) = self.circuits.get(&id) else {
            return;
        };
        let value = circuit.power();
        let due = self.now + circuit.delay();
        let deliveries: Vec<(WireId, u64)> = circuit
            .outputs()
            .iter()
            .flat_map(|conn| conn.wires().iter().copied())
            .filter_map(|wire| self.wires.get(&wire).map(|w| (wire, w.generation())))
            .collect();

        for (wire, generation) in deliveries {
            trace!("broadcast {} -> wire {} due at {}", value, wire, due);
            self.scheduler.schedule(
                Delivery::WirePower {
                    wire,
                    generation,
                    value,
                },
                due,
            );
        }
    }

    // Clock driving
    // -----------------------

    /// Advance to the next due instant and process everything scheduled for
    /// it. Returns false if no deliveries are pending.
    pub fn step(&mut self) -> bool {
        let Some(due) = self.scheduler.peek_next_due() else {
            return false;
        };
        self.now = due.max(self.now);
        debug!("=== propagation unit {} ===", self.now);
        while let Some(delivery) = self.scheduler.pop_due(self.now) {
            self.process_delivery(delivery);
        }
        true
    }

    /// Advance virtual time by exactly `units`, processing every delivery
    /// that falls due on the way
    pub fn advance(&mut self, units: u64) {
        let target = self.now.saturating_add(units);
        while let Some(due) = self.scheduler.peek_next_due() {
            if due > target {
                break;
            }
            self.now = due.max(self.now);
            debug!("=== propagation unit {} ===", self.now);
            while let Some(delivery) = self.scheduler.pop_due(self.now) {
                self.process_delivery(delivery);
            }
        }
        self.now = target;
    }

    fn process_delivery(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::WirePower {
                wire,
                generation,
                value,
            } => {
                // The wire map only holds attached wires; a matching
                // generation means it is still the same attachment this
                // delivery was scheduled for.
                let sink = match self.wires.get_mut(&wire) {
                    Some(w) if w.generation() == generation => {
                        w.set_power(value);
                        w.sink().circuit_id()
                    }
                    _ => {
                        trace!("dropped stale delivery for wire {}", wire);
                        return;
                    }
                };
                self.input_change(sink);
            }
            Delivery::TickerToggle { circuit } => self.ticker_toggle(circuit),
        }
    }

    /// A ticker flips, broadcasts, and reschedules itself: on for one unit,
    /// off for its configured period, decoupled from any wiring.
    fn ticker_toggle(&mut self, id: CircuitId) {
        let (power, off_time) = {
            // The ticker may have been removed since this toggle was queued
            let Some(circuit) = self.circuits.get_mut(&id) else {
                return;
            };
            let KindData::Ticker { off_time } = circuit.data() else {
                return;
            };
            circuit.set_power(!circuit.power());
            (circuit.power(), off_time.max(1))
        };

        self.notify_power_changed(id, power);
        self.broadcast(id);

        let next = if power { 1 } else { off_time };
        self.scheduler
            .schedule(Delivery::TickerToggle { circuit: id }, self.now + next);
    }

    // Inspection
    // -----------------------

    /// Current virtual time, in propagation units
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn has_pending_deliveries(&self) -> bool {
        self.scheduler.has_events()
    }

    /// Number of deliveries waiting in the virtual-time queue
    pub fn pending_deliveries(&self) -> usize {
        self.scheduler.len()
    }

    pub fn circuit(&self, id: CircuitId) -> Option<&Circuit> {
        self.circuits.get(&id)
    }

    /// All registered circuits, in id order
    pub fn circuits(&self) -> impl Iterator<Item = &Circuit> {
        self.circuits.values()
    }

    pub fn circuit_count(&self) -> usize {
        self.circuits.len()
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(&id)
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// Total wires ever constructed by the pool (its high-water mark)
    pub fn wire_allocations(&self) -> u64 {
        self.pool.allocated()
    }

    pub fn move_circuit(&mut self, id: CircuitId, position: Position) -> Result<()> {
        let circuit = self
            .circuits
            .get_mut(&id)
            .ok_or(EngineError::CircuitNotFound { id })?;
        circuit.set_position(position);
        Ok(())
    }

    /// Canvas offset, persisted with the project
    pub fn canvas(&self) -> Position {
        self.canvas
    }

    pub fn set_canvas(&mut self, canvas: Position) {
        self.canvas = canvas;
    }

    // Loader support
    // -----------------------

    /// Remove every circuit (cascading wire recycle) without touching the
    /// clock or the pool. Every pending delivery can only reference the
    /// removed graph, and the loader may reuse its ids, so the queue is
    /// dropped wholesale rather than left to the staleness checks.
    pub(crate) fn clear_graph(&mut self) {
        let ids: Vec<CircuitId> = self.circuits.keys().copied().collect();
        for id in ids {
            self.remove_circuit_internal(id);
        }
        self.scheduler.clear();
    }

    pub(crate) fn notify_graph_changed(&mut self) {
        for observer in &mut self.observers {
            observer.on_graph_changed();
        }
    }

    fn notify_power_changed(&mut self, id: CircuitId, power: bool) {
        for observer in &mut self.observers {
            observer.on_power_changed(id, power);
        }
    }
}

impl Default for CircuitEngine {
    fn default() -> Self {
        Self::new()
    }
}
