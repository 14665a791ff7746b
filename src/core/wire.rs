use crate::core::types::{InputPort, OutputPort, WireId};

/// A directed edge from an output connector to an input connector.
///
/// `power` is the value last delivered over the wire; it lags the source
/// circuit's current power by the source's propagation delay.
#[derive(Debug, Clone)]
pub struct Wire {
    id: WireId,
    generation: u64,
    source: OutputPort,
    sink: InputPort,
    power: bool,
}

impl Wire {
    fn new(id: WireId, source: OutputPort, sink: InputPort) -> Self {
        Self {
            id,
            generation: 0,
            source,
            sink,
            power: false,
        }
    }

    pub fn id(&self) -> WireId {
        self.id
    }

    /// Incremented every time the wire is recycled. A scheduled delivery
    /// carries the generation it was created under; if they no longer match
    /// the wire was recycled (and possibly reused) in the meantime, and the
    /// delivery must be a silent no-op.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> OutputPort {
        self.source
    }

    pub fn sink(&self) -> InputPort {
        self.sink
    }

    /// Cached last-delivered value
    pub fn power(&self) -> bool {
        self.power
    }

    pub(crate) fn set_power(&mut self, power: bool) {
        self.power = power;
    }
}

/// Free-list pool of wire instances.
///
/// Connect/disconnect is the most frequent user action; reusing detached
/// instances avoids unbounded allocation churn. A pooled wire is
/// indistinguishable from a fresh one once its power is reset, so pooling is
/// purely a performance concern.
#[derive(Debug, Default)]
pub struct WirePool {
    free: Vec<Wire>,
    next_id: u64,
    allocated: u64,
}

impl WirePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a recycled instance if one is available, else construct a new
    /// one. The caller registers the wire on both endpoint connectors.
    pub fn acquire(&mut self, source: OutputPort, sink: InputPort) -> Wire {
        match self.free.pop() {
            Some(mut wire) => {
                wire.source = source;
                wire.sink = sink;
                wire.power = false;
                wire
            }
            None => {
                let id = WireId(self.next_id);
                self.next_id += 1;
                self.allocated += 1;
                Wire::new(id, source, sink)
            }
        }
    }

    /// Return a detached wire to the free list. The caller must already have
    /// removed it from both endpoint connectors.
    pub fn recycle(&mut self, mut wire: Wire) {
        wire.power = false;
        wire.generation += 1;
        self.free.push(wire);
    }

    /// Total wires ever constructed (the pool's allocation high-water mark)
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// Detached instances currently available for reuse
    pub fn available(&self) -> usize {
        self.free.len()
    }
}
