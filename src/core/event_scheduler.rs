use crate::core::types::{CircuitId, WireId};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A delayed delivery travelling through the engine's virtual timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A power value arriving at a wire after the source's propagation delay.
    /// Stamped with the wire's generation so deliveries to a since-recycled
    /// wire are dropped.
    WirePower {
        wire: WireId,
        generation: u64,
        value: bool,
    },
    /// A ticker's autonomous self-toggle
    TickerToggle { circuit: CircuitId },
}

#[derive(Debug)]
struct ScheduledDelivery {
    due: u64,
    sequence: u64,
    delivery: Delivery,
}

impl PartialEq for ScheduledDelivery {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.sequence == other.sequence
    }
}

impl Eq for ScheduledDelivery {}

impl PartialOrd for ScheduledDelivery {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledDelivery {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Virtual-time delivery queue, ordered by due instant with a sequence
/// counter keeping same-instant deliveries in scheduling order.
pub struct EventScheduler {
    queue: BinaryHeap<ScheduledDelivery>,
    sequence_counter: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            sequence_counter: 0,
        }
    }

    /// Schedule a delivery at an absolute virtual-time instant
    pub fn schedule(&mut self, delivery: Delivery, due: u64) {
        self.queue.push(ScheduledDelivery {
            due,
            sequence: self.sequence_counter,
            delivery,
        });
        self.sequence_counter += 1;
    }

    /// Earliest due instant in the queue, without removing anything
    pub fn peek_next_due(&self) -> Option<u64> {
        self.queue.peek().map(|event| event.due)
    }

    /// Pop the next delivery if it is due at or before `now`
    pub fn pop_due(&mut self, now: u64) -> Option<Delivery> {
        match self.queue.peek() {
            Some(next) if next.due <= now => self.queue.pop().map(|event| event.delivery),
            _ => None,
        }
    }

    pub fn has_events(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of pending deliveries
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}
