use crate::core::engine::{CircuitEngine, EngineObserver};
use crate::core::error::EngineError;
use crate::core::kinds::{CircuitKind, KindData};
use crate::core::types::{CircuitId, Position};
use std::cell::RefCell;
use std::rc::Rc;

fn engine() -> CircuitEngine {
    CircuitEngine::new()
}

fn power(engine: &CircuitEngine, id: CircuitId) -> bool {
    engine.circuit(id).expect("circuit exists").power()
}

#[test]
fn test_button_to_light_propagates_after_one_unit() {
    let mut engine = engine();
    let button = engine.create_circuit(CircuitKind::Button, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());
    engine.connect(button.output(0), light.input(0)).unwrap();

    engine.toggle_button(button).unwrap();
    assert!(power(&engine, button));
    assert!(!power(&engine, light), "signal has not travelled yet");

    engine.advance(1);
    assert!(power(&engine, light), "one propagation unit reaches the light");
}

#[test]
fn test_connect_delivers_current_power_immediately() {
    let mut engine = engine();
    let not = engine.create_circuit(CircuitKind::Not, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());

    // NOT starts true; the drag-connect hands its power over without delay
    engine.connect(not.output(0), light.input(0)).unwrap();
    assert!(power(&engine, light));
}

#[test]
fn test_unchanged_evaluation_enqueues_nothing() {
    let mut engine = engine();
    let button = engine.create_circuit(CircuitKind::Button, Position::default());
    let and = engine.create_circuit(CircuitKind::And, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());
    engine.connect(button.output(0), and.input(0)).unwrap();
    engine.connect(and.output(0), light.input(0)).unwrap();

    engine.toggle_button(button).unwrap();
    assert_eq!(engine.pending_deliveries(), 1);

    // AND sees (true, false) and stays false, so nothing new is scheduled
    engine.advance(1);
    assert_eq!(engine.pending_deliveries(), 0);
    assert!(!power(&engine, and));
    assert!(!power(&engine, light));
}

#[test]
fn test_memory_latch_set_priority_through_wires() {
    let mut engine = engine();
    let set = engine.create_circuit(CircuitKind::Button, Position::default());
    let reset = engine.create_circuit(CircuitKind::Button, Position::default());
    let memory = engine.create_circuit(CircuitKind::Memory, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());
    engine.connect(set.output(0), memory.input(1)).unwrap();
    engine.connect(reset.output(0), memory.input(0)).unwrap();
    engine.connect(memory.output(0), light.input(0)).unwrap();

    assert!(!power(&engine, memory));

    // SET asserted -> latch turns on
    engine.toggle_button(set).unwrap();
    engine.advance(1);
    assert!(power(&engine, memory));
    engine.advance(1);
    assert!(power(&engine, light));

    // Both deasserted -> latch holds
    engine.toggle_button(set).unwrap();
    engine.advance(2);
    assert!(power(&engine, memory), "latch holds with both inputs low");

    // RESET asserted -> latch turns off
    engine.toggle_button(reset).unwrap();
    engine.advance(1);
    assert!(!power(&engine, memory));
    engine.advance(1);
    assert!(!power(&engine, light));

    // SET and RESET together -> SET wins
    engine.toggle_button(set).unwrap();
    engine.advance(1);
    assert!(power(&engine, memory), "SET has priority over RESET");
}

#[test]
fn test_ticker_cadence_with_off_time_five() {
    let mut engine = engine();
    let ticker = engine.create_circuit_with_data(
        CircuitKind::Ticker,
        Position::default(),
        KindData::Ticker { off_time: 5 },
        1,
    );

    let mut observed = Vec::new();
    for _ in 0..12 {
        engine.advance(1);
        observed.push(power(&engine, ticker));
    }

    // Off for 5 units, on for 1, repeating - with no external wiring at all
    let expected = [
        false, false, false, false, true, // first pulse fires at unit 5
        false, false, false, false, false, // off period
        true,  // second pulse at unit 11
        false,
    ];
    assert_eq!(observed, expected);
}

#[test]
fn test_delay_circuit_shifts_output_by_exactly_its_delay() {
    let mut engine = engine();
    let button = engine.create_circuit(CircuitKind::Button, Position::default());
    let delay = engine.create_circuit(CircuitKind::Delay, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());
    engine.connect(button.output(0), delay.input(0)).unwrap();
    engine.connect(delay.output(0), light.input(0)).unwrap();
    engine.set_delay(delay, 3).unwrap();

    engine.toggle_button(button).unwrap();

    // The delay circuit's own input flips at unit 1
    engine.advance(1);
    assert!(power(&engine, delay));
    assert!(!power(&engine, light));

    // Its broadcast takes 3 units instead of 1: not at unit 2 or 3...
    engine.advance(1);
    assert!(!power(&engine, light), "too early at +2");
    engine.advance(1);
    assert!(!power(&engine, light), "too early at +3");

    // ...but exactly at unit 4
    engine.advance(1);
    assert!(power(&engine, light));
}

#[test]
fn test_wire_pool_reuses_instances() {
    let mut engine = engine();
    let button = engine.create_circuit(CircuitKind::Button, Position::default());
    let lights: Vec<CircuitId> = (0..3)
        .map(|_| engine.create_circuit(CircuitKind::Light, Position::default()))
        .collect();

    for light in &lights {
        engine.connect(button.output(0), light.input(0)).unwrap();
    }
    assert_eq!(engine.wire_allocations(), 3);

    engine.disconnect_output(button.output(0));
    assert_eq!(engine.wire_count(), 0);

    for light in &lights {
        engine.connect(button.output(0), light.input(0)).unwrap();
    }
    assert_eq!(
        engine.wire_allocations(),
        3,
        "reconnecting must not grow the allocation high-water mark"
    );
}

#[test]
fn test_stale_delivery_is_a_silent_noop() {
    let mut engine = engine();
    let button = engine.create_circuit(CircuitKind::Button, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());
    engine.connect(button.output(0), light.input(0)).unwrap();

    // Schedule a true delivery, then recycle the wire before it fires
    engine.toggle_button(button).unwrap();
    engine.disconnect_input(light.input(0));

    engine.advance(2);
    assert!(!power(&engine, light), "recycled wire never delivers");
}

#[test]
fn test_stale_delivery_misses_a_reused_wire() {
    let mut engine = engine();
    let button = engine.create_circuit(CircuitKind::Button, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());
    engine.connect(button.output(0), light.input(0)).unwrap();

    // In-flight true delivery against the original wire...
    engine.toggle_button(button).unwrap();
    // ...which is recycled, while the button goes dark again
    engine.disconnect_input(light.input(0));
    engine.toggle_button(button).unwrap();
    // The same pooled instance now carries the same endpoints again
    engine.connect(button.output(0), light.input(0)).unwrap();
    assert_eq!(engine.wire_allocations(), 1);

    engine.advance(2);
    assert!(
        !power(&engine, light),
        "delivery stamped with the old generation must not land"
    );
}

#[test]
fn test_last_connection_wins_on_an_input() {
    let mut engine = engine();
    let first = engine.create_circuit(CircuitKind::Button, Position::default());
    let second = engine.create_circuit(CircuitKind::Button, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());

    engine.toggle_button(first).unwrap();
    engine.connect(first.output(0), light.input(0)).unwrap();
    assert!(power(&engine, light));

    // Connecting a second driver silently replaces the first wire
    engine.connect(second.output(0), light.input(0)).unwrap();
    assert_eq!(engine.wire_count(), 1);
    assert!(
        engine
            .circuit(first)
            .unwrap()
            .output(0)
            .unwrap()
            .is_empty(),
        "superseded wire is detached from its source"
    );
    assert!(!power(&engine, light), "new driver is dark");
}

#[test]
fn test_remove_circuit_recycles_wires_and_is_idempotent() {
    let mut engine = engine();
    let button = engine.create_circuit(CircuitKind::Button, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());
    engine.connect(button.output(0), light.input(0)).unwrap();

    engine.remove_circuit(button);
    assert_eq!(engine.circuit_count(), 1);
    assert_eq!(engine.wire_count(), 0);
    assert!(
        engine.circuit(light).unwrap().input(0).unwrap().is_empty(),
        "wire is detached from the surviving endpoint"
    );

    // Removing a missing id is a no-op, not an error
    engine.remove_circuit(button);
    assert_eq!(engine.circuit_count(), 1);
}

#[test]
fn test_removed_ticker_stops_silently() {
    let mut engine = engine();
    let ticker = engine.create_circuit_with_data(
        CircuitKind::Ticker,
        Position::default(),
        KindData::Ticker { off_time: 2 },
        1,
    );
    engine.remove_circuit(ticker);

    engine.advance(5);
    assert_eq!(engine.circuit_count(), 0);
}

#[test]
fn test_feedback_loop_oscillates_without_recursing() {
    let mut engine = engine();
    let not = engine.create_circuit(CircuitKind::Not, Position::default());

    // An inverter wired back into itself: only the per-hop delay keeps this
    // from recursing within a single instant
    engine.connect(not.output(0), not.input(0)).unwrap();
    assert!(!power(&engine, not), "loop flips once on connect");

    let before = power(&engine, not);
    engine.advance(1);
    assert_eq!(power(&engine, not), !before);
    engine.advance(1);
    assert_eq!(power(&engine, not), before);
    assert!(engine.has_pending_deliveries(), "the loop keeps running");
}

#[test]
fn test_operation_errors() {
    let mut engine = engine();
    let light = engine.create_circuit(CircuitKind::Light, Position::default());
    let button = engine.create_circuit(CircuitKind::Button, Position::default());
    let missing = CircuitId(99);

    assert!(matches!(
        engine.toggle_button(light),
        Err(EngineError::KindMismatch { .. })
    ));
    assert!(matches!(
        engine.toggle_button(missing),
        Err(EngineError::CircuitNotFound { .. })
    ));
    assert!(matches!(
        engine.connect(missing.output(0), light.input(0)),
        Err(EngineError::CircuitNotFound { .. })
    ));
    assert!(matches!(
        engine.connect(button.output(3), light.input(0)),
        Err(EngineError::PortOutOfRange { .. })
    ));
    assert!(matches!(
        engine.connect(button.output(0), light.input(7)),
        Err(EngineError::PortOutOfRange { .. })
    ));
    assert!(matches!(
        engine.set_delay(button, 3),
        Err(EngineError::KindMismatch { .. })
    ));
    assert!(matches!(
        engine.set_off_time(light, 3),
        Err(EngineError::KindMismatch { .. })
    ));
}

#[test]
fn test_adjustments_clamp_to_floor_one() {
    let mut engine = engine();
    let delay = engine.create_circuit(CircuitKind::Delay, Position::default());
    let ticker = engine.create_circuit(CircuitKind::Ticker, Position::default());

    engine.set_delay(delay, 0).unwrap();
    assert_eq!(engine.circuit(delay).unwrap().delay(), 1);

    engine.set_off_time(ticker, 0).unwrap();
    assert_eq!(
        engine.circuit(ticker).unwrap().data(),
        KindData::Ticker { off_time: 1 }
    );
}

#[test]
fn test_step_jumps_to_the_next_due_instant() {
    let mut engine = engine();
    let ticker = engine.create_circuit_with_data(
        CircuitKind::Ticker,
        Position::default(),
        KindData::Ticker { off_time: 7 },
        1,
    );

    assert!(engine.step(), "first toggle is pending");
    assert_eq!(engine.now(), 7);
    assert!(power(&engine, ticker));

    assert!(engine.step());
    assert_eq!(engine.now(), 8);
    assert!(!power(&engine, ticker));
}

#[test]
fn test_reset_drops_graph_clock_and_queue() {
    let mut engine = engine();
    let button = engine.create_circuit(CircuitKind::Button, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());
    engine.connect(button.output(0), light.input(0)).unwrap();
    engine.toggle_button(button).unwrap();
    engine.advance(5);

    engine.reset();
    assert_eq!(engine.circuit_count(), 0);
    assert_eq!(engine.wire_count(), 0);
    assert_eq!(engine.now(), 0);
    assert!(!engine.has_pending_deliveries());

    let fresh = engine.create_circuit(CircuitKind::Button, Position::default());
    assert_eq!(fresh, CircuitId(0), "id counter starts over");
}

#[test]
fn test_move_circuit_updates_position() {
    let mut engine = engine();
    let button = engine.create_circuit(CircuitKind::Button, Position::new(5, 5));
    engine.move_circuit(button, Position::new(-30, 40)).unwrap();
    assert_eq!(
        engine.circuit(button).unwrap().position(),
        Position::new(-30, 40)
    );
    assert!(matches!(
        engine.move_circuit(CircuitId(9), Position::default()),
        Err(EngineError::CircuitNotFound { .. })
    ));
}

#[derive(Default)]
struct Recorder {
    power_events: Vec<(CircuitId, bool)>,
    graph_changes: usize,
}

struct RecordingObserver(Rc<RefCell<Recorder>>);

impl EngineObserver for RecordingObserver {
    fn on_power_changed(&mut self, id: CircuitId, power: bool) {
        self.0.borrow_mut().power_events.push((id, power));
    }

    fn on_graph_changed(&mut self) {
        self.0.borrow_mut().graph_changes += 1;
    }
}

#[test]
fn test_observers_see_power_and_graph_changes() {
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let mut engine = engine();
    engine.add_observer(Box::new(RecordingObserver(recorder.clone())));

    let button = engine.create_circuit(CircuitKind::Button, Position::default());
    let light = engine.create_circuit(CircuitKind::Light, Position::default());
    engine.connect(button.output(0), light.input(0)).unwrap();
    assert_eq!(recorder.borrow().graph_changes, 3);

    engine.toggle_button(button).unwrap();
    engine.advance(1);
    assert_eq!(
        recorder.borrow().power_events,
        vec![(button, true), (light, true)]
    );
}
