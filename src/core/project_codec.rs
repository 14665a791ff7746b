//! Save/load of the whole graph as compact JSON.
//!
//! The format is sparse: `delay` is written only when greater than 1, `data`
//! only when the kind carries any, and `output_connections` only when the
//! circuit has at least one outgoing wire. Loading validates the entire
//! payload before the destructive clear, so a corrupt save never empties the
//! working graph.

use crate::core::engine::CircuitEngine;
use crate::core::error::{EngineError, Result};
use crate::core::kinds::{CircuitKind, KindData, DEFAULT_TICKER_OFF_TIME};
use crate::core::types::{CircuitId, Position};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize)]
struct ProjectDoc {
    canvas: Position,
    circuits: Vec<CircuitDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CircuitDoc {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    x: i32,
    y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<DataDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_connections: Option<Vec<OutputConnectionDoc>>,
}

/// Kind-specific persisted fields, flattened into one sparse document
#[derive(Debug, Default, Serialize, Deserialize)]
struct DataDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    memory: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    off_time: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OutputConnectionDoc {
    wires: Vec<WireDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireDoc {
    input_circuit_id: u64,
    input_index: usize,
}

/// Serialize the engine's graph to compact JSON
pub fn save_project(engine: &CircuitEngine) -> Result<String> {
    Ok(serde_json::to_string(&to_doc(engine))?)
}

/// Serialize the engine's graph to human-readable JSON
pub fn save_project_pretty(engine: &CircuitEngine) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_doc(engine))?)
}

fn to_doc(engine: &CircuitEngine) -> ProjectDoc {
    let circuits = engine
        .circuits()
        .map(|circuit| {
            let data = match circuit.data() {
                KindData::None => None,
                KindData::Memory { bit } => Some(DataDoc {
                    memory: Some(bit),
                    ..DataDoc::default()
                }),
                KindData::Ticker { off_time } => Some(DataDoc {
                    off_time: Some(off_time),
                    ..DataDoc::default()
                }),
            };

            let has_wires = circuit.outputs().iter().any(|conn| !conn.is_empty());
            let output_connections = has_wires.then(|| {
                circuit
                    .outputs()
                    .iter()
                    .map(|conn| OutputConnectionDoc {
                        wires: conn
                            .wires()
                            .iter()
                            .filter_map(|id| engine.wire(*id))
                            .map(|wire| WireDoc {
                                input_circuit_id: wire.sink().circuit_id().0,
                                input_index: wire.sink().index(),
                            })
                            .collect(),
                    })
                    .collect()
            });

            CircuitDoc {
                kind: circuit.kind().as_str().to_string(),
                id: circuit.id().0,
                x: circuit.position().x,
                y: circuit.position().y,
                delay: (circuit.delay() > 1).then_some(circuit.delay()),
                data,
                output_connections,
            }
        })
        .collect();

    ProjectDoc {
        canvas: engine.canvas(),
        circuits,
    }
}

/// Replace the engine's graph with the one described by `json`.
///
/// The payload is parsed and fully validated first; on any error the current
/// graph is left untouched. On success the live graph is cleared, every
/// circuit is recreated under its persisted id (advancing the id counter past
/// the maximum seen), and every wire is reattached with the source's current
/// power delivered immediately so the reloaded graph settles without an
/// artificial startup lag.
pub fn load_project(engine: &mut CircuitEngine, json: &str) -> Result<()> {
    let doc: ProjectDoc = serde_json::from_str(json)?;

    // Validate before any mutation
    let mut kinds: HashMap<u64, CircuitKind> = HashMap::new();
    let mut parsed: Vec<CircuitKind> = Vec::with_capacity(doc.circuits.len());
    for circuit in &doc.circuits {
        let kind = CircuitKind::parse(&circuit.kind).ok_or_else(|| EngineError::UnsupportedKind {
            kind: circuit.kind.clone(),
        })?;
        if kinds.insert(circuit.id, kind).is_some() {
            return Err(EngineError::DuplicateId {
                id: CircuitId(circuit.id),
            });
        }
        parsed.push(kind);
    }
    for (circuit, kind) in doc.circuits.iter().zip(&parsed) {
        let Some(connections) = &circuit.output_connections else {
            continue;
        };
        if connections.len() > kind.output_count() {
            return Err(EngineError::PortOutOfRange {
                id: CircuitId(circuit.id),
                index: kind.output_count(),
            });
        }
        for connection in connections {
            for wire in &connection.wires {
                let target =
                    kinds
                        .get(&wire.input_circuit_id)
                        .ok_or(EngineError::DanglingReference {
                            id: CircuitId(wire.input_circuit_id),
                        })?;
                if wire.input_index >= target.input_count() {
                    return Err(EngineError::DanglingInput {
                        id: CircuitId(wire.input_circuit_id),
                        index: wire.input_index,
                    });
                }
            }
        }
    }

    // Destructive phase: clear, then rebuild in two passes
    engine.clear_graph();
    engine.set_canvas(doc.canvas);

    let mut highest_id = 0;
    for (circuit, kind) in doc.circuits.iter().zip(&parsed) {
        highest_id = highest_id.max(circuit.id);

        let data = match kind {
            CircuitKind::Memory => KindData::Memory {
                bit: circuit
                    .data
                    .as_ref()
                    .and_then(|data| data.memory)
                    .unwrap_or(false),
            },
            CircuitKind::Ticker => KindData::Ticker {
                off_time: circuit
                    .data
                    .as_ref()
                    .and_then(|data| data.off_time)
                    .unwrap_or(DEFAULT_TICKER_OFF_TIME)
                    .max(1),
            },
            _ => KindData::None,
        };

        engine.insert_circuit(
            CircuitId(circuit.id),
            *kind,
            Position::new(circuit.x, circuit.y),
            data,
            circuit.delay.unwrap_or(1),
        );
    }
    engine.set_next_id(highest_id + 1);

    // Wire everything up, delivering each source's current power as we go
    for circuit in &doc.circuits {
        let Some(connections) = &circuit.output_connections else {
            continue;
        };
        let source = CircuitId(circuit.id);
        for (index, connection) in connections.iter().enumerate() {
            for wire in &connection.wires {
                engine.connect_internal(
                    source.output(index),
                    CircuitId(wire.input_circuit_id).input(wire.input_index),
                )?;
            }
        }
    }

    debug!("loaded project with {} circuits", doc.circuits.len());
    engine.notify_graph_changed();
    Ok(())
}
