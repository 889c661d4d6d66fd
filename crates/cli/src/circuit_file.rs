//! Circuit files.
//!
//! A circuit file is a JSON document holding one or more circuits:
//!
//! ```json
//! {
//!   "name": "gates",
//!   "circuits": [
//!     {
//!       "id": "and",
//!       "alice": [1],
//!       "bob": [2],
//!       "out": [3],
//!       "gates": [{ "id": 3, "type": "AND", "in": [1, 2] }]
//!     }
//!   ]
//! }
//! ```
//!
//! `alice` lists the garbler's input wires, `bob` the evaluator's. The `id`
//! of a gate is its output wire.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use yao_core::{circuits, Circuit, CircuitDescription, Gate, GateOp, WireId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitFile {
    pub name: String,
    pub circuits: Vec<CircuitEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitEntry {
    pub id: String,
    #[serde(default)]
    pub alice: Vec<u32>,
    #[serde(default)]
    pub bob: Vec<u32>,
    pub out: Vec<u32>,
    pub gates: Vec<GateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateEntry {
    pub id: u32,
    #[serde(rename = "type")]
    pub op: GateOp,
    #[serde(rename = "in")]
    pub inputs: Vec<u32>,
}

impl From<CircuitEntry> for CircuitDescription {
    fn from(entry: CircuitEntry) -> Self {
        CircuitDescription {
            name: entry.id,
            garbler_inputs: entry.alice.into_iter().map(WireId).collect(),
            evaluator_inputs: entry.bob.into_iter().map(WireId).collect(),
            outputs: entry.out.into_iter().map(WireId).collect(),
            gates: entry
                .gates
                .into_iter()
                .map(|gate| Gate {
                    op: gate.op,
                    inputs: gate.inputs.into_iter().map(WireId).collect(),
                    output: WireId(gate.id),
                })
                .collect(),
        }
    }
}

impl CircuitFile {
    /// Parses a circuit file.
    pub fn parse(json: &str) -> Result<Self> {
        let file: CircuitFile = serde_json::from_str(json)?;
        ensure!(!file.circuits.is_empty(), "circuit file holds no circuits");

        Ok(file)
    }

    /// Validates every circuit of the file.
    pub fn into_circuits(self) -> Result<Vec<Circuit>> {
        self.circuits
            .into_iter()
            .map(|entry| {
                let id = entry.id.clone();
                Circuit::try_from(CircuitDescription::from(entry))
                    .with_context(|| format!("invalid circuit {id}"))
            })
            .collect()
    }
}

/// Loads the circuits to run.
///
/// Reads `path` if given, otherwise builds the MIN circuit for `bit_width`
/// bit inputs.
pub fn load(path: Option<&Path>, bit_width: usize) -> Result<Vec<Circuit>> {
    let Some(path) = path else {
        debug!(bit_width, "using built-in MIN circuit");
        return Ok(vec![circuits::min(bit_width)?]);
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read circuit file {}", path.display()))?;
    let file = CircuitFile::parse(&json)
        .with_context(|| format!("failed to parse circuit file {}", path.display()))?;
    debug!(name = file.name, circuits = file.circuits.len(), "loaded circuit file");

    file.into_circuits()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use yao_core::circuits::{from_bits, to_bits};

    use super::*;

    const GATES: &str = r#"{
        "name": "gates",
        "circuits": [
            {
                "id": "and",
                "alice": [1],
                "bob": [2],
                "out": [3],
                "gates": [{ "id": 3, "type": "AND", "in": [1, 2] }]
            },
            {
                "id": "not",
                "alice": [1],
                "out": [2],
                "gates": [{ "id": 2, "type": "NOT", "in": [1] }]
            },
            {
                "id": "xor-then-nand",
                "alice": [1, 2],
                "bob": [3],
                "out": [5],
                "gates": [
                    { "id": 5, "type": "NAND", "in": [4, 3] },
                    { "id": 4, "type": "XOR", "in": [1, 2] }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse() {
        let circs = CircuitFile::parse(GATES).unwrap().into_circuits().unwrap();

        assert_eq!(circs.len(), 3);
        assert_eq!(circs[0].name(), "and");
        assert_eq!(circs[0].garbler_inputs(), &[WireId(1)]);
        assert_eq!(circs[0].evaluator_inputs(), &[WireId(2)]);
        assert!(circs[1].evaluator_inputs().is_empty());
        assert_eq!(circs[1].gates()[0].op, GateOp::Not);

        // Gates are reordered so the XOR runs first.
        assert_eq!(circs[2].gates()[0].output, WireId(4));
        assert_eq!(
            circs[2].eval_plain(&[true, false], &[true]).unwrap(),
            vec![false]
        );
    }

    #[test]
    fn test_reject_unknown_gate() {
        let json = r#"{"name": "x", "circuits": [{"id": "x", "alice": [1], "bob": [2],
            "out": [3], "gates": [{"id": 3, "type": "IMPLIES", "in": [1, 2]}]}]}"#;

        assert!(CircuitFile::parse(json).is_err());
    }

    #[test]
    fn test_reject_empty_file() {
        assert!(CircuitFile::parse(r#"{"name": "x", "circuits": []}"#).is_err());
    }

    #[test]
    fn test_reject_malformed_circuit() {
        let json = r#"{"name": "x", "circuits": [{"id": "cycle", "alice": [1], "out": [3],
            "gates": [{"id": 2, "type": "AND", "in": [1, 3]},
                      {"id": 3, "type": "AND", "in": [1, 2]}]}]}"#;

        let err = CircuitFile::parse(json)
            .unwrap()
            .into_circuits()
            .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GATES.as_bytes()).unwrap();

        assert_eq!(load(Some(file.path()), 8).unwrap().len(), 3);
    }

    #[test]
    fn test_load_builtin() {
        let circs = load(None, 4).unwrap();

        assert_eq!(circs.len(), 1);
        let out = circs[0].eval_plain(&to_bits(9, 4), &to_bits(6, 4)).unwrap();
        assert_eq!(from_bits(&out), 6);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load(Some(Path::new("/nonexistent/circuit.json")), 8).is_err());
    }
}
