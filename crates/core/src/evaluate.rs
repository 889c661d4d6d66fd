//! Evaluation engine.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::{
    circuit::{Circuit, GateOp, WireId},
    garble::{decrypt, GarbledTable, DOUBLE_ROW_LEN, SINGLE_ROW_LEN},
    keys::MaskedValue,
};

/// Errors that can occur during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluateError {
    /// A row failed to authenticate.
    #[error("decryption failed at gate {gate} producing wire {wire}")]
    DecryptionFailure {
        /// Gate index.
        gate: usize,
        /// Output wire of the gate.
        wire: WireId,
    },
    /// An input wire has no masked value.
    #[error("missing masked value for input wire {0}")]
    MissingInput(WireId),
    /// An output wire has no permutation bit.
    #[error("missing permutation bit for output wire {0}")]
    MissingPbit(WireId),
    /// A table has the wrong shape.
    #[error("malformed garbled table for gate {gate}")]
    MalformedTable {
        /// Gate index.
        gate: usize,
    },
    /// The number of tables differs from the number of gates.
    #[error("expected {expected} garbled tables, got {actual}")]
    TableCount {
        /// Number of gates.
        expected: usize,
        /// Number of tables received.
        actual: usize,
    },
}

/// Evaluates a garbled circuit, returning the masked values of the output
/// wires.
///
/// # Arguments
///
/// * `circ` - The circuit.
/// * `tables` - Garbled tables, one per gate in topological order.
/// * `inputs` - One masked value per circuit input wire.
#[instrument(level = "debug", skip_all, fields(circuit = circ.name()))]
pub fn evaluate_masked(
    circ: &Circuit,
    tables: &[GarbledTable],
    inputs: &BTreeMap<WireId, MaskedValue>,
) -> Result<BTreeMap<WireId, MaskedValue>, EvaluateError> {
    if tables.len() != circ.gates().len() {
        return Err(EvaluateError::TableCount {
            expected: circ.gates().len(),
            actual: tables.len(),
        });
    }

    let mut active: BTreeMap<WireId, MaskedValue> = BTreeMap::new();
    for wire in circ.inputs() {
        let value = inputs.get(&wire).ok_or(EvaluateError::MissingInput(wire))?;
        active.insert(wire, *value);
    }

    for (gid, (gate, table)) in circ.gates().iter().zip(tables).enumerate() {
        // Gates are topologically ordered, so every input is already active.
        let a = active
            .get(&gate.inputs[0])
            .copied()
            .ok_or(EvaluateError::MissingInput(gate.inputs[0]))?;

        let decryption_failure = EvaluateError::DecryptionFailure {
            gate: gid,
            wire: gate.output,
        };

        let payload = match gate.op {
            GateOp::Not => {
                let row = a.ext as usize;
                let ct = row_of(table, gid, 2, SINGLE_ROW_LEN, row)?;
                decrypt(&a.key, gid, row, 0, ct).ok_or(decryption_failure)?
            }
            _ => {
                let b = active
                    .get(&gate.inputs[1])
                    .copied()
                    .ok_or(EvaluateError::MissingInput(gate.inputs[1]))?;

                let row = 2 * a.ext as usize + b.ext as usize;
                let ct = row_of(table, gid, 4, DOUBLE_ROW_LEN, row)?;
                let inner = decrypt(&b.key, gid, row, 1, ct).ok_or(decryption_failure.clone())?;
                decrypt(&a.key, gid, row, 0, &inner).ok_or(decryption_failure)?
            }
        };

        let value = MaskedValue::from_bytes(&payload)
            .ok_or(EvaluateError::MalformedTable { gate: gid })?;
        active.insert(gate.output, value);
    }

    debug!("evaluated circuit");

    circ.outputs()
        .iter()
        .map(|&wire| {
            active
                .get(&wire)
                .map(|value| (wire, *value))
                .ok_or(EvaluateError::MissingInput(wire))
        })
        .collect()
}

/// Evaluates a garbled circuit and decodes its outputs.
///
/// The true value of an output wire is its external bit XOR its permutation
/// bit. Returns one bit per output wire.
pub fn evaluate(
    circ: &Circuit,
    tables: &[GarbledTable],
    output_pbits: &BTreeMap<WireId, bool>,
    inputs: &BTreeMap<WireId, MaskedValue>,
) -> Result<BTreeMap<WireId, bool>, EvaluateError> {
    let masked = evaluate_masked(circ, tables, inputs)?;

    unmask(&masked, output_pbits)
}

/// Decodes masked output values with the garbler's permutation bits.
pub fn unmask(
    masked: &BTreeMap<WireId, MaskedValue>,
    output_pbits: &BTreeMap<WireId, bool>,
) -> Result<BTreeMap<WireId, bool>, EvaluateError> {
    masked
        .iter()
        .map(|(&wire, value)| {
            let pbit = output_pbits
                .get(&wire)
                .ok_or(EvaluateError::MissingPbit(wire))?;
            Ok((wire, value.ext ^ pbit))
        })
        .collect()
}

fn row_of(
    table: &GarbledTable,
    gate: usize,
    rows: usize,
    row_len: usize,
    row: usize,
) -> Result<&[u8], EvaluateError> {
    if table.rows().len() != rows || table.rows().iter().any(|r| r.len() != row_len) {
        return Err(EvaluateError::MalformedTable { gate });
    }

    Ok(&table.rows()[row])
}
