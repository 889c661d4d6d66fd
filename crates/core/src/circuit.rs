//! Boolean circuits.
//!
//! A [`CircuitDescription`] is an unchecked list of gates as it comes off the
//! wire or out of a file. Converting it into a [`Circuit`] validates the gate
//! graph and fixes the topological order in which gates are garbled and
//! evaluated.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, BinaryHeap},
    fmt,
};

use serde::{Deserialize, Serialize};

/// Identifier of a wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WireId(pub u32);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for WireId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A boolean operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateOp {
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Exclusive or.
    Xor,
    /// Negated conjunction.
    Nand,
    /// Negated disjunction.
    Nor,
    /// Negated exclusive or.
    Xnor,
    /// Negation, the only unary operator.
    Not,
}

impl GateOp {
    /// All supported operators.
    pub const ALL: [GateOp; 7] = [
        GateOp::And,
        GateOp::Or,
        GateOp::Xor,
        GateOp::Nand,
        GateOp::Nor,
        GateOp::Xnor,
        GateOp::Not,
    ];

    /// Returns the number of inputs of the operator.
    pub fn arity(&self) -> usize {
        match self {
            GateOp::Not => 1,
            _ => 2,
        }
    }

    /// Evaluates the operator in the clear.
    ///
    /// `b` is ignored for [`GateOp::Not`].
    pub fn eval(&self, a: bool, b: bool) -> bool {
        match self {
            GateOp::And => a & b,
            GateOp::Or => a | b,
            GateOp::Xor => a ^ b,
            GateOp::Nand => !(a & b),
            GateOp::Nor => !(a | b),
            GateOp::Xnor => !(a ^ b),
            GateOp::Not => !a,
        }
    }
}

impl fmt::Display for GateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateOp::And => "AND",
            GateOp::Or => "OR",
            GateOp::Xor => "XOR",
            GateOp::Nand => "NAND",
            GateOp::Nor => "NOR",
            GateOp::Xnor => "XNOR",
            GateOp::Not => "NOT",
        };
        f.write_str(name)
    }
}

/// A gate, reading one or two wires and producing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    /// Operator.
    pub op: GateOp,
    /// Input wires, in operand order.
    pub inputs: Vec<WireId>,
    /// Output wire.
    pub output: WireId,
}

impl Gate {
    /// Creates a new two-input gate.
    pub fn binary(op: GateOp, a: WireId, b: WireId, output: WireId) -> Self {
        Self {
            op,
            inputs: vec![a, b],
            output,
        }
    }

    /// Creates a new NOT gate.
    pub fn not(a: WireId, output: WireId) -> Self {
        Self {
            op: GateOp::Not,
            inputs: vec![a],
            output,
        }
    }
}

/// An unchecked circuit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitDescription {
    /// Name of the circuit.
    pub name: String,
    /// Wires carrying the garbler's input bits.
    pub garbler_inputs: Vec<WireId>,
    /// Wires carrying the evaluator's input bits.
    pub evaluator_inputs: Vec<WireId>,
    /// Wires whose values are revealed.
    pub outputs: Vec<WireId>,
    /// Gates, in any order.
    pub gates: Vec<Gate>,
}

/// Structural defect of a circuit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum Defect {
    #[error("gate {gate} expects {expected} inputs, got {actual}")]
    Arity {
        gate: usize,
        expected: usize,
        actual: usize,
    },
    #[error("gate {gate} reads wire {wire} which is never produced")]
    UndefinedWire { gate: usize, wire: WireId },
    #[error("gate {gate} produces wire {wire} which is already produced")]
    ProducedTwice { gate: usize, wire: WireId },
    #[error("gate {gate} writes input wire {wire}")]
    WritesInput { gate: usize, wire: WireId },
    #[error("gate {gate} is part of a cycle")]
    Cycle { gate: usize },
    #[error("input wire {wire} is declared twice")]
    DuplicateInput { wire: WireId },
    #[error("output wire {wire} is never produced")]
    UnknownOutput { wire: WireId },
}

/// Errors that can occur when building a circuit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CircuitError {
    /// The gate graph is malformed.
    #[error("malformed circuit: {0}")]
    MalformedGate(#[from] Defect),
}

/// A validated circuit with its gates in topological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CircuitDescription", into = "CircuitDescription")]
pub struct Circuit {
    name: String,
    garbler_inputs: Vec<WireId>,
    evaluator_inputs: Vec<WireId>,
    outputs: Vec<WireId>,
    gates: Vec<Gate>,
}

impl Circuit {
    /// Returns the name of the circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the garbler's input wires.
    pub fn garbler_inputs(&self) -> &[WireId] {
        &self.garbler_inputs
    }

    /// Returns the evaluator's input wires.
    pub fn evaluator_inputs(&self) -> &[WireId] {
        &self.evaluator_inputs
    }

    /// Returns all input wires, garbler's first.
    pub fn inputs(&self) -> impl Iterator<Item = WireId> + '_ {
        self.garbler_inputs
            .iter()
            .chain(self.evaluator_inputs.iter())
            .copied()
    }

    /// Returns the output wires.
    pub fn outputs(&self) -> &[WireId] {
        &self.outputs
    }

    /// Returns the gates in topological order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Returns every wire of the circuit: inputs followed by gate outputs.
    pub fn wires(&self) -> impl Iterator<Item = WireId> + '_ {
        self.inputs().chain(self.gates.iter().map(|gate| gate.output))
    }

    /// Evaluates the circuit in the clear.
    ///
    /// Returns `None` if the number of input bits does not match.
    pub fn eval_plain(&self, garbler: &[bool], evaluator: &[bool]) -> Option<Vec<bool>> {
        if garbler.len() != self.garbler_inputs.len()
            || evaluator.len() != self.evaluator_inputs.len()
        {
            return None;
        }

        let mut values: BTreeMap<WireId, bool> = self
            .garbler_inputs
            .iter()
            .copied()
            .zip(garbler.iter().copied())
            .chain(
                self.evaluator_inputs
                    .iter()
                    .copied()
                    .zip(evaluator.iter().copied()),
            )
            .collect();

        for gate in &self.gates {
            let a = values[&gate.inputs[0]];
            let b = gate.inputs.get(1).map(|w| values[w]).unwrap_or_default();
            values.insert(gate.output, gate.op.eval(a, b));
        }

        Some(self.outputs.iter().map(|w| values[w]).collect())
    }
}

impl TryFrom<CircuitDescription> for Circuit {
    type Error = CircuitError;

    fn try_from(desc: CircuitDescription) -> Result<Self, Self::Error> {
        let CircuitDescription {
            name,
            garbler_inputs,
            evaluator_inputs,
            outputs,
            gates,
        } = desc;

        let mut inputs = BTreeSet::new();
        for &wire in garbler_inputs.iter().chain(evaluator_inputs.iter()) {
            if !inputs.insert(wire) {
                return Err(Defect::DuplicateInput { wire }.into());
            }
        }

        // Maps each produced wire to the gate producing it.
        let mut producer: BTreeMap<WireId, usize> = BTreeMap::new();
        for (id, gate) in gates.iter().enumerate() {
            if gate.inputs.len() != gate.op.arity() {
                return Err(Defect::Arity {
                    gate: id,
                    expected: gate.op.arity(),
                    actual: gate.inputs.len(),
                }
                .into());
            }

            if inputs.contains(&gate.output) {
                return Err(Defect::WritesInput {
                    gate: id,
                    wire: gate.output,
                }
                .into());
            }

            if producer.insert(gate.output, id).is_some() {
                return Err(Defect::ProducedTwice {
                    gate: id,
                    wire: gate.output,
                }
                .into());
            }
        }

        for (id, gate) in gates.iter().enumerate() {
            for &wire in &gate.inputs {
                if !inputs.contains(&wire) && !producer.contains_key(&wire) {
                    return Err(Defect::UndefinedWire { gate: id, wire }.into());
                }
            }
        }

        for &wire in &outputs {
            if !inputs.contains(&wire) && !producer.contains_key(&wire) {
                return Err(Defect::UnknownOutput { wire }.into());
            }
        }

        let order = topological_order(&gates, &producer)?;

        let mut gates: Vec<Option<Gate>> = gates.into_iter().map(Some).collect();
        let gates = order
            .into_iter()
            .filter_map(|id| gates[id].take())
            .collect();

        Ok(Self {
            name,
            garbler_inputs,
            evaluator_inputs,
            outputs,
            gates,
        })
    }
}

impl From<Circuit> for CircuitDescription {
    fn from(circ: Circuit) -> Self {
        Self {
            name: circ.name,
            garbler_inputs: circ.garbler_inputs,
            evaluator_inputs: circ.evaluator_inputs,
            outputs: circ.outputs,
            gates: circ.gates,
        }
    }
}

/// Kahn's algorithm, always picking the ready gate with the lowest index.
///
/// A gate list which is already in topological order is returned unchanged,
/// so both parties derive the same order from a serialized circuit.
fn topological_order(
    gates: &[Gate],
    producer: &BTreeMap<WireId, usize>,
) -> Result<Vec<usize>, CircuitError> {
    let mut pending = vec![0usize; gates.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); gates.len()];

    for (id, gate) in gates.iter().enumerate() {
        for wire in &gate.inputs {
            if let Some(&dep) = producer.get(wire) {
                pending[id] += 1;
                dependents[dep].push(id);
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| Reverse(id))
        .collect();

    let mut order = Vec::with_capacity(gates.len());
    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);
        for &next in &dependents[id] {
            pending[next] -= 1;
            if pending[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() != gates.len() {
        let gate = pending
            .iter()
            .position(|count| *count > 0)
            .unwrap_or_default();
        return Err(Defect::Cycle { gate }.into());
    }

    Ok(order)
}
