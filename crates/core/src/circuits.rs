//! Built-in circuits.

use crate::circuit::{Circuit, CircuitDescription, CircuitError, Gate, GateOp, WireId};

/// Incrementally builds a circuit, allocating wire ids as it goes.
///
/// ```
/// use yao_core::{circuits::CircuitBuilder, GateOp};
///
/// let mut builder = CircuitBuilder::new("and");
/// let a = builder.add_garbler_input();
/// let b = builder.add_evaluator_input();
/// let c = builder.add_gate(GateOp::And, a, b);
/// builder.add_output(c);
///
/// let circ = builder.build().unwrap();
/// assert_eq!(circ.eval_plain(&[true], &[true]), Some(vec![true]));
/// ```
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    desc: CircuitDescription,
    next_wire: u32,
}

impl CircuitBuilder {
    /// Creates a new, empty builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            desc: CircuitDescription {
                name: name.into(),
                ..Default::default()
            },
            next_wire: 0,
        }
    }

    fn alloc(&mut self) -> WireId {
        let wire = WireId(self.next_wire);
        self.next_wire += 1;
        wire
    }

    /// Adds an input wire owned by the garbler.
    pub fn add_garbler_input(&mut self) -> WireId {
        let wire = self.alloc();
        self.desc.garbler_inputs.push(wire);
        wire
    }

    /// Adds an input wire owned by the evaluator.
    pub fn add_evaluator_input(&mut self) -> WireId {
        let wire = self.alloc();
        self.desc.evaluator_inputs.push(wire);
        wire
    }

    /// Adds a two-input gate, returning its output wire.
    pub fn add_gate(&mut self, op: GateOp, a: WireId, b: WireId) -> WireId {
        let output = self.alloc();
        self.desc.gates.push(Gate::binary(op, a, b, output));
        output
    }

    /// Adds a NOT gate, returning its output wire.
    pub fn add_not(&mut self, a: WireId) -> WireId {
        let output = self.alloc();
        self.desc.gates.push(Gate::not(a, output));
        output
    }

    /// Marks a wire as an output.
    pub fn add_output(&mut self, wire: WireId) {
        self.desc.outputs.push(wire);
    }

    /// Validates and returns the circuit.
    pub fn build(self) -> Result<Circuit, CircuitError> {
        Circuit::try_from(self.desc)
    }
}

/// A circuit with a single gate.
///
/// The garbler owns the first input and, for two-input operators, the
/// evaluator owns the second.
pub fn single_gate(op: GateOp) -> Result<Circuit, CircuitError> {
    let mut builder = CircuitBuilder::new(op.to_string());
    let a = builder.add_garbler_input();
    let c = match op {
        GateOp::Not => builder.add_not(a),
        op => {
            let b = builder.add_evaluator_input();
            builder.add_gate(op, a, b)
        }
    };
    builder.add_output(c);
    builder.build()
}

/// The minimum of two unsigned `bit_width`-bit numbers.
///
/// The garbler holds the first number and the evaluator the second, both
/// most significant bit first. The output is the minimum, most significant
/// bit first.
pub fn min(bit_width: usize) -> Result<Circuit, CircuitError> {
    let mut builder = CircuitBuilder::new(format!("min{bit_width}"));

    let a: Vec<WireId> = (0..bit_width)
        .map(|_| builder.add_garbler_input())
        .collect();
    let b: Vec<WireId> = (0..bit_width)
        .map(|_| builder.add_evaluator_input())
        .collect();

    if bit_width == 0 {
        return builder.build();
    }

    // lt: a < b on the bits seen so far, eq: a == b on the bits seen so far.
    let not_a = builder.add_not(a[0]);
    let mut lt = builder.add_gate(GateOp::And, not_a, b[0]);
    let mut eq = builder.add_gate(GateOp::Xnor, a[0], b[0]);

    for i in 1..bit_width {
        let not_a = builder.add_not(a[i]);
        let a_lt_b = builder.add_gate(GateOp::And, not_a, b[i]);
        let decided = builder.add_gate(GateOp::And, eq, a_lt_b);
        lt = builder.add_gate(GateOp::Or, lt, decided);

        if i + 1 < bit_width {
            let bit_eq = builder.add_gate(GateOp::Xnor, a[i], b[i]);
            eq = builder.add_gate(GateOp::And, eq, bit_eq);
        }
    }

    // out = lt ? a : b
    for i in 0..bit_width {
        let diff = builder.add_gate(GateOp::Xor, a[i], b[i]);
        let select = builder.add_gate(GateOp::And, lt, diff);
        let out = builder.add_gate(GateOp::Xor, b[i], select);
        builder.add_output(out);
    }

    builder.build()
}

/// Encodes `value` into `width` bits, most significant bit first.
///
/// Bits above the width are dropped.
pub fn to_bits(value: u64, width: usize) -> Vec<bool> {
    (0..width)
        .rev()
        .map(|i| i < 64 && (value >> i) & 1 == 1)
        .collect()
}

/// Decodes bits, most significant bit first.
pub fn from_bits(bits: &[bool]) -> u64 {
    bits.iter().fold(0, |acc, &bit| (acc << 1) | bit as u64)
}
