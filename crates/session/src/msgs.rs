//! Session messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use yao_core::{Circuit, GarbledTable, MaskedValue, WireId};
use yao_ot::OtMode;

/// Top-level session message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum SessionMessage {
    Setup(Setup),
    Output(Output),
    Close,
}

impl SessionMessage {
    /// Returns the name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionMessage::Setup(_) => "Setup",
            SessionMessage::Output(_) => "Output",
            SessionMessage::Close => "Close",
        }
    }
}

/// Everything the evaluator needs besides its own input keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setup {
    /// The circuit.
    pub circuit: Circuit,
    /// Garbled tables, one per gate in topological order.
    pub tables: Vec<GarbledTable>,
    /// Permutation bits of the output wires.
    pub output_pbits: BTreeMap<WireId, bool>,
    /// Masked values of the garbler's input wires.
    pub garbler_inputs: BTreeMap<WireId, MaskedValue>,
    /// OT mode the garbler uses for the evaluator's input wires.
    pub ot_mode: OtMode,
}

/// Masked values of the output wires, returned by the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    /// Masked output values.
    pub outputs: BTreeMap<WireId, MaskedValue>,
}
