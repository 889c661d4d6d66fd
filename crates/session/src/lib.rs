//! Two-party Yao session.
//!
//! A session sequences the protocol over a [`Channel`](yao_common::Channel):
//!
//! 1. The [`Garbler`] garbles the circuit afresh and sends the circuit, the
//!    garbled tables, the output permutation bits, its own masked inputs and
//!    the OT mode.
//! 2. The [`Evaluator`] fetches the masked values of its input wires by
//!    oblivious transfer.
//! 3. The evaluator evaluates locally and returns the masked output values.
//! 4. The garbler decodes them, checking each returned key against its wire
//!    material.
//!
//! The evaluator can serve several sessions on one channel until the garbler
//! closes it.

#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(clippy::all)]
#![forbid(unsafe_code)]

mod config;
pub(crate) mod error;
mod evaluator;
mod garbler;
pub mod msgs;

pub use config::{SessionConfig, SessionConfigBuilder, SessionConfigBuilderError};
pub use error::{ErrorKind, SessionError};
pub use evaluator::Evaluator;
pub use garbler::Garbler;

use std::collections::BTreeMap;

use yao_common::Role;
use yao_core::{MaskedValue, WireId};
use yao_ot::OtMode;

/// The result of one session, as seen by one party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutput {
    /// Name of the circuit.
    pub circuit: String,
    /// Role of the party.
    pub role: Role,
    /// OT mode used.
    pub ot_mode: OtMode,
    /// Output bits, in the order of the circuit's output wires.
    pub outputs: Vec<bool>,
    /// Masked values of the output wires.
    pub masked_outputs: BTreeMap<WireId, MaskedValue>,
    /// Wires transferred by OT.
    pub ot_wires: Vec<WireId>,
    /// Masked values received by OT. Empty for the garbler.
    pub received: BTreeMap<WireId, MaskedValue>,
}
