//! Core types and algorithms for Yao garbled circuits.
//!
//! This crate contains the pure, synchronous parts of the protocol: boolean
//! circuits, the key fabric which assigns a pair of keys and a permutation bit
//! to every wire, the garbling engine and the evaluation engine. It performs
//! no IO.

#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(clippy::all)]
#![forbid(unsafe_code)]

mod block;
pub mod circuit;
pub mod circuits;
pub mod evaluate;
pub mod garble;
pub mod keys;

pub use block::Block;
pub use circuit::{Circuit, CircuitDescription, CircuitError, Defect, Gate, GateOp, WireId};
pub use circuits::CircuitBuilder;
pub use evaluate::{evaluate, evaluate_masked, unmask, EvaluateError};
pub use garble::{garble, GarbleError, GarbledTable, Garbling};
pub use keys::{generate_wire_material, KeyFabricError, MaskedValue, WireMaterial, WireSecret};
