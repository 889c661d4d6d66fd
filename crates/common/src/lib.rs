//! Common code shared between the garbler and the evaluator.

#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(clippy::all)]
#![forbid(unsafe_code)]

pub mod channel;

pub use channel::{duplex, framed, Channel, FramedIo};

use serde::{Deserialize, Serialize};

/// The party's role in the two-party protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Creates the garbled circuit and acts as the OT sender.
    Garbler,
    /// Evaluates the garbled circuit and acts as the OT receiver.
    Evaluator,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Garbler => write!(f, "garbler"),
            Role::Evaluator => write!(f, "evaluator"),
        }
    }
}
