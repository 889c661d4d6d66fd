//! Messages exchanged during oblivious transfer.

use serde::{Deserialize, Serialize};
use yao_core::{MaskedValue, WireId};

/// A one-time-pad encrypted masked value.
pub type Ciphertext = [u8; MaskedValue::LEN];

/// Top-level OT message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum OtMessage {
    SenderSetup(SenderSetup),
    ReceiverSetup(ReceiverSetup),
    SenderPayload(SenderPayload),
    InsecurePayload(InsecurePayload),
}

impl OtMessage {
    /// Returns the name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            OtMessage::SenderSetup(_) => "SenderSetup",
            OtMessage::ReceiverSetup(_) => "ReceiverSetup",
            OtMessage::SenderPayload(_) => "SenderPayload",
            OtMessage::InsecurePayload(_) => "InsecurePayload",
        }
    }
}

/// The sender's public keys, one per wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSetup {
    /// Wires being transferred, in ascending order.
    pub wires: Vec<WireId>,
    /// Compressed Ristretto points `A_i = a_i G`.
    pub public_keys: Vec<[u8; 32]>,
}

/// The receiver's blinded choices, one per wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverSetup {
    /// Compressed Ristretto points `B_i`.
    pub blinded_choices: Vec<[u8; 32]>,
}

/// The sender's encrypted values, one pair per wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderPayload {
    /// Ciphertexts of the values for choice 0 and choice 1.
    pub ciphertexts: Vec<[Ciphertext; 2]>,
}

/// Both values of every wire in the clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsecurePayload {
    /// Wires being transferred, in ascending order.
    pub wires: Vec<WireId>,
    /// Values for choice 0 and choice 1.
    pub values: Vec<[MaskedValue; 2]>,
}
