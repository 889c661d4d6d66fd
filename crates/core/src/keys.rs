//! Key fabric: the secret material attached to every wire.

use std::collections::BTreeMap;

use rand::TryCryptoRng;
use serde::{Deserialize, Serialize};

use crate::{circuit::WireId, Block};

/// Errors that can occur when generating wire material.
#[derive(Debug, thiserror::Error)]
pub enum KeyFabricError {
    /// The random source could not be read.
    #[error("insufficient entropy: {0}")]
    InsufficientEntropy(String),
}

/// A (key, external bit) pair held for one wire.
///
/// Holding the masked value of a wire reveals neither its true value nor the
/// key of the other value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedValue {
    /// The wire key.
    pub key: Block,
    /// The external bit, the true value XOR the wire's permutation bit.
    pub ext: bool,
}

impl MaskedValue {
    /// Length of the byte encoding.
    pub const LEN: usize = Block::LEN + 1;

    /// Creates a new masked value.
    pub fn new(key: Block, ext: bool) -> Self {
        Self { key, ext }
    }

    /// Encodes the masked value as the key followed by a single 0/1 byte.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        bytes[..Block::LEN].copy_from_slice(self.key.as_bytes());
        bytes[Block::LEN] = self.ext as u8;
        bytes
    }

    /// Decodes a masked value.
    ///
    /// Returns `None` if the length is wrong or the external bit byte is not
    /// 0 or 1.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::LEN {
            return None;
        }

        let mut key = [0u8; Block::LEN];
        key.copy_from_slice(&bytes[..Block::LEN]);

        let ext = match bytes[Block::LEN] {
            0 => false,
            1 => true,
            _ => return None,
        };

        Some(Self::new(Block::new(key), ext))
    }
}

/// The key pair and permutation bit of a wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireSecret {
    keys: [Block; 2],
    pbit: bool,
}

impl WireSecret {
    /// Creates a new wire secret.
    pub fn new(keys: [Block; 2], pbit: bool) -> Self {
        Self { keys, pbit }
    }

    /// Returns the key bound to the true value `bit`.
    pub fn key(&self, bit: bool) -> Block {
        self.keys[bit as usize]
    }

    /// Returns the permutation bit.
    pub fn pbit(&self) -> bool {
        self.pbit
    }

    /// Returns the masked value encoding the true value `bit`.
    pub fn encode(&self, bit: bool) -> MaskedValue {
        MaskedValue::new(self.key(bit), bit ^ self.pbit)
    }

    /// Returns the masked values of both true values, indexed by the true
    /// value.
    pub fn offer(&self) -> [MaskedValue; 2] {
        [self.encode(false), self.encode(true)]
    }

    /// Recovers the true value from a masked value.
    ///
    /// Returns `None` if the key matches neither key of the wire, or the
    /// external bit is inconsistent with the key.
    pub fn decode(&self, value: &MaskedValue) -> Option<bool> {
        let bit = value.ext ^ self.pbit;
        (self.key(bit) == value.key).then_some(bit)
    }
}

/// Secret material of every wire of a circuit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireMaterial(BTreeMap<WireId, WireSecret>);

impl WireMaterial {
    /// Returns the secret of a wire.
    pub fn get(&self, wire: WireId) -> Option<&WireSecret> {
        self.0.get(&wire)
    }

    /// Returns the number of wires.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there is no material.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the wires and their secrets.
    pub fn iter(&self) -> impl Iterator<Item = (&WireId, &WireSecret)> {
        self.0.iter()
    }
}

impl FromIterator<(WireId, WireSecret)> for WireMaterial {
    fn from_iter<T: IntoIterator<Item = (WireId, WireSecret)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Generates a fresh key pair and permutation bit for every wire.
///
/// Both keys are read from `rng`, and the permutation bit is the low bit of a
/// further random byte. Fails if the random source cannot be read.
pub fn generate_wire_material<R, I>(rng: &mut R, wires: I) -> Result<WireMaterial, KeyFabricError>
where
    R: TryCryptoRng + ?Sized,
    I: IntoIterator<Item = WireId>,
{
    let mut material = BTreeMap::new();
    for wire in wires {
        let mut buf = [0u8; 2 * Block::LEN + 1];
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| KeyFabricError::InsufficientEntropy(e.to_string()))?;

        let mut key_0 = [0u8; Block::LEN];
        let mut key_1 = [0u8; Block::LEN];
        key_0.copy_from_slice(&buf[..Block::LEN]);
        key_1.copy_from_slice(&buf[Block::LEN..2 * Block::LEN]);

        let pbit = buf[2 * Block::LEN] & 1 == 1;

        material.insert(
            wire,
            WireSecret::new([Block::new(key_0), Block::new(key_1)], pbit),
        );
    }

    Ok(WireMaterial(material))
}
