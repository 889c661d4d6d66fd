//! Garbling engine.
//!
//! Every gate is turned into a table of authenticated ciphertexts. Row
//! `2 * ext_a + ext_b` of a two-input gate holds the masked value of the
//! output wire, encrypted first under the key of input `a` and then under the
//! key of input `b` with AES-128-GCM. NOT gates have two rows indexed by
//! `ext_a` and a single layer.

use std::collections::BTreeMap;

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, NewAead},
    Aes128Gcm,
};
use rand::TryCryptoRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    circuit::{Circuit, GateOp, WireId},
    keys::{generate_wire_material, KeyFabricError, MaskedValue, WireMaterial},
    Block,
};

/// Length of an AES-GCM authentication tag.
pub(crate) const TAG_LEN: usize = 16;

/// Length of a row encrypted under one layer.
pub(crate) const SINGLE_ROW_LEN: usize = MaskedValue::LEN + TAG_LEN;

/// Length of a row encrypted under two layers.
pub(crate) const DOUBLE_ROW_LEN: usize = SINGLE_ROW_LEN + TAG_LEN;

/// Errors that can occur during garbling.
#[derive(Debug, thiserror::Error)]
pub enum GarbleError {
    /// Wire material could not be generated.
    #[error(transparent)]
    KeyFabric(#[from] KeyFabricError),
    /// No material was generated for a wire.
    #[error("no wire material for wire {0}")]
    MissingMaterial(WireId),
    /// A row could not be encrypted.
    #[error("failed to encrypt row {row} of gate {gate}")]
    Encryption {
        /// Gate index.
        gate: usize,
        /// Row index.
        row: usize,
    },
}

/// The garbled table of one gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarbledTable {
    rows: Vec<Vec<u8>>,
}

impl GarbledTable {
    /// Creates a table from its rows.
    pub fn new(rows: Vec<Vec<u8>>) -> Self {
        Self { rows }
    }

    /// Returns the rows in permuted order.
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }
}

/// The output of garbling a circuit once.
///
/// A garbling is used for exactly one session; its material must never be
/// reused for another.
#[derive(Debug, Clone)]
pub struct Garbling {
    tables: Vec<GarbledTable>,
    material: WireMaterial,
}

impl Garbling {
    /// Returns the garbled tables, one per gate in topological order.
    pub fn tables(&self) -> &[GarbledTable] {
        &self.tables
    }

    /// Returns the secret wire material.
    pub fn material(&self) -> &WireMaterial {
        &self.material
    }

    /// Returns the permutation bits of the circuit's output wires.
    ///
    /// These are the only permutation bits ever revealed to the evaluator.
    pub fn output_pbits(&self, circ: &Circuit) -> BTreeMap<WireId, bool> {
        circ.outputs()
            .iter()
            .filter_map(|&wire| self.material.get(wire).map(|s| (wire, s.pbit())))
            .collect()
    }

    /// Returns the masked value encoding `bit` on `wire`.
    pub fn encode(&self, wire: WireId, bit: bool) -> Option<MaskedValue> {
        self.material.get(wire).map(|s| s.encode(bit))
    }

    /// Returns both masked values of `wire`, indexed by true value.
    pub fn offer(&self, wire: WireId) -> Option<[MaskedValue; 2]> {
        self.material.get(wire).map(|s| s.offer())
    }

    /// Recovers the true value of `wire` from a masked value, checking that
    /// the key belongs to the wire.
    pub fn decode(&self, wire: WireId, value: &MaskedValue) -> Option<bool> {
        self.material.get(wire).and_then(|s| s.decode(value))
    }
}

/// Garbles a circuit with fresh wire material.
#[instrument(level = "debug", skip_all, fields(circuit = circ.name(), gates = circ.gates().len()))]
pub fn garble<R: TryCryptoRng + ?Sized>(rng: &mut R, circ: &Circuit) -> Result<Garbling, GarbleError> {
    let material = generate_wire_material(rng, circ.wires())?;

    let mut tables = Vec::with_capacity(circ.gates().len());
    for (gid, gate) in circ.gates().iter().enumerate() {
        let secret = |wire: WireId| material.get(wire).ok_or(GarbleError::MissingMaterial(wire));

        let a = secret(gate.inputs[0])?;
        let c = secret(gate.output)?;

        let table = match gate.op {
            GateOp::Not => {
                let mut rows = vec![Vec::new(); 2];
                for ba in [false, true] {
                    let row = (a.pbit() ^ ba) as usize;
                    let payload = c.encode(gate.op.eval(ba, false)).to_bytes();
                    rows[row] = encrypt(&a.key(ba), gid, row, 0, &payload)
                        .ok_or(GarbleError::Encryption { gate: gid, row })?;
                }
                rows
            }
            op => {
                let b = secret(gate.inputs[1])?;
                let mut rows = vec![Vec::new(); 4];
                for ba in [false, true] {
                    for bb in [false, true] {
                        let row = 2 * (a.pbit() ^ ba) as usize + (b.pbit() ^ bb) as usize;
                        let payload = c.encode(op.eval(ba, bb)).to_bytes();
                        let inner = encrypt(&a.key(ba), gid, row, 0, &payload)
                            .ok_or(GarbleError::Encryption { gate: gid, row })?;
                        rows[row] = encrypt(&b.key(bb), gid, row, 1, &inner)
                            .ok_or(GarbleError::Encryption { gate: gid, row })?;
                    }
                }
                rows
            }
        };

        tables.push(GarbledTable::new(table));
    }

    debug!("garbled circuit");

    Ok(Garbling { tables, material })
}

/// Derives the nonce of one encryption layer of one row.
///
/// Every (gate, row, layer) triple gets a distinct nonce, so no key is ever
/// used twice with the same nonce within a garbling.
pub(crate) fn nonce(gate: usize, row: usize, layer: u8) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[..8].copy_from_slice(&(gate as u64).to_be_bytes());
    nonce[8] = row as u8;
    nonce[9] = layer;
    nonce
}

pub(crate) fn encrypt(
    key: &Block,
    gate: usize,
    row: usize,
    layer: u8,
    plaintext: &[u8],
) -> Option<Vec<u8>> {
    let cipher = Aes128Gcm::new_from_slice(key.as_bytes()).ok()?;
    let nonce = nonce(gate, row, layer);
    cipher
        .encrypt(GenericArray::from_slice(&nonce), plaintext)
        .ok()
}

pub(crate) fn decrypt(
    key: &Block,
    gate: usize,
    row: usize,
    layer: u8,
    ciphertext: &[u8],
) -> Option<Vec<u8>> {
    let cipher = Aes128Gcm::new_from_slice(key.as_bytes()).ok()?;
    let nonce = nonce(gate, row, layer);
    cipher
        .decrypt(GenericArray::from_slice(&nonce), ciphertext)
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{circuits, keys::tests::FailingRng};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use rstest::*;

    #[rstest]
    #[case::and(GateOp::And)]
    #[case::xor(GateOp::Xor)]
    #[case::not(GateOp::Not)]
    fn test_table_shape(#[case] op: GateOp) {
        let circ = circuits::single_gate(op).unwrap();
        let garbling = garble(&mut rand::rng(), &circ).unwrap();

        let table = &garbling.tables()[0];
        if op == GateOp::Not {
            assert_eq!(table.rows().len(), 2);
            assert!(table.rows().iter().all(|r| r.len() == SINGLE_ROW_LEN));
        } else {
            assert_eq!(table.rows().len(), 4);
            assert!(table.rows().iter().all(|r| r.len() == DOUBLE_ROW_LEN));
        }
    }

    #[test]
    fn test_regarble_is_fresh() {
        let circ = circuits::min(8).unwrap();
        let a = garble(&mut rand::rng(), &circ).unwrap();
        let b = garble(&mut rand::rng(), &circ).unwrap();

        assert_ne!(a.tables(), b.tables());
        for wire in circ.wires() {
            let sa = a.material().get(wire).unwrap();
            let sb = b.material().get(wire).unwrap();
            assert_ne!(sa.key(false), sb.key(false));
            assert_ne!(sa.key(true), sb.key(true));
        }
    }

    #[test]
    fn test_seeded_garbling_is_deterministic() {
        let circ = circuits::single_gate(GateOp::Nand).unwrap();
        let a = garble(&mut ChaCha12Rng::seed_from_u64(0), &circ).unwrap();
        let b = garble(&mut ChaCha12Rng::seed_from_u64(0), &circ).unwrap();

        assert_eq!(a.tables(), b.tables());
    }

    #[test]
    fn test_output_pbits_only_cover_outputs() {
        let circ = circuits::min(4).unwrap();
        let garbling = garble(&mut rand::rng(), &circ).unwrap();
        let pbits = garbling.output_pbits(&circ);

        assert_eq!(
            pbits.keys().copied().collect::<Vec<_>>(),
            circ.outputs().to_vec()
        );
    }

    #[test]
    fn test_nonces_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for gate in 0..16 {
            for row in 0..4 {
                for layer in 0..2 {
                    assert!(seen.insert(nonce(gate, row, layer)));
                }
            }
        }
    }

    #[test]
    fn test_garble_insufficient_entropy() {
        let circ = circuits::single_gate(GateOp::Or).unwrap();
        let err = garble(&mut FailingRng, &circ).unwrap_err();

        assert!(matches!(
            err,
            GarbleError::KeyFabric(KeyFabricError::InsufficientEntropy(_))
        ));
    }
}
