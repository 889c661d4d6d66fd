//! The CO15 "simplest OT" protocol over the Ristretto group, see
//! <https://eprint.iacr.org/2015/267.pdf> (Figure 1).
//!
//! Unlike the batched variant in the paper, every transferred wire uses its
//! own sender key pair and its own receiver secret.

mod receiver;
mod sender;

pub use receiver::DhOtReceiver;
pub use sender::DhOtSender;

use blake3::Hasher;
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use rand::CryptoRng;
use yao_core::MaskedValue;

use crate::{msgs::Ciphertext, OtError};

pub(crate) const DOMAIN_SEP: &[u8] = b"yao CO15 DH-OT";

/// The state of an OT sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SenderState {
    Initialized,
    Setup,
    Complete,
}

/// The state of an OT receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ReceiverState {
    Initialized,
    Setup,
    Complete,
}

fn check_state<S: PartialEq + std::fmt::Debug>(expected: S, actual: S) -> Result<(), OtError> {
    if expected != actual {
        Err(OtError::BadState {
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        })
    } else {
        Ok(())
    }
}

/// Samples a uniformly random scalar.
fn random_scalar<R: CryptoRng + ?Sized>(rng: &mut R) -> Scalar {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    Scalar::from_bytes_mod_order_wide(&bytes)
}

fn decompress(bytes: &[u8; 32]) -> Result<RistrettoPoint, OtError> {
    CompressedRistretto(*bytes)
        .decompress()
        .ok_or_else(|| OtError::ProtocolMismatch("invalid Ristretto point".to_string()))
}

/// Hashes a Ristretto point to a one-time pad.
pub(crate) fn hash_point(point: &RistrettoPoint, tweak: &[u8]) -> Ciphertext {
    // H(tweak || point)
    let mut h = Hasher::new();
    h.update(tweak);
    h.update(point.compress().as_bytes());
    let digest = h.finalize();

    let mut pad = [0u8; MaskedValue::LEN];
    pad.copy_from_slice(&digest.as_bytes()[..MaskedValue::LEN]);
    pad
}

// E_k(m) = k ⊕ m
fn encrypt_input(pad: &Ciphertext, input: &MaskedValue) -> Ciphertext {
    let mut ct = input.to_bytes();
    ct.iter_mut().zip(pad).for_each(|(c, k)| *c ^= k);
    ct
}

// D_k(c) = k ⊕ c, rejecting an external bit byte other than 0/1.
fn decrypt_input(pad: &Ciphertext, ct: &Ciphertext) -> Result<MaskedValue, OtError> {
    let mut pt = *ct;
    pt.iter_mut().zip(pad).for_each(|(p, k)| *p ^= k);
    MaskedValue::from_bytes(&pt)
        .ok_or_else(|| OtError::ProtocolMismatch("decrypted external bit is not 0/1".to_string()))
}
