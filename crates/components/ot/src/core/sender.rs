use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use merlin::Transcript;
use rand::CryptoRng;
use yao_core::{MaskedValue, WireId};

use super::{check_state, decompress, encrypt_input, hash_point, random_scalar, SenderState, DOMAIN_SEP};
use crate::{
    msgs::{ReceiverSetup, SenderPayload, SenderSetup},
    OtError,
};

/// CO15 sender state machine.
pub struct DhOtSender {
    /// The current state of the protocol
    state: SenderState,
    /// The transcript of the protocol so far
    transcript: Transcript,
    /// Per-wire key pairs `(a_i, A_i)`
    keys: Vec<(Scalar, RistrettoPoint)>,
}

impl Default for DhOtSender {
    fn default() -> Self {
        Self {
            state: SenderState::Initialized,
            transcript: Transcript::new(DOMAIN_SEP),
            keys: Vec::new(),
        }
    }
}

impl DhOtSender {
    /// Returns the current state.
    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Generates a fresh key pair for each wire.
    pub fn setup<R: CryptoRng + ?Sized>(
        &mut self,
        rng: &mut R,
        wires: Vec<WireId>,
    ) -> Result<SenderSetup, OtError> {
        check_state(SenderState::Initialized, self.state)?;

        self.keys = wires
            .iter()
            .map(|_| {
                let private_key = random_scalar(rng);
                // A = aG
                let public_key = RistrettoPoint::mul_base(&private_key);
                (private_key, public_key)
            })
            .collect();

        let public_keys: Vec<[u8; 32]> = self
            .keys
            .iter()
            .map(|(_, public_key)| public_key.compress().to_bytes())
            .collect();

        for (wire, public_key) in wires.iter().zip(&public_keys) {
            self.transcript.append_u64(b"wire", wire.0 as u64);
            self.transcript.append_message(b"pubkey", public_key);
        }

        self.state = SenderState::Setup;

        Ok(SenderSetup { wires, public_keys })
    }

    /// For each wire, encrypts `inputs[i][0]` under `H(a_i B_i)` and
    /// `inputs[i][1]` under `H(a_i (B_i - A_i))`.
    pub fn send(
        &mut self,
        inputs: &[[MaskedValue; 2]],
        receiver_setup: ReceiverSetup,
    ) -> Result<SenderPayload, OtError> {
        check_state(SenderState::Setup, self.state)?;

        if inputs.len() != self.keys.len() {
            return Err(OtError::ProtocolMismatch(format!(
                "expected {} inputs, got {}",
                self.keys.len(),
                inputs.len()
            )));
        }

        if receiver_setup.blinded_choices.len() != self.keys.len() {
            return Err(OtError::ProtocolMismatch(format!(
                "expected {} blinded choices, got {}",
                self.keys.len(),
                receiver_setup.blinded_choices.len()
            )));
        }

        let mut ciphertexts = Vec::with_capacity(inputs.len());
        for ((input, blinded_choice), (private_key, public_key)) in inputs
            .iter()
            .zip(&receiver_setup.blinded_choices)
            .zip(&self.keys)
        {
            let b = decompress(blinded_choice)?;

            // Witness the receiver's choice in the transcript
            self.transcript.append_message(b"B", blinded_choice);

            // Construct a tweak to domain-separate the ristretto point hashes
            let mut tweak = [0u8; 16];
            self.transcript.challenge_bytes(b"tweak", &mut tweak);

            // yr is B^a in CO15 Figure 1
            let yr = private_key * b;
            // ys is A^a in CO15 Figure 1
            let ys = private_key * public_key;

            let k0 = hash_point(&yr, &tweak);
            let k1 = hash_point(&(yr - ys), &tweak);

            ciphertexts.push([encrypt_input(&k0, &input[0]), encrypt_input(&k1, &input[1])]);
        }

        self.state = SenderState::Complete;

        Ok(SenderPayload { ciphertexts })
    }
}
