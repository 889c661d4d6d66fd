use curve25519_dalek::ristretto::RistrettoPoint;
use merlin::Transcript;
use rand::CryptoRng;
use yao_core::MaskedValue;

use super::{check_state, decompress, decrypt_input, hash_point, random_scalar, ReceiverState, DOMAIN_SEP};
use crate::{
    msgs::{Ciphertext, ReceiverSetup, SenderPayload, SenderSetup},
    OtError,
};

/// CO15 receiver state machine.
pub struct DhOtReceiver {
    /// The current state of the protocol
    state: ReceiverState,
    /// The transcript of the protocol so far
    transcript: Transcript,
    /// The pads used to decrypt the selected ciphertexts
    decryption_keys: Vec<Ciphertext>,
    /// The bits that this receiver picked
    choices: Vec<bool>,
}

impl Default for DhOtReceiver {
    fn default() -> Self {
        Self {
            state: ReceiverState::Initialized,
            transcript: Transcript::new(DOMAIN_SEP),
            decryption_keys: Vec::new(),
            choices: Vec::new(),
        }
    }
}

impl DhOtReceiver {
    /// Returns the current state.
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Blinds the choices against the sender's public keys.
    pub fn setup<R: CryptoRng + ?Sized>(
        &mut self,
        rng: &mut R,
        choices: &[bool],
        sender_setup: SenderSetup,
    ) -> Result<ReceiverSetup, OtError> {
        check_state(ReceiverState::Initialized, self.state)?;

        if sender_setup.public_keys.len() != choices.len()
            || sender_setup.wires.len() != choices.len()
        {
            return Err(OtError::ProtocolMismatch(format!(
                "expected {} wires, sender offered {}",
                choices.len(),
                sender_setup.public_keys.len()
            )));
        }

        let public_keys = sender_setup
            .public_keys
            .iter()
            .map(decompress)
            .collect::<Result<Vec<_>, _>>()?;

        for (wire, public_key) in sender_setup.wires.iter().zip(&sender_setup.public_keys) {
            self.transcript.append_u64(b"wire", wire.0 as u64);
            self.transcript.append_message(b"pubkey", public_key);
        }

        let mut blinded_choices = Vec::with_capacity(choices.len());
        let mut decryption_keys = Vec::with_capacity(choices.len());
        for (&choice, public_key) in choices.iter().zip(&public_keys) {
            let b = random_scalar(rng);
            // blinded_choice is B in CO15 Figure 1
            let blinded_choice = if choice {
                public_key + RistrettoPoint::mul_base(&b)
            } else {
                RistrettoPoint::mul_base(&b)
            };
            let blinded_choice = blinded_choice.compress().to_bytes();

            // Witness the blinded choice in the transcript
            self.transcript.append_message(b"B", &blinded_choice);

            // Construct a tweak to domain-separate the ristretto point hashes
            let mut tweak = [0u8; 16];
            self.transcript.challenge_bytes(b"tweak", &mut tweak);

            // dec_key is k_r in CO15 Figure 1 == hash(A^b)
            decryption_keys.push(hash_point(&(b * public_key), &tweak));
            blinded_choices.push(blinded_choice);
        }

        self.decryption_keys = decryption_keys;
        self.choices = choices.to_vec();
        self.state = ReceiverState::Setup;

        Ok(ReceiverSetup { blinded_choices })
    }

    /// Decrypts the selected value of every wire.
    pub fn receive(&mut self, payload: SenderPayload) -> Result<Vec<MaskedValue>, OtError> {
        check_state(ReceiverState::Setup, self.state)?;

        // Update the state regardless of whether this OT succeeded or not
        self.state = ReceiverState::Complete;

        if payload.ciphertexts.len() != self.choices.len() {
            return Err(OtError::ProtocolMismatch(format!(
                "expected {} ciphertext pairs, got {}",
                self.choices.len(),
                payload.ciphertexts.len()
            )));
        }

        self.choices
            .iter()
            .zip(&self.decryption_keys)
            .zip(&payload.ciphertexts)
            .map(|((&choice, key), cts)| decrypt_input(key, &cts[choice as usize]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{tests::*, DhOtSender};
    use rstest::*;
    use yao_core::WireId;

    #[rstest]
    fn test_unselected_not_recoverable(data: Data) {
        // Decrypting the other ciphertext with the receiver's pad does not
        // yield the unselected value.
        for ((choice, values), (received, cts)) in data
            .choices
            .iter()
            .zip(&data.values)
            .zip(data.received.iter().zip(&data.sender_payload.ciphertexts))
        {
            let selected = *choice as usize;
            let other = 1 - selected;

            let mut pad = cts[selected];
            pad.iter_mut()
                .zip(received.to_bytes())
                .for_each(|(p, m)| *p ^= m);

            let mut guess = cts[other];
            guess.iter_mut().zip(pad).for_each(|(g, p)| *g ^= p);

            assert_ne!(guess, values[other].to_bytes());
        }
    }

    #[test]
    fn test_wire_count_mismatch() {
        let mut rng = rand::rng();
        let mut sender = DhOtSender::default();
        let setup = sender.setup(&mut rng, vec![WireId(0), WireId(1)]).unwrap();

        let mut receiver = DhOtReceiver::default();
        let err = receiver.setup(&mut rng, &[true], setup).unwrap_err();

        assert!(matches!(err, OtError::ProtocolMismatch(_)));
    }

    #[test]
    fn test_bad_state() {
        let mut receiver = DhOtReceiver::default();
        let err = receiver
            .receive(SenderPayload {
                ciphertexts: vec![],
            })
            .unwrap_err();

        assert!(matches!(err, OtError::BadState { .. }));
    }

    #[rstest]
    fn test_sender_view_is_independent_of_choice() {
        // The blinded choices are uniformly distributed points whatever the
        // choice bit. Compare a bit of the encoding for all-0 and all-1
        // choices.
        const N: usize = 200;

        let mut rng = rand::rng();
        let wires: Vec<WireId> = (0..N as u32).map(WireId).collect();

        for choice in [false, true] {
            let mut sender = DhOtSender::default();
            let setup = sender.setup(&mut rng, wires.clone()).unwrap();

            let mut receiver = DhOtReceiver::default();
            let blinded = receiver.setup(&mut rng, &[choice; N], setup).unwrap();

            let ones = blinded
                .blinded_choices
                .iter()
                .filter(|point| point[1] & 1 == 1)
                .count();

            assert!((60..140).contains(&ones), "choice {choice}: {ones} ones");
        }
    }
}
