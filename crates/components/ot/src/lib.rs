//! 1-of-2 oblivious transfer of wire keys.
//!
//! The garbler is the sender and offers, for every evaluator input wire, the
//! masked values of both truth values. The evaluator is the receiver and
//! learns exactly the one matching its input bit, while the sender learns
//! nothing about the choice.

#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(clippy::all)]
#![forbid(unsafe_code)]

pub mod core;
mod insecure;
pub mod msgs;
mod receiver;
mod sender;

pub use insecure::{InsecureReceiver, InsecureSender};
pub use receiver::Receiver;
pub use sender::Sender;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use yao_common::Channel;
use yao_core::{MaskedValue, WireId};

/// The OT mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtMode {
    /// CO15 oblivious transfer.
    #[default]
    Secure,
    /// Both values are sent in the clear. For testing only.
    Insecure,
}

impl std::fmt::Display for OtMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OtMode::Secure => write!(f, "secure"),
            OtMode::Insecure => write!(f, "insecure"),
        }
    }
}

/// Errors that can occur during oblivious transfer.
#[derive(Debug, thiserror::Error)]
pub enum OtError {
    /// The channel failed or the peer disconnected mid-transfer.
    #[error("transfer aborted: {0}")]
    TransferAborted(std::io::Error),
    /// The peer sent something the protocol does not allow.
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),
    /// A state machine was driven out of order.
    #[error("invalid state: expected {expected}, got {actual}")]
    BadState {
        /// Expected state.
        expected: String,
        /// Actual state.
        actual: String,
    },
}

impl From<std::io::Error> for OtError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            // Frames that fail to decode come from a live but misbehaving peer.
            std::io::ErrorKind::InvalidData => OtError::ProtocolMismatch(err.to_string()),
            _ => OtError::TransferAborted(err),
        }
    }
}

impl OtError {
    pub(crate) fn unexpected(expected: &str, msg: &msgs::OtMessage) -> Self {
        OtError::ProtocolMismatch(format!("expected {}, got {}", expected, msg.kind()))
    }
}

/// The sending side of an oblivious transfer.
#[async_trait]
pub trait ObliviousSend {
    /// Returns `true` if the transfer hides the unselected values.
    fn is_secure(&self) -> bool;

    /// Offers a pair of masked values per wire, indexed by the receiver's
    /// choice bit.
    async fn send<C: Channel + ?Sized>(
        &mut self,
        channel: &mut C,
        offers: BTreeMap<WireId, [MaskedValue; 2]>,
    ) -> Result<(), OtError>;
}

/// The receiving side of an oblivious transfer.
#[async_trait]
pub trait ObliviousReceive {
    /// Returns `true` if the transfer hides the unselected values.
    fn is_secure(&self) -> bool;

    /// Receives the masked value selected by the choice bit of every wire.
    async fn receive<C: Channel + ?Sized>(
        &mut self,
        channel: &mut C,
        choices: BTreeMap<WireId, bool>,
    ) -> Result<BTreeMap<WireId, MaskedValue>, OtError>;
}

/// Checks that the sender offers exactly the wires the receiver has choices for.
pub(crate) fn check_wires(expected: &BTreeMap<WireId, bool>, wires: &[WireId]) -> Result<(), OtError> {
    if wires.len() != expected.len() || !wires.iter().eq(expected.keys()) {
        return Err(OtError::ProtocolMismatch(format!(
            "expected wires {:?}, sender offered {:?}",
            expected.keys().collect::<Vec<_>>(),
            wires
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use yao_common::duplex;
    use yao_core::Block;

    #[fixture]
    fn offers() -> BTreeMap<WireId, [MaskedValue; 2]> {
        let mut rng = rand::rng();
        (10..26)
            .map(|id| {
                let pbit = id % 2 == 0;
                let k0 = Block::random(&mut rng).unwrap();
                let k1 = Block::random(&mut rng).unwrap();
                (
                    WireId(id),
                    [MaskedValue::new(k0, pbit), MaskedValue::new(k1, !pbit)],
                )
            })
            .collect()
    }

    fn choices(offers: &BTreeMap<WireId, [MaskedValue; 2]>) -> BTreeMap<WireId, bool> {
        offers.keys().map(|wire| (*wire, wire.0 % 3 == 1)).collect()
    }

    async fn transfer<S: ObliviousSend, R: ObliviousReceive>(
        mut sender: S,
        mut receiver: R,
        offers: BTreeMap<WireId, [MaskedValue; 2]>,
        choices: BTreeMap<WireId, bool>,
    ) -> (Result<(), OtError>, Result<BTreeMap<WireId, MaskedValue>, OtError>) {
        let (mut a, mut b) = duplex(1 << 16);
        // Each side drops its end when done, so a failing peer never leaves
        // the other waiting.
        tokio::join!(
            async move { sender.send(&mut a, offers).await },
            async move { receiver.receive(&mut b, choices).await }
        )
    }

    #[rstest]
    #[tokio::test]
    async fn test_secure_transfer(offers: BTreeMap<WireId, [MaskedValue; 2]>) {
        let choices = choices(&offers);
        let (sent, received) =
            transfer(Sender::new(), Receiver::new(), offers.clone(), choices.clone()).await;

        sent.unwrap();
        let received = received.unwrap();
        for (wire, choice) in choices {
            assert_eq!(received[&wire], offers[&wire][choice as usize]);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_insecure_matches_secure(offers: BTreeMap<WireId, [MaskedValue; 2]>) {
        let choices = choices(&offers);

        let (_, secure) =
            transfer(Sender::new(), Receiver::new(), offers.clone(), choices.clone()).await;
        let (_, insecure) = transfer(
            InsecureSender::default(),
            InsecureReceiver::default(),
            offers,
            choices,
        )
        .await;

        assert_eq!(secure.unwrap(), insecure.unwrap());
    }

    #[test]
    fn test_is_secure() {
        assert!(ObliviousSend::is_secure(&Sender::new()));
        assert!(ObliviousReceive::is_secure(&Receiver::new()));
        assert!(!ObliviousSend::is_secure(&InsecureSender::default()));
        assert!(!ObliviousReceive::is_secure(&InsecureReceiver::default()));
    }

    #[rstest]
    #[tokio::test]
    async fn test_wire_mismatch(offers: BTreeMap<WireId, [MaskedValue; 2]>) {
        let mut choices = choices(&offers);
        choices.pop_last();

        let (_, received) = transfer(Sender::new(), Receiver::new(), offers, choices).await;

        assert!(matches!(received, Err(OtError::ProtocolMismatch(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_mode_mismatch(offers: BTreeMap<WireId, [MaskedValue; 2]>) {
        let choices = choices(&offers);

        let (_, received) =
            transfer(InsecureSender::default(), Receiver::new(), offers, choices).await;

        assert!(matches!(received, Err(OtError::ProtocolMismatch(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_sender_disconnect(offers: BTreeMap<WireId, [MaskedValue; 2]>) {
        let choices = choices(&offers);
        let (a, mut b) = duplex(1 << 16);
        drop(a);

        let err = Receiver::new().receive(&mut b, choices).await.unwrap_err();
        assert!(matches!(err, OtError::TransferAborted(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn test_receiver_disconnect(offers: BTreeMap<WireId, [MaskedValue; 2]>) {
        let (mut a, b) = duplex(1 << 16);

        let receiver = async move {
            let mut b = b;
            let _ = b.receive::<msgs::OtMessage>().await;
            drop(b);
        };

        let mut sender = Sender::new();
        let (sent, _) = tokio::join!(sender.send(&mut a, offers), receiver);
        assert!(matches!(sent, Err(OtError::TransferAborted(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_malformed_message(offers: BTreeMap<WireId, [MaskedValue; 2]>) {
        let choices = choices(&offers);
        let (mut a, mut b) = duplex(1 << 16);

        a.send(vec![0xffu8; 7]).await.unwrap();

        let err = Receiver::new().receive(&mut b, choices).await.unwrap_err();
        assert!(matches!(err, OtError::ProtocolMismatch(_)));
    }
}
