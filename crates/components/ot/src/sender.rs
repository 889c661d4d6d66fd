use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{instrument, trace};
use yao_common::Channel;
use yao_core::{MaskedValue, WireId};

use crate::{
    core::DhOtSender,
    msgs::{OtMessage, SenderSetup},
    ObliviousSend, OtError,
};

/// CO15 OT sender.
#[derive(Debug, Default)]
pub struct Sender {}

impl Sender {
    /// Creates a new sender.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ObliviousSend for Sender {
    fn is_secure(&self) -> bool {
        true
    }

    #[instrument(level = "debug", skip_all, fields(wires = offers.len()), err)]
    async fn send<C: Channel + ?Sized>(
        &mut self,
        channel: &mut C,
        offers: BTreeMap<WireId, [MaskedValue; 2]>,
    ) -> Result<(), OtError> {
        let mut ot = DhOtSender::default();

        let wires: Vec<WireId> = offers.keys().copied().collect();
        let inputs: Vec<[MaskedValue; 2]> = offers.into_values().collect();

        let setup: SenderSetup = ot.setup(&mut rand::rng(), wires)?;

        trace!("sending SenderSetup");
        channel.send(OtMessage::SenderSetup(setup)).await?;

        let setup = match channel.receive::<OtMessage>().await? {
            OtMessage::ReceiverSetup(m) => m,
            m => return Err(OtError::unexpected("ReceiverSetup", &m)),
        };
        trace!("received ReceiverSetup");

        let payload = ot.send(&inputs, setup)?;

        trace!("sending SenderPayload");
        channel.send(OtMessage::SenderPayload(payload)).await?;

        Ok(())
    }
}
