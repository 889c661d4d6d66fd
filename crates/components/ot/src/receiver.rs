use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{instrument, trace};
use yao_common::Channel;
use yao_core::{MaskedValue, WireId};

use crate::{check_wires, core::DhOtReceiver, msgs::OtMessage, ObliviousReceive, OtError};

/// CO15 OT receiver.
#[derive(Debug, Default)]
pub struct Receiver {}

impl Receiver {
    /// Creates a new receiver.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ObliviousReceive for Receiver {
    fn is_secure(&self) -> bool {
        true
    }

    #[instrument(level = "debug", skip_all, fields(wires = choices.len()), err)]
    async fn receive<C: Channel + ?Sized>(
        &mut self,
        channel: &mut C,
        choices: BTreeMap<WireId, bool>,
    ) -> Result<BTreeMap<WireId, MaskedValue>, OtError> {
        let mut ot = DhOtReceiver::default();

        let setup = match channel.receive::<OtMessage>().await? {
            OtMessage::SenderSetup(m) => m,
            m => return Err(OtError::unexpected("SenderSetup", &m)),
        };
        trace!("received SenderSetup");

        check_wires(&choices, &setup.wires)?;

        let bits: Vec<bool> = choices.values().copied().collect();
        let setup = ot.setup(&mut rand::rng(), &bits, setup)?;

        trace!("sending ReceiverSetup");
        channel.send(OtMessage::ReceiverSetup(setup)).await?;

        let payload = match channel.receive::<OtMessage>().await? {
            OtMessage::SenderPayload(m) => m,
            m => return Err(OtError::unexpected("SenderPayload", &m)),
        };
        trace!("received SenderPayload");

        let values = ot.receive(payload)?;

        Ok(choices.into_keys().zip(values).collect())
    }
}
