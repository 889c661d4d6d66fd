//! OT which sends both values in the clear.
//!
//! The receiver learns the unselected values, so this mode only exists to
//! test the rest of the protocol against a trivially correct transfer.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{instrument, warn};
use yao_common::Channel;
use yao_core::{MaskedValue, WireId};

use crate::{
    check_wires,
    msgs::{InsecurePayload, OtMessage},
    ObliviousReceive, ObliviousSend, OtError,
};

/// Insecure OT sender.
#[derive(Debug, Default)]
pub struct InsecureSender {}

/// Insecure OT receiver.
#[derive(Debug, Default)]
pub struct InsecureReceiver {}

#[async_trait]
impl ObliviousSend for InsecureSender {
    fn is_secure(&self) -> bool {
        false
    }

    #[instrument(level = "debug", skip_all, fields(wires = offers.len()), err)]
    async fn send<C: Channel + ?Sized>(
        &mut self,
        channel: &mut C,
        offers: BTreeMap<WireId, [MaskedValue; 2]>,
    ) -> Result<(), OtError> {
        warn!("sending OT values in the clear");

        let (wires, values) = offers.into_iter().unzip();
        channel
            .send(OtMessage::InsecurePayload(InsecurePayload { wires, values }))
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ObliviousReceive for InsecureReceiver {
    fn is_secure(&self) -> bool {
        false
    }

    #[instrument(level = "debug", skip_all, fields(wires = choices.len()), err)]
    async fn receive<C: Channel + ?Sized>(
        &mut self,
        channel: &mut C,
        choices: BTreeMap<WireId, bool>,
    ) -> Result<BTreeMap<WireId, MaskedValue>, OtError> {
        let payload = match channel.receive::<OtMessage>().await? {
            OtMessage::InsecurePayload(m) => m,
            m => return Err(OtError::unexpected("InsecurePayload", &m)),
        };

        check_wires(&choices, &payload.wires)?;

        if payload.values.len() != payload.wires.len() {
            return Err(OtError::ProtocolMismatch(format!(
                "expected {} value pairs, got {}",
                payload.wires.len(),
                payload.values.len()
            )));
        }

        Ok(choices
            .into_iter()
            .zip(payload.values)
            .map(|((wire, choice), values)| (wire, values[choice as usize]))
            .collect())
    }
}
