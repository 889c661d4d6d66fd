use std::collections::BTreeMap;

use tracing::{debug, info, instrument};
use yao_common::{Channel, Role};
use yao_core::{garble, Circuit, MaskedValue, WireId};
use yao_ot::{InsecureSender, ObliviousSend, OtMode, Sender};

use crate::{
    msgs::{Output, SessionMessage, Setup},
    SessionConfig, SessionError, SessionOutput,
};

/// The garbling party.
///
/// Garbles a fresh instance of the circuit for every session and acts as the
/// OT sender.
#[derive(Debug)]
pub struct Garbler {
    config: SessionConfig,
}

impl Garbler {
    /// Creates a new garbler.
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Returns the config.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs one session.
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel to the evaluator.
    /// * `circ` - The circuit to compute.
    /// * `inputs` - One bit per garbler input wire.
    #[instrument(level = "info", skip_all, fields(circuit = circ.name()), err)]
    pub async fn run<C: Channel + ?Sized>(
        &self,
        channel: &mut C,
        circ: &Circuit,
        inputs: &[bool],
    ) -> Result<SessionOutput, SessionError> {
        if inputs.len() != circ.garbler_inputs().len() {
            return Err(SessionError::input_length(
                circ.garbler_inputs().len(),
                inputs.len(),
            ));
        }

        let garbling = garble(&mut rand::rng(), circ)?;

        let garbler_inputs: BTreeMap<WireId, MaskedValue> = circ
            .garbler_inputs()
            .iter()
            .zip(inputs)
            .filter_map(|(&wire, &bit)| garbling.encode(wire, bit).map(|value| (wire, value)))
            .collect();

        let offers: BTreeMap<WireId, [MaskedValue; 2]> = circ
            .evaluator_inputs()
            .iter()
            .filter_map(|&wire| garbling.offer(wire).map(|pair| (wire, pair)))
            .collect();
        let ot_wires: Vec<WireId> = offers.keys().copied().collect();

        let ot_mode = self.config.ot_mode();
        channel
            .send(SessionMessage::Setup(Setup {
                circuit: circ.clone(),
                tables: garbling.tables().to_vec(),
                output_pbits: garbling.output_pbits(circ),
                garbler_inputs,
                ot_mode,
            }))
            .await?;
        debug!("sent setup");

        match ot_mode {
            OtMode::Secure => Sender::new().send(channel, offers).await?,
            OtMode::Insecure => InsecureSender::default().send(channel, offers).await?,
        }
        debug!(wires = ot_wires.len(), "completed oblivious transfer");

        let masked_outputs = match channel.receive::<SessionMessage>().await? {
            SessionMessage::Output(Output { outputs }) => outputs,
            m => return Err(SessionError::unexpected("Output", m.kind())),
        };

        let outputs = circ
            .outputs()
            .iter()
            .map(|&wire| {
                let value = masked_outputs
                    .get(&wire)
                    .ok_or_else(|| SessionError::output_mismatch(wire, "missing"))?;
                garbling
                    .decode(wire, value)
                    .ok_or_else(|| SessionError::output_mismatch(wire, "key does not match"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!("session complete");

        Ok(SessionOutput {
            circuit: circ.name().to_string(),
            role: Role::Garbler,
            ot_mode,
            outputs,
            masked_outputs,
            ot_wires,
            received: BTreeMap::new(),
        })
    }

    /// Tells the evaluator that no more sessions follow and closes the
    /// channel.
    pub async fn close<C: Channel + ?Sized>(&self, channel: &mut C) -> Result<(), SessionError> {
        channel.send(SessionMessage::Close).await?;
        channel.close().await?;

        Ok(())
    }
}
