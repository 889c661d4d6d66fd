use std::collections::BTreeMap;

use tracing::{debug, info, instrument};
use yao_common::{Channel, Role};
use yao_core::{evaluate_masked, unmask, Circuit, WireId};
use yao_ot::{InsecureReceiver, ObliviousReceive, OtMode, Receiver};

use crate::{
    msgs::{Output, SessionMessage, Setup},
    SessionConfig, SessionError, SessionOutput,
};

/// The evaluating party.
///
/// Fetches the keys of its input wires by OT and evaluates the garbled
/// circuit it receives.
#[derive(Debug)]
pub struct Evaluator {
    config: SessionConfig,
}

impl Evaluator {
    /// Creates a new evaluator.
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
    /// * `channel` - Channel to the garbler.
    /// * `inputs` - One bit per evaluator input wire.
    pub async fn run<C: Channel + ?Sized>(
        &self,
        channel: &mut C,
        inputs: &[bool],
    ) -> Result<SessionOutput, SessionError> {
        match channel.receive::<SessionMessage>().await? {
            SessionMessage::Setup(setup) => self.execute(channel, setup, inputs).await,
            m => Err(SessionError::unexpected("Setup", m.kind())),
        }
    }

    /// Serves sessions until the garbler closes the channel.
    ///
    /// `inputs` is called with the circuit of every session and returns the
    /// evaluator's input bits for it.
    pub async fn serve<C, F>(
        &self,
        channel: &mut C,
        mut inputs: F,
    ) -> Result<Vec<SessionOutput>, SessionError>
    where
        C: Channel + ?Sized,
        F: FnMut(&Circuit) -> Vec<bool> + Send,
    {
        let mut outputs = Vec::new();
        loop {
            match channel.receive::<SessionMessage>().await? {
                SessionMessage::Setup(setup) => {
                    let bits = inputs(&setup.circuit);
                    outputs.push(self.execute(channel, setup, &bits).await?);
                }
                SessionMessage::Close => {
                    debug!("garbler closed the channel");
                    return Ok(outputs);
                }
                m => return Err(SessionError::unexpected("Setup or Close", m.kind())),
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(circuit = setup.circuit.name()), err)]
    async fn execute<C: Channel + ?Sized>(
        &self,
        channel: &mut C,
        setup: Setup,
        inputs: &[bool],
    ) -> Result<SessionOutput, SessionError> {
        let Setup {
            circuit: circ,
            tables,
            output_pbits,
            garbler_inputs,
            ot_mode,
        } = setup;

        if ot_mode != self.config.ot_mode() {
            return Err(SessionError::ot_mode_mismatch(self.config.ot_mode(), ot_mode));
        }

        if inputs.len() != circ.evaluator_inputs().len() {
            return Err(SessionError::input_length(
                circ.evaluator_inputs().len(),
                inputs.len(),
            ));
        }

        let choices: BTreeMap<WireId, bool> = circ
            .evaluator_inputs()
            .iter()
            .copied()
            .zip(inputs.iter().copied())
            .collect();
        let ot_wires: Vec<WireId> = choices.keys().copied().collect();

        let received = match ot_mode {
            OtMode::Secure => Receiver::new().receive(channel, choices).await?,
            OtMode::Insecure => InsecureReceiver::default().receive(channel, choices).await?,
        };
        debug!(wires = received.len(), "completed oblivious transfer");

        let mut active = garbler_inputs;
        active.extend(received.iter().map(|(wire, value)| (*wire, *value)));

        let masked_outputs = evaluate_masked(&circ, &tables, &active)?;

        let decoded = unmask(&masked_outputs, &output_pbits)?;
        let outputs: Vec<bool> = circ
            .outputs()
            .iter()
            .filter_map(|wire| decoded.get(wire).copied())
            .collect();

        channel
            .send(SessionMessage::Output(Output {
                outputs: masked_outputs.clone(),
            }))
            .await?;

        info!("session complete");

        Ok(SessionOutput {
            circuit: circ.name().to_string(),
            role: Role::Evaluator,
            ot_mode,
            outputs,
            masked_outputs,
            ot_wires,
            received,
        })
    }
}
