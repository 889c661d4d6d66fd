//! Subcommands.

use std::{collections::BTreeMap, fmt::Write as _, time::Duration};

use anyhow::{anyhow, ensure, Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use yao_common::{duplex, framed};
use yao_core::{circuits::to_bits, evaluate, garble, Circuit, WireId};
use yao_session::{Evaluator, Garbler, SessionError, SessionOutput};

use crate::{
    circuit_file,
    cli::Command,
    input::{bit_string, PrivateInput},
    report::{self, PartyReport, Verification},
    settings::Settings,
};

const CONNECT_RETRIES: usize = 50;
const CONNECT_DELAY: Duration = Duration::from_millis(100);
/// Upper bound on the number of input bits of a truth table.
const MAX_TRUTH_TABLE_INPUTS: usize = 16;
const DUPLEX_BUFFER: usize = 1 << 20;

/// Runs a subcommand.
pub async fn dispatch(command: &Command, settings: &Settings) -> Result<()> {
    let verify = command.verify();
    match command {
        Command::Garbler(_) => garbler(settings, verify).await.map(print),
        Command::Evaluator(_) => evaluator(settings, verify).await.map(print),
        Command::Local(_) => local(settings, verify).await.map(print),
        Command::Table => table(settings).map(print),
        Command::TruthTable => truth_table(settings).map(print),
    }
}

fn print(text: String) {
    print!("{text}");
}

/// Runs the garbler against a remote evaluator and returns the report.
pub async fn garbler(settings: &Settings, verify: bool) -> Result<String> {
    let circs = circuit_file::load(settings.circuit.as_deref(), settings.bit_width())?;
    let input = PrivateInput::read(&settings.garbler_input, settings.bit_width())?;
    check_widths(&circs, settings.bit_width())?;

    let socket = connect(&settings.host, settings.port).await?;
    let mut channel = framed(socket);
    let garbler = Garbler::new(settings.session_config()?);

    let mut outputs = Vec::with_capacity(circs.len());
    for circ in &circs {
        info!("sending {}", circ.name());
        let bits = input.bits_for(circ.garbler_inputs().len());
        outputs.push(garbler.run(&mut channel, circ, bits).await?);
    }
    garbler.close(&mut channel).await?;

    let peer = verify
        .then(|| PrivateInput::read(&settings.evaluator_input, settings.bit_width()))
        .transpose()?;

    let mut text = String::new();
    for (circ, output) in circs.iter().zip(&outputs) {
        let report = PartyReport {
            circuit: circ,
            input: &input,
            output,
        };
        let check = verification(circ, &input, peer.as_ref(), output)?;
        append(&mut text, &report.to_string(), check)?;
    }

    finish(settings, text)
}

/// Serves a remote garbler and returns the report.
pub async fn evaluator(settings: &Settings, verify: bool) -> Result<String> {
    let input = PrivateInput::read(&settings.evaluator_input, settings.bit_width())?;
    let peer = verify
        .then(|| PrivateInput::read(&settings.garbler_input, settings.bit_width()))
        .transpose()?;

    let listener = TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("failed to listen on {}:{}", settings.host, settings.port))?;
    info!("listening on {}", listener.local_addr()?);

    let (socket, addr) = listener.accept().await?;
    info!("garbler connected from {addr}");

    let mut channel = framed(socket);
    let evaluator = Evaluator::new(settings.session_config()?);

    let mut circs = Vec::new();
    let outputs = evaluator
        .serve(&mut channel, |circ| {
            info!("received {}", circ.name());
            circs.push(circ.clone());
            input.bits_for(circ.evaluator_inputs().len()).to_vec()
        })
        .await?;

    let mut text = String::new();
    for (circ, output) in circs.iter().zip(&outputs) {
        let report = PartyReport {
            circuit: circ,
            input: &input,
            output,
        };
        let check = match &peer {
            Some(garbler) => Some(Verification::new(circ, garbler, &input, &output.outputs)?),
            None => None,
        };
        append(&mut text, &report.to_string(), check)?;
    }

    finish(settings, text)
}

/// Runs both parties in one process and returns the combined report.
pub async fn local(settings: &Settings, verify: bool) -> Result<String> {
    let circs = circuit_file::load(settings.circuit.as_deref(), settings.bit_width())?;
    let garbler_input = PrivateInput::read(&settings.garbler_input, settings.bit_width())?;
    let evaluator_input = PrivateInput::read(&settings.evaluator_input, settings.bit_width())?;
    check_widths(&circs, settings.bit_width())?;

    let (mut gen_channel, mut ev_channel) = duplex(DUPLEX_BUFFER);
    let garbler = Garbler::new(settings.session_config()?);
    let evaluator = Evaluator::new(settings.session_config()?);

    let circs_ref = &circs;
    let garbler_input_ref = &garbler_input;
    let evaluator_input_ref = &evaluator_input;

    // Each side owns its end of the channel, so an aborting party
    // disconnects the other.
    let gen_fut = async move {
        let mut outputs = Vec::with_capacity(circs_ref.len());
        for circ in circs_ref {
            let bits = garbler_input_ref.bits_for(circ.garbler_inputs().len());
            outputs.push(garbler.run(&mut gen_channel, circ, bits).await?);
        }
        garbler.close(&mut gen_channel).await?;
        Ok::<_, SessionError>(outputs)
    };
    let ev_fut = async move {
        evaluator
            .serve(&mut ev_channel, |circ| {
                evaluator_input_ref
                    .bits_for(circ.evaluator_inputs().len())
                    .to_vec()
            })
            .await
    };

    let (gen_outputs, ev_outputs) = tokio::join!(gen_fut, ev_fut);
    let (gen_outputs, ev_outputs) = (gen_outputs?, ev_outputs?);

    let mut text = String::new();
    for ((circ, gen), ev) in circs.iter().zip(&gen_outputs).zip(&ev_outputs) {
        if gen.outputs != ev.outputs {
            warn!("parties disagree on the output of {}", circ.name());
        }

        let check = verify
            .then(|| Verification::new(circ, &garbler_input, &evaluator_input, &gen.outputs))
            .transpose()?;

        let gen_report = PartyReport {
            circuit: circ,
            input: &garbler_input,
            output: gen,
        };
        let ev_report = PartyReport {
            circuit: circ,
            input: &evaluator_input,
            output: ev,
        };
        append(&mut text, &format!("{gen_report}\n{ev_report}"), check)?;
    }

    finish(settings, text)
}

/// Garbles every circuit and renders the garbled tables.
pub fn table(settings: &Settings) -> Result<String> {
    let circs = circuit_file::load(settings.circuit.as_deref(), settings.bit_width())?;

    let mut text = String::new();
    for circ in &circs {
        let garbling = garble(&mut rand::rng(), circ)?;

        writeln!(text, "======== {} ========", circ.name())?;
        for (gate, table) in circ.gates().iter().zip(garbling.tables()) {
            let inputs = gate
                .inputs
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(text, "{} [{}] -> {}", gate.op, inputs, gate.output)?;
            for (i, row) in table.rows().iter().enumerate() {
                writeln!(text, "  [{i}]: {}", hex::encode(row))?;
            }
        }
        text.push('\n');
    }

    Ok(text)
}

/// Garbles every circuit and evaluates it on every input combination.
pub fn truth_table(settings: &Settings) -> Result<String> {
    let circs = circuit_file::load(settings.circuit.as_deref(), settings.bit_width())?;

    let mut text = String::new();
    for circ in &circs {
        let gen_len = circ.garbler_inputs().len();
        let ev_len = circ.evaluator_inputs().len();
        ensure!(
            gen_len + ev_len <= MAX_TRUTH_TABLE_INPUTS,
            "circuit {} has {} inputs, at most {MAX_TRUTH_TABLE_INPUTS} are supported",
            circ.name(),
            gen_len + ev_len
        );

        let garbling = garble(&mut rand::rng(), circ)?;
        let output_pbits = garbling.output_pbits(circ);

        writeln!(text, "======== {} ========", circ.name())?;
        for combination in 0..1u64 << (gen_len + ev_len) {
            let bits = to_bits(combination, gen_len + ev_len);
            let (gen_bits, ev_bits) = bits.split_at(gen_len);

            let inputs = circ
                .garbler_inputs()
                .iter()
                .chain(circ.evaluator_inputs())
                .zip(&bits)
                .map(|(&wire, &bit)| {
                    garbling
                        .encode(wire, bit)
                        .map(|value| (wire, value))
                        .ok_or_else(|| anyhow!("no material for wire {wire}"))
                })
                .collect::<Result<BTreeMap<_, _>>>()?;

            let result = evaluate(circ, garbling.tables(), &output_pbits, &inputs)?;
            let outputs: Vec<bool> = circ
                .outputs()
                .iter()
                .map(|wire| result.get(wire).copied().unwrap_or_default())
                .collect();

            writeln!(
                text,
                "Garbler{} = {} Evaluator{} = {}  Outputs{} = {}",
                wire_list(circ.garbler_inputs()),
                bit_string(gen_bits),
                wire_list(circ.evaluator_inputs()),
                bit_string(ev_bits),
                wire_list(circ.outputs()),
                bit_string(&outputs),
            )?;
        }
        text.push('\n');
    }

    Ok(text)
}

/// Checks that every party input of every circuit is either absent or
/// `bit_width` bits wide.
fn check_widths(circs: &[Circuit], bit_width: usize) -> Result<()> {
    for circ in circs {
        for (party, wires) in [
            ("garbler", circ.garbler_inputs()),
            ("evaluator", circ.evaluator_inputs()),
        ] {
            ensure!(
                wires.is_empty() || wires.len() == bit_width,
                "circuit {} takes {} {party} input bits, the bit width is {bit_width}",
                circ.name(),
                wires.len()
            );
        }
    }

    Ok(())
}

async fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let mut retries = 0;
    loop {
        match TcpStream::connect((host, port)).await {
            Ok(socket) => {
                info!("connected to evaluator at {host}:{port}");
                return Ok(socket);
            }
            Err(e) if retries < CONNECT_RETRIES => {
                debug!("connection to {host}:{port} failed, retrying: {e}");
                retries += 1;
                tokio::time::sleep(CONNECT_DELAY).await;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to connect to {host}:{port}"))
            }
        }
    }
}

fn verification(
    circ: &Circuit,
    garbler: &PrivateInput,
    evaluator: Option<&PrivateInput>,
    output: &SessionOutput,
) -> Result<Option<Verification>> {
    evaluator
        .map(|evaluator| Verification::new(circ, garbler, evaluator, &output.outputs))
        .transpose()
}

fn append(text: &mut String, report: &str, check: Option<Verification>) -> Result<()> {
    text.push_str(report);
    if let Some(check) = check {
        if !check.is_correct() {
            warn!("verification failed: {check}");
        }
        writeln!(text, "\nverification: {check}")?;
    }
    text.push('\n');

    Ok(())
}

fn finish(settings: &Settings, text: String) -> Result<String> {
    if let Some(path) = &settings.output {
        report::write(path, &text)?;
        info!("report written to {}", path.display());
    }

    Ok(text)
}

fn wire_list(wires: &[WireId]) -> String {
    let ids = wires
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{ids}]")
}
