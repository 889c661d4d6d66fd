//! Human-readable reports.

use std::{fmt, path::Path};

use anyhow::{Context, Result};
use yao_common::Role;
use yao_core::{circuits::from_bits, Circuit};
use yao_session::SessionOutput;

use crate::input::{bit_string, PrivateInput};

/// What one party saw of one session.
#[derive(Debug)]
pub struct PartyReport<'a> {
    pub circuit: &'a Circuit,
    pub input: &'a PrivateInput,
    pub output: &'a SessionOutput,
}

impl fmt::Display for PartyReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let PartyReport {
            circuit,
            input,
            output,
        } = self;

        writeln!(
            f,
            "{} computation ({}, {} OT):",
            capitalize(output.role),
            output.circuit,
            output.ot_mode
        )?;
        writeln!(f, " input: {} ({} in binary)", input.value, input.binary())?;
        writeln!(f, " output: {}", result_string(&output.outputs))?;
        writeln!(f)?;
        writeln!(f, " oblivious transfer:")?;

        match output.role {
            Role::Garbler => {
                writeln!(f, "  wires offered to the evaluator:")?;
                for wire in &output.ot_wires {
                    writeln!(f, "   wire {wire}")?;
                }
            }
            Role::Evaluator => {
                writeln!(f, "  inputs:")?;
                let wires = circuit.evaluator_inputs();
                for (wire, bit) in wires.iter().zip(input.bits_for(wires.len())) {
                    writeln!(f, "   wire {wire}: bit = {}", u8::from(*bit))?;
                }
                writeln!(f, "  received:")?;
                for (wire, value) in &output.received {
                    writeln!(
                        f,
                        "   wire {wire}: key = {}, external bit = {}",
                        hex::encode(value.key.as_bytes()),
                        u8::from(value.ext)
                    )?;
                }
            }
        }

        writeln!(f, "  masked outputs:")?;
        for (wire, value) in &output.masked_outputs {
            writeln!(f, "   wire {wire}: external bit = {}", u8::from(value.ext))?;
        }

        Ok(())
    }
}

/// The result of recomputing a circuit in the clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub expected: Vec<bool>,
    pub actual: Vec<bool>,
}

impl Verification {
    /// Evaluates `circ` in the clear and compares with `actual`.
    pub fn new(
        circ: &Circuit,
        garbler: &PrivateInput,
        evaluator: &PrivateInput,
        actual: &[bool],
    ) -> Result<Self> {
        let expected = circ
            .eval_plain(
                garbler.bits_for(circ.garbler_inputs().len()),
                evaluator.bits_for(circ.evaluator_inputs().len()),
            )
            .with_context(|| format!("inputs do not match circuit {}", circ.name()))?;

        Ok(Self {
            expected,
            actual: actual.to_vec(),
        })
    }

    pub fn is_correct(&self) -> bool {
        self.expected == self.actual
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_correct() {
            write!(f, "the result is {} and it is correct", result_string(&self.actual))
        } else {
            write!(
                f,
                "the result is {} and it is not correct, expected {}",
                result_string(&self.actual),
                result_string(&self.expected)
            )
        }
    }
}

/// Formats output bits, with their value if they fit in an integer.
pub fn result_string(bits: &[bool]) -> String {
    if bits.len() <= 64 {
        format!("{} ({})", bit_string(bits), from_bits(bits))
    } else {
        bit_string(bits)
    }
}

/// Writes the report file, creating its directory if needed.
pub fn write(path: &Path, report: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }

    std::fs::write(path, report)
        .with_context(|| format!("failed to write report {}", path.display()))
}

fn capitalize(role: Role) -> &'static str {
    match role {
        Role::Garbler => "Garbler",
        Role::Evaluator => "Evaluator",
    }
}

#[cfg(test)]
mod tests {
    use yao_core::circuits;

    use super::*;

    #[test]
    fn test_verification() {
        let circ = circuits::min(8).unwrap();
        let garbler = PrivateInput::new(40, 8).unwrap();
        let evaluator = PrivateInput::new(12, 8).unwrap();

        let correct = Verification::new(&circ, &garbler, &evaluator, &circuits::to_bits(12, 8))
            .unwrap();
        assert!(correct.is_correct());
        assert_eq!(
            correct.to_string(),
            "the result is 00001100 (12) and it is correct"
        );

        let wrong = Verification::new(&circ, &garbler, &evaluator, &circuits::to_bits(40, 8))
            .unwrap();
        assert!(!wrong.is_correct());
        assert!(wrong.to_string().contains("not correct"));
    }

    #[test]
    fn test_verification_width_mismatch() {
        let circ = circuits::min(8).unwrap();
        let garbler = PrivateInput::new(4, 4).unwrap();
        let evaluator = PrivateInput::new(12, 8).unwrap();

        assert!(Verification::new(&circ, &garbler, &evaluator, &[]).is_err());
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("result.txt");

        write(&path, "report").unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "report");
    }
}
