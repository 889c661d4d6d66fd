use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use yao_core::circuits::to_bits;

/// A party's private input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateInput {
    /// The integer fed into the circuit.
    pub value: u64,
    /// `value`, most significant bit first.
    pub bits: Vec<bool>,
}

impl PrivateInput {
    /// Encodes `value` into `bit_width` bits.
    pub fn new(value: u64, bit_width: usize) -> Result<Self> {
        ensure!(
            (1..=64).contains(&bit_width),
            "bit width must be between 1 and 64, got {bit_width}"
        );
        if bit_width < 64 && value >> bit_width != 0 {
            bail!("input {value} does not fit in {bit_width} bits");
        }

        Ok(Self {
            value,
            bits: to_bits(value, bit_width),
        })
    }

    /// Parses whitespace-separated integers and takes their minimum.
    pub fn parse(text: &str, bit_width: usize) -> Result<Self> {
        let min = text
            .split_whitespace()
            .map(|word| {
                word.parse::<u64>()
                    .with_context(|| format!("invalid integer {word:?}"))
            })
            .try_fold(None::<u64>, |min, value| {
                let value = value?;
                Ok::<_, anyhow::Error>(Some(min.map_or(value, |min| min.min(value))))
            })?
            .context("input holds no integers")?;

        Self::new(min, bit_width)
    }

    /// Reads an input file.
    pub fn read(path: &Path, bit_width: usize) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()))?;

        Self::parse(&text, bit_width)
            .with_context(|| format!("invalid input file {}", path.display()))
    }

    /// Returns the bits fed into `wires` input wires.
    ///
    /// A party without input wires in a circuit contributes nothing.
    pub fn bits_for(&self, wires: usize) -> &[bool] {
        if wires == 0 {
            &[]
        } else {
            &self.bits
        }
    }

    /// Returns the bits as a string of `0`s and `1`s.
    pub fn binary(&self) -> String {
        bit_string(&self.bits)
    }
}

pub(crate) fn bit_string(bits: &[bool]) -> String {
    bits.iter().map(|&bit| if bit { '1' } else { '0' }).collect()
}
