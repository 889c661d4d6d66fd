use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Two-party computation with Yao garbled circuits",
    name = "yao"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// YAML configuration file.
    #[arg(long, short, global = true, env = "YAO_CONFIG")]
    pub config: Option<PathBuf>,
    /// Circuit file. The built-in MIN circuit is used if omitted.
    #[arg(long, global = true)]
    pub circuit: Option<PathBuf>,
    /// Number of bits of each private input.
    #[arg(long, global = true)]
    pub bit_width: Option<u32>,
    /// Oblivious transfer mode.
    #[arg(long, global = true, value_parser = ["secure", "insecure"])]
    pub ot_mode: Option<String>,
    /// Log level.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connects to the evaluator and runs every circuit.
    Garbler(PartyArgs),
    /// Waits for the garbler and serves sessions until it closes the
    /// connection.
    Evaluator(PartyArgs),
    /// Runs both parties in one process.
    Local(LocalArgs),
    /// Garbles every circuit and prints the garbled tables.
    Table,
    /// Evaluates every input combination of every circuit.
    TruthTable,
}

#[derive(Args, Debug, Default)]
pub struct PartyArgs {
    /// Address of the evaluator.
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    /// File holding this party's integers.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// File holding the peer's integers. Only read by `--verify`.
    #[arg(long)]
    pub peer_input: Option<PathBuf>,
    /// Report file.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Recomputes the result in the clear and reports whether it matches.
    #[arg(long)]
    pub verify: bool,
}

#[derive(Args, Debug, Default)]
pub struct LocalArgs {
    #[arg(long)]
    pub garbler_input: Option<PathBuf>,
    #[arg(long)]
    pub evaluator_input: Option<PathBuf>,
    /// Report file.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Recomputes the result in the clear and reports whether it matches.
    #[arg(long)]
    pub verify: bool,
}

impl Command {
    /// Returns whether `--verify` was given.
    pub fn verify(&self) -> bool {
        match self {
            Command::Garbler(args) | Command::Evaluator(args) => args.verify,
            Command::Local(args) => args.verify,
            Command::Table | Command::TruthTable => false,
        }
    }
}
