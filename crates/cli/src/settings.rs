use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use yao_ot::OtMode;
use yao_session::{SessionConfig, SessionConfigBuilderError};

use crate::cli::{Cli, Command};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Address the evaluator listens on and the garbler connects to.
    pub host: String,
    pub port: u16,
    /// Number of bits of each private input.
    pub bit_width: u32,
    pub ot_mode: OtMode,
    /// Circuit file. The built-in MIN circuit is used if not set.
    pub circuit: Option<PathBuf>,
    pub garbler_input: PathBuf,
    pub evaluator_input: PathBuf,
    /// Report file. Nothing is written if not set.
    pub output: Option<PathBuf>,
    pub log: LogProperties,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogProperties {
    /// Log verbosity level of the default filtering logic, which is
    /// yao_cli=<level>,yao_session=<level>,yao_ot=<level>,yao_core=<level>.
    /// Must be either of <https://docs.rs/tracing/latest/tracing/struct.Level.html#implementations>
    pub level: String,
    /// Custom filtering logic, refer to the syntax here <https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#example-syntax>
    /// This will override the default filtering logic above
    pub filter: Option<String>,
    pub format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            bit_width: 8,
            ot_mode: OtMode::Secure,
            circuit: None,
            garbler_input: PathBuf::from("input/alice.txt"),
            evaluator_input: PathBuf::from("input/bob.txt"),
            output: None,
            log: LogProperties::default(),
        }
    }
}

impl Default for LogProperties {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            filter: None,
            format: LogFormat::Compact,
        }
    }
}

impl Settings {
    /// Loads the settings.
    ///
    /// Sources in increasing priority: defaults, the config file, `YAO_`
    /// environment variables and command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::from(path.as_path()));
        }

        builder = builder
            .add_source(
                Environment::with_prefix("YAO")
                    .try_parsing(true)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("circuit", path_str(&cli.circuit))?
            .set_override_option("bit_width", cli.bit_width)?
            .set_override_option("ot_mode", cli.ot_mode.clone())?
            .set_override_option("log.level", cli.log_level.clone())?;

        match &cli.command {
            Command::Garbler(args) => {
                builder = builder
                    .set_override_option("host", args.host.clone())?
                    .set_override_option("port", args.port)?
                    .set_override_option("garbler_input", path_str(&args.input))?
                    .set_override_option("evaluator_input", path_str(&args.peer_input))?
                    .set_override_option("output", path_str(&args.output))?;
            }
            Command::Evaluator(args) => {
                builder = builder
                    .set_override_option("host", args.host.clone())?
                    .set_override_option("port", args.port)?
                    .set_override_option("evaluator_input", path_str(&args.input))?
                    .set_override_option("garbler_input", path_str(&args.peer_input))?
                    .set_override_option("output", path_str(&args.output))?;
            }
            Command::Local(args) => {
                builder = builder
                    .set_override_option("garbler_input", path_str(&args.garbler_input))?
                    .set_override_option("evaluator_input", path_str(&args.evaluator_input))?
                    .set_override_option("output", path_str(&args.output))?;
            }
            Command::Table | Command::TruthTable => {}
        }

        builder.build()?.try_deserialize()
    }

    /// Returns the session config.
    pub fn session_config(&self) -> Result<SessionConfig, SessionConfigBuilderError> {
        SessionConfig::builder().ot_mode(self.ot_mode).build()
    }

    /// Returns the input bit width.
    pub fn bit_width(&self) -> usize {
        self.bit_width as usize
    }
}

fn path_str(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|path| path.display().to_string())
}
