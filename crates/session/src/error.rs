use std::fmt;

use yao_core::{EvaluateError, GarbleError, WireId};
use yao_ot::{OtError, OtMode};

/// Session error.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct SessionError(#[from] pub(crate) ErrorRepr);

/// Kind of a [`SessionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The channel failed.
    Io,
    /// The peer sent a message that could not be decoded.
    Protocol,
    /// Garbling failed.
    Garble,
    /// Evaluation failed.
    Evaluate,
    /// Oblivious transfer failed.
    Ot,
    /// The number of input bits does not match the circuit.
    InputLength,
    /// The parties are configured with different OT modes.
    OtModeMismatch,
    /// The evaluator returned outputs that do not belong to the circuit.
    OutputMismatch,
    /// The peer sent an unexpected message.
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("session error: {0}")]
pub(crate) enum ErrorRepr {
    #[error("io error: {0}")]
    Io(std::io::Error),
    #[error("malformed message: {0}")]
    Protocol(std::io::Error),
    #[error("garble error: {0}")]
    Garble(GarbleError),
    #[error("evaluate error: {0}")]
    Evaluate(EvaluateError),
    #[error("ot error: {0}")]
    Ot(OtError),
    #[error("expected {expected} input bits, got {actual}")]
    InputLength { expected: usize, actual: usize },
    #[error("local OT mode is {local}, peer uses {remote}")]
    OtModeMismatch { local: OtMode, remote: OtMode },
    #[error("output mismatch on wire {wire}: {reason}")]
    OutputMismatch { wire: WireId, reason: &'static str },
    #[error("unexpected message: expected {expected}, got {actual}")]
    Unexpected {
        expected: &'static str,
        actual: &'static str,
    },
}

impl SessionError {
    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        match &self.0 {
            ErrorRepr::Io(_) => ErrorKind::Io,
            ErrorRepr::Protocol(_) => ErrorKind::Protocol,
            ErrorRepr::Garble(_) => ErrorKind::Garble,
            ErrorRepr::Evaluate(_) => ErrorKind::Evaluate,
            ErrorRepr::Ot(_) => ErrorKind::Ot,
            ErrorRepr::InputLength { .. } => ErrorKind::InputLength,
            ErrorRepr::OtModeMismatch { .. } => ErrorKind::OtModeMismatch,
            ErrorRepr::OutputMismatch { .. } => ErrorKind::OutputMismatch,
            ErrorRepr::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    pub(crate) fn input_length(expected: usize, actual: usize) -> Self {
        Self(ErrorRepr::InputLength { expected, actual })
    }

    pub(crate) fn ot_mode_mismatch(local: OtMode, remote: OtMode) -> Self {
        Self(ErrorRepr::OtModeMismatch { local, remote })
    }

    pub(crate) fn output_mismatch(wire: WireId, reason: &'static str) -> Self {
        Self(ErrorRepr::OutputMismatch { wire, reason })
    }

    pub(crate) fn unexpected(expected: &'static str, actual: &'static str) -> Self {
        Self(ErrorRepr::Unexpected { expected, actual })
    }
}

impl From<std::io::Error> for SessionError {
    fn from(value: std::io::Error) -> Self {
        match value.kind() {
            std::io::ErrorKind::InvalidData => Self(ErrorRepr::Protocol(value)),
            _ => Self(ErrorRepr::Io(value)),
        }
    }
}

impl From<GarbleError> for SessionError {
    fn from(value: GarbleError) -> Self {
        Self(ErrorRepr::Garble(value))
    }
}

impl From<EvaluateError> for SessionError {
    fn from(value: EvaluateError) -> Self {
        Self(ErrorRepr::Evaluate(value))
    }
}

impl From<OtError> for SessionError {
    fn from(value: OtError) -> Self {
        Self(ErrorRepr::Ot(value))
    }
}
