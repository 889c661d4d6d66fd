use serde::{Deserialize, Serialize};
use yao_ot::OtMode;

/// Session configuration, shared by the garbler and the evaluator.
///
/// Both parties must agree on the OT mode; a mismatch aborts the session.
#[derive(derive_builder::Builder, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Oblivious transfer mode.
    #[builder(default)]
    ot_mode: OtMode,
}

impl SessionConfig {
    /// Creates a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Returns the OT mode.
    pub fn ot_mode(&self) -> OtMode {
        self.ot_mode
    }
}
