//! Engine configuration.
//!
//! Policy switches that the settlement rules leave to the operator. Loaded
//! from JSON by the host; every field has a default so partial documents
//! are accepted.

use serde::{Deserialize, Serialize};

use crate::{PoolbetError, Result, constants};

/// Policy configuration for the settlement engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Whether one bettor may back both sides of the same match.
    pub allow_hedging: bool,
    /// Reject `create_match` when the window already closed.
    pub reject_elapsed_windows: bool,
    /// Maximum title length in bytes.
    pub max_title_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allow_hedging: true,
            reject_elapsed_windows: true,
            max_title_len: constants::DEFAULT_MAX_TITLE_LEN,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    /// Returns [`PoolbetError::Configuration`] on malformed JSON, unknown
    /// fields, or out-of-range values.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(raw)
            .map_err(|e| PoolbetError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_title_len == 0 {
            return Err(PoolbetError::Configuration(
                "max_title_len must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Strict profile: one side per bettor per match.
    #[must_use]
    pub fn no_hedging() -> Self {
        Self {
            allow_hedging: false,
            ..Self::default()
        }
    }
}
