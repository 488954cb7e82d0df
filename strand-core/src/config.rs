//! Runtime Configuration
//!
//! Tunables for the per-thread reactive runtime. Every field has a default,
//! so a partial (or empty) JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::ReactiveError;

/// Configuration for the reactive runtime of the current thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on flush passes performed by `run_until_idle`.
    pub max_flush_passes: usize,

    /// Number of diagnostics retained before the oldest are discarded.
    pub diagnostics_capacity: usize,
}

impl RuntimeConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ReactiveError> {
        let config: Self = serde_json::from_str(json)?;
        if config.max_flush_passes == 0 {
            return Err(ReactiveError::InvalidConfig(
                "max_flush_passes must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_passes: 100,
            diagnostics_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = RuntimeConfig::from_json("{}").unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn partial_object_overrides_fields() {
        let config = RuntimeConfig::from_json(r#"{ "max_flush_passes": 5 }"#).unwrap();
        assert_eq!(config.max_flush_passes, 5);
        assert_eq!(config.diagnostics_capacity, 64);
    }

    #[test]
    fn rejects_zero_passes() {
        let err = RuntimeConfig::from_json(r#"{ "max_flush_passes": 0 }"#).unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = RuntimeConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidConfig(_)));
    }
}
