//! Runtime Configuration
//!
//! Tunables for the reactive runtime and the list reconciler. A config is
//! installed per thread with [`configure`](crate::configure); threads that
//! never call it run with [`RuntimeConfig::default`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::list::StrategyKind;

/// Default cap on computations run by a single flush.
pub const DEFAULT_MAX_FLUSH_RUNS: usize = 100_000;

/// Configuration for one thread's reactive runtime.
///
/// # Example
///
/// ```rust,ignore
/// let cfg = RuntimeConfig::from_json(r#"{ "max_flush_runs": 500 }"#)?;
/// pulse_core::configure(cfg);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum number of computation runs a single flush may perform
    /// before it is treated as a runaway update loop.
    pub max_flush_runs: usize,

    /// Move strategy used by lists that do not pick one explicitly.
    pub default_strategy: StrategyKind,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_runs: DEFAULT_MAX_FLUSH_RUNS,
            default_strategy: StrategyKind::Lis,
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a config from JSON. Missing fields take their
    /// default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field holds a usable value.
    pub fn validate(&self) -> Result<()> {
        if self.max_flush_runs == 0 {
            return Err(Error::InvalidConfig(
                "max_flush_runs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
