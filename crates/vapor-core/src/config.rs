use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Construction-time configuration for one [`ResourceManager`] instance.
///
/// There is no dynamic reconfiguration: the flags are read once when the
/// manager is built and fixed for its lifetime.
///
/// [`ResourceManager`]: crate::graph::manager::ResourceManager
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// When true, a relationship-bookkeeping failure must abort and roll
    /// back the handler operation that triggered it. When false, handlers
    /// log the failure and proceed (the state store stays authoritative).
    #[serde(default)]
    pub strict_validation: bool,
    /// Reject relationship additions that would close a directed cycle.
    #[serde(default = "default_true")]
    pub detect_cycles: bool,
    /// Validate every relationship against the built-in AWS-shaped table of
    /// legal `(from type, kind, to type)` triples.
    #[serde(default = "default_true")]
    pub use_aws_schema: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            strict_validation: false,
            detect_cycles: default_true(),
            use_aws_schema: default_true(),
        }
    }
}

/// Top-level emulator configuration, one tracker section per service family.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmulatorConfig {
    #[serde(default)]
    pub iam: TrackerConfig,
    #[serde(default)]
    pub ec2: TrackerConfig,
}

/// Load the emulator config from a TOML file, falling back to defaults if
/// the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<EmulatorConfig> {
    if !path.exists() {
        return Ok(EmulatorConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<EmulatorConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_true() -> bool {
    true
}
