//! CLI configuration loading and merging.

use anyhow::Context;
use imgprep_core::PrepConfig;
use std::path::Path;

/// Load and merge CLI configuration.
///
/// Configuration precedence:
/// 1. CLI arguments (handled by clap)
/// 2. Explicit `--config` file, if given
/// 3. Local config file (./.imgpreprc)
/// 4. Global config file (~/.imgprep/config.toml)
/// 5. Defaults
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<PrepConfig> {
    let mut config = PrepConfig::discover_and_load();
    if let Some(path) = explicit {
        let file = PrepConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;
        config.merge(&file);
    }
    Ok(config)
}
