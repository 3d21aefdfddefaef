pub mod inject;
pub mod scan;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::InjectConfig;
use crate::Result;

/// Resolve the pass configuration for a target: an explicit `--config`
/// path wins, then `telegraft.toml` in the target root, then defaults.
pub fn resolve_config(target: &Path, explicit: Option<&PathBuf>) -> Result<InjectConfig> {
    if let Some(path) = explicit {
        return InjectConfig::load(path);
    }
    let conventional = target.join("telegraft.toml");
    if conventional.is_file() {
        debug!(path = %conventional.display(), "Using conventional config file");
        return InjectConfig::load(&conventional);
    }
    Ok(InjectConfig::default())
}
