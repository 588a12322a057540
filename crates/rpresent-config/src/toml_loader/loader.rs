//! Reading and validating relay config files.

use std::io::ErrorKind;
use std::path::Path;

use rpresent_common::ConfigError;
use tracing::{debug, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::RelayConfig;
use crate::validation;

/// Parse the relay config at `path`.
///
/// Missing sections and fields fall back to their defaults. Values that
/// fail validation are reported as a warning and kept, so a typo in one
/// timeout does not stop the relay from starting.
pub fn load_from_path(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("cannot read {}: {e}", path.display())),
    })?;

    let config: RelayConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "{e}; keeping the configured values");
    }

    debug!(
        listen = %config.server.listen,
        slides_dir = %config.server.slides_dir.display(),
        "relay config loaded from {}",
        path.display()
    );
    Ok(config)
}

/// Load `path`, writing the commented default there first if it is absent.
pub fn load_or_create(path: &Path) -> Result<RelayConfig, ConfigError> {
    if create_default_config(path)? {
        return Ok(RelayConfig::default());
    }
    load_from_path(path)
}

/// Load the config from [`default_config_path`], creating it on first run.
pub fn load_default() -> Result<RelayConfig, ConfigError> {
    load_or_create(&default_config_path()?)
}
