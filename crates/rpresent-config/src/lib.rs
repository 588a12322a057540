//! rpresent configuration system.
//!
//! TOML-based configuration for the relay process. Every section uses
//! serde defaults, so an empty or partial file is a valid config.
//!
//! ```rust,no_run
//! use rpresent_config::load_config;
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("listening on {}", config.server.listen);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{LogLevel, LoggingConfig, RelayConfig, ServerConfig, TimeoutsConfig};
pub use toml_loader::{
    create_default_config, default_config_path, load_default, load_from_path, load_or_create,
    CONFIG_ENV,
};

use std::path::Path;

use rpresent_common::ConfigError;

/// Load config from `path` if given, otherwise from the platform default.
///
/// An explicit path must exist; the platform default is created on first use.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    match path {
        Some(path) => load_from_path(path),
        None => load_default(),
    }
}
