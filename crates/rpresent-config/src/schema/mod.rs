//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod logging;
mod server;
mod timeouts;

pub use logging::*;
pub use server::*;
pub use timeouts::*;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub timeouts: TimeoutsConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn default_server_matches_legacy_flags() {
        let config = RelayConfig::default();
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.server.slides_dir, PathBuf::from("slides"));
        assert_eq!(config.server.index_file, "index.json");
        assert_eq!(config.server.base_url, "http://localhost:8080");
    }

    #[test]
    fn default_timeouts() {
        let t = RelayConfig::default().timeouts;
        assert_eq!(t.handshake(), Duration::from_secs(10));
        assert_eq!(t.presenter_idle(), Duration::from_secs(15 * 60));
        assert_eq!(t.viewer_wait(), Duration::from_secs(60));
        assert_eq!(t.send(), Duration::from_secs(10));
    }

    #[test]
    fn index_path_joins_dir_and_file() {
        let mut config = RelayConfig::default();
        config.server.slides_dir = PathBuf::from("/srv/slides");
        assert_eq!(
            config.server.index_path(),
            PathBuf::from("/srv/slides/index.json")
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: RelayConfig = toml::from_str("[timeouts]\nviewer_wait_secs = 5\n").unwrap();
        assert_eq!(config.timeouts.viewer_wait_secs, 5);
        assert_eq!(config.timeouts.handshake_secs, 10);
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn log_level_parses_lowercase() {
        let config: RelayConfig = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.level.as_filter(), "debug");
    }
}
