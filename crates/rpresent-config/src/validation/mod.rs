//! Configuration validation.
//!
//! Each check pushes a message into a shared list; the orchestrator folds
//! them into a single `ConfigError`.

mod helpers;

#[cfg(test)]
mod tests;

use crate::schema::RelayConfig;
use rpresent_common::ConfigError;

use helpers::{validate_non_empty, validate_range};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &RelayConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_server(&mut errors, config);
    validate_timeouts(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_server(errors: &mut Vec<String>, config: &RelayConfig) {
    let server = &config.server;
    validate_non_empty(errors, "server.listen", &server.listen);
    validate_non_empty(errors, "server.index_file", &server.index_file);
    validate_non_empty(errors, "server.base_url", &server.base_url);

    if server.listen.parse::<std::net::SocketAddr>().is_err() && !server.listen.contains(':') {
        errors.push(format!(
            "server.listen = {:?} is not a host:port address",
            server.listen
        ));
    }
    if server.index_file.contains(std::path::is_separator) {
        errors.push(format!(
            "server.index_file = {:?} must be a plain file name",
            server.index_file
        ));
    }
}

fn validate_timeouts(errors: &mut Vec<String>, config: &RelayConfig) {
    let t = &config.timeouts;
    validate_range(errors, "timeouts.handshake_secs", t.handshake_secs, 1, 300);
    validate_range(
        errors,
        "timeouts.presenter_idle_secs",
        t.presenter_idle_secs,
        10,
        86_400,
    );
    validate_range(errors, "timeouts.viewer_wait_secs", t.viewer_wait_secs, 1, 3_600);
    validate_range(errors, "timeouts.send_secs", t.send_secs, 1, 300);
}
