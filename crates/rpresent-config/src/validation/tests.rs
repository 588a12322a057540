use super::*;

#[test]
fn default_config_is_valid() {
    assert!(validate(&RelayConfig::default()).is_ok());
}

#[test]
fn zero_send_timeout_is_rejected() {
    let mut config = RelayConfig::default();
    config.timeouts.send_secs = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("timeouts.send_secs = 0 is out of range [1, 300]"));
}

#[test]
fn all_errors_are_collected() {
    let mut config = RelayConfig::default();
    config.timeouts.handshake_secs = 0;
    config.timeouts.viewer_wait_secs = 10_000;
    config.server.base_url = "   ".into();

    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("timeouts.handshake_secs"));
    assert!(err.contains("timeouts.viewer_wait_secs"));
    assert!(err.contains("server.base_url must not be empty"));
}

#[test]
fn index_file_must_be_plain_name() {
    let mut config = RelayConfig::default();
    config.server.index_file = "../index.json".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.index_file"));
}

#[test]
fn listen_without_port_is_rejected() {
    let mut config = RelayConfig::default();
    config.server.listen = "localhost".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.listen"));
}

#[test]
fn hostname_listen_address_is_accepted() {
    let mut config = RelayConfig::default();
    config.server.listen = "localhost:8080".into();
    assert!(validate(&config).is_ok());
}
