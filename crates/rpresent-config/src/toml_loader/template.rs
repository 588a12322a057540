//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# rpresent relay configuration
# Only override what you want to change -- missing fields use defaults.

[server]
# listen = "0.0.0.0:8080"
# slides_dir = "slides"
# index_file = "index.json"
# base_url = "http://localhost:8080"

[timeouts]
# handshake_secs = 10        # 1-300
# presenter_idle_secs = 900  # 10-86400
# viewer_wait_secs = 60      # 1-3600
# send_secs = 10             # 1-300

[logging]
# level = "info"             # trace, debug, info, warn, error
"##
}
