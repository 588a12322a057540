//! Relay config files: location, first-run template and parsing.

mod loader;
mod paths;
mod template;


pub use loader::{load_default, load_from_path, load_or_create};
pub use paths::{create_default_config, default_config_path, CONFIG_ENV};
