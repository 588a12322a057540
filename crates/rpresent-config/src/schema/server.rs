use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Listening address and on-disk storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the websocket listener binds to.
    pub listen: String,
    /// Directory holding presentations and the identifier index.
    pub slides_dir: PathBuf,
    /// File name of the persisted index inside `slides_dir`.
    pub index_file: String,
    /// Public base URL used when printing share links.
    pub base_url: String,
}

impl ServerConfig {
    pub fn index_path(&self) -> PathBuf {
        self.slides_dir.join(&self.index_file)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".into(),
            slides_dir: PathBuf::from("slides"),
            index_file: "index.json".into(),
            base_url: "http://localhost:8080".into(),
        }
    }
}
