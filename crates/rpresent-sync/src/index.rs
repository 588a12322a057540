//! Bidirectional presentation ↔ viewer identifier index.
//!
//! The forward table (presentation → viewer) is the only thing persisted;
//! the inverse table is rebuilt on load. Both are kept behind one lock so
//! a reader never observes half of a registration.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use rpresent_common::IndexError;
use tracing::{debug, info};

/// A registered presentation and the viewer token paired with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdPair {
    pub presentation_id: String,
    pub viewer_id: String,
}

impl IdPair {
    pub fn new(presentation_id: impl Into<String>, viewer_id: impl Into<String>) -> Self {
        Self {
            presentation_id: presentation_id.into(),
            viewer_id: viewer_id.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    presentations: BTreeMap<String, String>,
    viewers: HashMap<String, String>,
}

impl Tables {
    fn from_forward(presentations: BTreeMap<String, String>) -> Result<Self, String> {
        let mut viewers = HashMap::with_capacity(presentations.len());
        for (presentation_id, viewer_id) in &presentations {
            if presentation_id == viewer_id {
                return Err(format!("{presentation_id:?} is paired with itself"));
            }
            if presentations.contains_key(viewer_id) {
                return Err(format!("{viewer_id:?} is both a presentation and a viewer id"));
            }
            if let Some(other) = viewers.insert(viewer_id.clone(), presentation_id.clone()) {
                return Err(format!(
                    "viewer id {viewer_id:?} is shared by {other:?} and {presentation_id:?}"
                ));
            }
        }
        Ok(Self {
            presentations,
            viewers,
        })
    }
}

/// Durable bijection between presentation ids and viewer ids.
#[derive(Debug, Default)]
pub struct IdIndex {
    tables: RwLock<Tables>,
    save_lock: Mutex<()>,
}

impl IdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a persisted index. A missing file yields an empty index.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no index at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(IndexError::io(path, e)),
        };

        let presentations: BTreeMap<String, String> = serde_json::from_str(&content)
            .map_err(|e| IndexError::corrupt(path, e.to_string()))?;
        let tables = Tables::from_forward(presentations)
            .map_err(|reason| IndexError::corrupt(path, reason))?;

        info!(
            presentations = tables.presentations.len(),
            "loaded index from {}",
            path.display()
        );
        Ok(Self {
            tables: RwLock::new(tables),
            save_lock: Mutex::new(()),
        })
    }

    /// Insert or overwrite the pairing for `presentation_id`.
    ///
    /// Overwriting drops the previous viewer id. A pairing that would break
    /// the bijection is refused.
    pub fn register_pair(&self, presentation_id: &str, viewer_id: &str) -> Result<(), IndexError> {
        if presentation_id == viewer_id {
            return Err(IndexError::Conflict(format!(
                "{presentation_id:?} cannot be its own viewer id"
            )));
        }

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if tables.viewers.contains_key(presentation_id) {
            return Err(IndexError::Conflict(format!(
                "{presentation_id:?} is already a viewer id"
            )));
        }
        if tables.presentations.contains_key(viewer_id) {
            return Err(IndexError::Conflict(format!(
                "{viewer_id:?} is already a presentation id"
            )));
        }
        if let Some(owner) = tables.viewers.get(viewer_id) {
            if owner != presentation_id {
                return Err(IndexError::Conflict(format!(
                    "{viewer_id:?} already belongs to another presentation"
                )));
            }
        }

        if let Some(previous) = tables
            .presentations
            .insert(presentation_id.to_owned(), viewer_id.to_owned())
        {
            tables.viewers.remove(&previous);
        }
        tables
            .viewers
            .insert(viewer_id.to_owned(), presentation_id.to_owned());
        Ok(())
    }

    /// Persist the forward table, replacing the file at `path`.
    ///
    /// The content goes to a sibling temp file first and is renamed into
    /// place, so a crash leaves either the old or the new index on disk.
    /// On Unix the parent directory is synced after the rename so the new
    /// entry itself is durable.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let encoded = {
            let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_vec(&tables.presentations)
                .map_err(|e| IndexError::Encode(e.to_string()))?
        };

        let tmp = temp_path(path);
        let written = write_synced(&tmp, &encoded).and_then(|()| std::fs::rename(&tmp, path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(IndexError::io(path, e));
        }
        sync_parent_dir(path).map_err(|e| IndexError::io(path, e))?;

        debug!(bytes = encoded.len(), "saved index to {}", path.display());
        Ok(())
    }

    /// Normalize either kind of identifier to its presentation id.
    pub fn resolve_presentation_id(&self, any_id: &str) -> Option<String> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(presentation_id) = tables.viewers.get(any_id) {
            return Some(presentation_id.clone());
        }
        tables
            .presentations
            .contains_key(any_id)
            .then(|| any_id.to_owned())
    }

    /// Look up a pair by presentation id only. Viewer ids never resolve here.
    pub fn resolve_pair(&self, presentation_id: &str) -> Option<IdPair> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .presentations
            .get(presentation_id)
            .map(|viewer_id| IdPair::new(presentation_id, viewer_id.clone()))
    }

    /// True if `id` is in use as either kind of identifier.
    pub fn contains_key(&self, id: &str) -> bool {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.presentations.contains_key(id) || tables.viewers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .presentations
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn index_with(pairs: &[(&str, &str)]) -> IdIndex {
        let index = IdIndex::new();
        for (p, v) in pairs {
            index.register_pair(p, v).unwrap();
        }
        index
    }

    #[test]
    fn resolves_both_kinds_to_presentation_id() {
        let index = index_with(&[("p1", "v1"), ("p2", "v2")]);
        assert_eq!(index.resolve_presentation_id("p1").as_deref(), Some("p1"));
        assert_eq!(index.resolve_presentation_id("v1").as_deref(), Some("p1"));
        assert_eq!(index.resolve_presentation_id("v2").as_deref(), Some("p2"));
        assert_eq!(index.resolve_presentation_id("nope"), None);
    }

    #[test]
    fn viewer_id_never_resolves_as_pair() {
        let index = index_with(&[("p1", "v1")]);
        assert_eq!(index.resolve_pair("p1"), Some(IdPair::new("p1", "v1")));
        assert_eq!(index.resolve_pair("v1"), None);
        assert_eq!(index.resolve_pair("unknown"), None);
    }

    #[test]
    fn overwrite_drops_previous_viewer_id() {
        let index = index_with(&[("p1", "v1")]);
        index.register_pair("p1", "v9").unwrap();

        assert_eq!(index.resolve_presentation_id("v1"), None);
        assert_eq!(index.resolve_presentation_id("v9").as_deref(), Some("p1"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn re_registering_same_pair_is_a_no_op() {
        let index = index_with(&[("p1", "v1")]);
        index.register_pair("p1", "v1").unwrap();
        assert_eq!(index.resolve_pair("p1"), Some(IdPair::new("p1", "v1")));
    }

    #[test]
    fn conflicting_registrations_are_refused() {
        let index = index_with(&[("p1", "v1")]);
        assert!(matches!(
            index.register_pair("x", "x"),
            Err(IndexError::Conflict(_))
        ));
        assert!(matches!(
            index.register_pair("v1", "v2"),
            Err(IndexError::Conflict(_))
        ));
        assert!(matches!(
            index.register_pair("p2", "p1"),
            Err(IndexError::Conflict(_))
        ));
        assert!(matches!(
            index.register_pair("p2", "v1"),
            Err(IndexError::Conflict(_))
        ));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = index_with(&[("p1", "v1"), ("p2", "v2")]);
        index.save(&path).unwrap();

        let loaded = IdIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        for (p, v) in [("p1", "v1"), ("p2", "v2")] {
            assert_eq!(loaded.resolve_pair(p), Some(IdPair::new(p, v)));
            assert_eq!(loaded.resolve_presentation_id(v).as_deref(), Some(p));
        }
        assert!(!dir.path().join("index.json.tmp").exists());
    }

    #[test]
    fn saved_file_is_forward_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        index_with(&[("p1", "v1")]).save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({ "p1": "v1" }));
    }

    #[test]
    fn save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, r#"{"old":"stale","other":"junk"}"#).unwrap();

        index_with(&[("p1", "v1")]).save(&path).unwrap();
        let loaded = IdIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.resolve_pair("old"), None);
    }

    #[cfg(unix)]
    #[test]
    fn parent_directory_sync_follows_the_index_location() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sync_parent_dir(&dir.path().join("index.json")).is_ok());
        assert!(sync_parent_dir(Path::new("index.json")).is_ok());
        assert!(sync_parent_dir(&dir.path().join("gone").join("index.json")).is_err());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = IdIndex::load(&dir.path().join("absent.json")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn malformed_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        for content in ["", "not json", "[1,2]", r#"{"p1": 3}"#] {
            std::fs::write(&path, content).unwrap();
            let err = IdIndex::load(&path).unwrap_err();
            assert!(matches!(err, IndexError::Corrupt { .. }), "{content:?}: {err}");
        }
    }

    #[test]
    fn non_bijective_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        for content in [
            r#"{"p1":"v1","p2":"v1"}"#,
            r#"{"p1":"p2","p2":"v2"}"#,
            r#"{"p1":"p1"}"#,
        ] {
            std::fs::write(&path, content).unwrap();
            assert!(
                matches!(IdIndex::load(&path), Err(IndexError::Corrupt { .. })),
                "{content:?}"
            );
        }
    }

    #[test]
    fn save_into_missing_directory_fails_without_losing_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone").join("index.json");
        let index = index_with(&[("p1", "v1")]);

        assert!(matches!(index.save(&path), Err(IndexError::Io { .. })));
        assert_eq!(index.resolve_presentation_id("v1").as_deref(), Some("p1"));
    }

    #[test]
    fn concurrent_saves_leave_a_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Arc::new(dir.path().join("index.json"));
        let index = Arc::new(IdIndex::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = Arc::clone(&index);
                let path = Arc::clone(&path);
                std::thread::spawn(move || {
                    index
                        .register_pair(&format!("p{i}"), &format!("v{i}"))
                        .unwrap();
                    index.save(&path).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let loaded = IdIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 8);
    }
}
