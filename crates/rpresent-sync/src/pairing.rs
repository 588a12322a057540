//! Boundary helpers for the upload and page-serving collaborators.
//!
//! Uploading a presentation either reuses an existing pair or mints a new
//! one and persists it. Serving a page decides which role the requesting
//! identifier speaks for, so the page's socket connects to the right
//! endpoint.

use std::path::{Path, PathBuf};

use rpresent_common::generate_key;
use tracing::{error, info};

use crate::index::{IdIndex, IdPair};
use crate::protocol::Endpoint;

/// File name the extracted slide source is stored under.
pub const SLIDE_SOURCE: &str = "main.slide";

/// Result of [`publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub pair: IdPair,
    /// False when an existing presentation id was reused.
    pub is_new: bool,
    /// False when the index write failed; the pair lives only in memory.
    pub persisted: bool,
}

/// Resolve or mint the identifier pair for an upload.
///
/// An `existing_id` that names a registered presentation is reused and the
/// index file is left alone. Otherwise a fresh pair is registered and
/// saved. A failed save is logged and the pair is still returned: it works
/// until the process exits but is lost on restart.
pub fn publish(index: &IdIndex, index_path: &Path, existing_id: Option<&str>) -> Publication {
    if let Some(pair) = existing_id.and_then(|id| index.resolve_pair(id)) {
        info!(presentation = %pair.presentation_id, "reusing existing presentation id");
        return Publication {
            pair,
            is_new: false,
            persisted: true,
        };
    }

    let pair = loop {
        let candidate = IdPair::new(generate_key(), generate_key());
        if candidate.presentation_id == candidate.viewer_id
            || index.contains_key(&candidate.presentation_id)
            || index.contains_key(&candidate.viewer_id)
        {
            continue;
        }
        if index
            .register_pair(&candidate.presentation_id, &candidate.viewer_id)
            .is_ok()
        {
            break candidate;
        }
    };

    let persisted = match index.save(index_path) {
        Ok(()) => {
            info!(presentation = %pair.presentation_id, "registered new presentation");
            true
        }
        Err(e) => {
            error!(
                presentation = %pair.presentation_id,
                error = %e,
                "failed to persist index; new pair will not survive a restart"
            );
            false
        }
    };

    Publication {
        pair,
        is_new: true,
        persisted,
    }
}

/// Links handed back to the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLinks {
    pub presenter_url: String,
    pub viewer_url: String,
}

impl ShareLinks {
    pub fn new(base_url: &str, pair: &IdPair) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            presenter_url: format!("{base}/{}", pair.presentation_id),
            viewer_url: format!("{base}/{}", pair.viewer_id),
        }
    }
}

/// Path of the slide source handed to the external renderer.
pub fn slide_source_path(slides_dir: &Path, presentation_id: &str) -> PathBuf {
    slides_dir.join(presentation_id).join(SLIDE_SOURCE)
}

/// What a served page embeds for its client-side socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIdentity {
    pub role: Endpoint,
    /// Identifier the page's socket presents after connecting.
    pub socket_id: String,
    pub presentation_id: String,
}

/// Decide the role of a page request, or `None` for an unknown identifier.
///
/// Only an exact presentation id earns the presenter role.
pub fn page_identity(index: &IdIndex, requested_id: &str) -> Option<PageIdentity> {
    let presentation_id = index.resolve_presentation_id(requested_id)?;
    let role = if presentation_id == requested_id {
        Endpoint::Presenter
    } else {
        Endpoint::Viewer
    };
    Some(PageIdentity {
        role,
        socket_id: requested_id.to_owned(),
        presentation_id,
    })
}
