//! Real-time slide synchronization between one presenter and its viewers.
//!
//! A presenter socket pushes slide numbers; every viewer socket subscribed
//! to the same presentation receives the latest one. Identity is carried
//! by two unguessable tokens per presentation, kept in an [`IdIndex`].
//!
//! ```text
//! presenter ──/p──► handle_presenter ──broadcast──► ListenerRegistry
//!                                                      │
//!                                   ┌──────────────────┼──────────────┐
//!                                   ▼                  ▼              ▼
//!                               Mailbox            Mailbox        Mailbox
//!                                   │                  │              │
//! viewer ◄──/v── handle_viewer ◄────┘     ...          ┘              ┘
//! ```

pub mod handlers;
pub mod index;
pub mod mailbox;
pub mod pairing;
pub mod protocol;
pub mod registry;
pub mod server;

pub use handlers::{handle_presenter, handle_viewer, SyncContext, Timeouts};
pub use index::{IdIndex, IdPair};
pub use mailbox::Mailbox;
pub use pairing::{page_identity, publish, slide_source_path, PageIdentity, Publication, ShareLinks};
pub use protocol::{Endpoint, SessionEnd, SlideNumber, PING};
pub use registry::{ListenerRegistry, Subscription};
pub use server::serve;
