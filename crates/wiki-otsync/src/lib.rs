//! # wiki-otsync
//!
//! Client-side collaborative editing core for a multi-user wiki, built on
//! server-ordered operational transformation (OT).
//!
//! ## What it does
//!
//! - **Operation algebra**: [`Insert`] / [`Delete`] / [`MoveCursor`] over
//!   character indices, with a pairwise transform for concurrent
//!   operations
//! - **Event algebra**: [`Edit`] / [`Join`] / [`Leave`], lifting the
//!   operation transform over whole batches
//! - **Document model**: replicated text plus per-participant cursors,
//!   with atomic validate-then-apply semantics
//! - **Edit session**: outbox coalescing, unacknowledged-edit tracking,
//!   and transformation of incoming events against pending local edits
//! - **Wire protocol**: the JSON message shapes shared with the relay
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `client` *(default)* | WebSocket transport ([`OtSyncClient`]) and high-level [`PageSession`] |
//!
//! Without the `client` feature the crate is sans-I/O: the algebra, the
//! document model and the [`EditSession`] state machine work against any
//! transport that can move [`ClientMessage`]s and [`ServerMessage`]s.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wiki_otsync::{PageSession, SessionConfig};
//!
//! let config = SessionConfig::new("http://localhost:8080", "Home");
//! let mut session = PageSession::connect(config).await?;
//!
//! session.insert(0, "Hello, wiki!")?;
//! session.flush().await?;
//!
//! // Pump the relay's events; each one arrives already rewritten against
//! // our unacknowledged edits and applied to the document.
//! while let Some(msg) = session.next_event().await? {
//!     println!("{:?} -> {:?}", msg, session.content());
//! }
//! ```

pub mod doc;
pub mod error;
pub mod ot;
pub mod protocol;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "client")]
pub mod session;

pub use doc::{Change, Document, DocumentParticipant, PageDoc, Participants};
pub use error::{EditError, OtSyncError, Result};
pub use ot::{
    Delete, Edit, Event, Insert, Join, Leave, MoveCursor, Operation, ParticipantId,
};
pub use protocol::{
    ClientEdit, ClientMessage, Connected, EditSession, SequenceId, ServerEvent, ServerMessage,
};

#[cfg(feature = "client")]
pub use client::{build_page_url, ClientConfig, OtSyncClient};

#[cfg(feature = "client")]
pub use session::{PageSession, SessionConfig};
