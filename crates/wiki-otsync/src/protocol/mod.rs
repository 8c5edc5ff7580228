//! Client/relay protocol: the wire messages and the session state machine
//! that drives them.
//!
//! ## Message flow
//!
//! ```text
//! client                                  relay
//!   │  ◀── Connected { id }                 │   assigns the participant id
//!   │  ◀── Event { seq, client_seq, event } │   one per sequenced event
//!   │  ──▶ ClientEdit { parent_seq,         │
//!   │                   client_seq, ops }   │   acknowledged via the
//!   │                                       │   echoed client_seq
//! ```
//!
//! Frames are JSON with external variant tagging; an unknown tag fails
//! decoding and is fatal for the connection. The exact shapes are part of
//! the server contract, see [`message`].

pub mod message;
pub mod sync;

pub use message::{ClientEdit, ClientMessage, Connected, ServerEvent, ServerMessage};
pub use sync::EditSession;

/// Monotonically increasing ordinal of an event in the relay's log. A
/// client's sequence is the highest value it has observed.
pub type SequenceId = u64;
