//! Messages exchanged between the client and the relay.
//!
//! Shapes are byte-compatible with the relay:
//!
//! | Message | JSON |
//! |---------|------|
//! | ClientEdit | `{"ClientEdit":{"parent_seq":0,"client_seq":1,"operations":[…]}}` |
//! | Connected | `{"Connected":{"id":1}}` |
//! | Event | `{"Event":{"seq":1,"client_seq":0,"event":{"Join":{"id":1}}}}` |
//!
//! Operations and events use the same external tagging
//! (`{"Insert":{"pos":0,"content":"a"}}` and so on), and the participant
//! table inside a `Document` serializes as an array of
//! `{"id":…,"cursor_pos":…}` objects.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ot::{Event, Operation, ParticipantId};

use super::SequenceId;

/// Message sent from the client to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// A change was made to the local document content.
    ClientEdit(ClientEdit),
}

/// A batch of locally-authored operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEdit {
    /// The most recent server sequence the client had observed when the
    /// edit was made.
    pub parent_seq: SequenceId,
    /// The client's own ordinal for this edit, strictly increasing.
    pub client_seq: SequenceId,
    /// The operations which describe the change.
    pub operations: Vec<Operation>,
}

/// Message sent from the relay to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Always the first message on a connection: the id the relay assigned
    /// to this client.
    Connected(Connected),
    /// A sequenced event from the shared log.
    Event(ServerEvent),
}

/// Client successfully connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connected {
    /// The new client's participant id.
    pub id: ParticipantId,
}

/// A sequenced event, tagged with the client sequence it acknowledges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEvent {
    /// Position of the event in the relay's log.
    pub seq: SequenceId,
    /// The highest of this client's edits folded into the log so far, 0
    /// when none have been.
    pub client_seq: SequenceId,
    /// The event itself.
    pub event: Event,
}

impl ClientMessage {
    /// Serializes the message to its wire form.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a message from its wire form. Unknown tags fail.
    pub fn decode(frame: &str) -> Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }
}

impl ServerMessage {
    /// Serializes the message to its wire form.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a message from its wire form. Unknown tags fail.
    pub fn decode(frame: &str) -> Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }
}
