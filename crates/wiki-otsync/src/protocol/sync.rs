//! Session state machine for the edit stream.
//!
//! [`EditSession`] owns the sequence bookkeeping on the client side of the
//! protocol: the outbox of queued local operations, the sent-but-
//! unacknowledged edits, and the last server sequence observed. It is a
//! pure state machine (messages in, messages out) so the transport can
//! live elsewhere and tests can drive it directly.
//!
//! The invariant that makes convergence work: every edit in the sent
//! buffer is concurrent with any incoming event, so the event is rewritten
//! through all of them before it is surfaced, and the content layer can
//! apply the result against its current state. Operations still in the
//! outbox are deliberately left alone: once flushed they declare the
//! latest server sequence as their parent, which orders them after the
//! event on the relay.

use tracing::{debug, trace};

use crate::error::{OtSyncError, Result};
use crate::ot::{Edit, Event, Operation, ParticipantId};

use super::message::{ClientEdit, ClientMessage, ServerMessage};
use super::SequenceId;

/// Client-side protocol state for one page.
#[derive(Debug)]
pub struct EditSession {
    /// Highest server sequence observed.
    seq: SequenceId,
    /// Ordinal of the last flushed ClientEdit, starting at 0.
    client_seq: SequenceId,
    /// Relay-assigned id, set by the Connected handshake.
    participant_id: Option<ParticipantId>,
    /// Flushed edits the relay has not acknowledged yet, in client_seq
    /// order.
    sent: Vec<ClientEdit>,
    /// Locally-authored operations queued for the next flush.
    outbox: Vec<Operation>,
    /// Last operation kept by the previous flush; used to suppress
    /// redundant cursor-only operations.
    last_operation: Option<Operation>,
}

impl EditSession {
    /// Creates a session that has observed `initial_seq` as the latest
    /// server sequence (the host supplies it together with the initial
    /// document).
    pub fn new(initial_seq: SequenceId) -> Self {
        EditSession {
            seq: initial_seq,
            client_seq: 0,
            participant_id: None,
            sent: Vec::new(),
            outbox: Vec::new(),
            last_operation: None,
        }
    }

    /// Highest server sequence observed.
    pub fn seq(&self) -> SequenceId {
        self.seq
    }

    /// The relay-assigned id, once the Connected handshake has arrived.
    pub fn participant_id(&self) -> Option<ParticipantId> {
        self.participant_id
    }

    /// True after the Connected handshake.
    pub fn is_connected(&self) -> bool {
        self.participant_id.is_some()
    }

    /// Number of flushed edits still awaiting acknowledgement.
    pub fn unacknowledged(&self) -> usize {
        self.sent.len()
    }

    /// True when operations are queued for the next flush.
    pub fn has_queued_operations(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// Processes one message from the relay and returns the message to
    /// surface to the content layer.
    ///
    /// Incoming edits are rewritten against every unacknowledged local
    /// edit before being returned, so the caller applies the result
    /// directly to its current document. The caller must apply it before
    /// processing any further local write.
    pub fn receive(&mut self, msg: ServerMessage) -> Result<ServerMessage> {
        match msg {
            ServerMessage::Connected(connected) => {
                if self.participant_id.is_some() {
                    return Err(OtSyncError::Protocol(String::from(
                        "received a second Connected handshake",
                    )));
                }
                debug!(id = connected.id, "connected");
                self.participant_id = Some(connected.id);
                Ok(ServerMessage::Connected(connected))
            }
            ServerMessage::Event(mut server_event) => {
                let local_id = self.participant_id.ok_or_else(|| {
                    OtSyncError::Protocol(String::from(
                        "received an event before the Connected handshake",
                    ))
                })?;

                self.seq = server_event.seq;
                self.sent
                    .retain(|edit| edit.client_seq > server_event.client_seq);
                trace!(
                    seq = server_event.seq,
                    acked = server_event.client_seq,
                    unacknowledged = self.sent.len(),
                    "event"
                );

                for sent in &self.sent {
                    let concurrent = Event::Edit(Edit {
                        author: local_id,
                        operations: sent.operations.clone(),
                    });
                    server_event.event.transform(&concurrent);
                }

                // The next flush starts a fresh cursor comparison: the
                // event moves cursors underneath us.
                self.last_operation = None;

                Ok(ServerMessage::Event(server_event))
            }
        }
    }

    /// Queues locally-authored operations for the next flush.
    ///
    /// Returns true when the caller should schedule a flush: only the
    /// first write into an empty outbox arms one, so a burst of writes
    /// within the same scheduler tick coalesces into a single ClientEdit.
    pub fn write(&mut self, operations: Vec<Operation>) -> bool {
        let was_empty = self.outbox.is_empty();
        self.outbox.extend(operations);
        was_empty && !self.outbox.is_empty()
    }

    /// Drains the outbox into a ClientEdit.
    ///
    /// Content-changing operations are always kept. Cursor-only
    /// operations (empty inserts, empty deletes, cursor moves) are
    /// best-effort UI hints: only the newest one matters, and it is
    /// dropped too when the previously kept operation already leaves the
    /// cursor at the same place. Returns `None` when nothing needs to be
    /// sent.
    pub fn flush(&mut self) -> Option<ClientMessage> {
        let pending = std::mem::take(&mut self.outbox);
        let count = pending.len();

        let mut prepared = Vec::with_capacity(count);
        let mut last = self.last_operation.clone();
        for (index, op) in pending.into_iter().enumerate() {
            let keep = op.is_content_change()
                || (index + 1 == count
                    && last
                        .as_ref()
                        .map_or(true, |l| {
                            l.cursor_position_after() != op.cursor_position_after()
                        }));
            if keep {
                last = Some(op.clone());
                prepared.push(op);
            }
        }

        if prepared.is_empty() {
            return None;
        }

        self.client_seq += 1;
        let edit = ClientEdit {
            parent_seq: self.seq,
            client_seq: self.client_seq,
            operations: prepared,
        };
        debug!(
            client_seq = edit.client_seq,
            parent_seq = edit.parent_seq,
            operations = edit.operations.len(),
            "flush"
        );
        self.sent.push(edit.clone());
        self.last_operation = last;
        Some(ClientMessage::ClientEdit(edit))
    }
}
