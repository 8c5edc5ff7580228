//! Document content and per-participant cursors.
//!
//! [`Document`] is the replicated state itself: the text plus every
//! participant's cursor position. Events are validated in full before any
//! mutation, so a rejected event leaves the document byte-for-byte
//! unchanged.
//!
//! [`PageDoc`] wraps a `Document` with the client-side bookkeeping the
//! editor needs: the last observed server sequence, the local participant
//! id, and entry points that turn local keystrokes into [`Change`]
//! notifications for the session.

use std::cmp;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EditError;
use crate::ot::{Delete, Edit, Event, Insert, Join, Leave, MoveCursor, Operation, ParticipantId};
use crate::protocol::SequenceId;

/// Cursor state for one participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentParticipant {
    /// Unicode scalar value index of the participant's cursor.
    pub cursor_pos: usize,
}

/// The participants editing a document, keyed by id.
///
/// Serializes as a JSON array of `{"id": …, "cursor_pos": …}` objects
/// because JSON only allows strings as object keys. Entries are kept in id
/// order so the wire form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participants {
    /// The participants.
    pub entries: BTreeMap<ParticipantId, DocumentParticipant>,
}

impl Participants {
    /// Creates an empty participant set.
    pub fn new() -> Self {
        Default::default()
    }

    /// Number of current participants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nobody is editing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ParticipantId, DocumentParticipant)> for Participants {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (ParticipantId, DocumentParticipant)>,
    {
        Participants {
            entries: BTreeMap::from_iter(iter),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireParticipant {
    id: ParticipantId,
    cursor_pos: usize,
}

impl Serialize for Participants {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.entries.iter().map(|(id, p)| WireParticipant {
            id: *id,
            cursor_pos: p.cursor_pos,
        }))
    }
}

struct ParticipantsVisitor;

impl<'de> Visitor<'de> for ParticipantsVisitor {
    type Value = Participants;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence of participants")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut entries = BTreeMap::new();
        while let Some(WireParticipant { id, cursor_pos }) = access.next_element()? {
            entries.insert(id, DocumentParticipant { cursor_pos });
        }
        Ok(Participants { entries })
    }
}

impl<'de> Deserialize<'de> for Participants {
    fn deserialize<D>(deserializer: D) -> Result<Participants, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(ParticipantsVisitor)
    }
}

/// A document's replicated state at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Current document content.
    pub content: String,
    /// Current active editors.
    pub participants: Participants,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the given character index, clamped to the end of the
/// string. Exact for every index validation admits.
fn byte_index(content: &str, char_index: usize) -> usize {
    content
        .char_indices()
        .nth(char_index)
        .map(|(byte_pos, _)| byte_pos)
        .unwrap_or(content.len())
}

impl Document {
    /// Applies an event to the document. Either every operation in the
    /// event is applied, or none are and an [`EditError`] is returned.
    pub fn apply(&mut self, event: &Event) -> Result<(), EditError> {
        self.can_apply(event)?;

        match event {
            Event::Edit(edit) => {
                for op in &edit.operations {
                    self.perform_operation(edit.author, op);
                }
            }
            Event::Join(Join { id }) => {
                self.participants
                    .entries
                    .insert(*id, DocumentParticipant { cursor_pos: 0 });
            }
            Event::Leave(Leave { id }) => {
                self.participants.entries.remove(id);
            }
        }
        Ok(())
    }

    /// Checks that the whole event can be applied cleanly, without making
    /// any changes to the document.
    pub fn can_apply(&self, event: &Event) -> Result<(), EditError> {
        match event {
            Event::Edit(edit) => {
                if !self.participants.entries.contains_key(&edit.author) {
                    return Err(EditError::InvalidOperation);
                }
                // Simulate the running content length: each operation is
                // validated against the length left by its predecessors.
                let mut length = char_len(&self.content);
                for op in &edit.operations {
                    if !op.is_valid() {
                        return Err(EditError::InvalidOperation);
                    }
                    match op {
                        Operation::Insert(Insert { pos, content }) => {
                            if *pos > length {
                                return Err(EditError::OutsideDocument);
                            }
                            length += char_len(content);
                        }
                        Operation::Delete(Delete { start, end }) => {
                            if *end > length {
                                return Err(EditError::OutsideDocument);
                            }
                            length -= end - start;
                        }
                        Operation::MoveCursor(MoveCursor { pos }) => {
                            if *pos > length {
                                return Err(EditError::OutsideDocument);
                            }
                        }
                    }
                }
                Ok(())
            }
            Event::Join(Join { id }) => {
                if self.participants.entries.contains_key(id) {
                    Err(EditError::InvalidOperation)
                } else {
                    Ok(())
                }
            }
            Event::Leave(Leave { id }) => {
                if self.participants.entries.contains_key(id) {
                    Ok(())
                } else {
                    Err(EditError::InvalidOperation)
                }
            }
        }
    }

    // Applies a single validated operation, updating content and every
    // affected cursor in place.
    fn perform_operation(&mut self, author: ParticipantId, op: &Operation) {
        match op {
            Operation::Insert(op) => {
                let at = byte_index(&self.content, op.pos);
                self.content.insert_str(at, &op.content);

                let len = char_len(&op.content);
                for (id, participant) in self.participants.entries.iter_mut() {
                    if *id == author {
                        participant.cursor_pos = op.pos + len;
                    } else if participant.cursor_pos > op.pos {
                        // Strictly greater: a cursor sitting exactly at the
                        // insert point is held in place so its owner's
                        // caret does not jump.
                        participant.cursor_pos += len;
                    }
                }
            }
            Operation::Delete(op) => {
                let start = byte_index(&self.content, op.start);
                let end = byte_index(&self.content, op.end);
                self.content.replace_range(start..end, "");

                for (id, participant) in self.participants.entries.iter_mut() {
                    if *id == author {
                        participant.cursor_pos = op.start;
                    } else if participant.cursor_pos > op.start {
                        // Cursors inside the range collapse onto its
                        // start; cursors past it shift left.
                        participant.cursor_pos -=
                            cmp::min(op.end, participant.cursor_pos) - op.start;
                    }
                }
            }
            Operation::MoveCursor(op) => {
                if let Some(participant) = self.participants.entries.get_mut(&author) {
                    participant.cursor_pos = op.pos;
                }
            }
        }
    }
}

impl<'a> From<&'a str> for Document {
    fn from(content: &'a str) -> Self {
        Document {
            content: String::from(content),
            participants: Default::default(),
        }
    }
}

/// A locally-authored change, ready to hand to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// The last server sequence observed when the change was made.
    pub parent_seq: SequenceId,
    /// The operations describing the change.
    pub operations: Vec<Operation>,
}

/// Client-side view of one wiki page.
///
/// Owns the authoritative local [`Document`] plus the sequence and
/// identity bookkeeping around it. Server events advance the sequence;
/// local edits do not (they reference it as their parent instead).
#[derive(Debug, Clone)]
pub struct PageDoc {
    seq: SequenceId,
    local_id: Option<ParticipantId>,
    document: Document,
}

impl PageDoc {
    /// Creates a page view from the host-provided initial state.
    pub fn new(seq: SequenceId, document: Document) -> Self {
        PageDoc {
            seq,
            local_id: None,
            document,
        }
    }

    /// Replaces the page state wholesale, e.g. when the host
    /// resynchronizes after a rejected server event.
    pub fn load(&mut self, seq: SequenceId, document: Document) {
        self.seq = seq;
        self.document = document;
    }

    /// The highest server sequence applied so far.
    pub fn seq(&self) -> SequenceId {
        self.seq
    }

    /// Current page text.
    pub fn content(&self) -> &str {
        &self.document.content
    }

    /// The full replicated state.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The relay-assigned id of this client, once connected.
    pub fn local_id(&self) -> Option<ParticipantId> {
        self.local_id
    }

    /// Records the relay-assigned id and registers the local participant
    /// in the roster. Called exactly once, when the Connected handshake
    /// arrives.
    ///
    /// The relay broadcasts this client's Join to everyone else but never
    /// echoes a participant's own events back, so the local entry has to
    /// be created here.
    pub fn set_local_id(&mut self, id: ParticipantId) {
        self.local_id = Some(id);
        self.document.participants.entries.entry(id).or_default();
    }

    /// Applies a server event and advances the sequence. A failing event
    /// changes nothing, including the sequence.
    pub fn apply_event(&mut self, seq: SequenceId, event: &Event) -> Result<(), EditError> {
        self.document.apply(event)?;
        self.seq = seq;
        Ok(())
    }

    /// Adds a participant to the roster at the given sequence.
    pub fn add_participant(
        &mut self,
        seq: SequenceId,
        id: ParticipantId,
        participant: DocumentParticipant,
    ) -> Result<(), EditError> {
        if self.document.participants.entries.contains_key(&id) {
            return Err(EditError::InvalidOperation);
        }
        self.document.participants.entries.insert(id, participant);
        self.seq = seq;
        Ok(())
    }

    /// Removes a participant from the roster at the given sequence.
    pub fn remove_participant(
        &mut self,
        seq: SequenceId,
        id: ParticipantId,
    ) -> Result<(), EditError> {
        if self.document.participants.entries.remove(&id).is_none() {
            return Err(EditError::InvalidOperation);
        }
        self.seq = seq;
        Ok(())
    }

    /// Moves a participant's cursor bookmark without touching content.
    pub fn set_participant_position(
        &mut self,
        id: ParticipantId,
        pos: usize,
    ) -> Result<(), EditError> {
        if pos > char_len(&self.document.content) {
            return Err(EditError::OutsideDocument);
        }
        match self.document.participants.entries.get_mut(&id) {
            Some(participant) => {
                participant.cursor_pos = pos;
                Ok(())
            }
            None => Err(EditError::InvalidOperation),
        }
    }

    /// A participant's cursor position, if present.
    pub fn participant_position(&self, id: ParticipantId) -> Option<usize> {
        self.document
            .participants
            .entries
            .get(&id)
            .map(|p| p.cursor_pos)
    }

    /// Applies locally-authored operations and returns the change
    /// notification to queue on the session.
    ///
    /// Fails with `InvalidOperation` until this client's own Join event
    /// has been applied (the author must be in the roster).
    pub fn edit(&mut self, operations: Vec<Operation>) -> Result<Change, EditError> {
        let author = self.local_id.ok_or(EditError::InvalidOperation)?;
        let event = Event::Edit(Edit {
            author,
            operations: operations.clone(),
        });
        self.document.apply(&event)?;
        Ok(Change {
            parent_seq: self.seq,
            operations,
        })
    }

    /// Inserts text at a character index, as a local edit.
    pub fn insert(&mut self, pos: usize, content: &str) -> Result<Change, EditError> {
        self.edit(vec![Operation::Insert(Insert {
            pos,
            content: content.to_string(),
        })])
    }

    /// Deletes the range `[start, end)`, as a local edit.
    pub fn delete(&mut self, start: usize, end: usize) -> Result<Change, EditError> {
        self.edit(vec![Operation::Delete(Delete { start, end })])
    }

    /// Moves the local cursor, as a local edit.
    pub fn move_cursor(&mut self, pos: usize) -> Result<Change, EditError> {
        self.edit(vec![Operation::MoveCursor(MoveCursor { pos })])
    }
}
