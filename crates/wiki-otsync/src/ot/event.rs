//! Events in a document's shared edit log.

use serde::{Deserialize, Serialize};

use super::operation::Operation;
use super::ParticipantId;

/// An event the relay may sequence for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// An update was made to the document.
    Edit(Edit),
    /// A new participant joined the edit session.
    Join(Join),
    /// A participant left the edit session.
    Leave(Leave),
}

/// A new participant has joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    /// The id of the newly joined participant.
    pub id: ParticipantId,
}

/// A participant has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leave {
    /// The id of the departed participant.
    pub id: ParticipantId,
}

/// A batch of operations applied together, or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// The participant who authored the change.
    pub author: ParticipantId,
    /// The operations which describe the change.
    pub operations: Vec<Operation>,
}

impl Event {
    /// Rewrites this event to apply after a concurrent event that has
    /// already been applied locally. Only pairs of edits interact; joins
    /// and leaves commute with everything.
    pub fn transform(&mut self, concurrent: &Event) {
        if let (Event::Edit(this), Event::Edit(other)) = (self, concurrent) {
            this.transform(other);
        }
    }
}

impl Edit {
    /// Lower participant ids win position conflicts: the tie-break shifts
    /// the lower author's operation past the other's insert.
    fn has_priority(&self, other: &Edit) -> bool {
        self.author < other.author
    }

    /// Rewrites `operations` to apply after the operations of a
    /// concurrent edit that has already been applied locally.
    ///
    /// Operations that stop changing content along the way (an empty
    /// delete left over from a split, for instance) are retained: they
    /// still carry their author's cursor, and dropping them would let
    /// cursor positions diverge between replicas.
    pub fn transform(&mut self, other: &Edit) {
        let has_priority = self.has_priority(other);
        for concurrent in &other.operations {
            let pending = std::mem::take(&mut self.operations);
            for op in pending {
                op.transform(concurrent, has_priority, &mut self.operations);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ot::operation::{Delete, Insert, MoveCursor};

    fn edit(author: ParticipantId, operations: Vec<Operation>) -> Edit {
        Edit { author, operations }
    }

    fn insert(pos: usize, content: &str) -> Operation {
        Operation::Insert(Insert {
            pos,
            content: content.to_string(),
        })
    }

    fn delete(start: usize, end: usize) -> Operation {
        Operation::Delete(Delete { start, end })
    }

    #[test]
    fn test_edit_transform_applies_priority_both_ways() {
        let mut lower = edit(1, vec![insert(5, "Test")]);
        lower.transform(&edit(2, vec![insert(5, "foo")]));
        assert_eq!(lower.operations, vec![insert(8, "Test")]);

        let mut higher = edit(2, vec![insert(5, "Test")]);
        higher.transform(&edit(1, vec![insert(5, "foo")]));
        assert_eq!(higher.operations, vec![insert(5, "Test")]);
    }

    #[test]
    fn test_edit_transform_chains_concurrent_operations() {
        // Both concurrent inserts land before ours and accumulate.
        let mut this = edit(1, vec![insert(4, "x")]);
        this.transform(&edit(2, vec![insert(0, "ab"), insert(0, "cd")]));
        assert_eq!(this.operations, vec![insert(8, "x")]);
    }

    #[test]
    fn test_edit_transform_split_pieces_keep_transforming() {
        // The delete splits around the insert, then both pieces shift for
        // the later insert at the front.
        let mut this = edit(1, vec![delete(2, 6)]);
        this.transform(&edit(2, vec![insert(4, "zz"), insert(0, "a")]));
        assert_eq!(this.operations, vec![delete(7, 9), delete(3, 5)]);
    }

    #[test]
    fn test_edit_transform_keeps_emptied_operations() {
        let mut this = edit(1, vec![delete(2, 4)]);
        this.transform(&edit(2, vec![insert(2, "cd")]));
        assert_eq!(this.operations, vec![delete(4, 6), delete(2, 2)]);
    }

    #[test]
    fn test_event_transform_ignores_joins_and_leaves() {
        let original = Event::Edit(edit(1, vec![insert(0, "x")]));

        let mut this = original.clone();
        this.transform(&Event::Join(Join { id: 2 }));
        assert_eq!(this, original);

        let mut this = original.clone();
        this.transform(&Event::Leave(Leave { id: 2 }));
        assert_eq!(this, original);

        let mut join = Event::Join(Join { id: 3 });
        join.transform(&original);
        assert_eq!(join, Event::Join(Join { id: 3 }));
    }

    #[test]
    fn test_cursor_only_operation_transforms_like_a_cursor() {
        let mut this = edit(2, vec![Operation::MoveCursor(MoveCursor { pos: 4 })]);
        this.transform(&edit(1, vec![delete(0, 2)]));
        assert_eq!(
            this.operations,
            vec![Operation::MoveCursor(MoveCursor { pos: 2 })]
        );
    }
}
