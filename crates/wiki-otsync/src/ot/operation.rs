//! Primitive operations over document content.

use std::cmp;

use serde::{Deserialize, Serialize};

/// Inserts new content at a single position in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insert {
    /// Insert position as the number of Unicode scalar values preceding
    /// the insertion point (not a byte offset, not grapheme clusters).
    pub pos: usize,
    /// The content to insert.
    pub content: String,
}

/// Deletes the contiguous region of content in `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delete {
    /// First Unicode scalar value removed.
    pub start: usize,
    /// End of the range, exclusive. Must be `>= start`; `start == end` is
    /// a legal empty delete which changes no content but still carries the
    /// author's cursor to `start`.
    pub end: usize,
}

/// Moves the author's cursor without changing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCursor {
    /// New cursor position for the operation's author.
    pub pos: usize,
}

/// Describes an incremental change to a document's content or to the
/// author's cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert new content into the document.
    Insert(Insert),
    /// Remove a range of content from the document.
    Delete(Delete),
    /// Move the author's cursor.
    MoveCursor(MoveCursor),
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl Operation {
    /// Returns false if the operation could never apply meaningfully to
    /// any document. A valid operation may still be rejected against a
    /// specific document when it references an index beyond the content.
    pub fn is_valid(&self) -> bool {
        match self {
            Operation::Insert(_) => true,
            Operation::Delete(Delete { start, end }) => end >= start,
            Operation::MoveCursor(_) => true,
        }
    }

    /// True when applying the operation would change document content.
    /// Empty inserts, empty deletes and cursor moves are cursor-only
    /// signals.
    pub fn is_content_change(&self) -> bool {
        match self {
            Operation::Insert(Insert { content, .. }) => !content.is_empty(),
            Operation::Delete(Delete { start, end }) => start != end,
            Operation::MoveCursor(_) => false,
        }
    }

    /// The character index the author's cursor occupies once the
    /// operation has been applied.
    pub fn cursor_position_after(&self) -> usize {
        match self {
            Operation::Insert(Insert { pos, content }) => pos + char_len(content),
            Operation::Delete(Delete { start, .. }) => *start,
            Operation::MoveCursor(MoveCursor { pos }) => *pos,
        }
    }

    /// Rewrites `self` so that applying `other` and then the output is
    /// equivalent to applying `self` and then `other` to the original
    /// state.
    ///
    /// `has_priority` is true when the author of the event containing
    /// `self` sorts lower than the author of `other`; it breaks the tie
    /// between concurrent inserts at the same position. Most pairs produce
    /// exactly one operation; a delete straddling a concurrent insert
    /// splits in two.
    pub fn transform(self, other: &Operation, has_priority: bool, output: &mut Vec<Operation>) {
        match (self, other) {
            (Operation::Insert(mut this), Operation::Insert(other)) => {
                if other.pos < this.pos || (other.pos == this.pos && has_priority) {
                    this.pos += char_len(&other.content);
                }
                output.push(Operation::Insert(this));
            }
            (Operation::Insert(mut this), Operation::Delete(other)) => {
                if other.start < this.pos {
                    this.pos -= cmp::min(this.pos, other.end) - other.start;
                }
                output.push(Operation::Insert(this));
            }
            (this @ Operation::Insert(_), Operation::MoveCursor(_)) => output.push(this),

            (Operation::Delete(mut this), Operation::Insert(other)) => {
                let len = char_len(&other.content);
                if other.pos < this.start {
                    this.start += len;
                    this.end += len;
                    output.push(Operation::Delete(this));
                } else if other.pos < this.end && this.end > this.start {
                    // The insert landed inside the range: split around it
                    // so the new content survives. The piece after the
                    // insert goes first; the before-piece is applied last
                    // and leaves the author's cursor at the earlier index.
                    // The before-piece may be empty but is still emitted
                    // for its cursor effect.
                    let after = Delete {
                        start: other.pos + len,
                        end: this.end + len,
                    };
                    let before = Delete {
                        start: this.start,
                        end: other.pos,
                    };
                    output.push(Operation::Delete(after));
                    output.push(Operation::Delete(before));
                } else {
                    output.push(Operation::Delete(this));
                }
            }
            (Operation::Delete(mut this), Operation::Delete(other)) => {
                let deleted_before = if other.start < this.start {
                    cmp::min(this.start, other.end) - other.start
                } else {
                    0
                };
                let deleted_inside = if other.start < this.start {
                    if other.end > this.start {
                        cmp::min(this.end, other.end) - this.start
                    } else {
                        0
                    }
                } else if other.start < this.end {
                    cmp::min(this.end, other.end) - other.start
                } else {
                    0
                };
                this.start -= deleted_before;
                this.end -= deleted_before + deleted_inside;
                output.push(Operation::Delete(this));
            }
            (this @ Operation::Delete(_), Operation::MoveCursor(_)) => output.push(this),

            (Operation::MoveCursor(mut this), Operation::Insert(other)) => {
                // A cursor parked exactly at the insert point stays put.
                if other.pos < this.pos {
                    this.pos += char_len(&other.content);
                }
                output.push(Operation::MoveCursor(this));
            }
            (Operation::MoveCursor(mut this), Operation::Delete(other)) => {
                if other.start < this.pos {
                    this.pos -= cmp::min(this.pos, other.end) - other.start;
                }
                output.push(Operation::MoveCursor(this));
            }
            (this @ Operation::MoveCursor(_), Operation::MoveCursor(_)) => output.push(this),
        }
    }
}

impl From<Insert> for Operation {
    fn from(op: Insert) -> Self {
        Operation::Insert(op)
    }
}

impl From<Delete> for Operation {
    fn from(op: Delete) -> Self {
        Operation::Delete(op)
    }
}

impl From<MoveCursor> for Operation {
    fn from(op: MoveCursor) -> Self {
        Operation::MoveCursor(op)
    }
}
