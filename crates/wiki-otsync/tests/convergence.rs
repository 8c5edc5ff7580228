//! Property tests for the universal invariants: transform convergence,
//! length conservation, cursor bounds, atomic rejection and wire
//! round-trips.

use proptest::prelude::*;

use wiki_otsync::{
    ClientEdit, Delete, Document, Edit, Event, Insert, Join, MoveCursor, Operation,
    ServerEvent, ServerMessage,
};

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Any operation that is valid against a document of `len` characters.
fn valid_operation(len: usize) -> BoxedStrategy<Operation> {
    prop_oneof![
        (0..=len, "[a-zщд ]{0,8}").prop_map(|(pos, content)| {
            Operation::Insert(Insert { pos, content })
        }),
        (0..=len)
            .prop_flat_map(move |start| (Just(start), start..=len))
            .prop_map(|(start, end)| Operation::Delete(Delete { start, end })),
        (0..=len).prop_map(|pos| Operation::MoveCursor(MoveCursor { pos })),
    ]
    .boxed()
}

/// Document content of at least one character, multibyte included.
fn document_content() -> BoxedStrategy<String> {
    ".{1,30}"
        .prop_filter("content must not be empty", |s: &String| {
            s.chars().count() > 0
        })
        .boxed()
}

/// A document plus one valid operation from each of two participants.
fn concurrent_operations() -> BoxedStrategy<(String, Operation, Operation)> {
    document_content()
        .prop_flat_map(|content| {
            let len = char_len(&content);
            (Just(content), valid_operation(len), valid_operation(len))
        })
        .boxed()
}

fn seeded_document(content: &str) -> Document {
    let mut doc = Document::from(content);
    doc.apply(&Event::Join(Join { id: 1 })).unwrap();
    doc.apply(&Event::Join(Join { id: 2 })).unwrap();
    doc
}

fn content_delta(operations: &[Operation]) -> isize {
    operations
        .iter()
        .map(|op| match op {
            Operation::Insert(Insert { content, .. }) => char_len(content) as isize,
            Operation::Delete(Delete { start, end }) => -((end - start) as isize),
            Operation::MoveCursor(_) => 0,
        })
        .sum()
}

proptest! {
    /// Transform-priority symmetry: applying the two edits in either
    /// relay order produces the same content.
    #[test]
    fn transformed_concurrent_operations_converge(
        (ref content, ref op1, ref op2) in concurrent_operations()
    ) {
        let doc = seeded_document(content);

        let mut a1 = Event::Edit(Edit { author: 1, operations: vec![op1.clone()] });
        let b1 = Event::Edit(Edit { author: 2, operations: vec![op2.clone()] });
        let a2 = a1.clone();
        let mut b2 = b1.clone();

        a1.transform(&b1);
        b2.transform(&a2);

        let mut doc1 = doc.clone();
        let mut doc2 = doc.clone();
        // Order 1: b first, then a rewritten past b.
        doc1.apply(&b1).unwrap();
        doc1.apply(&a1).unwrap();
        // Order 2: a first, then b rewritten past a.
        doc2.apply(&a2).unwrap();
        doc2.apply(&b2).unwrap();

        prop_assert_eq!(&doc1.content, &doc2.content);
    }

    /// Length conservation: content length moves by exactly the inserted
    /// minus the deleted characters.
    #[test]
    fn applied_edit_conserves_length(
        (ref content, ref op1, ref op2) in concurrent_operations()
    ) {
        // Two single-op edits applied one after another; the second must
        // be valid against the first's result, so re-check before use.
        let mut doc = seeded_document(content);
        let before = char_len(&doc.content);

        let edit = Event::Edit(Edit { author: 1, operations: vec![op1.clone()] });
        doc.apply(&edit).unwrap();
        let mid = char_len(&doc.content);
        prop_assert_eq!(
            mid as isize,
            before as isize + content_delta(std::slice::from_ref(op1))
        );

        let edit = Event::Edit(Edit { author: 2, operations: vec![op2.clone()] });
        if doc.can_apply(&edit).is_ok() {
            doc.apply(&edit).unwrap();
            prop_assert_eq!(
                char_len(&doc.content) as isize,
                mid as isize + content_delta(std::slice::from_ref(op2))
            );
        }
    }

    /// Every cursor stays within the document after any successful apply.
    #[test]
    fn cursors_stay_in_range(
        (ref content, ref op1, ref op2) in concurrent_operations()
    ) {
        let mut doc = seeded_document(content);
        for (author, op) in [(1, op1), (2, op2)] {
            let edit = Event::Edit(Edit { author, operations: vec![op.clone()] });
            if doc.can_apply(&edit).is_ok() {
                doc.apply(&edit).unwrap();
            }
            let len = char_len(&doc.content);
            for participant in doc.participants.entries.values() {
                prop_assert!(participant.cursor_pos <= len);
            }
        }
    }

    /// A rejected event changes nothing, even when earlier operations in
    /// the batch were individually fine.
    #[test]
    fn rejected_edit_is_atomic(
        (ref content, ref op1, _) in concurrent_operations()
    ) {
        let mut doc = seeded_document(content);
        let before = doc.clone();
        let edit = Event::Edit(Edit {
            author: 1,
            operations: vec![
                op1.clone(),
                Operation::Delete(Delete { start: 5000, end: 5001 }),
            ],
        });
        prop_assert!(doc.apply(&edit).is_err());
        prop_assert_eq!(&doc, &before);
    }

    /// Wire round-trip: decoding an encoded message yields the original.
    #[test]
    fn server_messages_roundtrip_through_json(
        seq in 0u64..10_000,
        client_seq in 0u64..100,
        author in 1u32..9,
        (ref content, ref op1, ref op2) in concurrent_operations()
    ) {
        let doc = seeded_document(content);
        let messages = vec![
            ServerMessage::Event(ServerEvent {
                seq,
                client_seq,
                event: Event::Edit(Edit {
                    author,
                    operations: vec![op1.clone(), op2.clone()],
                }),
            }),
            ServerMessage::Event(ServerEvent {
                seq,
                client_seq,
                event: Event::Join(Join { id: author }),
            }),
        ];
        for msg in &messages {
            let frame = msg.encode().unwrap();
            prop_assert_eq!(&ServerMessage::decode(&frame).unwrap(), msg);
        }

        let edit = wiki_otsync::ClientMessage::ClientEdit(ClientEdit {
            parent_seq: seq,
            client_seq,
            operations: vec![op1.clone()],
        });
        let frame = edit.encode().unwrap();
        prop_assert_eq!(&wiki_otsync::ClientMessage::decode(&frame).unwrap(), &edit);

        let json = serde_json::to_string(&doc).unwrap();
        prop_assert_eq!(&serde_json::from_str::<Document>(&json).unwrap(), &doc);
    }
}
