//! The operational-transformation algebra.
//!
//! Concurrent edits are reconciled by rewriting the later operation so it
//! applies on top of the earlier one while preserving intent. The relay
//! decides which edit is "earlier": events arrive in a single server order,
//! and the client rewrites everything else to fit.
//!
//! Two layers:
//!
//! 1. [`Operation`]: Insert / Delete / MoveCursor over character indices,
//!    with a pairwise [`Operation::transform`].
//! 2. [`Event`]: Edit / Join / Leave; [`Edit::transform`] lifts the
//!    operation transform over whole batches, breaking position ties by
//!    participant id.
//!
//! All positions are counts of Unicode scalar values from the start of the
//! document, never byte offsets.

pub mod event;
pub mod operation;

pub use event::{Edit, Event, Join, Leave};
pub use operation::{Delete, Insert, MoveCursor, Operation};

/// Identifier the relay assigns to each connected participant.
///
/// Ids are unique among concurrent participants and totally ordered; that
/// order is the only tie-breaker between concurrent operations at the same
/// position.
pub type ParticipantId = u32;
