use thiserror::Error;

/// Error conditions which may occur when validating or applying an event
/// to a document.
///
/// Validation always runs before mutation, so a failing event leaves the
/// document untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditError {
    /// The operation's position or range falls outside the current
    /// document content.
    #[error("the operation's area of effect falls outside the document")]
    OutsideDocument,

    /// The operation could not be applied meaningfully to any document,
    /// or the event references an unknown participant.
    #[error("the operation is invalid")]
    InvalidOperation,
}

#[derive(Error, Debug)]
pub enum OtSyncError {
    /// A server-originated event failed validation against the local
    /// document. This indicates a relay bug; the document is unchanged and
    /// the host may resynchronize by reloading the page state.
    #[error("edit rejected: {0}")]
    Edit(#[from] EditError),

    /// An inbound frame could not be decoded, or an outbound message could
    /// not be encoded. Unknown message tags land here and are fatal for
    /// the connection.
    #[error("JSON message error: {0}")]
    Json(#[from] serde_json::Error),

    /// The peer violated the session protocol (for example a second
    /// Connected handshake).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The transport was closed underneath the session.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, OtSyncError>;
