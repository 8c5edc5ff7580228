//! High-level editing session for one wiki page.
//!
//! [`PageSession`] wires the three core pieces together: the
//! [`PageDoc`] content layer, the [`EditSession`] state machine, and the
//! [`OtSyncClient`] transport. Connecting fetches the page's initial state
//! over HTTP (unless the host supplies it), opens the edit stream, and
//! completes the Connected handshake.
//!
//! Local edits go through [`PageSession::edit`], which applies them to the
//! document and queues them; edits queued before the next
//! [`PageSession::flush`] are coalesced into a single ClientEdit. Incoming
//! events are pumped with [`PageSession::next_event`], which rewrites them
//! against the pending local edits and applies them to the document before
//! handing them to the host.

use serde::Deserialize;
use tracing::debug;

use crate::client::{build_page_url, ClientConfig, OtSyncClient};
use crate::doc::{Document, PageDoc};
use crate::error::{OtSyncError, Result};
use crate::ot::{Delete, Insert, MoveCursor, Operation, ParticipantId};
use crate::protocol::{EditSession, SequenceId, ServerMessage};

/// Configuration for joining a page's edit session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the wiki server (e.g. `http://localhost:8080`).
    pub base_url: String,
    /// Name of the page to edit.
    pub page: String,
    /// Authentication token.
    pub token: Option<String>,
    /// Initial state to use instead of fetching it from the server.
    pub initial: Option<(SequenceId, Document)>,
}

impl SessionConfig {
    /// Creates a new session configuration.
    pub fn new(base_url: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page: page.into(),
            token: None,
            initial: None,
        }
    }

    /// Sets the authentication token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Supplies the initial page state directly, skipping the HTTP fetch.
    pub fn with_initial(mut self, seq: SequenceId, document: Document) -> Self {
        self.initial = Some((seq, document));
        self
    }
}

/// A connected editing session for one page.
pub struct PageSession {
    doc: PageDoc,
    session: EditSession,
    client: OtSyncClient,
    flush_scheduled: bool,
}

impl PageSession {
    /// Connects to the page's edit stream and completes the Connected
    /// handshake.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let (seq, document) = match config.initial.clone() {
            Some(initial) => initial,
            None => fetch_page_state(&config).await?,
        };

        let url = build_page_url(&config.base_url, &config.page, config.token.as_deref());
        let mut client = OtSyncClient::connect(ClientConfig::new(url)).await?;

        let mut session = EditSession::new(seq);
        let mut doc = PageDoc::new(seq, document);

        // The relay's first frame is always the Connected handshake.
        let msg = client
            .receive_message()
            .await?
            .ok_or(OtSyncError::ConnectionClosed)?;
        match session.receive(msg)? {
            ServerMessage::Connected(connected) => {
                debug!(id = connected.id, page = %config.page, "joined edit session");
                doc.set_local_id(connected.id);
            }
            ServerMessage::Event(_) => {
                return Err(OtSyncError::Protocol(String::from(
                    "expected the Connected handshake",
                )));
            }
        }

        Ok(Self {
            doc,
            session,
            client,
            flush_scheduled: false,
        })
    }

    /// The relay-assigned id of this client.
    pub fn participant_id(&self) -> Option<ParticipantId> {
        self.session.participant_id()
    }

    /// Current page text.
    pub fn content(&self) -> &str {
        self.doc.content()
    }

    /// The content layer.
    pub fn doc(&self) -> &PageDoc {
        &self.doc
    }

    /// Highest server sequence applied so far.
    pub fn seq(&self) -> SequenceId {
        self.doc.seq()
    }

    /// True when queued operations are waiting for [`Self::flush`].
    pub fn flush_scheduled(&self) -> bool {
        self.flush_scheduled
    }

    /// Applies a locally-authored edit and queues it for the next flush.
    ///
    /// Local editing only becomes possible once this client's own Join
    /// event has arrived (pump [`Self::next_event`] until then). Edits
    /// queued before the flush runs coalesce into one ClientEdit.
    pub fn edit(&mut self, operations: Vec<Operation>) -> Result<()> {
        let change = self.doc.edit(operations)?;
        if self.session.write(change.operations) {
            self.flush_scheduled = true;
        }
        Ok(())
    }

    /// Inserts text at a character index, as a local edit.
    pub fn insert(&mut self, pos: usize, content: &str) -> Result<()> {
        self.edit(vec![Operation::Insert(Insert {
            pos,
            content: content.to_string(),
        })])
    }

    /// Deletes the range `[start, end)`, as a local edit.
    pub fn delete(&mut self, start: usize, end: usize) -> Result<()> {
        self.edit(vec![Operation::Delete(Delete { start, end })])
    }

    /// Moves the local cursor, as a local edit.
    pub fn move_cursor(&mut self, pos: usize) -> Result<()> {
        self.edit(vec![Operation::MoveCursor(MoveCursor { pos })])
    }

    /// Sends any queued operations as a single ClientEdit. A no-op when
    /// normalization drops everything.
    pub async fn flush(&mut self) -> Result<()> {
        self.flush_scheduled = false;
        if let Some(msg) = self.session.flush() {
            self.client.send_message(&msg).await?;
        }
        Ok(())
    }

    /// Waits for the next event from the relay, rewrites it against the
    /// pending local edits, applies it to the document, and returns the
    /// transformed message.
    ///
    /// Returns `None` once the relay closes the connection. An event the
    /// document rejects is surfaced as an error with the document left
    /// unchanged; the host may resynchronize via [`PageDoc::load`].
    pub async fn next_event(&mut self) -> Result<Option<ServerMessage>> {
        let Some(msg) = self.client.receive_message().await? else {
            return Ok(None);
        };
        let msg = self.session.receive(msg)?;
        if let ServerMessage::Event(server_event) = &msg {
            self.doc.apply_event(server_event.seq, &server_event.event)?;
        }
        Ok(Some(msg))
    }

    /// Closes the session gracefully.
    pub async fn close(self) -> Result<()> {
        self.client.close().await
    }
}

/// Fetches a page's current sequence and document from the wiki server.
async fn fetch_page_state(config: &SessionConfig) -> Result<(SequenceId, Document)> {
    #[derive(Deserialize)]
    struct PageState {
        seq: SequenceId,
        document: Document,
    }

    let client = reqwest::Client::new();
    let url = format!(
        "{}/api/pages/{}",
        config.base_url.trim_end_matches('/'),
        config.page
    );

    let mut request = client.get(&url);
    if let Some(token) = &config.token {
        request = request.query(&[("token", token)]);
    }

    let state: PageState = request
        .send()
        .await
        .map_err(|e| OtSyncError::Protocol(format!("Failed to fetch page state: {}", e)))?
        .json()
        .await
        .map_err(|e| OtSyncError::Protocol(format!("Failed to parse page state: {}", e)))?;

    Ok((state.seq, state.document))
}
