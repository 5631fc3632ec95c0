//! Mail client abstraction and its IMAP implementation

use crate::config::ImapConfig;
use crate::connection::{self, ImapSession, with_timeout};
use crate::error::{Error, Result};
use crate::folder::Folder;
use crate::record::{MessageId, MessageRecord};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};

/// A remote mailbox that messages can be listed and fetched from.
#[async_trait]
pub trait MailClient: Send {
    /// Open a session and select `folder`.
    ///
    /// Calling it while connected replaces the current session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] on any transport, login or SELECT
    /// failure.
    async fn connect(&mut self, folder: &Folder) -> Result<()>;

    /// Whether a session is held. Does not talk to the server.
    fn is_connected(&self) -> bool;

    /// Identifiers of every message in the selected folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] without a session and
    /// [`Error::Connection`] if the search fails.
    async fn list_message_ids(&mut self) -> Result<Vec<MessageId>>;

    /// Fetch one full message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] without a session and
    /// [`Error::Connection`] if the server rejects `id` or the fetch
    /// fails.
    async fn fetch_message(&mut self, id: MessageId) -> Result<MessageRecord>;

    /// Log out and drop the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if there is no session.
    async fn close(&mut self) -> Result<()>;
}

enum SessionState {
    Disconnected,
    Connected(Box<ImapSession>),
}

/// IMAP implementation of [`MailClient`]
///
/// Message identifiers are UIDs. Fetches use `BODY.PEEK[]`, so backing
/// up a folder leaves the `\Seen` flags as they were.
pub struct ImapClient {
    config: ImapConfig,
    state: SessionState,
}

impl ImapClient {
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self {
            config,
            state: SessionState::Disconnected,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ImapConfig {
        &self.config
    }

    fn session_mut(&mut self) -> Result<&mut ImapSession> {
        match &mut self.state {
            SessionState::Connected(session) => Ok(&mut **session),
            SessionState::Disconnected => Err(Error::NotConnected),
        }
    }
}

#[async_trait]
impl MailClient for ImapClient {
    async fn connect(&mut self, folder: &Folder) -> Result<()> {
        let limit = self.config.timeout();
        let config = &self.config;

        let session = with_timeout(limit, "Connecting", async {
            let mut session = connection::connect(config).await?;
            connection::select(&mut session, folder.as_str()).await?;
            Ok(session)
        })
        .await?;

        info!("Selected {}", folder);
        self.state = SessionState::Connected(Box::new(session));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    async fn list_message_ids(&mut self) -> Result<Vec<MessageId>> {
        let limit = self.config.timeout();
        let session = self.session_mut()?;

        let uids = with_timeout(limit, "SEARCH", async {
            session
                .uid_search("ALL")
                .await
                .map_err(|e| Error::Connection(format!("Search failed: {e}")))
        })
        .await?;

        // The search result is a set; UID order is the mailbox order.
        let mut ids: Vec<MessageId> = uids.into_iter().collect();
        ids.sort_unstable();

        info!("Found {} messages", ids.len());
        Ok(ids)
    }

    async fn fetch_message(&mut self, id: MessageId) -> Result<MessageRecord> {
        let limit = self.config.timeout();
        let session = self.session_mut()?;

        let raw = with_timeout(limit, "FETCH", fetch_body(session, id)).await?;

        debug!("Fetched UID {} ({} bytes)", id, raw.len());
        Ok(MessageRecord::parse(id, raw))
    }

    async fn close(&mut self) -> Result<()> {
        let limit = self.config.timeout();
        let SessionState::Connected(mut session) =
            std::mem::replace(&mut self.state, SessionState::Disconnected)
        else {
            return Err(Error::NotConnected);
        };

        let logout = with_timeout(limit, "LOGOUT", async {
            session
                .logout()
                .await
                .map_err(|e| Error::Connection(format!("Logout failed: {e}")))
        })
        .await;

        // The session is gone either way; a failed LOGOUT only means the
        // server did not see it.
        if let Err(e) = logout {
            warn!("{}", e);
        }
        Ok(())
    }
}

async fn fetch_body(session: &mut ImapSession, uid: MessageId) -> Result<Vec<u8>> {
    let uid_set = format!("{uid}");
    let mut messages = session
        .uid_fetch(&uid_set, "(BODY.PEEK[])")
        .await
        .map_err(|e| Error::Connection(format!("Fetch failed: {e}")))?;

    // Unsolicited FETCH responses for other messages can share the stream.
    let mut body = None;
    while let Some(msg_result) = messages.next().await {
        let msg = msg_result.map_err(|e| Error::Connection(format!("Fetch error: {e}")))?;
        if body.is_none() && msg.uid == Some(uid) {
            body = msg.body().map(<[u8]>::to_vec);
        }
    }
    drop(messages);

    body.ok_or_else(|| Error::Connection(format!("No body found for UID {uid}")))
}
