//! Retrieval session abstraction

use async_trait::async_trait;

use crate::{Flag, ImapResult};

/// One authenticated retrieval session
///
/// A session lives for a single operation. Callers must call
/// [`MailStore::logout`] when done, whatever the outcome of the operation.
#[async_trait]
pub trait MailStore: Send {
    /// Select a folder for the following commands
    async fn select(&mut self, folder: &str) -> ImapResult<()>;

    /// UIDs matching a SEARCH criteria, ascending
    async fn search(&mut self, criteria: &str) -> ImapResult<Vec<u32>>;

    /// Full message by UID, without setting `\Seen`
    ///
    /// `None` when the message no longer exists.
    async fn fetch_raw(&mut self, uid: u32) -> ImapResult<Option<Vec<u8>>>;

    /// Add flags to every UID in the set
    async fn add_flags(&mut self, uids: &[u32], flags: &[Flag]) -> ImapResult<()>;

    /// Whether the server supports scoped `UID EXPUNGE` (UIDPLUS)
    async fn supports_uid_expunge(&mut self) -> ImapResult<bool>;

    /// Purge only the given UIDs
    async fn uid_expunge(&mut self, uids: &[u32]) -> ImapResult<()>;

    /// Purge every `\Deleted` message in the selected folder
    async fn expunge(&mut self) -> ImapResult<()>;

    /// End the session
    ///
    /// Never expunges: messages flagged `\Deleted` by anyone else stay put.
    async fn logout(&mut self) -> ImapResult<()>;
}

/// Opens retrieval sessions
#[async_trait]
pub trait MailStoreConnector: Send + Sync {
    /// Session type produced by this connector
    type Store: MailStore;

    /// Connect and authenticate
    async fn connect(&self, username: &str, password: &str) -> ImapResult<Self::Store>;
}
