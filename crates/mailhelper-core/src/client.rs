//! Mail client facade
//!
//! Every operation is one self-contained transaction: connect,
//! authenticate, act, log out. The plain methods (`send`, `list`, ...) never
//! fail: they log the problem and report `false` or an empty list. The
//! `try_` variants return the typed error for callers that want it.

use mailhelper_imap::query::select_newest;
use mailhelper_imap::{
    Flag, ImapConnector, InboundMessage, ListOptions, MailStore, MailStoreConnector, SearchQuery,
};
use mailhelper_smtp::{build_lettre_message, OutgoingMessage, SmtpClient, Submitter};
use tracing::{debug, error, info, warn};

use crate::{CoreError, CoreResult, Credential, MailConfig};

/// Mail operations against one account
pub struct MailClient<C = ImapConnector, S = SmtpClient> {
    credential: Credential,
    retrieval: C,
    submission: S,
}

impl MailClient {
    /// Build a client for real IMAP and SMTP servers
    pub fn from_config(config: MailConfig) -> Self {
        let retrieval =
            ImapConnector::new(config.imap_host, config.imap_port).timeout(config.timeout);
        let submission = SmtpClient::new(config.smtp_host, config.smtp_port).timeout(config.timeout);

        Self::with_transports(config.credential, retrieval, submission)
    }

    /// Build a client from environment variables
    pub fn from_env() -> CoreResult<Self> {
        MailConfig::from_env().map(Self::from_config)
    }
}

impl<C, S> MailClient<C, S>
where
    C: MailStoreConnector,
    S: Submitter,
{
    /// Build a client over any retrieval connector and submitter
    pub fn with_transports(credential: Credential, retrieval: C, submission: S) -> Self {
        Self {
            credential,
            retrieval,
            submission,
        }
    }

    /// Account address
    pub fn address(&self) -> &str {
        self.credential.address()
    }

    /// Send a message; `false` on any failure
    pub async fn send(&self, message: &OutgoingMessage) -> bool {
        match self.try_send(message).await {
            Ok(()) => {
                info!("Email sent successfully to {}", message.to);
                true
            }
            Err(e) if e.is_auth_failure() => {
                error!("Authentication failed, check the address and app password: {}", e);
                false
            }
            Err(e) => {
                error!("Failed to send email: {}", e);
                false
            }
        }
    }

    /// Send a message
    ///
    /// The envelope covers to, cc and bcc; bcc stays out of the headers.
    pub async fn try_send(&self, message: &OutgoingMessage) -> CoreResult<()> {
        let lettre_message = build_lettre_message(self.credential.address(), message)?;

        debug!(
            recipients = message.recipients().len(),
            html = message.is_markup,
            "Submitting message"
        );

        self.submission
            .submit(
                self.credential.address(),
                self.credential.secret(),
                lettre_message,
            )
            .await?;

        Ok(())
    }

    /// Newest messages in a folder, newest first; empty on any failure
    pub async fn list(&self, options: &ListOptions) -> Vec<InboundMessage> {
        match self.try_list(options).await {
            Ok(messages) => {
                info!("Retrieved {} emails from {}", messages.len(), options.folder);
                messages
            }
            Err(e) => {
                log_failure("read emails", &e);
                Vec::new()
            }
        }
    }

    /// Newest messages in a folder, newest first
    ///
    /// At most `options.limit` messages matching the resolved criteria.
    pub async fn try_list(&self, options: &ListOptions) -> CoreResult<Vec<InboundMessage>> {
        let criteria = options.criteria()?;
        let mut store = self.open(&options.folder).await?;
        let result = fetch_newest(&mut store, &criteria, options.limit).await;
        release(&mut store).await;
        result
    }

    /// Keyword search; empty on any failure
    pub async fn search(&self, query: &SearchQuery) -> Vec<InboundMessage> {
        match self.try_search(query).await {
            Ok(messages) => {
                info!("Found {} emails in {}", messages.len(), query.folder);
                messages
            }
            Err(e) => {
                log_failure("search emails", &e);
                Vec::new()
            }
        }
    }

    /// Keyword search
    ///
    /// Keywords or senders containing line breaks are rejected before
    /// connecting.
    pub async fn try_search(&self, query: &SearchQuery) -> CoreResult<Vec<InboundMessage>> {
        let options = query.list_options()?;
        self.try_list(&options).await
    }

    /// Flag messages as seen; `false` on any failure
    pub async fn mark_read(&self, ids: &[String], folder: &str) -> bool {
        match self.try_mark_read(ids, folder).await {
            Ok(()) => {
                info!("Marked {} emails as read", ids.len());
                true
            }
            Err(e) => {
                log_failure("mark emails as read", &e);
                false
            }
        }
    }

    /// Flag messages as seen
    ///
    /// One STORE over the whole set: the server applies it to every id or
    /// reports a single failure.
    pub async fn try_mark_read(&self, ids: &[String], folder: &str) -> CoreResult<()> {
        let uids = parse_ids(ids)?;
        if uids.is_empty() {
            return Ok(());
        }

        let mut store = self.open(folder).await?;
        let result = store
            .add_flags(&uids, &[Flag::Seen])
            .await
            .map_err(CoreError::from);
        release(&mut store).await;
        result
    }

    /// Delete messages permanently; `false` on any failure
    pub async fn delete(&self, ids: &[String], folder: &str) -> bool {
        match self.try_delete(ids, folder).await {
            Ok(()) => {
                info!("Deleted {} emails", ids.len());
                true
            }
            Err(e) => {
                log_failure("delete emails", &e);
                false
            }
        }
    }

    /// Delete messages permanently
    ///
    /// Flags the set `\Deleted` and purges it. Servers without UIDPLUS can
    /// only purge folder-wide, which also removes anything else already
    /// flagged `\Deleted` in the folder.
    pub async fn try_delete(&self, ids: &[String], folder: &str) -> CoreResult<()> {
        let uids = parse_ids(ids)?;
        if uids.is_empty() {
            return Ok(());
        }

        let mut store = self.open(folder).await?;
        let result = flag_and_purge(&mut store, &uids, folder).await;
        release(&mut store).await;
        result
    }

    async fn open(&self, folder: &str) -> CoreResult<C::Store> {
        let mut store = self
            .retrieval
            .connect(self.credential.address(), self.credential.secret())
            .await?;

        if let Err(e) = store.select(folder).await {
            release(&mut store).await;
            return Err(e.into());
        }

        Ok(store)
    }
}

async fn fetch_newest<M: MailStore>(
    store: &mut M,
    criteria: &str,
    limit: usize,
) -> CoreResult<Vec<InboundMessage>> {
    let uids = store.search(criteria).await?;
    let selected = select_newest(&uids, limit);

    let mut messages = Vec::with_capacity(selected.len());
    for uid in selected {
        match store.fetch_raw(uid).await? {
            Some(raw) => messages.push(InboundMessage::from_raw(uid, &raw)),
            None => warn!("Message {} disappeared before it could be fetched", uid),
        }
    }

    Ok(messages)
}

async fn flag_and_purge<M: MailStore>(store: &mut M, uids: &[u32], folder: &str) -> CoreResult<()> {
    store.add_flags(uids, &[Flag::Deleted]).await?;

    if store.supports_uid_expunge().await? {
        store.uid_expunge(uids).await?;
    } else {
        warn!(
            "Server lacks UIDPLUS; expunging every deleted message in {}",
            folder
        );
        store.expunge().await?;
    }

    Ok(())
}

/// End a session; a failed logout never masks the operation's result
async fn release<M: MailStore>(store: &mut M) {
    if let Err(e) = store.logout().await {
        warn!("Failed to log out of IMAP session: {}", e);
    }
}

fn parse_ids(ids: &[String]) -> CoreResult<Vec<u32>> {
    ids.iter()
        .map(|id| {
            id.trim()
                .parse::<u32>()
                .ok()
                .filter(|uid| *uid > 0)
                .ok_or_else(|| CoreError::InvalidMessageId(id.clone()))
        })
        .collect()
}

fn log_failure(action: &str, e: &CoreError) {
    if e.is_auth_failure() {
        error!("Authentication failed, check the address and app password: {}", e);
    } else {
        error!("Failed to {}: {}", action, e);
    }
}
