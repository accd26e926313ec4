//! IMAP client implementation

use std::fmt;
use std::time::Duration;

use async_imap::types::Fetch;
use async_imap::Session;
use async_native_tls::TlsStream;
use async_std::net::TcpStream;
use async_trait::async_trait;
use futures::io::{AsyncRead, AsyncWrite};
use futures::TryStreamExt;
use tracing::{debug, info};

use crate::query::uid_set;
use crate::{Flag, ImapError, ImapResult, MailStore, MailStoreConnector};

// Type alias for our TLS stream
type ImapStream = TlsStream<TcpStream>;

/// Default bound on connecting and logging in
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// IMAP client for one retrieval session
pub struct ImapClient<T = ImapStream>
where
    T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send,
{
    session: Option<Session<T>>,
    host: String,
    port: u16,
}

impl ImapClient {
    /// Connect over implicit TLS and authenticate using LOGIN
    pub async fn authenticate_login(&mut self, username: &str, password: &str) -> ImapResult<()> {
        info!("Connecting to {}:{}", self.host, self.port);

        let tcp_stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| ImapError::ConnectionFailed(e.to_string()))?;

        let tls_connector = async_native_tls::TlsConnector::new();
        let tls_stream = tls_connector
            .connect(&self.host, tcp_stream)
            .await
            .map_err(|e| ImapError::TlsError(e.to_string()))?;

        debug!("TLS connection established");

        self.login(tls_stream, username, password).await
    }
}

impl<T> ImapClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send,
{
    /// Create a new IMAP client
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            session: None,
            host: host.into(),
            port,
        }
    }

    /// Authenticate using LOGIN over an established stream
    pub async fn login(&mut self, stream: T, username: &str, password: &str) -> ImapResult<()> {
        let client = async_imap::Client::new(stream);

        info!("Authenticating with LOGIN for {}", username);

        let session = client
            .login(username, password)
            .await
            .map_err(|(e, _)| ImapError::AuthenticationFailed(e.to_string()))?;

        self.session = Some(session);
        info!("LOGIN authentication successful");
        Ok(())
    }

    /// Get the session, returning an error if not connected
    fn session_mut(&mut self) -> ImapResult<&mut Session<T>> {
        self.session.as_mut().ok_or(ImapError::NotConnected)
    }
}

#[async_trait]
impl<T> MailStore for ImapClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send + 'static,
{
    async fn select(&mut self, folder: &str) -> ImapResult<()> {
        let session = self.session_mut()?;

        let mailbox = session
            .select(folder)
            .await
            .map_err(|e| ImapError::FolderNotFound(format!("{}: {}", folder, e)))?;

        debug!("Selected folder {} with {} messages", folder, mailbox.exists);
        Ok(())
    }

    async fn search(&mut self, criteria: &str) -> ImapResult<Vec<u32>> {
        let session = self.session_mut()?;

        let found = session
            .uid_search(criteria)
            .await
            .map_err(|e| ImapError::ServerError(e.to_string()))?;

        let mut uids: Vec<u32> = found.into_iter().collect();
        uids.sort_unstable();

        debug!("SEARCH {} matched {} messages", criteria, uids.len());
        Ok(uids)
    }

    async fn fetch_raw(&mut self, uid: u32) -> ImapResult<Option<Vec<u8>>> {
        let session = self.session_mut()?;

        // BODY.PEEK[] leaves \Seen untouched
        let fetches: Vec<Fetch> = session
            .uid_fetch(uid.to_string(), "(UID BODY.PEEK[])")
            .await
            .map_err(|e| ImapError::ServerError(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| ImapError::ParseError(e.to_string()))?;

        let body = fetches
            .iter()
            .filter(|fetch| fetch.uid.map_or(true, |u| u == uid))
            .find_map(|fetch| fetch.body().map(|b| b.to_vec()));

        Ok(body)
    }

    async fn add_flags(&mut self, uids: &[u32], flags: &[Flag]) -> ImapResult<()> {
        let session = self.session_mut()?;

        let flags_str = flags
            .iter()
            .map(Flag::as_imap)
            .collect::<Vec<_>>()
            .join(" ");

        session
            .uid_store(uid_set(uids), format!("+FLAGS ({})", flags_str))
            .await
            .map_err(|e| ImapError::ServerError(e.to_string()))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| ImapError::ServerError(e.to_string()))?;

        Ok(())
    }

    async fn supports_uid_expunge(&mut self) -> ImapResult<bool> {
        let session = self.session_mut()?;

        let capabilities = session
            .capabilities()
            .await
            .map_err(|e| ImapError::ServerError(e.to_string()))?;

        Ok(capabilities.has_str("UIDPLUS"))
    }

    async fn uid_expunge(&mut self, uids: &[u32]) -> ImapResult<()> {
        let session = self.session_mut()?;

        session
            .uid_expunge(uid_set(uids))
            .await
            .map_err(|e| ImapError::ServerError(e.to_string()))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| ImapError::ServerError(e.to_string()))?;

        Ok(())
    }

    async fn expunge(&mut self) -> ImapResult<()> {
        let session = self.session_mut()?;

        session
            .expunge()
            .await
            .map_err(|e| ImapError::ServerError(e.to_string()))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| ImapError::ServerError(e.to_string()))?;

        Ok(())
    }

    async fn logout(&mut self) -> ImapResult<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        // No CLOSE: it would expunge every \Deleted message in the folder
        session
            .logout()
            .await
            .map_err(|e| ImapError::ServerError(e.to_string()))
    }
}

/// Opens [`ImapClient`] sessions against one server
#[derive(Debug, Clone)]
pub struct ImapConnector {
    host: String,
    port: u16,
    timeout: Duration,
}

impl ImapConnector {
    /// Create a connector for `host:port` (implicit TLS)
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound the connect and login phase
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl MailStoreConnector for ImapConnector {
    type Store = ImapClient;

    async fn connect(&self, username: &str, password: &str) -> ImapResult<ImapClient> {
        let mut client: ImapClient = ImapClient::new(self.host.clone(), self.port);

        async_std::future::timeout(self.timeout, client.authenticate_login(username, password))
            .await
            .map_err(|_| ImapError::Timeout)??;

        Ok(client)
    }
}
