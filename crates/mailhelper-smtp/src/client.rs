//! SMTP client implementation

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::{Credentials, Mechanism},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info};

use crate::{SmtpError, SmtpResult};

/// Default bound on each SMTP command
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Email message to send
///
/// The sender is not part of the message; it is the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Primary recipient
    pub to: String,
    /// CC addresses
    pub cc: Vec<String>,
    /// BCC addresses, delivered but never written to headers
    pub bcc: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Body, plain text or HTML
    pub body: String,
    /// Body is HTML
    pub is_markup: bool,
}

impl OutgoingMessage {
    /// Create a plain-text message to one recipient
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: subject.into(),
            body: body.into(),
            is_markup: false,
        }
    }

    /// Add a CC recipient
    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Add a BCC recipient
    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(address.into());
        self
    }

    /// Mark the body as HTML
    pub fn html(mut self, is_markup: bool) -> Self {
        self.is_markup = is_markup;
        self
    }

    /// Every delivery target: to, then cc, then bcc
    pub fn recipients(&self) -> Vec<&str> {
        std::iter::once(self.to.as_str())
            .chain(self.cc.iter().map(String::as_str))
            .chain(self.bcc.iter().map(String::as_str))
            .collect()
    }
}

/// Delivers built messages to a submission server
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Authenticate and transmit `message` to its envelope recipients
    async fn submit(&self, username: &str, password: &str, message: Message) -> SmtpResult<()>;
}

/// SMTP client for sending emails
#[derive(Debug, Clone)]
pub struct SmtpClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SmtpClient {
    /// Create a new SMTP client
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound each SMTP command
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Submitter for SmtpClient {
    async fn submit(&self, username: &str, password: &str, message: Message) -> SmtpResult<()> {
        info!("Sending email via SMTP to {}:{}", self.host, self.port);

        // No pool: each submission opens, upgrades and quits its own connection
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|e| SmtpError::ConnectionFailed(e.to_string()))?
            .port(self.port)
            .timeout(Some(self.timeout))
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .authentication(vec![Mechanism::Plain, Mechanism::Login])
            .build();

        debug!(
            "Envelope has {} recipients",
            message.envelope().to().len()
        );

        transport.send(message).await?;

        info!("Email sent successfully");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> SmtpResult<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|e| SmtpError::InvalidAddress(format!("{}: {}", address, e)))
}

/// Build a lettre Message from OutgoingMessage
///
/// One content part inside `multipart/mixed`. BCC recipients only reach the
/// envelope; lettre drops the header when formatting.
pub fn build_lettre_message(from: &str, msg: &OutgoingMessage) -> SmtpResult<Message> {
    let mut builder = Message::builder()
        .from(parse_mailbox(from)?)
        .to(parse_mailbox(&msg.to)?)
        .subject(&msg.subject);

    for cc in &msg.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }

    for bcc in &msg.bcc {
        builder = builder.bcc(parse_mailbox(bcc)?);
    }

    let content_type = if msg.is_markup {
        ContentType::TEXT_HTML
    } else {
        ContentType::TEXT_PLAIN
    };

    builder
        .multipart(
            MultiPart::mixed().singlepart(
                SinglePart::builder()
                    .header(content_type)
                    .body(msg.body.clone()),
            ),
        )
        .map_err(|e| SmtpError::MessageBuildError(e.to_string()))
}
