//! Core of MailHelper
//!
//! A mail client for one account: SMTP send, IMAP list, search, mark-read
//! and delete, plus the agent tool definition that wraps sending.

mod client;
mod config;
mod error;
pub mod tool;

pub use client::MailClient;
pub use config::{Credential, MailConfig, ENV_ADDRESS, ENV_SECRET};
pub use error::{CoreError, CoreResult};

pub use mailhelper_imap::{InboundMessage, ListOptions, SearchQuery, DEFAULT_FOLDER, DEFAULT_LIMIT};
pub use mailhelper_smtp::OutgoingMessage;
