//! IMAP retrieval for MailHelper
//!
//! Provides one-shot retrieval sessions, SEARCH criteria compilation and
//! plain-text body decoding for fetched messages.

pub mod body;
mod client;
mod error;
mod message;
pub mod query;
mod store;

pub use client::{ImapClient, ImapConnector, DEFAULT_TIMEOUT};
pub use error::{ImapError, ImapResult};
pub use message::{Flag, InboundMessage};
pub use query::{ListOptions, SearchQuery, DEFAULT_FOLDER, DEFAULT_LIMIT};
pub use store::{MailStore, MailStoreConnector};
