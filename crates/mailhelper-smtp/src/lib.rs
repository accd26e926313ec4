//! SMTP submission for MailHelper
//!
//! Builds outbound messages and delivers them over STARTTLS with
//! password authentication, one connection per message.

mod client;
mod error;

pub use client::{build_lettre_message, OutgoingMessage, SmtpClient, Submitter, DEFAULT_TIMEOUT};
pub use error::{SmtpError, SmtpResult};
pub use lettre::Message;
