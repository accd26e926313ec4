//! Error types for the core module

use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The mail server rejected the credential
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// IMAP error
    #[error("IMAP error: {0}")]
    ImapError(String),

    /// SMTP error
    #[error("SMTP error: {0}")]
    SmtpError(String),

    /// A message id that is not a server UID
    #[error("Invalid message id: {0:?}")]
    InvalidMessageId(String),

    /// Tool call arguments did not match the schema
    #[error("Invalid tool arguments: {0}")]
    InvalidToolArguments(String),
}

impl CoreError {
    /// True when the server rejected the credential
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, CoreError::AuthError(_))
    }
}

impl From<mailhelper_imap::ImapError> for CoreError {
    fn from(e: mailhelper_imap::ImapError) -> Self {
        if e.is_auth_failure() {
            CoreError::AuthError(e.to_string())
        } else {
            CoreError::ImapError(e.to_string())
        }
    }
}

impl From<mailhelper_smtp::SmtpError> for CoreError {
    fn from(e: mailhelper_smtp::SmtpError) -> Self {
        if e.is_auth_failure() {
            CoreError::AuthError(e.to_string())
        } else {
            CoreError::SmtpError(e.to_string())
        }
    }
}
