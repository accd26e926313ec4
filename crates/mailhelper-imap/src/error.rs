//! Error types for IMAP operations

use thiserror::Error;

/// Result type for IMAP operations
pub type ImapResult<T> = Result<T, ImapError>;

/// Errors that can occur during IMAP operations
#[derive(Debug, Error)]
pub enum ImapError {
    /// Connection failed
    #[error("Failed to connect to IMAP server: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("IMAP authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Server returned an error
    #[error("IMAP server error: {0}")]
    ServerError(String),

    /// Folder could not be selected
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    /// Parse error
    #[error("Failed to parse IMAP response: {0}")]
    ParseError(String),

    /// TLS error
    #[error("TLS error: {0}")]
    TlsError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Session is not connected
    #[error("IMAP session is not connected")]
    NotConnected,

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// SEARCH criteria that cannot be sent on one command line
    #[error("Invalid search criteria: {0}")]
    InvalidCriteria(String),
}

impl ImapError {
    /// True when the server rejected the credential
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ImapError::AuthenticationFailed(_))
    }
}
