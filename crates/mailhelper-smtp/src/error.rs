//! Error types for SMTP operations

use thiserror::Error;

/// Result type for SMTP operations
pub type SmtpResult<T> = Result<T, SmtpError>;

/// Errors that can occur during SMTP operations
#[derive(Debug, Error)]
pub enum SmtpError {
    /// Connection failed
    #[error("Failed to connect to SMTP server: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("SMTP authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Failed to send message
    #[error("Failed to send message: {0}")]
    SendFailed(String),

    /// Invalid email address
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message building error
    #[error("Failed to build message: {0}")]
    MessageBuildError(String),
}

impl SmtpError {
    /// True when the server rejected the credential
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SmtpError::AuthenticationFailed(_))
    }
}

impl From<lettre::transport::smtp::Error> for SmtpError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        // 530/534/535 are the authentication rejections
        let auth_rejected = e
            .status()
            .is_some_and(|code| code.to_string().starts_with("53"));

        if auth_rejected {
            SmtpError::AuthenticationFailed(e.to_string())
        } else if e.is_permanent() || e.is_transient() {
            SmtpError::SendFailed(e.to_string())
        } else {
            SmtpError::ConnectionFailed(e.to_string())
        }
    }
}
