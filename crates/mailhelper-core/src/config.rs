//! Account configuration

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{CoreError, CoreResult};

/// Account address variable
pub const ENV_ADDRESS: &str = "EMAIL_ADDRESS";
/// Account secret (app password) variable
pub const ENV_SECRET: &str = "EMAIL_APP_PASSWORD";

/// Login for one mail account
///
/// The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    address: String,
    secret: String,
}

impl Credential {
    /// Create a credential
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            secret: secret.into(),
        }
    }

    /// Account address, also the sender of outbound mail
    pub fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Server endpoints and credential for a [`crate::MailClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    /// Account login
    pub credential: Credential,
    /// SMTP submission host (STARTTLS)
    pub smtp_host: String,
    /// SMTP submission port
    pub smtp_port: u16,
    /// IMAP host (implicit TLS)
    pub imap_host: String,
    /// IMAP port
    pub imap_port: u16,
    /// Bound on connecting and on each SMTP command
    pub timeout: Duration,
}

impl MailConfig {
    /// Gmail endpoints for a credential
    pub fn gmail(credential: Credential) -> Self {
        Self {
            credential,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            imap_host: "imap.gmail.com".to_string(),
            imap_port: 993,
            timeout: Duration::from_secs(30),
        }
    }

    /// Resolve from process environment variables
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from any key/value source
    ///
    /// A missing secret is fatal; endpoint variables fall back to Gmail.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CoreError::Config(format!("{} is not set", key)))
        };

        let address = required(ENV_ADDRESS)?;
        let secret = required(ENV_SECRET)?;
        let defaults = Self::gmail(Credential::new(address, secret));

        let config = Self {
            smtp_host: lookup("MAIL_SMTP_HOST").unwrap_or(defaults.smtp_host.clone()),
            smtp_port: parse_or(&lookup, "MAIL_SMTP_PORT", defaults.smtp_port)?,
            imap_host: lookup("MAIL_IMAP_HOST").unwrap_or(defaults.imap_host.clone()),
            imap_port: parse_or(&lookup, "MAIL_IMAP_PORT", defaults.imap_port)?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "MAIL_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.smtp_host.trim().is_empty() {
            return Err(CoreError::Config("SMTP host cannot be empty".into()));
        }
        if self.imap_host.trim().is_empty() {
            return Err(CoreError::Config("IMAP host cannot be empty".into()));
        }
        if self.smtp_port == 0 || self.imap_port == 0 {
            return Err(CoreError::Config("ports must be non-zero".into()));
        }
        if self.timeout.is_zero() {
            return Err(CoreError::Config("timeout must be non-zero".into()));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> CoreResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| CoreError::Config(format!("invalid {}: {}", key, e))),
        None => Ok(default),
    }
}
