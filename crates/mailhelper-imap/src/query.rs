//! Listing options and IMAP SEARCH criteria

use crate::{ImapError, ImapResult};

/// Default folder for listing and searching
pub const DEFAULT_FOLDER: &str = "INBOX";

/// Default number of messages returned by a listing
pub const DEFAULT_LIMIT: usize = 10;

/// Options for listing a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Folder to read from
    pub folder: String,
    /// Maximum number of messages returned
    pub limit: usize,
    /// Only unseen messages
    pub unread_only: bool,
    /// Raw IMAP SEARCH criteria, overrides `unread_only`
    pub raw_filter: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            folder: DEFAULT_FOLDER.to_string(),
            limit: DEFAULT_LIMIT,
            unread_only: false,
            raw_filter: None,
        }
    }
}

impl ListOptions {
    /// Set the folder
    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Set the maximum number of messages
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Only return unseen messages
    pub fn unread_only(mut self, unread_only: bool) -> Self {
        self.unread_only = unread_only;
        self
    }

    /// Use a raw SEARCH criteria string
    pub fn raw_filter(mut self, filter: impl Into<String>) -> Self {
        self.raw_filter = Some(filter.into());
        self
    }

    /// Resolve the SEARCH criteria: raw filter, then UNSEEN, then ALL
    ///
    /// A raw filter must fit on one command line.
    pub fn criteria(&self) -> ImapResult<String> {
        match &self.raw_filter {
            Some(filter) => {
                ensure_single_line(filter)?;
                Ok(filter.clone())
            }
            None if self.unread_only => Ok("UNSEEN".to_string()),
            None => Ok("ALL".to_string()),
        }
    }
}

/// Keyword search over a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Keyword to look for
    pub keyword: String,
    /// Folder to search
    pub folder: String,
    /// Match the keyword against the subject
    pub in_subject: bool,
    /// Match the keyword against the body
    pub in_body: bool,
    /// Only messages from this sender
    pub from_address: Option<String>,
}

impl SearchQuery {
    /// Search the default folder's subjects and bodies for `keyword`
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            folder: DEFAULT_FOLDER.to_string(),
            in_subject: true,
            in_body: true,
            from_address: None,
        }
    }

    /// Set the folder
    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Toggle subject matching
    pub fn in_subject(mut self, enabled: bool) -> Self {
        self.in_subject = enabled;
        self
    }

    /// Toggle body matching
    pub fn in_body(mut self, enabled: bool) -> Self {
        self.in_body = enabled;
        self
    }

    /// Restrict to a sender
    pub fn from_address(mut self, address: impl Into<String>) -> Self {
        self.from_address = Some(address.into());
        self
    }

    /// Compile into a single SEARCH criteria string
    ///
    /// Keyword terms are ORed; the sender term is ANDed with them. Non-ASCII
    /// terms declare `CHARSET UTF-8`.
    pub fn criteria(&self) -> ImapResult<String> {
        let mut keyword_terms = Vec::new();
        if self.in_subject {
            keyword_terms.push(format!("SUBJECT {}", quote(&self.keyword)?));
        }
        if self.in_body {
            keyword_terms.push(format!("BODY {}", quote(&self.keyword)?));
        }

        let mut terms = Vec::new();
        match keyword_terms.len() {
            0 => {}
            1 => terms.push(keyword_terms.remove(0)),
            _ => terms.push(format!("OR {}", keyword_terms.join(" "))),
        }
        if let Some(from) = &self.from_address {
            terms.push(format!("FROM {}", quote(from)?));
        }

        if terms.is_empty() {
            return Ok("ALL".to_string());
        }

        let criteria = terms.join(" ");
        if criteria.is_ascii() {
            Ok(criteria)
        } else {
            Ok(format!("CHARSET UTF-8 {}", criteria))
        }
    }

    /// Listing options that run this search with the default limit
    pub fn list_options(&self) -> ImapResult<ListOptions> {
        Ok(ListOptions::default()
            .folder(self.folder.clone())
            .raw_filter(self.criteria()?))
    }
}

/// Quote a string for use in a SEARCH command
///
/// Quoted strings cannot carry CR, LF or NUL.
pub fn quote(value: &str) -> ImapResult<String> {
    ensure_single_line(value)?;

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Ok(quoted)
}

fn ensure_single_line(value: &str) -> ImapResult<()> {
    if value.contains(['\r', '\n', '\0']) {
        return Err(ImapError::InvalidCriteria(format!(
            "{:?} contains a line break or NUL",
            value
        )));
    }
    Ok(())
}

/// Keep the newest `limit` UIDs, newest first
///
/// `uids` must be ascending; the server assigns them in arrival order.
pub fn select_newest(uids: &[u32], limit: usize) -> Vec<u32> {
    let start = uids.len().saturating_sub(limit);
    uids[start..].iter().rev().copied().collect()
}

/// Render UIDs as an IMAP sequence set
pub fn uid_set(uids: &[u32]) -> String {
    uids.iter()
        .map(|uid| uid.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
