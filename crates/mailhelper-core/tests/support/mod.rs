//! In-memory mail server for driving `MailClient` without a network
//!
//! One shared state backs both protocols: submitted messages land in the
//! INBOX, so a send can be read back with a list. SEARCH understands the
//! subset of criteria the client produces (CHARSET, ALL, SEEN, UNSEEN,
//! DELETED, SUBJECT, BODY, FROM, OR).

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mailhelper_core::{Credential, MailClient};
use mailhelper_imap::{Flag, ImapError, ImapResult, InboundMessage, MailStore, MailStoreConnector};
use mailhelper_smtp::{Message, SmtpError, SmtpResult, Submitter};

pub const ADDRESS: &str = "me@example.com";
pub const SECRET: &str = "app-password";

pub type TestClient = MailClient<FakeServer, FakeServer>;

/// What the SMTP side observed for one submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub username: String,
    pub envelope_to: Vec<String>,
    pub formatted: String,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    uid: u32,
    raw: Vec<u8>,
    subject: String,
    from: String,
    body: String,
    seen: bool,
    deleted: bool,
}

#[derive(Debug, Default)]
struct State {
    next_uid: u32,
    folders: BTreeMap<String, Vec<StoredMessage>>,
    submissions: Vec<Submission>,
    connections: usize,
    open_sessions: usize,
    reject_auth: bool,
    uidplus: bool,
    fail_fetch: bool,
}

/// Shared handle to the fake server
#[derive(Debug, Clone)]
pub struct FakeServer {
    state: Arc<Mutex<State>>,
}

impl FakeServer {
    pub fn new() -> Self {
        let mut folders = BTreeMap::new();
        folders.insert("INBOX".to_string(), Vec::new());
        Self {
            state: Arc::new(Mutex::new(State {
                next_uid: 1,
                folders,
                uidplus: true,
                ..State::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn client(&self) -> TestClient {
        MailClient::with_transports(Credential::new(ADDRESS, SECRET), self.clone(), self.clone())
    }

    pub fn reject_auth(&self) {
        self.state().reject_auth = true;
    }

    pub fn without_uidplus(&self) {
        self.state().uidplus = false;
    }

    pub fn fail_fetch(&self) {
        self.state().fail_fetch = true;
    }

    pub fn create_folder(&self, folder: &str) {
        self.state().folders.entry(folder.to_string()).or_default();
    }

    /// Append a raw message, returning its UID
    pub fn append(&self, folder: &str, raw: &[u8]) -> u32 {
        let decoded = InboundMessage::from_raw(0, raw);
        let mut state = self.state();
        let uid = state.next_uid;
        state.next_uid += 1;
        state
            .folders
            .entry(folder.to_string())
            .or_default()
            .push(StoredMessage {
                uid,
                raw: raw.to_vec(),
                subject: decoded.subject.unwrap_or_default(),
                from: decoded.from.unwrap_or_default(),
                body: decoded.body,
                seen: false,
                deleted: false,
            });
        uid
    }

    /// Append a simple plain-text message to the INBOX
    pub fn deliver(&self, from: &str, subject: &str, body: &str) -> u32 {
        let raw = format!(
            "From: {from}\r\nTo: {ADDRESS}\r\nSubject: {subject}\r\n\
             Date: Mon, 7 Oct 2024 09:00:00 +0000\r\n\r\n{body}\r\n"
        );
        self.append("INBOX", raw.as_bytes())
    }

    pub fn set_seen(&self, uid: u32) {
        self.with_message(uid, |m| m.seen = true);
    }

    pub fn set_deleted(&self, uid: u32) {
        self.with_message(uid, |m| m.deleted = true);
    }

    fn with_message(&self, uid: u32, f: impl FnOnce(&mut StoredMessage)) {
        let mut state = self.state();
        let message = state
            .folders
            .values_mut()
            .flat_map(|msgs| msgs.iter_mut())
            .find(|m| m.uid == uid)
            .expect("uid exists");
        f(message);
    }

    pub fn is_seen(&self, uid: u32) -> bool {
        self.find(uid).map(|m| m.seen).unwrap_or(false)
    }

    pub fn exists(&self, uid: u32) -> bool {
        self.find(uid).is_some()
    }

    fn find(&self, uid: u32) -> Option<StoredMessage> {
        self.state()
            .folders
            .values()
            .flatten()
            .find(|m| m.uid == uid)
            .cloned()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state().submissions.clone()
    }

    pub fn connections(&self) -> usize {
        self.state().connections
    }

    pub fn open_sessions(&self) -> usize {
        self.state().open_sessions
    }
}

#[async_trait]
impl MailStoreConnector for FakeServer {
    type Store = FakeSession;

    async fn connect(&self, username: &str, password: &str) -> ImapResult<FakeSession> {
        let mut state = self.state();
        state.connections += 1;
        if state.reject_auth || username != ADDRESS || password != SECRET {
            return Err(ImapError::AuthenticationFailed(
                "[AUTHENTICATIONFAILED] Invalid credentials".into(),
            ));
        }
        state.open_sessions += 1;

        Ok(FakeSession {
            server: self.clone(),
            selected: None,
            closed: false,
        })
    }
}

#[async_trait]
impl Submitter for FakeServer {
    async fn submit(&self, username: &str, password: &str, message: Message) -> SmtpResult<()> {
        {
            let mut state = self.state();
            state.connections += 1;
            if state.reject_auth || username != ADDRESS || password != SECRET {
                return Err(SmtpError::AuthenticationFailed(
                    "535 5.7.8 Username and Password not accepted".into(),
                ));
            }
        }

        let raw = message.formatted();
        let submission = Submission {
            username: username.to_string(),
            envelope_to: message
                .envelope()
                .to()
                .iter()
                .map(|a| a.to_string())
                .collect(),
            formatted: String::from_utf8_lossy(&raw).into_owned(),
        };
        self.state().submissions.push(submission);
        self.append("INBOX", &raw);
        Ok(())
    }
}

/// One open retrieval session
pub struct FakeSession {
    server: FakeServer,
    selected: Option<String>,
    closed: bool,
}

impl FakeSession {
    fn folder<'a>(&self, state: &'a mut State) -> ImapResult<&'a mut Vec<StoredMessage>> {
        if self.closed {
            return Err(ImapError::NotConnected);
        }
        let name = self
            .selected
            .as_ref()
            .ok_or_else(|| ImapError::ServerError("No folder selected".into()))?;
        state
            .folders
            .get_mut(name)
            .ok_or_else(|| ImapError::FolderNotFound(name.clone()))
    }
}

#[async_trait]
impl MailStore for FakeSession {
    async fn select(&mut self, folder: &str) -> ImapResult<()> {
        if !self.server.state().folders.contains_key(folder) {
            return Err(ImapError::FolderNotFound(folder.to_string()));
        }
        self.selected = Some(folder.to_string());
        Ok(())
    }

    async fn search(&mut self, criteria: &str) -> ImapResult<Vec<u32>> {
        let keys = parse_criteria(criteria)?;
        let mut state = self.server.state();
        let messages = self.folder(&mut state)?;
        Ok(messages
            .iter()
            .filter(|m| keys.iter().all(|k| k.matches(m)))
            .map(|m| m.uid)
            .collect())
    }

    async fn fetch_raw(&mut self, uid: u32) -> ImapResult<Option<Vec<u8>>> {
        let mut state = self.server.state();
        if state.fail_fetch {
            return Err(ImapError::ServerError("connection reset".into()));
        }
        let messages = self.folder(&mut state)?;
        Ok(messages.iter().find(|m| m.uid == uid).map(|m| m.raw.clone()))
    }

    async fn add_flags(&mut self, uids: &[u32], flags: &[Flag]) -> ImapResult<()> {
        let mut state = self.server.state();
        let messages = self.folder(&mut state)?;
        for message in messages.iter_mut().filter(|m| uids.contains(&m.uid)) {
            for flag in flags {
                match flag {
                    Flag::Seen => message.seen = true,
                    Flag::Deleted => message.deleted = true,
                }
            }
        }
        Ok(())
    }

    async fn supports_uid_expunge(&mut self) -> ImapResult<bool> {
        Ok(self.server.state().uidplus)
    }

    async fn uid_expunge(&mut self, uids: &[u32]) -> ImapResult<()> {
        let mut state = self.server.state();
        let messages = self.folder(&mut state)?;
        messages.retain(|m| !(m.deleted && uids.contains(&m.uid)));
        Ok(())
    }

    async fn expunge(&mut self) -> ImapResult<()> {
        let mut state = self.server.state();
        let messages = self.folder(&mut state)?;
        messages.retain(|m| !m.deleted);
        Ok(())
    }

    // LOGOUT ends the session without expunging (RFC 3501 6.1.3)
    async fn logout(&mut self) -> ImapResult<()> {
        if !self.closed {
            self.closed = true;
            self.server.state().open_sessions -= 1;
        }
        Ok(())
    }
}

#[derive(Debug)]
enum SearchKey {
    All,
    Seen,
    Unseen,
    Deleted,
    Subject(String),
    Body(String),
    From(String),
    Or(Box<SearchKey>, Box<SearchKey>),
}

impl SearchKey {
    fn matches(&self, m: &StoredMessage) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };
        match self {
            SearchKey::All => true,
            SearchKey::Seen => m.seen,
            SearchKey::Unseen => !m.seen,
            SearchKey::Deleted => m.deleted,
            SearchKey::Subject(s) => contains(&m.subject, s),
            SearchKey::Body(s) => contains(&m.body, s),
            SearchKey::From(s) => contains(&m.from, s),
            SearchKey::Or(a, b) => a.matches(m) || b.matches(m),
        }
    }
}

fn parse_criteria(criteria: &str) -> ImapResult<Vec<SearchKey>> {
    let tokens = tokenize(criteria)?;
    let mut iter = tokens.into_iter();
    let mut keys = Vec::new();
    while let Some(token) = iter.next() {
        keys.push(parse_key(token, &mut iter)?);
    }
    Ok(keys)
}

fn parse_key(token: String, rest: &mut impl Iterator<Item = String>) -> ImapResult<SearchKey> {
    Ok(match token.to_ascii_uppercase().as_str() {
        "ALL" => SearchKey::All,
        "SEEN" => SearchKey::Seen,
        "UNSEEN" => SearchKey::Unseen,
        "DELETED" => SearchKey::Deleted,
        "CHARSET" => {
            next_token(rest, "CHARSET")?;
            SearchKey::All
        }
        "SUBJECT" => SearchKey::Subject(next_token(rest, "SUBJECT")?),
        "BODY" => SearchKey::Body(next_token(rest, "BODY")?),
        "FROM" => SearchKey::From(next_token(rest, "FROM")?),
        "OR" => {
            let first = next_token(rest, "OR")?;
            let a = parse_key(first, rest)?;
            let second = next_token(rest, "OR")?;
            let b = parse_key(second, rest)?;
            SearchKey::Or(Box::new(a), Box::new(b))
        }
        other => return Err(ImapError::ServerError(format!("BAD unknown key {}", other))),
    })
}

fn next_token(rest: &mut impl Iterator<Item = String>, key: &str) -> ImapResult<String> {
    rest.next()
        .ok_or_else(|| ImapError::ServerError(format!("BAD missing argument for {}", key)))
}

fn tokenize(criteria: &str) -> ImapResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = criteria.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some('\\') => value.extend(chars.next()),
                    Some('"') => break,
                    Some(ch) => value.push(ch),
                    None => return Err(ImapError::ServerError("BAD unterminated string".into())),
                }
            }
            tokens.push(value);
        } else {
            let mut atom = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                atom.push(ch);
                chars.next();
            }
            tokens.push(atom);
        }
    }
    Ok(tokens)
}
