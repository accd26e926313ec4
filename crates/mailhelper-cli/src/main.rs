//! MailHelper - send and read mail for one account from the command line
//!
//! Credentials come from the environment (or a `.env` file). Results are
//! printed as JSON on stdout; logs go to stderr.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mailhelper_core::tool::send_email_tool;
use mailhelper_core::{
    ListOptions, MailClient, OutgoingMessage, SearchQuery, DEFAULT_FOLDER, DEFAULT_LIMIT,
};
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "mailhelper", version, about = "Send and read mail over SMTP and IMAP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a message from the configured account
    Send {
        /// Primary recipient
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
        /// Carbon-copy recipient, repeatable
        #[arg(long)]
        cc: Vec<String>,
        /// Blind carbon-copy recipient, repeatable
        #[arg(long)]
        bcc: Vec<String>,
        /// Send the body as HTML
        #[arg(long)]
        html: bool,
    },
    /// List the newest messages in a folder
    List {
        #[arg(long, default_value = DEFAULT_FOLDER)]
        folder: String,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Only unseen messages
        #[arg(long)]
        unread: bool,
        /// Raw IMAP SEARCH criteria, overrides --unread
        #[arg(long)]
        filter: Option<String>,
    },
    /// Search subjects and bodies for a keyword
    Search {
        keyword: String,
        #[arg(long, default_value = DEFAULT_FOLDER)]
        folder: String,
        /// Do not match the subject
        #[arg(long)]
        no_subject: bool,
        /// Do not match the body
        #[arg(long)]
        no_body: bool,
        /// Only messages from this sender
        #[arg(long)]
        from: Option<String>,
    },
    /// Mark messages as read
    MarkRead {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long, default_value = DEFAULT_FOLDER)]
        folder: String,
    },
    /// Permanently delete messages
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long, default_value = DEFAULT_FOLDER)]
        folder: String,
    },
    /// Print the send_email agent tool definition
    ToolSchema,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mailhelper=info")),
        )
        .init();

    let cli = Cli::parse();

    // Only mail operations need credentials
    let client = || MailClient::from_env().context("Failed to load mail configuration");

    let ok = match cli.command {
        Command::Send {
            to,
            subject,
            body,
            cc,
            bcc,
            html,
        } => {
            let mut message = OutgoingMessage::new(to, subject, body).html(html);
            for address in cc {
                message = message.cc(address);
            }
            for address in bcc {
                message = message.bcc(address);
            }
            let sent = client()?.send(&message).await;
            print_json(&json!({ "sent": sent }))?;
            sent
        }
        Command::List {
            folder,
            limit,
            unread,
            filter,
        } => {
            let mut options = ListOptions::default()
                .folder(folder)
                .limit(limit)
                .unread_only(unread);
            if let Some(filter) = filter {
                options = options.raw_filter(filter);
            }
            let messages = client()?.list(&options).await;
            print_json(&messages)?;
            true
        }
        Command::Search {
            keyword,
            folder,
            no_subject,
            no_body,
            from,
        } => {
            let mut query = SearchQuery::new(keyword)
                .folder(folder)
                .in_subject(!no_subject)
                .in_body(!no_body);
            if let Some(from) = from {
                query = query.from_address(from);
            }
            let messages = client()?.search(&query).await;
            print_json(&messages)?;
            true
        }
        Command::MarkRead { ids, folder } => {
            let marked = client()?.mark_read(&ids, &folder).await;
            print_json(&json!({ "marked_read": marked }))?;
            marked
        }
        Command::Delete { ids, folder } => {
            let deleted = client()?.delete(&ids, &folder).await;
            print_json(&json!({ "deleted": deleted }))?;
            deleted
        }
        Command::ToolSchema => {
            print_json(&send_email_tool())?;
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
