//! Function-tool definition for agents
//!
//! Agent runtimes take a JSON schema describing a callable tool and, when
//! the model decides to call it, hand back a JSON argument object. This
//! module describes `send_email` and executes such calls.

use mailhelper_imap::MailStoreConnector;
use mailhelper_smtp::{OutgoingMessage, Submitter};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{CoreError, CoreResult, MailClient};

/// Tool name exposed to agents
pub const SEND_EMAIL_TOOL: &str = "send_email";

/// Arguments of a `send_email` call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendEmailArgs {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

impl From<SendEmailArgs> for OutgoingMessage {
    fn from(args: SendEmailArgs) -> Self {
        OutgoingMessage::new(args.to, args.subject, args.body)
    }
}

/// Schema of the `send_email` tool
pub fn send_email_tool() -> Value {
    json!({
        "name": SEND_EMAIL_TOOL,
        "description": "Send an email to the specified recipient.",
        "parameters": {
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": "Recipient email address"
                },
                "subject": {
                    "type": "string",
                    "description": "Email subject"
                },
                "body": {
                    "type": "string",
                    "description": "Plain-text email body"
                }
            },
            "required": ["to", "subject", "body"]
        }
    })
}

/// Execute a `send_email` call; `Ok(false)` when delivery failed
pub async fn invoke_send_email<C, S>(client: &MailClient<C, S>, arguments: Value) -> CoreResult<bool>
where
    C: MailStoreConnector,
    S: Submitter,
{
    let args: SendEmailArgs = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidToolArguments(e.to_string()))?;

    Ok(client.send(&args.into()).await)
}
