//! Relay between the finance assistant endpoint and the completion provider.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::Display;
use thiserror::Error;
use tracing::{error, info, warn};
use ts_rs::TS;

use super::claude_api::{ClaudeApiClient, CompletionProvider, Message};

pub const MESSAGE_REQUIRED: &str = "Message is required";
const NOT_CONFIGURED: &str = "assistant is not configured";
const DEFAULT_MAX_TOKENS: u32 = 1024;

const SYSTEM_PREAMBLE: &str = "You are the assistant inside a small-business finance and CRM \
workspace. You help the user understand their bank balances, transactions, audit history and \
sales pipeline. Answer concisely, use the figures provided rather than inventing numbers, and \
say so when the data needed to answer is not available.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    UpstreamFailure(String),
}

impl GatewayError {
    /// HTTP status the endpoint reports for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::UpstreamFailure(_) => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ConversationTurn {
    pub role: Role,
    #[serde(alias = "content")]
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Whatever application data the client wants the assistant to see
/// (balances, recent transactions, pipeline totals).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(transparent)]
pub struct SystemDataSnapshot(#[ts(type = "Record<string, unknown>")] pub serde_json::Map<String, Value>);

impl SystemDataSnapshot {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// System prompt: the fixed preamble, then the snapshot as JSON if there is one.
    pub fn system_prompt(&self) -> String {
        if self.is_empty() {
            return SYSTEM_PREAMBLE.to_string();
        }
        let data = serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string());
        format!("{SYSTEM_PREAMBLE}\n\nCurrent system data:\n```json\n{data}\n```")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct AssistantReply {
    pub reply: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// Stateless single-attempt relay to a [`CompletionProvider`].
#[derive(Clone)]
pub struct AssistantGateway {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl AssistantGateway {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// A gateway that validates requests but has nothing to forward them to.
    pub fn unconfigured() -> Self {
        Self { provider: None }
    }

    /// Use Claude when an API key is available, otherwise run unconfigured.
    pub fn from_api_key(api_key: Option<String>, model: Option<String>) -> Self {
        match api_key.map(|key| ClaudeApiClient::new(key, model)) {
            Some(Ok(client)) => {
                info!(model = %client.model(), "Assistant gateway using Claude");
                Self::new(Arc::new(client))
            }
            Some(Err(e)) => {
                warn!(error = %e, "Assistant gateway disabled");
                Self::unconfigured()
            }
            None => {
                warn!("ANTHROPIC_API_KEY not set; assistant gateway disabled");
                Self::unconfigured()
            }
        }
    }

    pub async fn relay(
        &self,
        message: &str,
        context: &SystemDataSnapshot,
        history: &[ConversationTurn],
    ) -> Result<AssistantReply, GatewayError> {
        if message.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(MESSAGE_REQUIRED.to_string()));
        }

        let Some(provider) = &self.provider else {
            return Err(GatewayError::UpstreamFailure(NOT_CONFIGURED.to_string()));
        };

        let messages = conversation(history, message);
        let response = provider
            .complete(messages, Some(context.system_prompt()), DEFAULT_MAX_TOKENS)
            .await
            .map_err(|e| {
                error!(error = %e, "Assistant completion failed");
                GatewayError::UpstreamFailure(e.to_string())
            })?;

        let reply = response
            .text()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                error!(response_id = %response.id, "Assistant returned no text");
                GatewayError::UpstreamFailure("empty reply from assistant".to_string())
            })?;

        info!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Assistant reply relayed"
        );

        Ok(AssistantReply {
            reply,
            model: response.model,
            usage: TokenUsage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            },
        })
    }
}

/// Prior turns in order, then the new user message. Blank turns are dropped,
/// as are assistant turns before the first user turn.
fn conversation(history: &[ConversationTurn], message: &str) -> Vec<Message> {
    history
        .iter()
        .filter(|turn| !turn.text.trim().is_empty())
        .skip_while(|turn| turn.role == Role::Assistant)
        .map(|turn| match turn.role {
            Role::User => Message::user(turn.text.as_str()),
            Role::Assistant => Message::assistant(turn.text.as_str()),
        })
        .chain(std::iter::once(Message::user(message)))
        .collect()
}
