use serde::{Deserialize, Serialize};

use crate::entity::{ClientError, Message};

/// Response shape shared by every backend endpoint:
/// `{ success, data, message }` on success, `{ error, message }` on failure.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: Option<bool>,
    pub error: Option<serde_json::Value>,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_error(&self) -> bool {
        let flagged = match &self.error {
            None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => false,
            Some(_) => true,
        };
        flagged || self.success == Some(false)
    }

    /// Message to show the user for a failed call, passed through unmodified
    pub fn error_message(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match &self.error {
            Some(serde_json::Value::String(text)) => text.clone(),
            _ => "Request failed".to_string(),
        }
    }

    pub fn into_data(self, status: Option<u16>) -> Result<T, ClientError> {
        if self.is_error() {
            return Err(ClientError::rejected(status, self.error_message()));
        }
        self.data
            .ok_or_else(|| ClientError::rejected(status, "Response did not include any data"))
    }

    pub fn into_ack(self, status: Option<u16>) -> Result<ActionAck, ClientError> {
        if self.is_error() {
            return Err(ClientError::rejected(status, self.error_message()));
        }
        Ok(ActionAck {
            message: self.message,
        })
    }
}

/// Successful mutation acknowledgement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionAck {
    pub message: Option<String>,
}

/// Chat history comes back either bare or wrapped in an envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageList {
    Bare(Vec<Message>),
    Wrapped(ApiEnvelope<Vec<Message>>),
}

impl MessageList {
    pub fn into_messages(self, status: Option<u16>) -> Result<Vec<Message>, ClientError> {
        match self {
            MessageList::Bare(messages) => Ok(messages),
            MessageList::Wrapped(envelope) => envelope.into_data(status),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvidenceFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct DisputeRequest {
    pub reason: String,
    pub trade_id: String,
    pub evidence: Option<EvidenceFile>,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageBody<'a> {
    pub content: &'a str,
}
