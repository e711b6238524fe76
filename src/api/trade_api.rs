use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::models::{
    ActionAck, ApiEnvelope, DisputeRequest, MessageList, SendMessageBody,
};
use crate::entity::{ClientError, Message, Trade};

/// Backend endpoints the trade screen depends on
#[async_trait]
pub trait TradeApi: Send + Sync {
    async fn fetch_trade(&self, trade_id: &str) -> Result<Trade>;

    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>>;

    async fn mark_as_paid(&self, trade_id: &str) -> Result<ActionAck>;

    async fn release_crypto(&self, trade_id: &str) -> Result<ActionAck>;

    async fn cancel_trade(&self, trade_id: &str) -> Result<ActionAck>;

    async fn open_dispute(&self, request: DisputeRequest) -> Result<ActionAck>;

    async fn send_message(&self, chat_id: &str, content: &str) -> Result<Message>;

    async fn trust_user(&self, user_id: &str) -> Result<ActionAck>;
}

/// REST implementation with bearer auth
pub struct HttpTradeApi {
    http_client: Client,
    base_url: String,
    token: String,
}

impl HttpTradeApi {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| {
                error!("Backend request failed: {}", e);
                ClientError::from(e)
            })?;

        debug!("Backend responded with {}", response.status());
        Ok(response)
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: Response,
    ) -> Result<(Option<u16>, ApiEnvelope<T>)> {
        let status = response.status();
        let code = Some(status.as_u16());
        let body = response.text().await.map_err(ClientError::from)?;

        match serde_json::from_str::<ApiEnvelope<T>>(&body) {
            Ok(envelope) if !status.is_success() && !envelope.is_error() => {
                // Non-2xx without an error flag still counts as a rejection
                let message = envelope
                    .message
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
                Err(ClientError::rejected(code, message).into())
            }
            Ok(envelope) => Ok((code, envelope)),
            Err(e) if status.is_success() => Err(ClientError::from(e).into()),
            Err(_) => {
                let message = status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string();
                Err(ClientError::rejected(code, message).into())
            }
        }
    }

    async fn post_action(&self, path: &str) -> Result<ActionAck> {
        let response = self.send(self.http_client.post(self.url(path))).await?;
        let (status, envelope) = Self::read_envelope::<serde_json::Value>(response).await?;
        Ok(envelope.into_ack(status)?)
    }
}

#[async_trait]
impl TradeApi for HttpTradeApi {
    async fn fetch_trade(&self, trade_id: &str) -> Result<Trade> {
        info!("Fetching trade {}", trade_id);

        let response = self
            .send(self.http_client.get(self.url(&format!("/trades/{}", trade_id))))
            .await?;
        let (status, envelope) = Self::read_envelope::<Trade>(response).await?;

        Ok(envelope.into_data(status)?)
    }

    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        info!("Fetching messages for chat {}", chat_id);

        let response = self
            .send(
                self.http_client
                    .get(self.url(&format!("/chats/{}/messages", chat_id))),
            )
            .await?;

        let status = response.status();
        let body = response.text().await.map_err(ClientError::from)?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .map(|envelope| envelope.error_message())
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Request failed").to_string());
            return Err(ClientError::rejected(Some(status.as_u16()), message).into());
        }

        let list: MessageList = serde_json::from_str(&body).map_err(ClientError::from)?;
        Ok(list.into_messages(Some(status.as_u16()))?)
    }

    async fn mark_as_paid(&self, trade_id: &str) -> Result<ActionAck> {
        self.post_action(&format!("/trades/{}/paid", trade_id)).await
    }

    async fn release_crypto(&self, trade_id: &str) -> Result<ActionAck> {
        self.post_action(&format!("/trades/{}/release", trade_id))
            .await
    }

    async fn cancel_trade(&self, trade_id: &str) -> Result<ActionAck> {
        self.post_action(&format!("/trades/{}/cancel", trade_id))
            .await
    }

    async fn open_dispute(&self, request: DisputeRequest) -> Result<ActionAck> {
        let mut form = Form::new()
            .text("reason", request.reason)
            .text("tradeId", request.trade_id)
            .text("description", request.description);

        if let Some(evidence) = request.evidence {
            let part = Part::bytes(evidence.bytes)
                .file_name(evidence.file_name)
                .mime_str(&evidence.mime_type)
                .map_err(ClientError::from)?;
            form = form.part("evidence", part);
        }

        let response = self
            .send(self.http_client.post(self.url("/disputes")).multipart(form))
            .await?;
        let (status, envelope) = Self::read_envelope::<serde_json::Value>(response).await?;

        Ok(envelope.into_ack(status)?)
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> Result<Message> {
        let response = self
            .send(
                self.http_client
                    .post(self.url(&format!("/chats/{}/messages", chat_id)))
                    .json(&SendMessageBody { content }),
            )
            .await?;
        let (status, envelope) = Self::read_envelope::<Message>(response).await?;

        Ok(envelope.into_data(status)?)
    }

    async fn trust_user(&self, user_id: &str) -> Result<ActionAck> {
        self.post_action(&format!("/users/{}/trust", user_id)).await
    }
}
