use crate::api::{DisputeRequest, TradeApi};
use crate::entity::{ClientError, Message, Trade, TradeAction};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

const MAX_DISPUTE_DESCRIPTION: usize = 1000;

/// Outcome of a mutation the backend answered.
/// Backend rejections are reported here, transport failures as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    pub action: TradeAction,
    pub success: bool,
    pub message: Option<String>,
}

#[async_trait]
pub trait TradeInteractor: Send + Sync {
    async fn load_trade(&self, trade_id: &str) -> Result<Trade>;
    async fn load_messages(&self, chat_id: &str) -> Result<Vec<Message>>;
    async fn execute_action(&self, action: TradeAction, trade_id: &str) -> Result<ActionResult>;
    async fn open_dispute(&self, request: DisputeRequest) -> Result<ActionResult>;
    async fn send_message(&self, chat_id: &str, content: &str) -> Result<Message>;
    async fn trust_user(&self, user_id: &str) -> Result<()>;
}

pub struct TradeInteractorImpl {
    api: Arc<dyn TradeApi + Send + Sync>,
}

impl TradeInteractorImpl {
    pub fn new(api: Arc<dyn TradeApi + Send + Sync>) -> Self {
        Self { api }
    }

    fn into_action_result(
        action: TradeAction,
        outcome: Result<crate::api::ActionAck>,
    ) -> Result<ActionResult> {
        match outcome {
            Ok(ack) => {
                info!("{} succeeded", action);
                Ok(ActionResult {
                    action,
                    success: true,
                    message: ack.message,
                })
            }
            Err(e) => match e.downcast::<ClientError>() {
                Ok(ClientError::Rejected { message, .. }) => {
                    warn!("{} rejected by backend: {}", action, message);
                    Ok(ActionResult {
                        action,
                        success: false,
                        message: Some(message),
                    })
                }
                Ok(other) => Err(other.into()),
                Err(e) => Err(e),
            },
        }
    }
}

/// Local checks before a dispute is sent
pub fn validate_dispute(reason: &str, description: &str) -> Result<()> {
    if reason.trim().is_empty() {
        return Err(ClientError::rejected(None, "Please select a reason for the dispute").into());
    }
    if description.chars().count() > MAX_DISPUTE_DESCRIPTION {
        return Err(ClientError::rejected(
            None,
            format!(
                "Description must be at most {} characters",
                MAX_DISPUTE_DESCRIPTION
            ),
        )
        .into());
    }
    Ok(())
}

#[async_trait]
impl TradeInteractor for TradeInteractorImpl {
    async fn load_trade(&self, trade_id: &str) -> Result<Trade> {
        if trade_id.trim().is_empty() {
            return Err(anyhow!("Trade id must not be empty"));
        }
        self.api.fetch_trade(trade_id).await
    }

    async fn load_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.api.fetch_messages(chat_id).await
    }

    async fn execute_action(&self, action: TradeAction, trade_id: &str) -> Result<ActionResult> {
        info!("Executing {} on trade {}", action, trade_id);

        let outcome = match action {
            TradeAction::MarkAsPaid => self.api.mark_as_paid(trade_id).await,
            TradeAction::ReleaseCrypto => self.api.release_crypto(trade_id).await,
            TradeAction::CancelTrade => self.api.cancel_trade(trade_id).await,
            TradeAction::OpenDispute | TradeAction::TrustCounterparty => {
                return Err(anyhow!("{} needs its own request", action));
            }
        };

        Self::into_action_result(action, outcome)
    }

    async fn open_dispute(&self, request: DisputeRequest) -> Result<ActionResult> {
        validate_dispute(&request.reason, &request.description)?;
        info!("Opening dispute on trade {}", request.trade_id);

        let outcome = self.api.open_dispute(request).await;
        Self::into_action_result(TradeAction::OpenDispute, outcome)
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::rejected(None, "Message cannot be empty").into());
        }
        self.api.send_message(chat_id, content).await
    }

    async fn trust_user(&self, user_id: &str) -> Result<()> {
        self.api.trust_user(user_id).await?;
        Ok(())
    }
}
