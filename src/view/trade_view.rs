use crate::entity::{ClientError, Message, TradeAction, WizardStep};
use crate::presenter::trade_presenter::TradeScreen;
use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};

const NETWORK_ERROR: &str = "Something went wrong. Please check your connection and try again.";

/// Modal alert with a single dismiss action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Backend messages are passed through unmodified
    pub fn from_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<ClientError>() {
            Some(ClientError::Rejected { message, .. }) => Alert::new("Error", message.clone()),
            Some(ClientError::Transport(_)) => Alert::new("Network error", NETWORK_ERROR),
            Some(ClientError::Decode(_)) => {
                Alert::new("Error", "Unexpected response from the server.")
            }
            Some(ClientError::Session(_)) => {
                Alert::new("Session expired", "Please sign in again.")
            }
            Some(e @ ClientError::ActionUnavailable(_)) => Alert::new("Not available", e.to_string()),
            None => Alert::new("Error", NETWORK_ERROR),
        }
    }
}

#[async_trait]
pub trait TradeView: Send + Sync {
    async fn render_trade(&self, screen: &TradeScreen) -> Result<()>;
    async fn render_messages(&self, messages: &[&Message], local_user_id: &str) -> Result<()>;
    async fn display_processing(&self, action: TradeAction) -> Result<()>;
    async fn display_success(&self, action: TradeAction, message: Option<&str>) -> Result<()>;
    async fn display_alert(&self, alert: &Alert) -> Result<()>;
}

/// Renders the trade screen as plain text on stdout
pub struct ConsoleTradeView;

impl ConsoleTradeView {
    pub fn new() -> Self {
        Self
    }

    fn step_line(screen: &TradeScreen, step: WizardStep, title: &str) -> String {
        let marker = if screen.completed_steps.contains(&step) {
            "[x]"
        } else if screen.active_tab == step {
            "[>]"
        } else {
            "[ ]"
        };
        format!("{} {}", marker, title)
    }
}

impl Default for ConsoleTradeView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradeView for ConsoleTradeView {
    async fn render_trade(&self, screen: &TradeScreen) -> Result<()> {
        let actions = &screen.actions;
        let enabled: Vec<&str> = [
            TradeAction::MarkAsPaid,
            TradeAction::ReleaseCrypto,
            TradeAction::CancelTrade,
            TradeAction::OpenDispute,
        ]
        .iter()
        .filter(|action| actions.is_enabled(**action))
        .map(|action| action.label())
        .collect();

        println!(
            "Trade {} ({}) as {}\n{} for {} @ {}\n{}\n{}\n{}\nPay within: {}  |  {}  |  Support: {}\nCounterparty: {} (trust {})\nActions: {}",
            screen.trade_id,
            screen.status,
            screen.role,
            screen.amount_crypto,
            screen.amount_fiat,
            screen.price,
            Self::step_line(screen, WizardStep::StepOne, "Payment"),
            Self::step_line(screen, WizardStep::StepTwo, "Confirmation"),
            Self::step_line(screen, WizardStep::StepThree, "Done"),
            screen.payment.label(),
            actions.dispute_label,
            screen.support.label(),
            screen.counterparty,
            screen.counterparty_trust.unwrap_or(0),
            if enabled.is_empty() { "none".to_string() } else { enabled.join(", ") },
        );
        Ok(())
    }

    async fn render_messages(&self, messages: &[&Message], local_user_id: &str) -> Result<()> {
        for message in messages {
            let who = if message.is_system() {
                "system"
            } else if message.is_from(local_user_id) {
                "you"
            } else {
                "them"
            };
            println!(
                "  {} {:>6}: {}",
                message.created_at.format("%H:%M"),
                who,
                message.content
            );
        }
        Ok(())
    }

    async fn display_processing(&self, action: TradeAction) -> Result<()> {
        info!("{}...", action);
        println!("{}... Please wait.", action);
        Ok(())
    }

    async fn display_success(&self, action: TradeAction, message: Option<&str>) -> Result<()> {
        println!("✅ {}: {}", action, message.unwrap_or("done"));
        Ok(())
    }

    async fn display_alert(&self, alert: &Alert) -> Result<()> {
        warn!("{}: {}", alert.title, alert.message);
        println!("❌ {}\n{}\n[OK]", alert.title, alert.message);
        Ok(())
    }
}
