#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use p2p_trade_client::{
    ActionAck, Alert, ChatRef, ClientError, DeadlineWindows, DisputeRequest, Message, MessageKind,
    OfferSnapshot, OfferType, RealtimeHub, SessionUser, Trade, TradeAction, TradeApi,
    TradeInteractorImpl, TradePresenterImpl, TradeScreen, TradeStatus, TradeView, UserRef,
};

pub const BUYER: &str = "u1";
pub const SELLER: &str = "u2";

pub fn trade(id: &str, status: TradeStatus) -> Trade {
    Trade {
        id: id.to_string(),
        status,
        buyer: UserRef {
            id: BUYER.to_string(),
            username: "alice".to_string(),
            trust_count: Some(2),
        },
        seller: UserRef {
            id: SELLER.to_string(),
            username: "bob".to_string(),
            trust_count: Some(7),
        },
        offer: OfferSnapshot {
            offer_type: OfferType::Sell,
            crypto: "USDT".to_string(),
            currency: "NGN".to_string(),
            payment_method: "Bank Transfer".to_string(),
            margin: 1.5,
            terms: Some("Pay within 30 minutes".to_string()),
        },
        amount_fiat: 150_000.0,
        amount_crypto: 100.0,
        trade_price: 1500.0,
        created_at: Utc::now() - Duration::minutes(20),
        expires_at: None,
        paid_at: None,
        dispute_opened_at: None,
        updated_at: None,
        chat: ChatRef {
            id: "c1".to_string(),
        },
    }
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap() + Duration::seconds(seconds)
}

pub fn message(id: &str, sender: &str, created_at: DateTime<Utc>) -> Message {
    Message {
        id: id.to_string(),
        kind: MessageKind::User,
        sender_id: Some(sender.to_string()),
        content: format!("hello from {}", sender),
        attachment: None,
        created_at,
        chat: Some("c1".to_string()),
    }
}

/// In-memory backend
pub struct FakeTradeApi {
    pub trade: Mutex<Trade>,
    pub messages: Mutex<Vec<Message>>,
    pub reject_with: Mutex<Option<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeTradeApi {
    pub fn new(trade: Trade, messages: Vec<Message>) -> Self {
        Self {
            trade: Mutex::new(trade),
            messages: Mutex::new(messages),
            reject_with: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reject(&self, message: &str) {
        *self.reject_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn mutation(&self, call: String) -> Result<ActionAck> {
        self.calls.lock().unwrap().push(call);
        match self.reject_with.lock().unwrap().clone() {
            Some(message) => Err(ClientError::rejected(Some(400), message).into()),
            None => Ok(ActionAck {
                message: Some("OK".to_string()),
            }),
        }
    }
}

#[async_trait]
impl TradeApi for FakeTradeApi {
    async fn fetch_trade(&self, trade_id: &str) -> Result<Trade> {
        self.calls.lock().unwrap().push(format!("fetch_trade:{}", trade_id));
        Ok(self.trade.lock().unwrap().clone())
    }

    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.calls.lock().unwrap().push(format!("fetch_messages:{}", chat_id));
        Ok(self.messages.lock().unwrap().clone())
    }

    async fn mark_as_paid(&self, trade_id: &str) -> Result<ActionAck> {
        self.mutation(format!("mark_as_paid:{}", trade_id))
    }

    async fn release_crypto(&self, trade_id: &str) -> Result<ActionAck> {
        self.mutation(format!("release_crypto:{}", trade_id))
    }

    async fn cancel_trade(&self, trade_id: &str) -> Result<ActionAck> {
        self.mutation(format!("cancel_trade:{}", trade_id))
    }

    async fn open_dispute(&self, request: DisputeRequest) -> Result<ActionAck> {
        self.mutation(format!("open_dispute:{}:{}", request.trade_id, request.reason))
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> Result<Message> {
        self.calls.lock().unwrap().push(format!("send_message:{}", chat_id));
        let mut stored = message("sent-1", BUYER, Utc::now());
        stored.content = content.to_string();
        self.messages.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn trust_user(&self, user_id: &str) -> Result<ActionAck> {
        self.mutation(format!("trust_user:{}", user_id))
    }
}

/// View that records what it was asked to show
#[derive(Default)]
pub struct RecordingView {
    pub screens: Mutex<Vec<TradeScreen>>,
    pub alerts: Mutex<Vec<Alert>>,
    pub successes: Mutex<Vec<TradeAction>>,
    pub fail_processing: Mutex<bool>,
}

impl RecordingView {
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TradeView for RecordingView {
    async fn render_trade(&self, screen: &TradeScreen) -> Result<()> {
        self.screens.lock().unwrap().push(screen.clone());
        Ok(())
    }

    async fn render_messages(&self, _messages: &[&Message], _local_user_id: &str) -> Result<()> {
        Ok(())
    }

    async fn display_processing(&self, action: TradeAction) -> Result<()> {
        if *self.fail_processing.lock().unwrap() {
            anyhow::bail!("view is gone while showing {}", action);
        }
        Ok(())
    }

    async fn display_success(&self, action: TradeAction, _message: Option<&str>) -> Result<()> {
        self.successes.lock().unwrap().push(action);
        Ok(())
    }

    async fn display_alert(&self, alert: &Alert) -> Result<()> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

pub struct Screen {
    pub api: Arc<FakeTradeApi>,
    pub view: Arc<RecordingView>,
    pub hub: Arc<RealtimeHub>,
    pub commands: tokio::sync::mpsc::UnboundedReceiver<p2p_trade_client::RealtimeCommand>,
    pub presenter: Presenter,
}

pub fn windows() -> DeadlineWindows {
    DeadlineWindows {
        payment: Duration::minutes(30),
        dispute_grace: Duration::minutes(10),
        support: Duration::minutes(60),
    }
}

pub type Presenter = TradePresenterImpl<TradeInteractorImpl, RecordingView>;

/// A presenter with its own fake backend and view, attached to `hub`
pub fn presenter_on(
    hub: &Arc<RealtimeHub>,
    local_user_id: &str,
    trade: Trade,
    messages: Vec<Message>,
) -> (Arc<FakeTradeApi>, Arc<RecordingView>, Presenter) {
    let api = Arc::new(FakeTradeApi::new(trade, messages));
    let view = Arc::new(RecordingView::default());

    let presenter = TradePresenterImpl::new(
        Arc::new(TradeInteractorImpl::new(api.clone())),
        view.clone(),
        hub.clone(),
        SessionUser {
            id: local_user_id.to_string(),
            username: local_user_id.to_string(),
        },
        windows(),
    );
    (api, view, presenter)
}

/// A trade screen for `local_user_id` backed by fakes
pub fn screen(local_user_id: &str, trade: Trade, messages: Vec<Message>) -> Screen {
    let (hub, commands) = RealtimeHub::new(16);
    let hub = Arc::new(hub);
    let (api, view, presenter) = presenter_on(&hub, local_user_id, trade, messages);

    Screen {
        api,
        view,
        hub,
        commands,
        presenter,
    }
}
