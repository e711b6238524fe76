use crate::api::{DisputeRequest, EvidenceFile};
use crate::entity::{
    ClientError, Message, SessionUser, Trade, TradeAction, TradeRole, TradeStatus, WizardStep,
};
use crate::interactor::trade_interactor::{ActionResult, TradeInteractor};
use crate::optimistic;
use crate::realtime::{
    merge_trade, Delivery, MessageLog, RealtimeChannel, RealtimeEvent, RoomSubscription,
    TradeMerge,
};
use crate::settings::Settings;
use crate::timer::{Countdown, Remaining};
use crate::utils;
use crate::view::{Alert, TradeView};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::future;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Deadline windows used by the trade screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadlineWindows {
    pub payment: Duration,
    pub dispute_grace: Duration,
    pub support: Duration,
}

impl From<&Settings> for DeadlineWindows {
    fn from(settings: &Settings) -> Self {
        Self {
            payment: settings.payment_window(),
            dispute_grace: settings.dispute_grace(),
            support: settings.support_window(),
        }
    }
}

/// Ephemeral state owned by one open trade screen
#[derive(Debug, Clone)]
pub struct TradeScreenState {
    pub active_tab: WizardStep,
    pub completed_steps: BTreeSet<WizardStep>,
    pub messages: MessageLog,
    pub current_trade: Option<Trade>,
    pub pending_action: Option<TradeAction>,
    pub counterparty_trust: Option<u32>,
}

impl Default for TradeScreenState {
    fn default() -> Self {
        Self {
            active_tab: WizardStep::StepOne,
            completed_steps: BTreeSet::new(),
            messages: MessageLog::new(),
            current_trade: None,
            pending_action: None,
            counterparty_trust: None,
        }
    }
}

/// Which actions are enabled at a given instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionAvailability {
    pub mark_as_paid: bool,
    pub release_crypto: bool,
    pub cancel_trade: bool,
    pub open_dispute: bool,
    pub trust_counterparty: bool,
    pub dispute_label: String,
}

impl ActionAvailability {
    fn none() -> Self {
        Self {
            mark_as_paid: false,
            release_crypto: false,
            cancel_trade: false,
            open_dispute: false,
            trust_counterparty: false,
            dispute_label: "Dispute locked".to_string(),
        }
    }

    pub fn is_enabled(&self, action: TradeAction) -> bool {
        match action {
            TradeAction::MarkAsPaid => self.mark_as_paid,
            TradeAction::ReleaseCrypto => self.release_crypto,
            TradeAction::CancelTrade => self.cancel_trade,
            TradeAction::OpenDispute => self.open_dispute,
            TradeAction::TrustCounterparty => self.trust_counterparty,
        }
    }
}

/// Everything the view needs to draw the trade screen
#[derive(Debug, Clone)]
pub struct TradeScreen {
    pub trade_id: String,
    pub status: TradeStatus,
    pub role: TradeRole,
    pub active_tab: WizardStep,
    pub completed_steps: BTreeSet<WizardStep>,
    pub actions: ActionAvailability,
    pub payment: Remaining,
    pub dispute: Remaining,
    pub support: Remaining,
    pub counterparty: String,
    pub counterparty_trust: Option<u32>,
    pub amount_fiat: String,
    pub amount_crypto: String,
    pub price: String,
}

/// Trade lifecycle view-model for one screen.
///
/// Owns the local view state, derives role, step and enabled actions from
/// the latest snapshot, merges realtime deliveries and runs mutations.
#[async_trait]
pub trait TradePresenter: Send + Sync {
    fn state(&self) -> &TradeScreenState;
    fn local_user(&self) -> &SessionUser;
    fn role(&self) -> Option<TradeRole>;
    fn is_subscribed(&self) -> bool;

    /// Fetch the trade and its chat, then join the realtime rooms.
    /// A failed trade fetch is shown to the user and returned.
    async fn open(&mut self, trade_id: &str) -> Result<()>;

    /// Leave the realtime rooms. Called when the screen goes away.
    fn close(&mut self);

    /// Wait for the next realtime delivery for this screen
    async fn next_delivery(&mut self) -> Option<Delivery>;

    /// Apply every delivery already queued. Returns how many changed state.
    async fn drain_deliveries(&mut self) -> Result<usize>;

    /// Merge one realtime delivery. Returns whether local state changed.
    async fn handle_delivery(&mut self, delivery: Delivery) -> Result<bool>;

    /// Refetch trade and messages, merging them like push events
    async fn refresh(&mut self) -> Result<bool>;

    /// Anchor of the dispute grace countdown (`paid_at` of the held trade)
    fn dispute_anchor(&self) -> Option<DateTime<Utc>>;

    /// Advance every countdown to `now`, latching expiries
    fn tick(&mut self, now: DateTime<Utc>);

    fn availability(&self, now: DateTime<Utc>) -> ActionAvailability;
    fn screen(&self, now: DateTime<Utc>) -> Option<TradeScreen>;
    async fn render(&self, now: DateTime<Utc>) -> Result<()>;

    async fn mark_as_paid(&mut self, now: DateTime<Utc>) -> Result<bool>;
    async fn release_crypto(&mut self, now: DateTime<Utc>) -> Result<bool>;
    async fn cancel_trade(&mut self, now: DateTime<Utc>) -> Result<bool>;
    async fn open_dispute(
        &mut self,
        reason: &str,
        description: &str,
        evidence: Option<EvidenceFile>,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Post a chat message and merge the stored copy
    async fn send_message(&mut self, content: &str) -> Result<bool>;

    /// Increment the counterparty's trust count before the backend confirms
    async fn trust_counterparty(&mut self) -> Result<bool>;
}

struct Deadlines {
    payment: Countdown,
    dispute: Countdown,
    support: Countdown,
}

pub struct TradePresenterImpl<I, V> {
    interactor: Arc<I>,
    view: Arc<V>,
    channel: Arc<dyn RealtimeChannel>,
    local_user: SessionUser,
    windows: DeadlineWindows,
    state: TradeScreenState,
    deadlines: Deadlines,
    subscription: Option<RoomSubscription>,
}

impl<I, V> TradePresenterImpl<I, V>
where
    I: TradeInteractor + 'static,
    V: TradeView,
{
    pub fn new(
        interactor: Arc<I>,
        view: Arc<V>,
        channel: Arc<dyn RealtimeChannel>,
        local_user: SessionUser,
        windows: DeadlineWindows,
    ) -> Self {
        Self {
            interactor,
            view,
            channel,
            local_user,
            windows,
            state: TradeScreenState::default(),
            deadlines: Deadlines {
                payment: Countdown::new(None, windows.payment),
                dispute: Countdown::new(None, windows.dispute_grace),
                support: Countdown::new(None, windows.support),
            },
            subscription: None,
        }
    }

    fn subscribe(&mut self, chat_id: &str, trade_id: &str) {
        if let Some(subscription) = &self.subscription {
            if subscription.covers(chat_id, trade_id) {
                return;
            }
        }
        if let Some(mut previous) = self.subscription.take() {
            previous.close();
        }
        self.subscription = Some(RoomSubscription::open(
            self.channel.clone(),
            chat_id,
            trade_id,
        ));
    }

    /// Whether a pushed message belongs to the chat of the held trade.
    /// Without a `chat` field it can only be attributed while a single
    /// chat room is joined on the shared channel.
    fn is_for_this_chat(&self, message: &Message) -> bool {
        let Some(trade) = &self.state.current_trade else {
            return false;
        };
        match &message.chat {
            Some(chat) => chat == trade.chat_id(),
            None => self.channel.joined_chats() <= 1,
        }
    }

    /// Replace the held snapshot and re-derive everything from it
    fn apply_snapshot(&mut self, trade: Trade) -> bool {
        match merge_trade(&mut self.state.current_trade, trade) {
            TradeMerge::Replaced => {
                self.sync_from_trade();
                true
            }
            TradeMerge::IgnoredOtherTrade | TradeMerge::IgnoredStale => false,
        }
    }

    fn sync_from_trade(&mut self) {
        let Some(trade) = &self.state.current_trade else {
            return;
        };

        let step = WizardStep::for_status(trade.status);
        self.state.active_tab = step;
        self.state
            .completed_steps
            .extend(step.preceding().iter().copied());

        match trade.expires_at {
            Some(expires_at) => self.deadlines.payment.retarget(Some(expires_at), Duration::zero()),
            None => self
                .deadlines
                .payment
                .retarget(Some(trade.created_at), self.windows.payment),
        }
        self.deadlines.dispute.set_anchor(trade.paid_at);
        self.deadlines.support.set_anchor(trade.dispute_opened_at);

        self.state.counterparty_trust = trade.counterparty(&self.local_user.id).trust_count;

        debug!(
            "Trade {} is {} -> {} for {}",
            trade.id,
            trade.status,
            step,
            TradeRole::derive(trade, &self.local_user.id)
        );
    }

    /// Returns the trade id when `action` may run now, otherwise alerts and returns `None`
    async fn gate(&self, action: TradeAction, now: DateTime<Utc>) -> Result<Option<String>> {
        let trade_id = match &self.state.current_trade {
            Some(trade) if self.availability(now).is_enabled(action) => trade.id.clone(),
            _ => {
                let error: anyhow::Error = ClientError::ActionUnavailable(action.label()).into();
                self.view.display_alert(&Alert::from_error(&error)).await?;
                return Ok(None);
            }
        };
        Ok(Some(trade_id))
    }

    async fn perform(&mut self, action: TradeAction, now: DateTime<Utc>) -> Result<bool> {
        let Some(trade_id) = self.gate(action, now).await? else {
            return Ok(false);
        };

        // in-flight only while the request itself is outstanding
        self.view.display_processing(action).await?;
        self.state.pending_action = Some(action);
        let outcome = self.interactor.execute_action(action, &trade_id).await;
        self.state.pending_action = None;

        self.finish(outcome, now).await
    }

    async fn finish(&mut self, outcome: Result<ActionResult>, now: DateTime<Utc>) -> Result<bool> {
        match outcome {
            Ok(result) if result.success => {
                self.advance_after(result.action);
                self.view
                    .display_success(result.action, result.message.as_deref())
                    .await?;
                self.render(now).await?;
                Ok(true)
            }
            Ok(result) => {
                let message = result
                    .message
                    .unwrap_or_else(|| format!("{} failed", result.action));
                self.view
                    .display_alert(&Alert::new("Error", message))
                    .await?;
                Ok(false)
            }
            Err(e) => {
                self.view.display_alert(&Alert::from_error(&e)).await?;
                Ok(false)
            }
        }
    }

    /// Local step advance after a confirmed mutation. The status itself
    /// only changes with the next snapshot.
    fn advance_after(&mut self, action: TradeAction) {
        let (completed, next): (&[WizardStep], WizardStep) = match action {
            TradeAction::MarkAsPaid | TradeAction::OpenDispute => {
                (&[WizardStep::StepOne], WizardStep::StepTwo)
            }
            TradeAction::ReleaseCrypto => (
                &[WizardStep::StepOne, WizardStep::StepTwo],
                WizardStep::StepThree,
            ),
            TradeAction::CancelTrade => (&[WizardStep::StepOne], WizardStep::StepThree),
            TradeAction::TrustCounterparty => return,
        };

        self.state.completed_steps.extend(completed.iter().copied());
        self.state.active_tab = next;
    }
}

#[async_trait]
impl<I, V> TradePresenter for TradePresenterImpl<I, V>
where
    I: TradeInteractor + 'static,
    V: TradeView,
{
    fn state(&self) -> &TradeScreenState {
        &self.state
    }

    fn local_user(&self) -> &SessionUser {
        &self.local_user
    }

    fn role(&self) -> Option<TradeRole> {
        self.state
            .current_trade
            .as_ref()
            .map(|trade| TradeRole::derive(trade, &self.local_user.id))
    }

    fn is_subscribed(&self) -> bool {
        self.subscription
            .as_ref()
            .map(|subscription| subscription.is_open())
            .unwrap_or(false)
    }

    async fn open(&mut self, trade_id: &str) -> Result<()> {
        let trade = match self.interactor.load_trade(trade_id).await {
            Ok(trade) => trade,
            Err(e) => {
                self.view.display_alert(&Alert::from_error(&e)).await?;
                return Err(e);
            }
        };

        if self
            .state
            .current_trade
            .as_ref()
            .map(|held| held.id != trade.id)
            .unwrap_or(false)
        {
            // different trade on the same screen: start over
            self.state = TradeScreenState::default();
        }

        let chat_id = trade.chat_id().to_string();
        let id = trade.id.clone();
        self.apply_snapshot(trade);
        self.subscribe(&chat_id, &id);

        match self.interactor.load_messages(&chat_id).await {
            Ok(messages) => {
                let added = self.state.messages.merge_all(messages);
                debug!("Loaded {} messages for chat {}", added, chat_id);
            }
            Err(e) => {
                warn!("Failed to load messages for chat {}: {}", chat_id, e);
                self.view.display_alert(&Alert::from_error(&e)).await?;
            }
        }

        self.render(Utc::now()).await
    }

    fn close(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
        }
    }

    async fn next_delivery(&mut self) -> Option<Delivery> {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => None,
        }
    }

    async fn drain_deliveries(&mut self) -> Result<usize> {
        let mut changed = 0;
        loop {
            let Some(delivery) = self.subscription.as_mut().and_then(|s| s.try_next()) else {
                break;
            };
            if self.handle_delivery(delivery).await? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn handle_delivery(&mut self, delivery: Delivery) -> Result<bool> {
        let changed = match delivery {
            Delivery::Event(RealtimeEvent::NewMessage(message)) => {
                if !self.is_for_this_chat(&message) {
                    debug!("Ignoring message {} for another chat", message.id);
                    return Ok(false);
                }
                self.state.messages.merge(message)
            }
            Delivery::Event(RealtimeEvent::NewTrade(trade)) => self.apply_snapshot(trade),
            Delivery::Missed(missed) => {
                info!("Refreshing after {} missed realtime events", missed);
                self.refresh().await?
            }
        };

        if changed {
            self.render(Utc::now()).await?;
        }
        Ok(changed)
    }

    async fn refresh(&mut self) -> Result<bool> {
        let Some((trade_id, chat_id)) = self
            .state
            .current_trade
            .as_ref()
            .map(|t| (t.id.clone(), t.chat_id().to_string()))
        else {
            return Ok(false);
        };

        let (trade, messages) = future::join(
            self.interactor.load_trade(&trade_id),
            self.interactor.load_messages(&chat_id),
        )
        .await;

        let mut changed = false;
        match trade {
            Ok(trade) => changed |= self.apply_snapshot(trade),
            Err(e) => warn!("Refresh of trade {} failed: {}", trade_id, e),
        }
        match messages {
            Ok(messages) => changed |= self.state.messages.merge_all(messages) > 0,
            Err(e) => warn!("Refresh of chat {} failed: {}", chat_id, e),
        }
        Ok(changed)
    }

    fn dispute_anchor(&self) -> Option<DateTime<Utc>> {
        self.deadlines.dispute.anchor()
    }

    fn tick(&mut self, now: DateTime<Utc>) {
        self.deadlines.payment.tick(now);
        self.deadlines.dispute.tick(now);
        self.deadlines.support.tick(now);
    }

    fn availability(&self, now: DateTime<Utc>) -> ActionAvailability {
        let Some(trade) = &self.state.current_trade else {
            return ActionAvailability::none();
        };

        let role = TradeRole::derive(trade, &self.local_user.id);
        let idle = self.state.pending_action.is_none();
        let pending = trade.status == TradeStatus::Pending;
        let disputed = trade.status == TradeStatus::Disputed;
        let terminal = trade.status.is_terminal();
        // honours an expiry latched by an earlier tick
        let grace = self.deadlines.dispute.peek(now);

        let dispute_label = if disputed {
            "Dispute opened".to_string()
        } else if grace.is_expired {
            "Open Dispute".to_string()
        } else if trade.paid_at.is_none() {
            "Dispute locked".to_string()
        } else {
            format!("Dispute available in {}", grace.label())
        };

        ActionAvailability {
            mark_as_paid: idle && role == TradeRole::Buyer && pending,
            release_crypto: idle && role == TradeRole::Seller && !terminal,
            cancel_trade: idle && role == TradeRole::Buyer && pending,
            open_dispute: idle && !disputed && !terminal && grace.is_expired,
            trust_counterparty: true,
            dispute_label,
        }
    }

    fn screen(&self, now: DateTime<Utc>) -> Option<TradeScreen> {
        let trade = self.state.current_trade.as_ref()?;

        Some(TradeScreen {
            trade_id: trade.id.clone(),
            status: trade.status,
            role: TradeRole::derive(trade, &self.local_user.id),
            active_tab: self.state.active_tab,
            completed_steps: self.state.completed_steps.clone(),
            actions: self.availability(now),
            payment: self.deadlines.payment.peek(now),
            dispute: self.deadlines.dispute.peek(now),
            support: self.deadlines.support.peek(now),
            counterparty: trade.counterparty(&self.local_user.id).username.clone(),
            counterparty_trust: self.state.counterparty_trust,
            amount_fiat: utils::format_fiat(trade.amount_fiat, &trade.offer.currency),
            amount_crypto: utils::format_crypto(trade.amount_crypto, &trade.offer.crypto),
            price: format!(
                "{} ({} margin)",
                utils::format_fiat(trade.trade_price, &trade.offer.currency),
                utils::format_margin(trade.offer.margin)
            ),
        })
    }

    async fn render(&self, now: DateTime<Utc>) -> Result<()> {
        let Some(screen) = self.screen(now) else {
            return Ok(());
        };
        self.view.render_trade(&screen).await?;

        let ordered = self.state.messages.ordered();
        self.view
            .render_messages(&ordered, &self.local_user.id)
            .await
    }

    async fn mark_as_paid(&mut self, now: DateTime<Utc>) -> Result<bool> {
        self.perform(TradeAction::MarkAsPaid, now).await
    }

    async fn release_crypto(&mut self, now: DateTime<Utc>) -> Result<bool> {
        self.perform(TradeAction::ReleaseCrypto, now).await
    }

    async fn cancel_trade(&mut self, now: DateTime<Utc>) -> Result<bool> {
        self.perform(TradeAction::CancelTrade, now).await
    }

    async fn open_dispute(
        &mut self,
        reason: &str,
        description: &str,
        evidence: Option<EvidenceFile>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(trade_id) = self.gate(TradeAction::OpenDispute, now).await? else {
            return Ok(false);
        };

        let request = DisputeRequest {
            reason: reason.to_string(),
            trade_id,
            evidence,
            description: description.to_string(),
        };

        self.view.display_processing(TradeAction::OpenDispute).await?;
        self.state.pending_action = Some(TradeAction::OpenDispute);
        let outcome = self.interactor.open_dispute(request).await;
        self.state.pending_action = None;

        self.finish(outcome, now).await
    }

    async fn send_message(&mut self, content: &str) -> Result<bool> {
        let Some(chat_id) = self
            .state
            .current_trade
            .as_ref()
            .map(|trade| trade.chat_id().to_string())
        else {
            return Ok(false);
        };

        match self.interactor.send_message(&chat_id, content).await {
            Ok(message) => {
                let added = self.state.messages.merge(message);
                if added {
                    self.render(Utc::now()).await?;
                }
                Ok(added)
            }
            Err(e) => {
                self.view.display_alert(&Alert::from_error(&e)).await?;
                Ok(false)
            }
        }
    }

    async fn trust_counterparty(&mut self) -> Result<bool> {
        let Some(counterparty_id) = self
            .state
            .current_trade
            .as_ref()
            .map(|trade| trade.counterparty(&self.local_user.id).id.clone())
        else {
            return Ok(false);
        };

        let interactor = self.interactor.clone();
        let outcome = optimistic::apply(
            &mut self.state.counterparty_trust,
            |trust| *trust = Some(trust.unwrap_or(0) + 1),
            async move { interactor.trust_user(&counterparty_id).await },
        )
        .await;

        self.render(Utc::now()).await?;
        match outcome {
            Ok(()) => Ok(true),
            Err(e) => {
                self.view.display_alert(&Alert::from_error(&e)).await?;
                Ok(false)
            }
        }
    }
}
