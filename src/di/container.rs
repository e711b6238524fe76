use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::api::{HttpTradeApi, TradeApi};
use crate::settings::Settings;
use crate::entity::AuthBlob;
use crate::interactor::TradeInteractorImpl;
use crate::presenter::{DeadlineWindows, TradePresenterImpl};
use crate::realtime::{RealtimeChannel, RealtimeCommand, RealtimeHub};
use crate::view::TradeView;

const REALTIME_BUFFER: usize = 256;

/// ServiceContainer provides access to the dependencies shared by every screen
pub struct ServiceContainer {
    // Core services
    trade_api: Arc<dyn TradeApi + Send + Sync>,
    hub: Arc<RealtimeHub>,

    // Configuration
    settings: Settings,
    session: AuthBlob,
}

impl ServiceContainer {
    /// Create the container for a signed-in session.
    /// Also returns the command queue the realtime transport should drain.
    pub fn new(
        settings: Settings,
        session: AuthBlob,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RealtimeCommand>)> {
        let trade_api = Arc::new(HttpTradeApi::new(
            &settings.api_base_url,
            &session.token,
            Duration::from_secs(settings.request_timeout_secs),
        )?) as Arc<dyn TradeApi + Send + Sync>;

        let (hub, commands) = RealtimeHub::new(REALTIME_BUFFER);

        let container = Self {
            trade_api,
            hub: Arc::new(hub),
            settings,
            session,
        };
        Ok((container, commands))
    }

    // Accessor methods

    pub fn trade_api(&self) -> Arc<dyn TradeApi + Send + Sync> {
        self.trade_api.clone()
    }

    pub fn hub(&self) -> Arc<RealtimeHub> {
        self.hub.clone()
    }

    pub fn realtime_channel(&self) -> Arc<dyn RealtimeChannel> {
        self.hub.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &AuthBlob {
        &self.session
    }

    /// Build the view-model for one trade screen
    pub fn trade_presenter<V: TradeView>(
        &self,
        view: Arc<V>,
    ) -> TradePresenterImpl<TradeInteractorImpl, V> {
        TradePresenterImpl::new(
            Arc::new(TradeInteractorImpl::new(self.trade_api())),
            view,
            self.realtime_channel(),
            self.session.user.clone(),
            DeadlineWindows::from(&self.settings),
        )
    }
}
