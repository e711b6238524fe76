use log::{info, warn};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::channel::RealtimeChannel;
use super::events::{RealtimeCommand, RealtimeEvent};

/// What a subscription hands back to the screen
#[derive(Debug, Clone)]
pub enum Delivery {
    Event(RealtimeEvent),
    /// The listener fell behind and `n` events were lost; state should be refetched
    Missed(u64),
}

/// Room membership and listener for one trade screen.
///
/// Joins the chat and trade rooms on open; leaves both and detaches the
/// listener on close or drop.
pub struct RoomSubscription {
    channel: Arc<dyn RealtimeChannel>,
    chat_id: String,
    trade_id: String,
    receiver: Option<broadcast::Receiver<RealtimeEvent>>,
}

impl RoomSubscription {
    pub fn open(channel: Arc<dyn RealtimeChannel>, chat_id: &str, trade_id: &str) -> Self {
        // attach before joining so nothing delivered after the join is missed
        let receiver = channel.listen();
        channel.publish(RealtimeCommand::JoinChat(chat_id.to_string()));
        channel.publish(RealtimeCommand::JoinTrade(trade_id.to_string()));
        info!("Joined chat {} and trade {}", chat_id, trade_id);

        Self {
            channel,
            chat_id: chat_id.to_string(),
            trade_id: trade_id.to_string(),
            receiver: Some(receiver),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn trade_id(&self) -> &str {
        &self.trade_id
    }

    pub fn is_open(&self) -> bool {
        self.receiver.is_some()
    }

    /// True when this subscription already covers the given rooms
    pub fn covers(&self, chat_id: &str, trade_id: &str) -> bool {
        self.is_open() && self.chat_id == chat_id && self.trade_id == trade_id
    }

    /// Leave both rooms and detach the listener. Idempotent.
    pub fn close(&mut self) {
        if self.receiver.take().is_some() {
            self.channel
                .publish(RealtimeCommand::LeaveChat(self.chat_id.clone()));
            self.channel
                .publish(RealtimeCommand::LeaveTrade(self.trade_id.clone()));
            info!("Left chat {} and trade {}", self.chat_id, self.trade_id);
        }
    }

    /// Wait for the next delivery. `None` once closed or the channel is gone.
    pub async fn next(&mut self) -> Option<Delivery> {
        let receiver = self.receiver.as_mut()?;
        match receiver.recv().await {
            Ok(event) => Some(Delivery::Event(event)),
            Err(RecvError::Lagged(missed)) => {
                warn!("Realtime listener lagged, {} events missed", missed);
                Some(Delivery::Missed(missed))
            }
            Err(RecvError::Closed) => None,
        }
    }

    /// Next delivery if one is already queued
    pub fn try_next(&mut self) -> Option<Delivery> {
        let receiver = self.receiver.as_mut()?;
        match receiver.try_recv() {
            Ok(event) => Some(Delivery::Event(event)),
            Err(TryRecvError::Lagged(missed)) => {
                warn!("Realtime listener lagged, {} events missed", missed);
                Some(Delivery::Missed(missed))
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
        }
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::channel::RealtimeHub;
    use crate::realtime::events::Room;
    use crate::test_support::user_message;
    use chrono::Utc;

    #[test]
    fn drop_leaves_rooms_and_detaches_listener() {
        let (hub, mut commands) = RealtimeHub::new(16);
        let hub = Arc::new(hub);

        {
            let _subscription = RoomSubscription::open(hub.clone(), "c1", "t1");
            assert_eq!(hub.listener_count(), 1);
            assert_eq!(hub.members(&Room::Chat("c1".to_string())), 1);
            assert_eq!(hub.members(&Room::Trade("t1".to_string())), 1);
        }

        assert_eq!(hub.listener_count(), 0);
        assert_eq!(hub.members(&Room::Chat("c1".to_string())), 0);
        assert_eq!(hub.members(&Room::Trade("t1".to_string())), 0);

        let sent: Vec<_> = std::iter::from_fn(|| commands.try_recv().ok()).collect();
        assert_eq!(
            sent,
            vec![
                RealtimeCommand::JoinChat("c1".to_string()),
                RealtimeCommand::JoinTrade("t1".to_string()),
                RealtimeCommand::LeaveChat("c1".to_string()),
                RealtimeCommand::LeaveTrade("t1".to_string()),
            ]
        );
    }

    #[test]
    fn remounting_does_not_accumulate_listeners() {
        let (hub, _commands) = RealtimeHub::new(16);
        let hub = Arc::new(hub);

        for _ in 0..3 {
            let mut subscription = RoomSubscription::open(hub.clone(), "c1", "t1");
            assert_eq!(hub.listener_count(), 1);
            subscription.close();
            subscription.close();
        }
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn delivered_events_reach_the_subscription() {
        let (hub, _commands) = RealtimeHub::new(16);
        let hub = Arc::new(hub);
        let mut subscription = RoomSubscription::open(hub.clone(), "c1", "t1");

        let delivered = hub.deliver(RealtimeEvent::NewMessage(user_message("m1", "u2", Utc::now())));
        assert_eq!(delivered, 1);

        match subscription.next().await {
            Some(Delivery::Event(RealtimeEvent::NewMessage(msg))) => assert_eq!(msg.id, "m1"),
            other => panic!("unexpected delivery: {:?}", other),
        }

        subscription.close();
        assert!(subscription.next().await.is_none());
    }

    #[test]
    fn lagging_listener_reports_missed_events() {
        let (hub, _commands) = RealtimeHub::new(2);
        let hub = Arc::new(hub);
        let mut subscription = RoomSubscription::open(hub.clone(), "c1", "t1");

        for i in 0..4 {
            hub.deliver(RealtimeEvent::NewMessage(user_message(&format!("m{}", i), "u2", Utc::now())));
        }

        assert!(matches!(subscription.try_next(), Some(Delivery::Missed(2))));
    }
}
