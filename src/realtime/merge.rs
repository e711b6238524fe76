use log::debug;
use std::collections::HashSet;

use crate::entity::{Message, Trade};

/// Chat messages merged from the initial fetch and push events.
///
/// Stored in arrival order and de-duplicated by id. Display order is by
/// `created_at` and is computed on demand.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    ids: HashSet<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fetched(messages: Vec<Message>) -> Self {
        let mut log = Self::new();
        log.merge_all(messages);
        log
    }

    /// Append `message` unless a message with the same id is already present.
    /// Returns whether it was appended.
    pub fn merge(&mut self, message: Message) -> bool {
        if self.ids.contains(&message.id) {
            debug!("Discarding duplicate message {}", message.id);
            return false;
        }
        self.ids.insert(message.id.clone());
        self.messages.push(message);
        true
    }

    /// Merge a batch, e.g. a refetch after missed events. Returns how many were new.
    pub fn merge_all(&mut self, messages: impl IntoIterator<Item = Message>) -> usize {
        messages
            .into_iter()
            .filter_map(|message| self.merge(message).then_some(()))
            .count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn arrival_order(&self) -> &[Message] {
        &self.messages
    }

    /// Messages sorted by `created_at` ascending, ties kept in arrival order
    pub fn ordered(&self) -> Vec<&Message> {
        let mut ordered: Vec<&Message> = self.messages.iter().collect();
        ordered.sort_by_key(|message| message.created_at);
        ordered
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeMerge {
    Replaced,
    IgnoredOtherTrade,
    IgnoredStale,
}

/// Replace the held snapshot with a pushed one.
///
/// Last arrival wins, except that pushes for another trade are dropped and,
/// when both snapshots carry `updated_at`, a strictly older push is dropped.
pub fn merge_trade(current: &mut Option<Trade>, incoming: Trade) -> TradeMerge {
    if let Some(held) = current.as_ref() {
        if held.id != incoming.id {
            return TradeMerge::IgnoredOtherTrade;
        }
        if let (Some(held_at), Some(incoming_at)) = (held.updated_at, incoming.updated_at) {
            if incoming_at < held_at {
                debug!(
                    "Ignoring stale snapshot of trade {} ({} < {})",
                    incoming.id, incoming_at, held_at
                );
                return TradeMerge::IgnoredStale;
            }
        }
    }

    *current = Some(incoming);
    TradeMerge::Replaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::MessageKind;
    use crate::test_support::{sample_trade, user_message};
    use crate::entity::TradeStatus;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn same_message_twice_is_kept_once() {
        let base = Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap();
        let mut log = MessageLog::from_fetched(vec![
            user_message("m1", "u1", base),
            user_message("m2", "u2", base + Duration::seconds(5)),
        ]);

        let pushed = user_message("m3", "u1", base + Duration::seconds(10));
        assert!(log.merge(pushed.clone()));
        assert!(!log.merge(pushed));

        let ids: Vec<_> = log.arrival_order().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn display_order_follows_created_at() {
        let t1 = Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap();
        let t2 = t1 + Duration::seconds(1);
        let t3 = t1 + Duration::seconds(2);

        let mut log = MessageLog::new();
        log.merge(user_message("c", "u1", t3));
        log.merge(user_message("a", "u1", t1));
        log.merge(user_message("b", "u2", t2));

        let ordered: Vec<_> = log.ordered().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ordered, vec!["a", "b", "c"]);
        // storage keeps arrival order
        assert_eq!(log.arrival_order()[0].id, "c");
    }

    #[test]
    fn equal_timestamps_keep_arrival_order() {
        let t = Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap();
        let mut log = MessageLog::new();
        log.merge(user_message("second-id-but-first", "u1", t));
        let mut system = user_message("a-system", "u1", t);
        system.kind = MessageKind::System;
        system.sender_id = None;
        log.merge(system);

        let ordered: Vec<_> = log.ordered().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ordered, vec!["second-id-but-first", "a-system"]);
    }

    #[test]
    fn refetch_merges_only_new_messages() {
        let t = Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap();
        let mut log = MessageLog::from_fetched(vec![user_message("m1", "u1", t)]);

        let added = log.merge_all(vec![
            user_message("m1", "u1", t),
            user_message("m2", "u2", t + Duration::seconds(1)),
        ]);
        assert_eq!(added, 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn pushed_trade_replaces_snapshot() {
        let mut current = Some(sample_trade("t1", TradeStatus::Pending));
        let pushed = sample_trade("t1", TradeStatus::Paid);

        assert_eq!(merge_trade(&mut current, pushed), TradeMerge::Replaced);
        assert_eq!(current.unwrap().status, TradeStatus::Paid);
    }

    #[test]
    fn other_trade_is_ignored() {
        let mut current = Some(sample_trade("t1", TradeStatus::Pending));
        let pushed = sample_trade("t2", TradeStatus::Paid);

        assert_eq!(merge_trade(&mut current, pushed), TradeMerge::IgnoredOtherTrade);
        assert_eq!(current.unwrap().status, TradeStatus::Pending);
    }

    #[test]
    fn older_snapshot_does_not_regress_status() {
        let now = Utc::now();
        let mut held = sample_trade("t1", TradeStatus::Completed);
        held.updated_at = Some(now);
        let mut current = Some(held);

        let mut late = sample_trade("t1", TradeStatus::Paid);
        late.updated_at = Some(now - Duration::seconds(3));

        assert_eq!(merge_trade(&mut current, late), TradeMerge::IgnoredStale);
        assert_eq!(current.unwrap().status, TradeStatus::Completed);
    }

    #[test]
    fn unversioned_push_wins_by_arrival() {
        let mut held = sample_trade("t1", TradeStatus::Completed);
        held.updated_at = Some(Utc::now());
        let mut current = Some(held);

        let pushed = sample_trade("t1", TradeStatus::Paid);
        assert_eq!(merge_trade(&mut current, pushed), TradeMerge::Replaced);
    }
}
