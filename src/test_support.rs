use chrono::{DateTime, TimeZone, Utc};

use crate::entity::{
    ChatRef, Message, MessageKind, OfferSnapshot, OfferType, Trade, TradeStatus, UserRef,
};

pub fn sample_trade(id: &str, status: TradeStatus) -> Trade {
    Trade {
        id: id.to_string(),
        status,
        buyer: UserRef {
            id: "u1".to_string(),
            username: "alice".to_string(),
            trust_count: Some(2),
        },
        seller: UserRef {
            id: "u2".to_string(),
            username: "bob".to_string(),
            trust_count: Some(7),
        },
        offer: OfferSnapshot {
            offer_type: OfferType::Sell,
            crypto: "USDT".to_string(),
            currency: "NGN".to_string(),
            payment_method: "Bank Transfer".to_string(),
            margin: 1.5,
            terms: None,
        },
        amount_fiat: 150_000.0,
        amount_crypto: 100.0,
        trade_price: 1500.0,
        created_at: Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap(),
        expires_at: None,
        paid_at: None,
        dispute_opened_at: None,
        updated_at: None,
        chat: ChatRef {
            id: format!("chat-{}", id),
        },
    }
}

pub fn user_message(id: &str, sender: &str, created_at: DateTime<Utc>) -> Message {
    Message {
        id: id.to_string(),
        kind: MessageKind::User,
        sender_id: Some(sender.to_string()),
        content: format!("message {}", id),
        attachment: None,
        created_at,
        chat: None,
    }
}
