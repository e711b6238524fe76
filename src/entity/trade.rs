use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade status as reported by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Pending,
    Paid,
    Disputed,
    Completed,
    Cancelled,
}

impl TradeStatus {
    pub const ALL: [TradeStatus; 5] = [
        TradeStatus::Pending,
        TradeStatus::Paid,
        TradeStatus::Disputed,
        TradeStatus::Completed,
        TradeStatus::Cancelled,
    ];

    /// Completed and cancelled trades accept no further actions
    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStatus::Completed | TradeStatus::Cancelled)
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeStatus::Pending => write!(f, "PENDING"),
            TradeStatus::Paid => write!(f, "PAID"),
            TradeStatus::Disputed => write!(f, "DISPUTED"),
            TradeStatus::Completed => write!(f, "COMPLETED"),
            TradeStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Side of the offer a trade was opened against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OfferType {
    Buy,
    Sell,
}

impl std::fmt::Display for OfferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferType::Buy => write!(f, "BUY"),
            OfferType::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub trust_count: Option<u32>,
}

/// Offer terms frozen at the moment the trade was opened
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferSnapshot {
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub crypto: String,
    pub currency: String,
    pub payment_method: String,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub terms: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRef {
    #[serde(alias = "_id")]
    pub id: String,
}

/// Trade snapshot received from the backend. Never mutated locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(alias = "_id")]
    pub id: String,
    pub status: TradeStatus,
    pub buyer: UserRef,
    pub seller: UserRef,
    pub offer: OfferSnapshot,
    pub amount_fiat: f64,
    pub amount_crypto: f64,
    pub trade_price: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dispute_opened_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub chat: ChatRef,
}

impl Trade {
    pub fn chat_id(&self) -> &str {
        &self.chat.id
    }

    /// The other party from the point of view of `local_user_id`
    pub fn counterparty(&self, local_user_id: &str) -> &UserRef {
        if self.buyer.id == local_user_id {
            &self.seller
        } else {
            &self.buyer
        }
    }
}
