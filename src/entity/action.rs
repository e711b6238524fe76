use serde::{Deserialize, Serialize};

/// User actions on the trade screen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TradeAction {
    MarkAsPaid,
    ReleaseCrypto,
    CancelTrade,
    OpenDispute,
    TrustCounterparty,
}

impl TradeAction {
    pub fn label(&self) -> &'static str {
        match self {
            TradeAction::MarkAsPaid => "Mark as paid",
            TradeAction::ReleaseCrypto => "Release crypto",
            TradeAction::CancelTrade => "Cancel trade",
            TradeAction::OpenDispute => "Open dispute",
            TradeAction::TrustCounterparty => "Trust",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
