pub mod models;
pub mod trade_api;

pub use models::{ActionAck, ApiEnvelope, DisputeRequest, EvidenceFile};
pub use trade_api::{HttpTradeApi, TradeApi};
