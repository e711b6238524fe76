pub mod trade_view;

pub use trade_view::{Alert, ConsoleTradeView, TradeView};
