pub mod trade_presenter;

pub use trade_presenter::{
    ActionAvailability, DeadlineWindows, TradePresenter, TradePresenterImpl, TradeScreen,
    TradeScreenState,
};
