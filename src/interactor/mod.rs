pub mod session;
pub mod trade_interactor;

pub use session::SessionStore;
pub use trade_interactor::{validate_dispute, ActionResult, TradeInteractor, TradeInteractorImpl};
