mod action;
mod client_error;
mod message;
mod step;
mod trade;
mod user;

pub use action::TradeAction;
pub use client_error::ClientError;
pub use message::{Attachment, Message, MessageKind};
pub use step::{TradeRole, WizardStep};
pub use trade::{ChatRef, OfferSnapshot, OfferType, Trade, TradeStatus, UserRef};
pub use user::{AuthBlob, SessionUser};
