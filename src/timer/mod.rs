pub mod countdown;
pub mod ticker;

pub use countdown::{Countdown, Remaining};
pub use ticker::CountdownTicker;
