pub mod channel;
pub mod events;
pub mod merge;
pub mod subscription;

pub use channel::{RealtimeChannel, RealtimeHub};
pub use events::{RealtimeCommand, RealtimeEvent, Room};
pub use merge::{merge_trade, MessageLog, TradeMerge};
pub use subscription::{Delivery, RoomSubscription};
