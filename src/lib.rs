pub mod api;
pub mod di;
pub mod entity;
pub mod interactor;
pub mod optimistic;
pub mod presenter;
pub mod realtime;
pub mod settings;
pub mod timer;
pub mod utils;
pub mod view;

#[cfg(test)]
mod test_support;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used items
pub use api::*;
pub use di::*;
pub use entity::*;
pub use interactor::*;
pub use presenter::*;
pub use realtime::*;
pub use settings::Settings;
pub use timer::*;
pub use utils::*;
pub use view::*;
