mod api;
mod config;
mod event;
mod game_state;
mod message;
pub mod sim;

pub use api::*;
pub use config::*;
pub use event::*;
pub use game_state::*;
pub use message::*;
