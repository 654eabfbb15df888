//! Deterministic game core: pickups, strand, charged throws, two-phase
//! string attachment and decoration sync.
//!
//! Nothing here spawns threads, reads clocks or does I/O. The host feeds
//! elapsed time through [`Game::update`] and acts on the returned
//! [`Effect`]s.

pub mod attachment;
pub mod charge;
pub mod effect;
pub mod flight;
pub mod game;
pub mod pickup;
pub mod player;
pub mod strand;
pub mod sync;
pub mod tuning;
pub mod world;

pub use attachment::{CoilPreview, Stage, StageKind, StringPreview};
pub use charge::ChargeMeter;
pub use effect::{Chime, Effect, Notice};
pub use flight::FlightView;
pub use game::Game;
pub use pickup::{PickupView, SpawnOptions};
pub use sync::{PlaceOptions, SyncState, SyncedDecoration};
pub use tuning::Tuning;
pub use world::{Terrain, WorldLayout};
