//! Scripted stand-ins for real players.

pub mod player;
