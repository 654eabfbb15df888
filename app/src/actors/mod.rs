//! Actor infrastructure: shared trait, bus helpers, and actor resolution.

pub mod game;
pub mod mock;
pub mod session;
pub mod web;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::broadcast;

use crate::bus::{BusReceiver, BusSender};
use crate::state::SystemState;
use crate::state::config::{GarlandConfig, global_id};
use garland::GarlandMessage;

// ---------------------------------------------------------------------------
// Actor trait
// ---------------------------------------------------------------------------

/// Common trait for self-managed actors. Each actor struct holds its own config;
/// `start()` clones what it needs and spawns a thread.
pub trait Actor: Send + Sync {
    /// Spawn the actor's run loop.
    fn start(&self, state: Arc<SystemState>, sender: BusSender, receiver: BusReceiver);

    /// Request the actor to stop. Default: no-op (actors check the shutdown
    /// flag via `BusReceiver::is_shutdown()`).
    fn stop(&self) {}
}

// ---------------------------------------------------------------------------
// Actor resolution
// ---------------------------------------------------------------------------

/// A concrete actor ready to be started, resolved from config.
pub struct ResolvedActor {
    pub id: String,
    pub name: String,
    pub actor: Box<dyn Actor>,
}

/// Build a flat list of all config-driven actors (sessions, mock players,
/// webservers). The game actor is always on and not listed here. Invalid
/// bind addresses are logged and skipped.
pub fn resolve_actors(config: &GarlandConfig) -> Vec<ResolvedActor> {
    let mut actors = Vec::new();

    for (index, section) in &config.session {
        let id = global_id("session", index);
        actors.push(ResolvedActor {
            id,
            name: section.name.clone(),
            actor: Box::new(session::SessionActor::from_section(section)),
        });
    }

    for (index, section) in &config.mock_player {
        let id = global_id("mock_player", index);
        actors.push(ResolvedActor {
            id,
            name: section.name.clone(),
            actor: Box::new(mock::player::MockPlayerActor::from_section(section)),
        });
    }

    for (index, ws) in &config.webserver {
        let id = global_id("webserver", index);
        match ws.bind.parse::<SocketAddr>() {
            Ok(addr) => {
                actors.push(ResolvedActor {
                    id,
                    name: ws.name.clone(),
                    actor: Box::new(web::WebActor::new(addr)),
                });
            }
            Err(e) => {
                tracing::warn!("webserver '{id}': invalid bind address '{}': {e}", ws.bind);
            }
        }
    }

    actors
}

/// Start a resolved actor: create bus wrappers, call start(), register in state.
pub fn start_actor(
    id: String,
    actor: Box<dyn Actor>,
    state: &Arc<SystemState>,
    bus_tx: &broadcast::Sender<GarlandMessage>,
) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let sender = BusSender::new(id.clone(), bus_tx.clone(), Arc::clone(&shutdown));
    let receiver = sender.subscribe();
    actor.start(Arc::clone(state), sender, receiver);
    state.register_actor(id, actor, shutdown);
}

/// Map of actor IDs to display names from config.
pub fn actor_names(config: &GarlandConfig) -> HashMap<String, String> {
    let mut names = HashMap::from([(game::GAME_ACTOR_ID.to_string(), "Game".to_string())]);
    for (index, section) in &config.session {
        names.insert(global_id("session", index), section.name.clone());
    }
    for (index, section) in &config.mock_player {
        names.insert(global_id("mock_player", index), section.name.clone());
    }
    for (index, ws) in &config.webserver {
        names.insert(global_id("webserver", index), ws.name.clone());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use garland::{MockPlayerSection, WebserverSection};

    #[test]
    fn default_config_resolves_session_and_webserver() {
        let ids: Vec<String> = resolve_actors(&GarlandConfig::default())
            .into_iter()
            .map(|ra| ra.id)
            .collect();
        assert_eq!(ids, vec!["session.0".to_string(), "webserver.0".to_string()]);
    }

    #[test]
    fn bad_bind_address_is_skipped() {
        let mut config = GarlandConfig::default();
        config.session.clear();
        config.webserver.insert(
            "0".into(),
            WebserverSection {
                name: "Broken".into(),
                bind: "not-an-address".into(),
            },
        );
        config.mock_player.insert(
            "1".into(),
            MockPlayerSection {
                name: "Elf".into(),
                structure: None,
                speed: None,
            },
        );
        let resolved = resolve_actors(&config);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, "mock_player.1");
        assert_eq!(resolved[0].name, "Elf");
    }

    #[test]
    fn names_include_the_game_actor() {
        let names = actor_names(&GarlandConfig::default());
        assert_eq!(names.get("game").map(String::as_str), Some("Game"));
        assert_eq!(
            names.get("webserver.0").map(String::as_str),
            Some("Web Server")
        );
    }
}
