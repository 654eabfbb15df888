//! Game actor: always-on owner of the local player's `Game`.
//!
//! Runs the fixed-step frame loop on its own thread. Player commands and
//! session snapshots are drained from the bus between frames; effects
//! produced by the simulation are published back as notices, chimes, visual
//! cues and outbound session placements. The latest frame and decoration list
//! are written to the `GameState` store every frame, and a throttled copy of
//! the frame goes out on the bus for presentation clients.

use std::collections::HashMap;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::actors::Actor;
use crate::bus::{BusReceiver, BusSender, PollError};
use crate::state::{GameStateWriter, SystemState};
use garland::sim::{Effect, Game, PlaceOptions, Tuning, WorldLayout};
use garland::{
    ActorState, ActorStatus, GarlandEvent, GarlandMessage, PlayerCommand, SessionEvent, VisualCue,
};

pub const GAME_ACTOR_ID: &str = "game";

/// Presentation frames on the bus are throttled to this interval. The store
/// is still updated every simulation frame.
const FRAME_PUBLISH_INTERVAL: Duration = Duration::from_millis(100);
const TELEMETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Always-on game actor. Not config-driven.
///
/// Holds the sole `GameStateWriter`, so the store always mirrors the one
/// simulation it drives.
pub struct GameActor {
    tuning: Tuning,
    world: WorldLayout,
    writer: Mutex<Option<GameStateWriter>>,
    ready_tx: Mutex<Option<std_mpsc::SyncSender<()>>>,
}

impl GameActor {
    pub fn new(
        tuning: Tuning,
        world: WorldLayout,
        writer: GameStateWriter,
    ) -> (Self, std_mpsc::Receiver<()>) {
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(0);
        let actor = Self {
            tuning,
            world,
            writer: Mutex::new(Some(writer)),
            ready_tx: Mutex::new(Some(ready_tx)),
        };
        (actor, ready_rx)
    }
}

impl Actor for GameActor {
    fn start(&self, _state: Arc<SystemState>, sender: BusSender, receiver: BusReceiver) {
        let writer = self.writer.lock().unwrap_or_else(|e| e.into_inner()).take();
        let ready_tx = self.ready_tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        let (Some(writer), Some(ready_tx)) = (writer, ready_tx) else {
            tracing::warn!("game: start() called more than once, ignoring");
            return;
        };
        let game = Game::new(self.tuning.clone(), self.world.clone());

        std::thread::Builder::new()
            .name(GAME_ACTOR_ID.into())
            .spawn(move || run(game, writer, sender, receiver, ready_tx))
            .expect("failed to spawn game thread");
    }
}

fn telemetry(game: &Game) -> HashMap<String, String> {
    let strand = game.strand();
    HashMap::from([
        ("sim_time_ms".into(), game.now().as_millis().to_string()),
        (
            "strand".into(),
            format!("{}/{}", strand.filled(), strand.capacity()),
        ),
        ("stage".into(), format!("{:?}", game.stage().kind())),
        ("pickups".into(), game.pickups().len().to_string()),
        ("decorations".into(), game.decorations().len().to_string()),
    ])
}

fn run(
    mut game: Game,
    writer: GameStateWriter,
    sender: BusSender,
    mut receiver: BusReceiver,
    ready_tx: std_mpsc::SyncSender<()>,
) {
    let step = game.tuning().frame_step();
    info!(
        "game: running at {} fps with {} pickups",
        game.tuning().frame_rate,
        game.pickups().len()
    );

    // Signal main thread that we're up and polling.
    let _ = ready_tx.send(());
    drop(ready_tx);

    sender.emit(ActorState::new(ActorStatus::Connected, telemetry(&game)));
    writer.set_decorations(game.decorations().iter().cloned().collect());

    let mut next_tick = Instant::now();
    let mut last_publish = Instant::now() - FRAME_PUBLISH_INTERVAL;
    let mut last_telemetry = Instant::now();

    loop {
        let mut decorations_changed = false;
        loop {
            match receiver.poll() {
                Err(PollError::Shutdown) => {
                    info!("game: shutting down");
                    return;
                }
                Ok(None) => break,
                Ok(Some(msg)) => {
                    if msg.source != sender.actor_id() {
                        decorations_changed |= handle_message(&mut game, &msg);
                    }
                }
            }
        }

        // Commands queue effects outside the frame; publish them in order
        // ahead of the frame's own.
        let mut effects = game.take_effects();
        effects.extend(game.update(step));
        for effect in effects {
            decorations_changed |= matches!(effect, Effect::Broadcast(_));
            sender.emit(effect_event(effect));
        }

        let frame = game.frame();
        if last_publish.elapsed() >= FRAME_PUBLISH_INTERVAL {
            sender.emit(frame.clone());
            last_publish = Instant::now();
        }
        writer.set_frame(frame);
        if decorations_changed {
            writer.set_decorations(game.decorations().iter().cloned().collect());
        }

        if last_telemetry.elapsed() >= TELEMETRY_INTERVAL {
            sender.emit(ActorState::new(ActorStatus::Connected, telemetry(&game)));
            last_telemetry = Instant::now();
        }

        next_tick += step;
        let now = Instant::now();
        if next_tick > now {
            std::thread::sleep(next_tick - now);
        } else {
            // Fell behind; drop the backlog instead of spinning to catch up.
            next_tick = now;
        }
    }
}

/// Apply one inbound bus message to the game. Returns whether the local
/// decoration list may have changed.
fn handle_message(game: &mut Game, msg: &GarlandMessage) -> bool {
    match &msg.event {
        GarlandEvent::PlayerCommand(cmd) => apply_command(game, cmd),
        GarlandEvent::Session(SessionEvent::SessionState { snapshot }) => {
            let report = game.apply_snapshot(&snapshot.decorations);
            debug!(
                "game: session state from {}: {} upserted, {} removed, {} pending",
                msg.source, report.upserted, report.removed, report.pending
            );
            true
        }
        _ => false,
    }
}

/// Route a player command to the matching `Game` operation.
pub(crate) fn apply_command(game: &mut Game, cmd: &PlayerCommand) -> bool {
    match cmd {
        PlayerCommand::Move {
            position,
            heading,
            moving,
        } => {
            game.move_avatar((*position).into(), *heading, *moving);
            false
        }
        PlayerCommand::BeginThrow { zone_id } => {
            game.begin_throw(zone_id.as_deref());
            false
        }
        PlayerCommand::ReleaseThrow => {
            game.release_throw();
            false
        }
        PlayerCommand::CancelThrow => {
            game.cancel_throw();
            false
        }
        PlayerCommand::DropBulb => {
            game.drop_bulb();
            false
        }
        PlayerCommand::PlaceDecoration {
            point,
            normal,
            type_id,
            color,
            cabin_id,
        } => {
            let options = PlaceOptions {
                type_id: *type_id,
                color: color.clone(),
                cabin_id: cabin_id.clone(),
                ..Default::default()
            };
            let decoration = game.place_decoration((*point).into(), normal.map(Into::into), options);
            debug!("game: placed {} {}", decoration.type_id, decoration.id);
            true
        }
        PlayerCommand::SelectDecor { type_id, color } => {
            game.select_decor(*type_id, color.clone());
            false
        }
        PlayerCommand::NewGame => {
            info!("game: new round requested");
            game.new_game();
            false
        }
    }
}

/// Bus form of a simulation effect.
fn effect_event(effect: Effect) -> GarlandEvent {
    match effect {
        Effect::Notice(notice) => notice.into(),
        Effect::Chime(chime) => chime.into(),
        Effect::Broadcast(decoration) => SessionEvent::PlaceDecoration { decoration }.into(),
        Effect::Spark { position, color } => VisualCue::Spark {
            position: position.into(),
            color,
        }
        .into(),
        Effect::StructureGlow { structure_id } => VisualCue::StructureGlow { structure_id }.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garland::sim::{Notice, StageKind};
    use garland::{AnchorZone, Decoration, DecorationType, Point3, SessionSnapshot};
    use glam::Vec3;

    fn test_game() -> Game {
        let zones = vec![
            AnchorZone {
                id: "z1".into(),
                structure_id: "cabin-1".into(),
                position: Vec3::new(-2.0, 3.0, 5.0),
                normal: Vec3::Z,
            },
            AnchorZone {
                id: "z2".into(),
                structure_id: "cabin-1".into(),
                position: Vec3::new(2.0, 3.0, 5.0),
                normal: Vec3::Z,
            },
        ];
        let tuning = Tuning {
            seed: Some(11),
            pickup_count: 0,
            ..Default::default()
        };
        Game::new(tuning, WorldLayout::open_field(20.0, 20.0, zones))
    }

    fn command(cmd: PlayerCommand) -> GarlandMessage {
        GarlandMessage::new(cmd).source("ws.deadbeef")
    }

    #[test]
    fn begin_throw_without_bulbs_publishes_a_notice() {
        let mut game = test_game();
        handle_message(
            &mut game,
            &command(PlayerCommand::BeginThrow {
                zone_id: Some("z1".into()),
            }),
        );
        let events: Vec<GarlandEvent> = game.take_effects().into_iter().map(effect_event).collect();
        assert!(matches!(
            events.as_slice(),
            [GarlandEvent::Notice(n)] if n.notice == Notice::CollectBulbsFirst
        ));
        assert_eq!(game.stage().kind(), StageKind::Idle);
    }

    #[test]
    fn placing_a_wreath_goes_out_to_the_session() {
        let mut game = test_game();
        let changed = handle_message(
            &mut game,
            &command(PlayerCommand::PlaceDecoration {
                point: Point3 {
                    x: 1.0,
                    y: 2.0,
                    z: 3.0,
                },
                normal: None,
                type_id: Some(DecorationType::Wreath),
                color: None,
                cabin_id: Some("cabin-1".into()),
            }),
        );
        assert!(changed);
        let events: Vec<GarlandEvent> = game.take_effects().into_iter().map(effect_event).collect();
        let placed: Vec<&Decoration> = events
            .iter()
            .filter_map(|e| match e {
                GarlandEvent::Session(SessionEvent::PlaceDecoration { decoration }) => {
                    Some(decoration)
                }
                _ => None,
            })
            .collect();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].cabin_id, "cabin-1");
        assert!(events.iter().any(|e| matches!(
            e,
            GarlandEvent::Cue(VisualCue::StructureGlow { structure_id }) if structure_id == "cabin-1"
        )));
    }

    #[test]
    fn session_state_replaces_confirmed_decorations() {
        let mut game = test_game();
        let placed = game.place_decoration(Vec3::ONE, None, PlaceOptions::default());
        let snapshot = SessionSnapshot {
            decorations: vec![placed.clone()],
        };
        let msg = GarlandMessage::new(SessionEvent::SessionState { snapshot }).source("session.0");
        assert!(handle_message(&mut game, &msg));
        assert_eq!(game.decorations().len(), 1);

        let empty = GarlandMessage::new(SessionEvent::SessionState {
            snapshot: SessionSnapshot::default(),
        });
        handle_message(&mut game, &empty);
        assert!(game.decorations().is_empty());
    }

    #[test]
    fn move_updates_the_avatar() {
        let mut game = test_game();
        handle_message(
            &mut game,
            &command(PlayerCommand::Move {
                position: Point3 {
                    x: 3.0,
                    y: 0.0,
                    z: -1.0,
                },
                heading: 0.5,
                moving: true,
            }),
        );
        assert_eq!(game.avatar().position, Vec3::new(3.0, 0.0, -1.0));
        assert!(game.avatar().moving);
    }
}
