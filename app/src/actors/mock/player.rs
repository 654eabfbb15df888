//! Mock player actor: walks the village, fills the strand and hangs strings
//! on one structure without any client attached.
//!
//! Reads the latest frame from the game store and answers with ordinary
//! `PlayerCommand`s on the bus, so it exercises exactly the path a WebSocket
//! client would.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec3;
use tracing::{info, warn};

use crate::actors::Actor;
use crate::bus::{BusReceiver, BusSender, PollError};
use crate::state::SystemState;
use garland::sim::{StageKind, Terrain, Tuning, WorldLayout};
use garland::{ActorState, ActorStatus, HudFrame, MockPlayerSection, PlayerCommand};

const TICK: Duration = Duration::from_millis(100);
const DEFAULT_SPEED: f32 = 4.0;
/// Extra hold past a full charge so the release is never judged too short.
const CHARGE_MARGIN: Duration = Duration::from_millis(100);

pub struct MockPlayerActor {
    pub structure: Option<String>,
    pub speed: f32,
}

impl MockPlayerActor {
    pub fn from_section(section: &MockPlayerSection) -> Self {
        Self {
            structure: section.structure.clone(),
            speed: section
                .speed
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(DEFAULT_SPEED),
        }
    }
}

impl Actor for MockPlayerActor {
    fn start(&self, state: Arc<SystemState>, sender: BusSender, receiver: BusReceiver) {
        let config = state.system.snapshot();
        let world = WorldLayout::from_section(&config.world);
        let tuning = Tuning::from_section(&config.tuning);
        let script = Script::new(world, self.structure.as_deref(), self.speed, &tuning);
        let thread_name = format!("mock:{}", sender.actor_id());

        std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || run(script, state, sender, receiver))
            .expect("failed to spawn mock player thread");
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Roam,
    Charging { since: Duration },
    /// Waiting for the game to show a frame produced after the release.
    Settling { after_frame: u64 },
}

/// The bot's decision logic. Pure: one frame in, commands out.
#[derive(Debug)]
pub struct Script {
    world: WorldLayout,
    zones: Vec<String>,
    pair: usize,
    speed: f32,
    hold: Duration,
    phase: Phase,
    strings: u64,
}

impl Script {
    pub fn new(world: WorldLayout, structure: Option<&str>, speed: f32, tuning: &Tuning) -> Self {
        let target = structure
            .map(str::to_string)
            .or_else(|| world.zones().first().map(|z| z.structure_id.clone()));
        let zones: Vec<String> = world
            .zones()
            .iter()
            .filter(|z| Some(&z.structure_id) == target.as_ref())
            .map(|z| z.id.clone())
            .collect();
        if zones.len() < 2 {
            warn!(
                "mock player: structure {:?} has {} anchor zones, strings need two",
                target,
                zones.len()
            );
        }
        Self {
            world,
            zones,
            pair: 0,
            speed,
            hold: tuning.full_charge + CHARGE_MARGIN,
            phase: Phase::Roam,
            strings: 0,
        }
    }

    /// Throws released so far, counting both ends.
    pub fn strings(&self) -> u64 {
        self.strings
    }

    pub fn step(&mut self, frame: &HudFrame, now: Duration, dt: f32) -> Vec<PlayerCommand> {
        match self.phase.clone() {
            Phase::Charging { since } => {
                if now.saturating_sub(since) < self.hold {
                    return Vec::new();
                }
                self.strings += 1;
                self.phase = Phase::Settling {
                    after_frame: frame.frame,
                };
                vec![PlayerCommand::ReleaseThrow]
            }
            Phase::Settling { after_frame } => {
                if frame.frame > after_frame {
                    self.phase = Phase::Roam;
                }
                Vec::new()
            }
            Phase::Roam => self.roam(frame, now, dt),
        }
    }

    fn roam(&mut self, frame: &HudFrame, now: Duration, dt: f32) -> Vec<PlayerCommand> {
        let can_string = self.zones.len() >= 2;
        match frame.stage {
            StageKind::Idle if can_string && frame.filled >= frame.capacity => {
                let zone = self.zones[self.pair % self.zones.len()].clone();
                self.aim(zone, now)
            }
            StageKind::FirstAttached if can_string => {
                let zone = self.zones[(self.pair + 1) % self.zones.len()].clone();
                self.pair += 1;
                self.aim(zone, now)
            }
            StageKind::Idle if frame.filled < frame.capacity => {
                if frame.pickups.is_empty() {
                    info!("mock player: field is empty, starting a new round");
                    return vec![PlayerCommand::NewGame];
                }
                self.walk(frame, dt).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    fn aim(&mut self, zone: String, now: Duration) -> Vec<PlayerCommand> {
        self.phase = Phase::Charging { since: now };
        vec![PlayerCommand::BeginThrow {
            zone_id: Some(zone),
        }]
    }

    /// One stride toward the nearest pickup on the ground plane.
    fn walk(&self, frame: &HudFrame, dt: f32) -> Option<PlayerCommand> {
        let here = frame.avatar.position;
        let flat = |p: Vec3| Vec3::new(p.x, 0.0, p.z);
        let target = frame
            .pickups
            .iter()
            .map(|p| flat(p.position))
            .min_by(|a, b| {
                a.distance_squared(flat(here))
                    .total_cmp(&b.distance_squared(flat(here)))
            })?;
        let offset = target - flat(here);
        let distance = offset.length();
        if distance < 0.05 {
            return None;
        }
        let dir = offset / distance;
        let mut next = here + dir * (self.speed * dt).min(distance);
        next.y = self.world.sample_height(next.x, next.z);
        Some(PlayerCommand::Move {
            position: next.into(),
            heading: dir.x.atan2(dir.z),
            moving: true,
        })
    }
}

fn run(mut script: Script, state: Arc<SystemState>, sender: BusSender, mut receiver: BusReceiver) {
    let name = sender.actor_id().to_string();
    info!("mock player '{name}': started");
    sender.emit(ActorState::new(ActorStatus::Connected, HashMap::new()));

    let started = Instant::now();
    let mut reported = 0;
    loop {
        // Input only flows outward; drain to notice shutdown.
        if let Err(PollError::Shutdown) = receiver.drain() {
            info!("mock player '{name}': shutting down");
            return;
        }

        if let Some(frame) = state.game.frame() {
            for cmd in script.step(&frame, started.elapsed(), TICK.as_secs_f32()) {
                sender.emit(cmd);
            }
            if script.strings() != reported {
                reported = script.strings();
                sender.emit(ActorState::new(
                    ActorStatus::Connected,
                    HashMap::from([("throws".into(), reported.to_string())]),
                ));
            }
        }

        std::thread::sleep(TICK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::game::apply_command;
    use garland::AnchorZone;
    use garland::sim::Game;

    fn zones() -> Vec<AnchorZone> {
        ["z1", "z2"]
            .iter()
            .enumerate()
            .map(|(i, id)| AnchorZone {
                id: id.to_string(),
                structure_id: "cabin-1".into(),
                position: Vec3::new(-2.0 + 4.0 * i as f32, 3.0, 9.0),
                normal: Vec3::Z,
            })
            .collect()
    }

    #[test]
    fn bot_gathers_a_full_strand_and_hangs_a_string() {
        let world = WorldLayout::open_field(20.0, 20.0, zones());
        let tuning = Tuning {
            seed: Some(5),
            ..Default::default()
        };
        let mut game = Game::new(tuning.clone(), world.clone());
        let mut script = Script::new(world, None, DEFAULT_SPEED, &tuning);
        let step = tuning.frame_step();

        while game.now() < Duration::from_secs(180) && game.decorations().is_empty() {
            let frame = game.frame();
            for cmd in script.step(&frame, game.now(), step.as_secs_f32()) {
                apply_command(&mut game, &cmd);
            }
            game.update(step);
        }

        assert_eq!(game.decorations().len(), 1);
        assert_eq!(script.strings(), 2);
        assert_eq!(game.stage().kind(), StageKind::Idle);
    }

    #[test]
    fn bot_without_two_zones_only_gathers() {
        let world = WorldLayout::open_field(20.0, 20.0, zones()[..1].to_vec());
        let tuning = Tuning {
            seed: Some(9),
            ..Default::default()
        };
        let mut game = Game::new(tuning.clone(), world.clone());
        let mut script = Script::new(world, Some("cabin-1"), DEFAULT_SPEED, &tuning);
        let step = tuning.frame_step();

        while game.now() < Duration::from_secs(60) {
            let frame = game.frame();
            for cmd in script.step(&frame, game.now(), step.as_secs_f32()) {
                assert!(!matches!(cmd, PlayerCommand::BeginThrow { .. }));
                apply_command(&mut game, &cmd);
            }
            game.update(step);
        }
        assert!(game.strand().is_full());
    }

    #[test]
    fn speed_must_be_positive() {
        let actor = MockPlayerActor::from_section(&MockPlayerSection {
            name: "Elf".into(),
            structure: None,
            speed: Some(-1.0),
        });
        assert_eq!(actor.speed, DEFAULT_SPEED);
    }
}
