//! The per-player game aggregate and its frame loop.

use std::f32::consts::TAU;
use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::attachment::{FinishedString, Stage, StringEvent};
use super::charge::{ChargeRejection, ReleaseOutcome};
use super::effect::{Effect, Notice, Outbox};
use super::flight::{FlightPath, FlightSim, Payload};
use super::pickup::{PickupField, PickupId, SpawnOptions};
use super::player::{Avatar, COIL_TIP_LOCAL, DROP_ORIGIN_LOCAL, PlayerInteractionState};
use super::strand::Strand;
use super::sync::{DecorSelection, DecorationSync, PlaceOptions, ReconcileReport, STRING_GLOW};
use super::tuning::{
    DROP_ARC_HEIGHT, DROP_DISTANCE, DROP_LANDING_THRESHOLD, STRAND_LANDING_THRESHOLD, Tuning,
};
use super::world::{Terrain, WorldLayout};
use crate::{AnchorZone, AvatarView, Color, Decoration, DecorationType, HudFrame};

/// Owns one local player's state together with the world it plays in.
/// Time only moves through [`Game::update`].
#[derive(Debug)]
pub struct Game {
    tuning: Tuning,
    world: WorldLayout,
    pickups: PickupField,
    flights: FlightSim,
    sync: DecorationSync,
    player: PlayerInteractionState,
    rng: StdRng,
    now: Duration,
    frames: u64,
    outbox: Outbox,
}

impl Game {
    pub fn new(tuning: Tuning, world: WorldLayout) -> Self {
        let seed = tuning.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let pickups = PickupField::new(StdRng::seed_from_u64(rng.r#gen()));
        let mut game = Self {
            player: PlayerInteractionState::new(&tuning),
            sync: DecorationSync::new(DecorSelection::new(tuning.decor_type)),
            pickups,
            flights: FlightSim::default(),
            rng,
            now: Duration::ZERO,
            frames: 0,
            outbox: Outbox::default(),
            tuning,
            world,
        };
        game.pickups.spawn_field(&game.world, &game.tuning);
        game
    }

    // -- accessors ----------------------------------------------------------

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn world(&self) -> &WorldLayout {
        &self.world
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn avatar(&self) -> &Avatar {
        &self.player.avatar
    }

    pub fn strand(&self) -> &Strand {
        &self.player.strand
    }

    pub fn stage(&self) -> &Stage {
        self.player.attachment.stage()
    }

    pub fn pickups(&self) -> &PickupField {
        &self.pickups
    }

    pub fn flights(&self) -> &FlightSim {
        &self.flights
    }

    pub fn decorations(&self) -> &DecorationSync {
        &self.sync
    }

    pub fn is_charging(&self) -> bool {
        self.player.charge.is_charging()
    }

    /// Effects queued by commands since the last drain.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        self.outbox.drain()
    }

    // -- commands -----------------------------------------------------------

    pub fn move_avatar(&mut self, position: Vec3, heading: f32, moving: bool) {
        self.player.avatar = Avatar {
            position,
            heading,
            moving,
        };
    }

    /// Start charging a throw at the zone under the cursor. Returns whether
    /// the charge started; rejections are reported as notices.
    pub fn begin_throw(&mut self, zone_id: Option<&str>) -> bool {
        let zone = zone_id.and_then(|id| {
            let zone = self.world.zone(id);
            if zone.is_none() {
                tracing::debug!("game: unknown anchor zone {id}");
            }
            zone.cloned()
        });
        let result = self.player.charge.begin(
            zone,
            &self.player.strand,
            self.player.attachment.stage(),
            self.now,
        );
        match result {
            Ok(()) => {
                self.apply_string(StringEvent::Aim);
                true
            }
            Err(ChargeRejection::AlreadyCharging) => false,
            Err(ChargeRejection::Notify(notice)) => {
                self.outbox.notice(notice);
                false
            }
        }
    }

    /// Let go of the charge. Returns whether a strand was thrown.
    pub fn release_throw(&mut self) -> bool {
        match self.player.charge.release(self.now) {
            ReleaseOutcome::NotCharging => false,
            ReleaseOutcome::TooShort => {
                self.outbox.notice(Notice::ChargeLonger);
                self.apply_string(StringEvent::AimAbandoned);
                false
            }
            ReleaseOutcome::Throw { zone } => self.throw_strand(zone),
        }
    }

    pub fn cancel_throw(&mut self) {
        if self.player.charge.is_charging() {
            self.player.charge.cancel();
            self.apply_string(StringEvent::AimAbandoned);
        }
    }

    /// Toss the most recent bulb a short arc ahead of the avatar, where it
    /// becomes a pickup again.
    pub fn drop_bulb(&mut self) -> bool {
        let Some(color) = self.player.strand.remove_last() else {
            self.outbox.notice(Notice::NothingToDrop);
            return false;
        };
        let avatar = self.player.avatar;
        let mut landing = avatar.position + avatar.forward() * DROP_DISTANCE;
        landing.y = self.world.sample_height(landing.x, landing.z) + 0.02;
        let origin = avatar.local_to_world(DROP_ORIGIN_LOCAL);
        let mut control = origin.lerp(landing, 0.5);
        control.y = origin.y.max(landing.y) + DROP_ARC_HEIGHT;

        self.flights.launch(
            FlightPath::Quadratic {
                start: origin,
                control,
                end: landing,
            },
            self.tuning.drop_duration,
            DROP_LANDING_THRESHOLD,
            Payload::Drop {
                color: color.clone(),
            },
        );
        self.outbox.spark(origin, color);
        true
    }

    /// Place a single-point decoration (wreath, lantern, ...).
    pub fn place_decoration(
        &mut self,
        point: Vec3,
        normal: Option<Vec3>,
        options: PlaceOptions,
    ) -> Decoration {
        self.sync.finalize(point, normal, options, &mut self.outbox)
    }

    pub fn select_decor(&mut self, type_id: DecorationType, color: Option<Color>) {
        let color = color.unwrap_or_else(|| self.sync.selection().color.clone());
        self.sync.set_selection(DecorSelection { type_id, color });
    }

    /// Fresh field and per-player state. Placed decorations belong to the
    /// session and are kept.
    pub fn new_game(&mut self) {
        self.flights.clear();
        self.player.reset();
        self.pickups.spawn_field(&self.world, &self.tuning);
        tracing::debug!("game: new round");
    }

    pub fn apply_snapshot(&mut self, decorations: &[Decoration]) -> ReconcileReport {
        self.sync.reconcile(decorations)
    }

    pub fn spawn_pickup(&mut self, options: SpawnOptions) -> PickupId {
        self.pickups.spawn_one(options, &self.world, &self.tuning)
    }

    // -- frame --------------------------------------------------------------

    /// Advance one frame: pickups, charge, flights, landings, then segments.
    pub fn update(&mut self, delta: Duration) -> Vec<Effect> {
        self.now += delta;
        self.frames += 1;

        self.pickups.update(
            self.now,
            delta.as_secs_f32(),
            self.player.collector(),
            &self.tuning,
            &mut self.outbox,
        );

        self.player.charge.tick(self.now);

        for landing in self.flights.update(delta) {
            match landing.payload {
                Payload::Strand { zone } => self.apply_string(StringEvent::Landed {
                    flight: landing.flight,
                    zone,
                }),
                Payload::Drop { color } => {
                    let p = landing.position;
                    let base = self.world.sample_height(p.x, p.z) + self.tuning.hover_offset;
                    let options = SpawnOptions {
                        color: Some(color),
                        position: Some(p),
                        base_y: Some(base),
                        rest_height: Some(base),
                        immune_until: self.now + self.tuning.drop_immunity,
                        ..Default::default()
                    };
                    self.pickups.spawn_one(options, &self.world, &self.tuning);
                }
            }
        }

        self.player
            .attachment
            .advance_segments(&self.flights, self.tuning.bulb_spacing);

        self.outbox.drain()
    }

    pub fn frame(&self) -> HudFrame {
        let strand = &self.player.strand;
        let attachment = &self.player.attachment;
        let avatar = &self.player.avatar;
        HudFrame {
            frame: self.frames,
            time_ms: self.now.as_millis() as u64,
            sockets: strand.sockets().to_vec(),
            filled: strand.filled(),
            capacity: strand.capacity(),
            charge: self.player.charge.meter(),
            stage: attachment.stage().kind(),
            coil: attachment.coil(),
            avatar: AvatarView {
                position: avatar.position,
                heading: avatar.heading,
                moving: avatar.moving,
            },
            pickups: self.pickups.views(),
            flights: self.flights.views(),
            segments: attachment
                .segments()
                .iter()
                .map(|s| s.points.iter().copied().collect())
                .collect(),
            preview: attachment.preview(avatar.local_to_world(COIL_TIP_LOCAL)),
            decorations: self.sync.len(),
        }
    }

    // -- internals ----------------------------------------------------------

    fn throw_strand(&mut self, zone: AnchorZone) -> bool {
        let coil_tip = self.player.avatar.local_to_world(COIL_TIP_LOCAL);
        let origin = match self.player.attachment.stage() {
            Stage::AimingFirst => {
                self.player
                    .attachment
                    .capture_pattern(self.player.strand.sockets());
                self.player.strand.consume_all();
                coil_tip
            }
            Stage::AimingSecond { first } => first.position,
            other => {
                tracing::warn!("game: release in unexpected stage {:?}", other.kind());
                return false;
            }
        };

        let flight = self.flights.launch(
            FlightPath::Linear {
                from: origin,
                to: zone.position,
            },
            self.tuning.throw_duration,
            STRAND_LANDING_THRESHOLD,
            Payload::Strand { zone: zone.clone() },
        );
        let wiggle = self.rng.r#gen::<f32>() * TAU;
        self.player
            .attachment
            .start_segment(flight, origin, zone.position, wiggle);
        self.apply_string(StringEvent::Released { flight, zone });
        true
    }

    fn apply_string(&mut self, event: StringEvent) {
        let applied = self.player.attachment.apply(event);
        if let Some(finished) = applied.finished {
            self.place_string(finished);
        }
        for notice in applied.notices {
            self.outbox.notice(notice);
        }
    }

    fn place_string(&mut self, finished: FinishedString) {
        let FinishedString {
            first,
            second,
            pattern,
        } = finished;
        let options = PlaceOptions {
            type_id: Some(DecorationType::StringLights),
            colors: Some(pattern),
            anchor_points: Some(vec![first.position.into(), second.position.into()]),
            cabin_id: Some(second.structure_id.clone()),
            glow: Some(STRING_GLOW),
            ..Default::default()
        };
        self.sync
            .finalize(first.position, Some(second.normal), options, &mut self.outbox);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::attachment::StageKind;

    fn zone(id: &str, structure: &str, x: f32) -> AnchorZone {
        AnchorZone {
            id: id.into(),
            structure_id: structure.into(),
            position: Vec3::new(x, 3.0, 6.0),
            normal: Vec3::Z,
        }
    }

    fn game() -> Game {
        let tuning = Tuning {
            pickup_count: 0,
            seed: Some(11),
            ..Default::default()
        };
        let world = WorldLayout::open_field(
            30.0,
            30.0,
            vec![zone("z1", "cabin-1", -2.0), zone("z2", "cabin-1", 2.0)],
        );
        Game::new(tuning, world)
    }

    fn fill_strand(game: &mut Game) {
        for _ in 0..game.tuning().strand_capacity {
            game.spawn_pickup(SpawnOptions {
                position: Some(Vec3::new(0.3, 0.0, 0.0)),
                ..Default::default()
            });
        }
        game.update(Duration::from_millis(16));
    }

    fn run(game: &mut Game, ms: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        for _ in 0..ms / 10 {
            effects.extend(game.update(Duration::from_millis(10)));
        }
        effects
    }

    #[test]
    fn nearby_pickups_fill_the_strand() {
        let mut g = game();
        fill_strand(&mut g);
        assert!(g.strand().is_full());
        assert!(g.pickups().is_empty());
    }

    #[test]
    fn begin_without_bulbs_is_a_notice() {
        let mut g = game();
        assert!(!g.begin_throw(Some("z1")));
        assert_eq!(
            g.take_effects(),
            vec![Effect::Notice(Notice::CollectBulbsFirst)]
        );
        assert_eq!(g.stage(), &Stage::Idle);
    }

    #[test]
    fn unknown_zone_means_no_target() {
        let mut g = game();
        fill_strand(&mut g);
        assert!(!g.begin_throw(Some("nowhere")));
        assert_eq!(g.take_effects(), vec![Effect::Notice(Notice::NoTarget)]);
    }

    #[test]
    fn short_release_keeps_the_strand() {
        let mut g = game();
        fill_strand(&mut g);
        assert!(g.begin_throw(Some("z1")));
        assert_eq!(g.stage().kind(), StageKind::AimingFirst);
        run(&mut g, 200);
        assert!(!g.release_throw());
        assert_eq!(g.stage(), &Stage::Idle);
        assert!(g.strand().is_full());
        assert!(g.flights().is_empty());
        assert!(
            g.take_effects()
                .contains(&Effect::Notice(Notice::ChargeLonger))
        );
    }

    #[test]
    fn cancel_reverts_silently() {
        let mut g = game();
        fill_strand(&mut g);
        g.begin_throw(Some("z1"));
        g.cancel_throw();
        assert_eq!(g.stage(), &Stage::Idle);
        assert!(g.take_effects().is_empty());
        assert!(g.frame().charge.is_none());
    }

    #[test]
    fn first_throw_consumes_the_strand() {
        let mut g = game();
        fill_strand(&mut g);
        g.begin_throw(Some("z1"));
        run(&mut g, 600);
        assert!(g.release_throw());
        assert!(g.strand().is_empty());
        assert_eq!(g.stage().kind(), StageKind::ThrowingFirst);
        assert_eq!(g.frame().coil.total, 8);

        let effects = run(&mut g, 800);
        assert_eq!(g.stage().kind(), StageKind::FirstAttached);
        assert!(effects.contains(&Effect::Notice(Notice::PickSecondAnchor)));
        assert!(g.frame().preview.is_some());
    }

    #[test]
    fn dropped_bulb_lands_ahead_and_is_immune() {
        let mut g = game();
        g.spawn_pickup(SpawnOptions {
            color: Some(Color::from("#ffd166")),
            position: Some(Vec3::new(0.3, 0.0, 0.0)),
            ..Default::default()
        });
        g.update(Duration::from_millis(16));
        assert_eq!(g.strand().filled(), 1);

        assert!(g.drop_bulb());
        assert!(g.strand().is_empty());
        let effects = g.take_effects();
        assert!(matches!(effects.as_slice(), [Effect::Spark { .. }]));
        run(&mut g, 530);
        assert!(g.flights().is_empty());
        let pickup = g.pickups().iter().next().unwrap();
        assert!((pickup.position.z - DROP_DISTANCE).abs() < 1e-3);
        assert_eq!(pickup.color, Color::from("#ffd166"));

        assert!(!g.drop_bulb());
        assert_eq!(g.take_effects(), vec![Effect::Notice(Notice::NothingToDrop)]);
    }

    #[test]
    fn new_game_resets_player_but_keeps_decorations() {
        let mut g = game();
        fill_strand(&mut g);
        g.place_decoration(Vec3::ZERO, None, PlaceOptions::default());
        g.begin_throw(Some("z1"));
        g.new_game();
        assert!(g.strand().is_empty());
        assert!(!g.is_charging());
        assert_eq!(g.stage(), &Stage::Idle);
        assert_eq!(g.decorations().len(), 1);
    }

    #[test]
    fn selected_color_reaches_the_next_placement() {
        let mut g = game();
        g.select_decor(DecorationType::Snowglobe, Some(Color::from("#00ccff")));
        let globe = g.place_decoration(Vec3::ONE, None, PlaceOptions::default());
        assert_eq!(globe.type_id, DecorationType::Snowglobe);
        assert_eq!(globe.color, Color::from("#00ccff"));

        g.select_decor(DecorationType::Wreath, None);
        let wreath = g.place_decoration(Vec3::ONE, None, PlaceOptions::default());
        assert_eq!(wreath.color, Color::from("#00ccff"));
    }
}
