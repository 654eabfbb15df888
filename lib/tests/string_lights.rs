//! End-to-end string hanging: collect, two throws, finalize, sync.

use std::time::Duration;

use garland::sim::{Effect, Game, Notice, SpawnOptions, StageKind, SyncState, Tuning, WorldLayout};
use garland::{AnchorZone, Color, DecorationType, Point3};
use glam::Vec3;

const FRAME: Duration = Duration::from_millis(10);

fn zone(id: &str, structure: &str, x: f32, y: f32) -> AnchorZone {
    AnchorZone {
        id: id.into(),
        structure_id: structure.into(),
        position: Vec3::new(x, y, 6.0),
        normal: Vec3::Z,
    }
}

fn new_game() -> Game {
    let tuning = Tuning {
        pickup_count: 0,
        seed: Some(2024),
        ..Default::default()
    };
    let world = WorldLayout::open_field(
        40.0,
        40.0,
        vec![
            zone("z1", "cabin-1", -2.0, 3.4),
            zone("z2", "cabin-1", 2.0, 3.4),
            zone("z3", "cabin-2", 12.0, 3.4),
        ],
    );
    Game::new(tuning, world)
}

fn run(game: &mut Game, ms: u64) -> Vec<Effect> {
    let mut effects = Vec::new();
    for _ in 0..ms / FRAME.as_millis() as u64 {
        effects.extend(game.update(FRAME));
    }
    effects
}

/// Spawn one pickup per palette color beside the avatar and collect them.
fn collect_full_strand(game: &mut Game) -> Vec<Color> {
    let colors: Vec<Color> = (0..game.tuning().strand_capacity)
        .map(|i| Color::new(Color::PALETTE[i % Color::PALETTE.len()]))
        .collect();
    // Collection walks pickups newest first, so spawn in reverse to fill
    // sockets in palette order.
    for color in colors.iter().rev() {
        game.spawn_pickup(SpawnOptions {
            color: Some(color.clone()),
            position: Some(Vec3::new(0.4, 0.0, 0.2)),
            ..Default::default()
        });
    }
    run(game, 20);
    colors
}

fn throw_at(game: &mut Game, zone_id: &str) -> Vec<Effect> {
    assert!(game.begin_throw(Some(zone_id)), "charge at {zone_id} rejected");
    let mut effects = run(game, 700);
    assert!(game.release_throw());
    effects.extend(game.take_effects());
    effects.extend(run(game, 900));
    effects
}

#[test]
fn two_throws_hang_one_string() {
    let mut game = new_game();
    let colors = collect_full_strand(&mut game);
    assert!(game.strand().is_full());
    let sockets: Vec<Color> = game.strand().colors().cloned().collect();
    assert_eq!(sockets, colors);

    let effects = throw_at(&mut game, "z1");
    assert_eq!(game.stage().kind(), StageKind::FirstAttached);
    assert!(game.strand().is_empty());
    assert!(effects.contains(&Effect::Notice(Notice::PickSecondAnchor)));
    assert!(game.decorations().is_empty());

    let effects = throw_at(&mut game, "z2");
    assert_eq!(game.stage().kind(), StageKind::Idle);
    assert_eq!(game.decorations().len(), 1);

    let broadcast = effects
        .iter()
        .find_map(|e| match e {
            Effect::Broadcast(d) => Some(d.clone()),
            _ => None,
        })
        .expect("decoration broadcast");
    assert_eq!(broadcast.type_id, DecorationType::StringLights);
    assert_eq!(broadcast.cabin_id, "cabin-1");
    assert_eq!(broadcast.glow, 0.95);
    assert_eq!(broadcast.colors.as_deref(), Some(colors.as_slice()));
    assert_eq!(
        broadcast.anchor_points,
        Some(vec![
            Point3 {
                x: -2.0,
                y: 3.4,
                z: 6.0
            },
            Point3 {
                x: 2.0,
                y: 3.4,
                z: 6.0
            },
        ])
    );
    assert_eq!(broadcast.transform.position, Point3::default());
    assert!(effects.contains(&Effect::Notice(Notice::Placed(DecorationType::StringLights))));
    assert!(effects.contains(&Effect::Notice(Notice::StringHung)));

    let entry = game.decorations().get(&broadcast.id).unwrap();
    assert_eq!(entry.state, SyncState::Pending);
    let frame = game.frame();
    assert_eq!(frame.coil.remaining, 0);
    assert!(frame.segments.is_empty());
    assert!(frame.preview.is_none());
}

#[test]
fn second_throw_to_same_zone_is_refused() {
    let mut game = new_game();
    collect_full_strand(&mut game);
    throw_at(&mut game, "z1");
    let effects = throw_at(&mut game, "z1");
    assert!(effects.contains(&Effect::Notice(Notice::PickDifferentSpot)));
    assert_eq!(game.stage().kind(), StageKind::FirstAttached);
    assert!(game.decorations().is_empty());

    // The string is still in hand: a valid second throw finishes it.
    throw_at(&mut game, "z2");
    assert_eq!(game.decorations().len(), 1);
}

#[test]
fn second_throw_to_other_cabin_is_refused() {
    let mut game = new_game();
    collect_full_strand(&mut game);
    throw_at(&mut game, "z1");
    let coil_before = game.frame().coil.remaining;
    let effects = throw_at(&mut game, "z3");
    assert!(effects.contains(&Effect::Notice(Notice::SameStructure)));
    assert_eq!(game.stage().kind(), StageKind::FirstAttached);
    assert_eq!(game.frame().coil.remaining, coil_before);
    assert!(game.decorations().is_empty());
}

#[test]
fn partial_strand_cannot_be_thrown() {
    let mut game = new_game();
    game.spawn_pickup(SpawnOptions {
        position: Some(Vec3::new(0.4, 0.0, 0.0)),
        ..Default::default()
    });
    run(&mut game, 20);
    assert_eq!(game.strand().filled(), 1);
    assert!(!game.begin_throw(Some("z1")));
    assert_eq!(
        game.take_effects(),
        vec![Effect::Notice(Notice::CollectFullStrand)]
    );
}

#[test]
fn cannot_start_over_while_the_first_end_flies() {
    let mut game = new_game();
    collect_full_strand(&mut game);
    assert!(game.begin_throw(Some("z1")));
    run(&mut game, 700);
    assert!(game.release_throw());
    run(&mut game, 100);
    assert_eq!(game.stage().kind(), StageKind::ThrowingFirst);
    assert!(!game.begin_throw(Some("z2")));
    assert_eq!(
        game.take_effects(),
        vec![Effect::Notice(Notice::FinishCurrentString)]
    );
}

#[test]
fn snapshot_confirms_the_hung_string() {
    let mut game = new_game();
    collect_full_strand(&mut game);
    throw_at(&mut game, "z1");
    throw_at(&mut game, "z2");
    let placed = game.decorations().decorations();
    let report = game.apply_snapshot(&placed);
    assert_eq!(report.upserted, 1);
    assert_eq!(report.pending, 0);
    assert_eq!(
        game.decorations().get(&placed[0].id).unwrap().state,
        SyncState::Confirmed
    );
    assert_eq!(game.apply_snapshot(&placed).upserted, 0);
}
