//! Dropping a bulb returns it to the field after a short immunity.

use std::time::Duration;

use garland::Color;
use garland::sim::{Effect, Game, SpawnOptions, Tuning, WorldLayout};
use glam::Vec3;

fn step(game: &mut Game, ms: u64) -> Vec<Effect> {
    let mut effects = Vec::new();
    for _ in 0..ms / 10 {
        effects.extend(game.update(Duration::from_millis(10)));
    }
    effects
}

#[test]
fn dropped_bulb_is_immune_then_collectible() {
    let tuning = Tuning {
        pickup_count: 0,
        seed: Some(5),
        ..Default::default()
    };
    let mut game = Game::new(tuning, WorldLayout::open_field(30.0, 30.0, Vec::new()));
    game.spawn_pickup(SpawnOptions {
        color: Some(Color::from("#4cc9f0")),
        position: Some(Vec3::new(0.2, 0.0, 0.0)),
        ..Default::default()
    });
    step(&mut game, 20);
    assert_eq!(game.strand().filled(), 1);

    assert!(game.drop_bulb());
    // Land the bulb exactly (520 ms), then stand on it.
    step(&mut game, 520);
    assert_eq!(game.pickups().len(), 1);
    let landed = game.pickups().iter().next().unwrap().position;
    game.move_avatar(Vec3::new(landed.x, 0.0, landed.z), 0.0, false);

    step(&mut game, 300);
    assert_eq!(game.strand().filled(), 0, "collected during immunity");
    let effects = step(&mut game, 100);
    assert_eq!(game.strand().filled(), 1);
    assert!(game.pickups().is_empty());
    assert!(effects.iter().any(|e| matches!(e, Effect::Chime(_))));
    assert_eq!(
        game.strand().sockets()[0],
        Some(Color::from("#4cc9f0"))
    );
}

#[test]
fn new_game_respawns_the_field() {
    let tuning = Tuning {
        pickup_count: 12,
        seed: Some(9),
        ..Default::default()
    };
    let mut game = Game::new(tuning, WorldLayout::open_field(30.0, 30.0, Vec::new()));
    assert_eq!(game.pickups().len(), 12);
    game.move_avatar(Vec3::new(100.0, 0.0, 100.0), 0.0, false);
    game.new_game();
    assert_eq!(game.pickups().len(), 12);
    assert!(game.strand().is_empty());
}
