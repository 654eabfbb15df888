//! Collectible bulbs floating over the snow.

use std::time::Duration;

use glam::Vec3;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::effect::{Chime, Notice, Outbox};
use super::player::{Collector, SPARK_ORIGIN_LOCAL};
use super::tuning::{BOB_AMPLITUDE, Tuning};
use super::world::{Terrain, WorldLayout};
use crate::Color;

pub type PickupId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: PickupId,
    pub color: Color,
    pub position: Vec3,
    /// Center of the idle bob.
    pub base_y: f32,
    /// Height a falling pickup settles at.
    pub rest_height: f32,
    pub wobble: f32,
    pub glow: f32,
    pub collected: bool,
    pub falling: bool,
    pub drop_velocity: Option<Vec3>,
    /// Simulation time before which the pickup cannot be collected.
    pub immune_until: Duration,
    /// Must see the player leave the collection radius before it can be
    /// collected.
    pub require_exit: bool,
}

/// Overrides for [`PickupField::spawn_one`]. Everything left `None` is
/// derived from the world and tuning.
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    pub color: Option<Color>,
    pub position: Option<Vec3>,
    pub base_y: Option<f32>,
    pub rest_height: Option<f32>,
    pub drop_height: Option<f32>,
    pub drop_velocity: Option<Vec3>,
    pub immune_until: Duration,
    pub require_exit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupView {
    pub id: PickupId,
    pub color: Color,
    pub position: Vec3,
    pub glow: f32,
}

/// All live pickups plus the random source used to place them.
#[derive(Debug)]
pub struct PickupField {
    pickups: Vec<Pickup>,
    next_id: PickupId,
    rng: StdRng,
}

impl PickupField {
    pub fn new(rng: StdRng) -> Self {
        Self {
            pickups: Vec::new(),
            next_id: 1,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.pickups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pickups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pickup> {
        self.pickups.iter()
    }

    pub fn get(&self, id: PickupId) -> Option<&Pickup> {
        self.pickups.iter().find(|p| p.id == id)
    }

    pub fn clear(&mut self) {
        self.pickups.clear();
    }

    /// Replace the field with `tuning.pickup_count` fresh pickups.
    pub fn spawn_field(&mut self, world: &WorldLayout, tuning: &Tuning) {
        self.clear();
        for _ in 0..tuning.pickup_count {
            self.spawn_one(SpawnOptions::default(), world, tuning);
        }
        tracing::debug!("pickups: spawned field of {}", self.pickups.len());
    }

    pub fn spawn_one(
        &mut self,
        options: SpawnOptions,
        world: &WorldLayout,
        tuning: &Tuning,
    ) -> PickupId {
        let color = match options.color {
            Some(c) => c,
            None => Color::new(*Color::PALETTE.choose(&mut self.rng).unwrap_or(&Color::NEUTRAL)),
        };
        let mut position = match options.position {
            Some(p) => p,
            None => world.find_spawn_position(&mut self.rng),
        };
        let ground = world.sample_height(position.x, position.z);
        let base_y = options.base_y.unwrap_or(ground + tuning.hover_offset);
        let rest_height = options.rest_height.unwrap_or(base_y);
        let start_y = options
            .drop_height
            .filter(|h| *h > rest_height)
            .unwrap_or(rest_height);
        position.y = start_y;

        let id = self.next_id;
        self.next_id += 1;
        self.pickups.push(Pickup {
            id,
            color,
            position,
            base_y,
            rest_height,
            wobble: self.rng.r#gen::<f32>() * std::f32::consts::TAU,
            glow: 0.7,
            collected: false,
            falling: start_y > rest_height + 0.01,
            drop_velocity: options.drop_velocity,
            immune_until: options.immune_until,
            require_exit: options.require_exit,
        });
        id
    }

    /// Animate every pickup and collect the ones the avatar touches.
    /// Returns how many were collected this frame.
    pub fn update(
        &mut self,
        now: Duration,
        delta: f32,
        player: Collector<'_>,
        tuning: &Tuning,
        outbox: &mut Outbox,
    ) -> usize {
        let Collector {
            avatar,
            strand,
            full_warning,
        } = player;
        let elapsed = now.as_secs_f32();
        let mut collected = 0;
        let mut i = self.pickups.len();
        while i > 0 {
            i -= 1;
            let take = {
                let pickup = &mut self.pickups[i];
                pickup.glow = 0.7 + (elapsed * 2.5 + pickup.wobble).sin() * 0.25;
                if pickup.falling {
                    let velocity = pickup.drop_velocity.get_or_insert(Vec3::ZERO);
                    velocity.y -= tuning.drop_gravity * delta;
                    pickup.position += *velocity * delta;
                    if pickup.position.y <= pickup.rest_height {
                        pickup.position.y = pickup.rest_height;
                        pickup.falling = false;
                    }
                } else {
                    pickup.position.y =
                        pickup.base_y + (elapsed * 2.0 + pickup.wobble).sin() * BOB_AMPLITUDE;
                }

                let inside = pickup.position.distance(avatar.position) < tuning.collect_radius;
                if pickup.require_exit {
                    if !inside {
                        pickup.require_exit = false;
                    }
                    false
                } else if !inside || pickup.collected || now < pickup.immune_until {
                    false
                } else if strand.is_full() {
                    if full_warning.allow(now) {
                        outbox.notice(Notice::StrandFull);
                    }
                    false
                } else {
                    pickup.collected = true;
                    true
                }
            };
            if take {
                let pickup = self.pickups.remove(i);
                strand.add_bulb(pickup.color.clone());
                outbox.chime(Chime::Collect);
                outbox.spark(avatar.local_to_world(SPARK_ORIGIN_LOCAL), pickup.color);
                collected += 1;
            }
        }
        collected
    }

    pub fn views(&self) -> Vec<PickupView> {
        self.pickups
            .iter()
            .map(|p| PickupView {
                id: p.id,
                color: p.color.clone(),
                position: p.position,
                glow: p.glow,
            })
            .collect()
    }
}
