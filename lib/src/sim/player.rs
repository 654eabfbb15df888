use glam::{Quat, Vec3};

use super::attachment::AttachmentSession;
use super::charge::ThrowCharge;
use super::effect::RateLimiter;
use super::strand::Strand;
use super::tuning::Tuning;

/// Hand position the collection spark starts from, in avatar space.
pub const SPARK_ORIGIN_LOCAL: Vec3 = Vec3::new(0.0, 1.2, 0.55);
/// Where dropped bulbs leave the hand, in avatar space.
pub const DROP_ORIGIN_LOCAL: Vec3 = Vec3::new(0.15, 1.18, 0.4);
/// Free end of the carried coil, in avatar space.
pub const COIL_TIP_LOCAL: Vec3 = Vec3::new(-0.24, 1.1, -0.18);

/// The local player's body: feet position and heading around +Y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Avatar {
    pub position: Vec3,
    pub heading: f32,
    pub moving: bool,
}

impl Avatar {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.heading)
    }

    /// Unit vector the avatar faces (+Z rotated by heading).
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::Z
    }

    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation() * local
    }
}

/// The part of a player that pickup collection reads and writes.
#[derive(Debug)]
pub struct Collector<'a> {
    pub avatar: &'a Avatar,
    pub strand: &'a mut Strand,
    pub full_warning: &'a mut RateLimiter,
}

/// Everything one player owns while playing. Exactly one per local player.
#[derive(Debug)]
pub struct PlayerInteractionState {
    pub avatar: Avatar,
    pub strand: Strand,
    pub charge: ThrowCharge,
    pub attachment: AttachmentSession,
    pub full_warning: RateLimiter,
}

impl PlayerInteractionState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            avatar: Avatar::default(),
            strand: Strand::new(tuning.strand_capacity),
            charge: ThrowCharge::new(tuning.full_charge, tuning.min_charge),
            attachment: AttachmentSession::default(),
            full_warning: RateLimiter::new(tuning.full_warning_interval),
        }
    }

    pub fn collector(&mut self) -> Collector<'_> {
        Collector {
            avatar: &self.avatar,
            strand: &mut self.strand,
            full_warning: &mut self.full_warning,
        }
    }

    /// Back to a fresh round: empty strand, no charge, idle attachment.
    pub fn reset(&mut self) {
        self.strand.consume_all();
        self.charge.cancel();
        self.attachment.reset();
        self.full_warning.reset();
    }
}
