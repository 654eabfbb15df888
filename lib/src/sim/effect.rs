//! Outward effects produced by the game core.
//!
//! The core never talks to audio, rendering or networking directly. Every
//! externally visible consequence is pushed into an [`Outbox`] and drained by
//! the host once per frame or command.

use std::fmt;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{Color, Decoration, DecorationType};

/// User-facing notices. The text is what a HUD shows verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    CollectBulbsFirst,
    CollectFullStrand,
    NoTarget,
    FinishCurrentString,
    ChargeLonger,
    StrandFull,
    NothingToDrop,
    PickSecondAnchor,
    PickDifferentSpot,
    SameStructure,
    StringHung,
    Placed(DecorationType),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollectBulbsFirst => f.write_str("Collect some bulbs first!"),
            Self::CollectFullStrand => f.write_str("Collect a full strand before decorating!"),
            Self::NoTarget => f.write_str("Aim at a glowing spot on a cabin."),
            Self::FinishCurrentString => f.write_str("Finish the current string before starting again."),
            Self::ChargeLonger => f.write_str("Hold a bit longer, then release to place!"),
            Self::StrandFull => f.write_str("Your strand is full! Time to decorate."),
            Self::NothingToDrop => f.write_str("No bulbs to drop yet!"),
            Self::PickSecondAnchor => f.write_str("Pick another glowing spot to anchor the other end of the string."),
            Self::PickDifferentSpot => f.write_str("Pick a different spot to anchor the other end."),
            Self::SameStructure => f.write_str("Both ends must attach to the same cabin."),
            Self::StringHung => f.write_str("String hung! Ready for another bundle."),
            Self::Placed(kind) => write!(f, "Placed {}!", kind.label()),
        }
    }
}

/// Short audio cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chime {
    Collect,
    Placement,
}

impl Chime {
    /// Two-note pitch pair in Hz.
    pub fn pitches(self) -> [f32; 2] {
        match self {
            Self::Collect => [660.0, 880.0],
            Self::Placement => [640.0, 880.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notice(Notice),
    Chime(Chime),
    /// Send a finalized decoration to the shared session.
    Broadcast(Decoration),
    /// Short-lived particle burst at a world position.
    Spark { position: Vec3, color: Color },
    /// Pulse the glow of a structure after something was placed on it.
    StructureGlow { structure_id: String },
}

/// Ordered effect queue.
#[derive(Debug, Default)]
pub struct Outbox {
    effects: Vec<Effect>,
}

impl Outbox {
    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn notice(&mut self, notice: Notice) {
        tracing::debug!("notice: {notice}");
        self.effects.push(Effect::Notice(notice));
    }

    pub fn chime(&mut self, chime: Chime) {
        self.effects.push(Effect::Chime(chime));
    }

    pub fn spark(&mut self, position: Vec3, color: Color) {
        self.effects.push(Effect::Spark { position, color });
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

/// Allows an event at most once per interval of simulation time.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last: Option<Duration>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn allow(&mut self, now: Duration) -> bool {
        match self.last {
            Some(last) if now.saturating_sub(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
