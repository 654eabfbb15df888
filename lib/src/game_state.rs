//! Presentation snapshots produced by the game core.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::{ChargeMeter, CoilPreview, FlightView, PickupView, StageKind, StringPreview};
use crate::{Color, Decoration};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvatarView {
    pub position: Vec3,
    pub heading: f32,
    pub moving: bool,
}

/// Everything a HUD or scene needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudFrame {
    pub frame: u64,
    pub time_ms: u64,
    /// Strand sockets in order. `None` is an unlit socket.
    pub sockets: Vec<Option<Color>>,
    pub filled: usize,
    pub capacity: usize,
    /// Present only while a throw is charging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge: Option<ChargeMeter>,
    pub stage: StageKind,
    pub coil: CoilPreview,
    pub avatar: AvatarView,
    pub pickups: Vec<PickupView>,
    pub flights: Vec<FlightView>,
    /// Temp string segments trailing thrown ends.
    pub segments: Vec<Vec<Vec3>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<StringPreview>,
    pub decorations: usize,
}

/// Full decoration state of a shared session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub decorations: Vec<Decoration>,
}
