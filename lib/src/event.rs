//! Shared domain types used by both the unified bus and the game core.
//!
//! These are pure data structures with no channel affinity. The bus message
//! types in `message.rs` and the simulation in `sim` reference them.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A bulb or decoration color as a `#rrggbb` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Warm white used for unlit sockets and empty patterns.
    pub const NEUTRAL: &'static str = "#ffecc3";

    /// Pickup palette, in spawn-table order.
    pub const PALETTE: &'static [&'static str] = &[
        "#ff4d4d", "#ffd166", "#06d6a0", "#4cc9f0", "#b388ff", "#ff8fab",
    ];

    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn neutral() -> Self {
        Self::new(Self::NEUTRAL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Point3: wire form of a world position
// ---------------------------------------------------------------------------

/// A world-space point as `{ "x", "y", "z" }` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Point3 {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Point3> for Vec3 {
    fn from(p: Point3) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

// ---------------------------------------------------------------------------
// Anchor zones
// ---------------------------------------------------------------------------

/// A candidate attachment point on a structure. Provided by the world and
/// immutable for the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorZone {
    pub id: String,
    pub structure_id: String,
    pub position: Vec3,
    #[serde(default = "up")]
    pub normal: Vec3,
}

fn up() -> Vec3 {
    Vec3::Y
}

// ---------------------------------------------------------------------------
// Decorations
// ---------------------------------------------------------------------------

/// Decoration kind. Serializes to the session's snake_case type ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum DecorationType {
    StringLights,
    Wreath,
    Lantern,
    Snowglobe,
}

impl DecorationType {
    /// Color used when a placement does not name one explicitly. `None`
    /// defers to the player's current color selection.
    ///
    /// Only string lights carry one: their bulbs hold the real colors and the
    /// primary color stays neutral.
    pub fn default_color(self) -> Option<Color> {
        match self {
            Self::StringLights => Some(Color::neutral()),
            Self::Wreath | Self::Lantern | Self::Snowglobe => None,
        }
    }

    /// Starting swatch offered in the picker for this type.
    pub fn swatch(self) -> Color {
        let hex = match self {
            Self::StringLights => Color::NEUTRAL,
            Self::Wreath => "#2f8f4e",
            Self::Lantern => "#ffb347",
            Self::Snowglobe => "#dff6ff",
        };
        Color::new(hex)
    }

    /// Human-readable label ("string lights").
    pub fn label(self) -> &'static str {
        match self {
            Self::StringLights => "string lights",
            Self::Wreath => "wreath",
            Self::Lantern => "lantern",
            Self::Snowglobe => "snowglobe",
        }
    }
}

impl fmt::Display for DecorationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::StringLights => "string_lights",
            Self::Wreath => "wreath",
            Self::Lantern => "lantern",
            Self::Snowglobe => "snowglobe",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecorTransform {
    pub position: Point3,
    pub rotation: Point3,
    pub scale: f32,
}

/// The finalized, session-shared placed object.
///
/// String-type decorations carry their geometry in `anchor_points` and keep a
/// zero transform position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    pub id: String,
    pub type_id: DecorationType,
    pub color: Color,
    pub glow: f32,
    pub cabin_id: String,
    pub transform: DecorTransform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_points: Option<Vec<Point3>>,
}

// ---------------------------------------------------------------------------
// ActorStatus: generic actor lifecycle
// ---------------------------------------------------------------------------

/// Generic actor lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorStatus {
    Starting,
    Disconnected,
    Connected,
}

impl fmt::Display for ActorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Actor state emitted on the bus. Carries lifecycle status and
/// actor-specific key/value telemetry (frame count, decorations, clients).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorState {
    pub status: ActorStatus,
    #[serde(default)]
    pub telemetry: HashMap<String, String>,
}

impl ActorState {
    pub fn new(status: ActorStatus, telemetry: HashMap<String, String>) -> Self {
        Self { status, telemetry }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoration_uses_session_field_names() {
        let decoration = Decoration {
            id: "d1".into(),
            type_id: DecorationType::StringLights,
            color: Color::neutral(),
            glow: 0.95,
            cabin_id: "cabin-1".into(),
            transform: DecorTransform {
                position: Point3::default(),
                rotation: Point3::default(),
                scale: 1.0,
            },
            colors: Some(vec![Color::from("#ff0000")]),
            anchor_points: Some(vec![Point3 {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            }]),
        };
        let json = serde_json::to_value(&decoration).unwrap();
        assert_eq!(json["typeId"], "string_lights");
        assert_eq!(json["cabinId"], "cabin-1");
        assert_eq!(json["colors"][0], "#ff0000");
        assert_eq!(json["anchorPoints"][0]["z"], 3.0);
    }

    #[test]
    fn plain_decoration_omits_string_fields() {
        let json = serde_json::json!({
            "id": "w1",
            "typeId": "wreath",
            "color": "#2f8f4e",
            "glow": 0.65,
            "cabinId": "storybook-home",
            "transform": {
                "position": { "x": 0.0, "y": 1.0, "z": 0.0 },
                "rotation": { "x": 0.0, "y": 0.0, "z": 0.0 },
                "scale": 1.0
            }
        });
        let decoration: Decoration = serde_json::from_value(json).unwrap();
        assert_eq!(decoration.type_id, DecorationType::Wreath);
        assert!(decoration.colors.is_none());
        assert!(decoration.anchor_points.is_none());
    }
}
