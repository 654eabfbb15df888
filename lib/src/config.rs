use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::{AnchorZone, DecorationType};

/// A time interval with unit. Serializes as a suffix string: `"780ms"`,
/// `"1.6s"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interval {
    Millis(f64),
    Seconds(f64),
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl std::str::FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // "ms" before "s" so "780ms" is not read as seconds
        for (suffix, ctor) in &[
            ("ms", Self::Millis as fn(f64) -> Self),
            ("s", Self::Seconds as fn(f64) -> Self),
        ] {
            if let Some(num) = s.strip_suffix(suffix) {
                let v: f64 = num
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid number in interval: {s:?}"))?;
                if v < 0.0 || !v.is_finite() {
                    return Err(format!("interval must be a finite, non-negative number: {s:?}"));
                }
                let interval = ctor(v);
                if Duration::try_from_secs_f64(interval.as_millis() / 1000.0).is_err() {
                    return Err(format!("interval out of range: {s:?}"));
                }
                return Ok(interval);
            }
        }
        Err(format!(
            "invalid interval {s:?}: expected number with suffix (ms, s)"
        ))
    }
}

impl Interval {
    pub fn value(self) -> f64 {
        match self {
            Self::Millis(v) | Self::Seconds(v) => v,
        }
    }

    pub fn unit_suffix(self) -> &'static str {
        match self {
            Self::Millis(_) => "ms",
            Self::Seconds(_) => "s",
        }
    }

    pub fn as_millis(self) -> f64 {
        match self {
            Self::Millis(v) => v,
            Self::Seconds(v) => v * 1000.0,
        }
    }

    /// Saturates at `Duration::MAX`; negative or NaN values become zero.
    pub fn as_duration(self) -> Duration {
        let secs = self.as_millis() / 1000.0;
        Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
            Duration::MAX
        } else {
            Duration::ZERO
        })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value(), self.unit_suffix())
    }
}

// ---------------------------------------------------------------------------
// Persisted config types (shared between app and game core)
// ---------------------------------------------------------------------------

/// Top-level persisted config. Every tuning value is optional so the TOML
/// file only needs to mention what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarlandConfig {
    #[serde(default)]
    pub tuning: TuningSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub webserver: HashMap<String, WebserverSection>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub session: HashMap<String, SessionSection>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub mock_player: HashMap<String, MockPlayerSection>,
}

/// Game constants. `None` means "use the built-in default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TuningSection {
    pub strand_capacity: Option<usize>,
    pub pickup_count: Option<usize>,
    pub collect_radius: Option<f32>,
    pub hover_offset: Option<f32>,
    pub drop_gravity: Option<f32>,
    pub bulb_spacing: Option<f32>,
    pub full_warning_interval: Option<Interval>,
    pub full_charge: Option<Interval>,
    pub min_charge: Option<Interval>,
    pub throw_duration: Option<Interval>,
    pub drop_duration: Option<Interval>,
    pub drop_immunity: Option<Interval>,
    pub frame_rate: Option<u32>,
    pub seed: Option<u64>,
    pub decor_type: Option<DecorationType>,
}

/// Axis-aligned rectangle on the ground plane (x/z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathArea {
    pub x1: f32,
    pub x2: f32,
    pub z1: f32,
    pub z2: f32,
}

/// A structure (cabin) footprint with its anchor zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSection {
    pub id: String,
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub depth: f32,
    #[serde(default)]
    pub zones: Vec<AnchorZone>,
}

/// Village layout consumed by the game core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSection {
    /// Spawn rectangle extent along x, centered on the origin.
    pub spawn_width: f32,
    /// Spawn rectangle extent along z, centered on the origin.
    pub spawn_depth: f32,
    #[serde(default)]
    pub ground_height: f32,
    #[serde(default)]
    pub hill_amplitude: f32,
    #[serde(default = "default_hill_wavelength")]
    pub hill_wavelength: f32,
    #[serde(default)]
    pub paths: Vec<PathArea>,
    #[serde(default)]
    pub structures: Vec<StructureSection>,
}

fn default_hill_wavelength() -> f32 {
    18.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebserverSection {
    #[serde(default)]
    pub name: String,
    pub bind: String,
}

/// An in-process shared session (loopback stand-in for the remote room).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default)]
    pub name: String,
    /// How often the full state is redelivered even without changes.
    pub resync_interval: Option<Interval>,
}

/// A scripted player that walks, collects and strings lights on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockPlayerSection {
    #[serde(default)]
    pub name: String,
    /// Target structure for the scripted strings. `None` = first structure.
    #[serde(default)]
    pub structure: Option<String>,
    /// Walking speed in world units per second.
    pub speed: Option<f32>,
}

impl Default for WorldSection {
    /// A small village: two cabins with four anchor zones each, and a
    /// crossing pair of paths.
    fn default() -> Self {
        fn cabin(id: &str, x: f32, z: f32) -> StructureSection {
            let zone = |suffix: &str, dx: f32, y: f32, normal: glam::Vec3| AnchorZone {
                id: format!("{id}-{suffix}"),
                structure_id: id.to_string(),
                position: glam::Vec3::new(x + dx, y, z + 3.1),
                normal,
            };
            StructureSection {
                id: id.to_string(),
                x,
                z,
                width: 6.0,
                depth: 6.0,
                zones: vec![
                    zone("eave-left", -2.6, 3.4, glam::Vec3::Z),
                    zone("eave-right", 2.6, 3.4, glam::Vec3::Z),
                    zone("door", 0.0, 2.4, glam::Vec3::Z),
                    zone("ridge", 0.0, 4.8, glam::Vec3::Y),
                ],
            }
        }
        Self {
            spawn_width: 56.0,
            spawn_depth: 56.0,
            ground_height: 0.0,
            hill_amplitude: 0.35,
            hill_wavelength: default_hill_wavelength(),
            paths: vec![
                PathArea {
                    x1: -1.5,
                    x2: 1.5,
                    z1: -28.0,
                    z2: 28.0,
                },
                PathArea {
                    x1: -28.0,
                    x2: 28.0,
                    z1: -1.5,
                    z2: 1.5,
                },
            ],
            structures: vec![cabin("cabin-1", -10.0, -10.0), cabin("cabin-2", 10.0, 8.0)],
        }
    }
}

impl Default for GarlandConfig {
    /// Known good defaults: one loopback session and a local web server.
    fn default() -> Self {
        let mut session = HashMap::new();
        session.insert(
            "0".into(),
            SessionSection {
                name: "Local Session".into(),
                resync_interval: Some(Interval::Seconds(5.0)),
            },
        );
        let mut webserver = HashMap::new();
        webserver.insert(
            "0".into(),
            WebserverSection {
                name: "Web Server".into(),
                bind: "127.0.0.1:3040".into(),
            },
        );
        Self {
            tuning: TuningSection::default(),
            world: WorldSection::default(),
            webserver,
            session,
            mock_player: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_parses_millis_before_seconds() {
        assert_eq!("780ms".parse::<Interval>(), Ok(Interval::Millis(780.0)));
        assert_eq!(" 1.6s ".parse::<Interval>(), Ok(Interval::Seconds(1.6)));
        assert!("12".parse::<Interval>().is_err());
        assert!("-3s".parse::<Interval>().is_err());
    }

    #[test]
    fn interval_too_large_for_a_duration_is_rejected() {
        assert!("1e300s".parse::<Interval>().is_err());
        assert!("1e300ms".parse::<Interval>().is_err());
        let err = serde_json::from_value::<TuningSection>(serde_json::json!({
            "full_charge": "1e300s"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn constructed_interval_saturates_instead_of_panicking() {
        assert_eq!(Interval::Seconds(1e300).as_duration(), Duration::MAX);
        assert_eq!(Interval::Millis(-5.0).as_duration(), Duration::ZERO);
        assert_eq!(Interval::Seconds(f64::NAN).as_duration(), Duration::ZERO);
    }

    #[test]
    fn interval_converts_to_duration() {
        assert_eq!(
            Interval::Seconds(1.6).as_duration(),
            Duration::from_millis(1600)
        );
        assert_eq!(Interval::Millis(350.0).as_millis(), 350.0);
    }

    #[test]
    fn partial_config_keeps_defaults_elsewhere() {
        let json = serde_json::json!({
            "tuning": { "strand_capacity": 6, "min_charge": "300ms" }
        });
        let config: GarlandConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.tuning.strand_capacity, Some(6));
        assert_eq!(config.tuning.min_charge, Some(Interval::Millis(300.0)));
        assert!(config.tuning.pickup_count.is_none());
        assert_eq!(config.world.structures.len(), 2);
        assert!(config.session.is_empty());
    }

    #[test]
    fn default_world_has_zones_on_each_cabin() {
        let world = WorldSection::default();
        for structure in &world.structures {
            assert_eq!(structure.zones.len(), 4);
            assert!(structure.zones.iter().all(|z| z.structure_id == structure.id));
        }
    }
}
