//! World collaborator seam: ground height, spawn regions and anchor zones.

use glam::Vec3;
use rand::Rng;

use super::tuning::SPAWN_RETRY_BUDGET;
use crate::{AnchorZone, PathArea, WorldSection};

/// Ground elevation query used to place pickups and landing points.
pub trait Terrain {
    fn sample_height(&self, x: f32, z: f32) -> f32;
}

/// Level ground at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain(pub f32);

impl Terrain for FlatTerrain {
    fn sample_height(&self, _x: f32, _z: f32) -> f32 {
        self.0
    }
}

/// Structure footprint on the ground plane, centered on (x, z).
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub structure_id: String,
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub depth: f32,
}

impl Footprint {
    fn contains(&self, p: Vec3) -> bool {
        (p.x - self.x).abs() < self.width / 2.0 && (p.z - self.z).abs() < self.depth / 2.0
    }
}

fn on_path(area: &PathArea, p: Vec3) -> bool {
    p.x >= area.x1 && p.x <= area.x2 && p.z >= area.z1 && p.z <= area.z2
}

/// Village layout: spawn rectangle, paths, structure footprints, anchor zones
/// and rolling snow terrain.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldLayout {
    pub spawn_width: f32,
    pub spawn_depth: f32,
    pub ground_height: f32,
    pub hill_amplitude: f32,
    pub hill_wavelength: f32,
    pub paths: Vec<PathArea>,
    pub footprints: Vec<Footprint>,
    zones: Vec<AnchorZone>,
}

impl WorldLayout {
    pub fn from_section(section: &WorldSection) -> Self {
        let footprints = section
            .structures
            .iter()
            .map(|s| Footprint {
                structure_id: s.id.clone(),
                x: s.x,
                z: s.z,
                width: s.width,
                depth: s.depth,
            })
            .collect();
        let zones = section
            .structures
            .iter()
            .flat_map(|s| {
                s.zones.iter().map(|z| AnchorZone {
                    // A zone always belongs to the structure it is listed under.
                    structure_id: s.id.clone(),
                    ..z.clone()
                })
            })
            .collect();
        Self {
            spawn_width: section.spawn_width,
            spawn_depth: section.spawn_depth,
            ground_height: section.ground_height,
            hill_amplitude: section.hill_amplitude,
            hill_wavelength: section.hill_wavelength.max(0.01),
            paths: section.paths.clone(),
            footprints,
            zones,
        }
    }

    /// Flat, obstacle-free layout with the given anchor zones.
    pub fn open_field(width: f32, depth: f32, zones: Vec<AnchorZone>) -> Self {
        Self {
            spawn_width: width,
            spawn_depth: depth,
            ground_height: 0.0,
            hill_amplitude: 0.0,
            hill_wavelength: 1.0,
            paths: Vec::new(),
            footprints: Vec::new(),
            zones,
        }
    }

    pub fn zones(&self) -> &[AnchorZone] {
        &self.zones
    }

    pub fn zone(&self, id: &str) -> Option<&AnchorZone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn is_on_path(&self, p: Vec3) -> bool {
        self.paths.iter().any(|area| on_path(area, p))
    }

    pub fn is_in_footprint(&self, p: Vec3) -> bool {
        self.footprints.iter().any(|f| f.contains(p))
    }

    /// Sample a ground point inside the spawn rectangle, avoiding paths and
    /// footprints. Best effort: after the retry budget the last candidate is
    /// returned even if it is invalid. The returned `y` is zero.
    pub fn find_spawn_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let mut candidate = Vec3::ZERO;
        for _ in 0..SPAWN_RETRY_BUDGET {
            candidate = Vec3::new(
                (rng.r#gen::<f32>() - 0.5) * self.spawn_width,
                0.0,
                (rng.r#gen::<f32>() - 0.5) * self.spawn_depth,
            );
            if !self.is_on_path(candidate) && !self.is_in_footprint(candidate) {
                return candidate;
            }
        }
        tracing::debug!("spawn: retry budget exhausted, accepting {candidate}");
        candidate
    }
}

impl Terrain for WorldLayout {
    fn sample_height(&self, x: f32, z: f32) -> f32 {
        let k = self.hill_wavelength;
        self.ground_height + self.hill_amplitude * (x / k).sin() * (z / k).cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn walled_layout() -> WorldLayout {
        let mut world = WorldLayout::open_field(10.0, 10.0, Vec::new());
        world.paths.push(PathArea {
            x1: -5.0,
            x2: -4.0,
            z1: -5.0,
            z2: 5.0,
        });
        world.footprints.push(Footprint {
            structure_id: "cabin-1".into(),
            x: 2.5,
            z: 2.5,
            width: 2.0,
            depth: 2.0,
        });
        world
    }

    #[test]
    fn spawn_points_avoid_paths_and_footprints() {
        let world = walled_layout();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = world.find_spawn_position(&mut rng);
            assert!(!world.is_on_path(p), "spawned on path at {p}");
            assert!(!world.is_in_footprint(p), "spawned in footprint at {p}");
            assert!(p.x.abs() <= 5.0 && p.z.abs() <= 5.0);
        }
    }

    #[test]
    fn fully_blocked_field_still_returns_a_point() {
        let mut world = WorldLayout::open_field(4.0, 4.0, Vec::new());
        world.paths.push(PathArea {
            x1: -10.0,
            x2: 10.0,
            z1: -10.0,
            z2: 10.0,
        });
        let mut rng = StdRng::seed_from_u64(1);
        let p = world.find_spawn_position(&mut rng);
        assert!(world.is_on_path(p));
    }

    #[test]
    fn zones_inherit_their_structure() {
        let mut section = WorldSection::default();
        section.structures[0].zones[0].structure_id = "mislabelled".into();
        let world = WorldLayout::from_section(&section);
        let zone = world.zone("cabin-1-eave-left").unwrap();
        assert_eq!(zone.structure_id, "cabin-1");
        assert_eq!(world.zones().len(), 8);
    }

    #[test]
    fn flat_field_height_is_constant() {
        let world = WorldLayout::open_field(10.0, 10.0, Vec::new());
        assert_eq!(world.sample_height(3.0, -2.0), 0.0);
        assert_eq!(FlatTerrain(1.5).sample_height(9.0, 9.0), 1.5);
    }
}
