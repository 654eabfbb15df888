//! Timed projectiles: thrown strand ends and dropped bulbs.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{AnchorZone, Color};

pub type FlightId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum FlightPath {
    Linear { from: Vec3, to: Vec3 },
    Quadratic { start: Vec3, control: Vec3, end: Vec3 },
}

impl FlightPath {
    pub fn point(&self, t: f32) -> Vec3 {
        match *self {
            Self::Linear { from, to } => from.lerp(to, t),
            Self::Quadratic {
                start,
                control,
                end,
            } => {
                let ab = start.lerp(control, t);
                let bc = control.lerp(end, t);
                ab.lerp(bc, t)
            }
        }
    }

    pub fn end(&self) -> Vec3 {
        match *self {
            Self::Linear { to, .. } => to,
            Self::Quadratic { end, .. } => end,
        }
    }
}

/// What a flight delivers when it lands.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Strand { zone: AnchorZone },
    Drop { color: Color },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightKind {
    Strand,
    Drop,
}

#[derive(Debug, Clone)]
pub struct Flight {
    pub id: FlightId,
    pub path: FlightPath,
    pub duration: Duration,
    pub elapsed: Duration,
    /// Progress at which the landing fires.
    pub threshold: f32,
    pub fired: bool,
    pub payload: Payload,
}

impl Flight {
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn position(&self) -> Vec3 {
        self.path.point(self.progress())
    }

    pub fn opacity(&self) -> f32 {
        1.0 - self.progress()
    }

    pub fn scale(&self) -> f32 {
        1.0 + (0.1 - 1.0) * self.progress()
    }

    pub fn kind(&self) -> FlightKind {
        match self.payload {
            Payload::Strand { .. } => FlightKind::Strand,
            Payload::Drop { .. } => FlightKind::Drop,
        }
    }
}

/// A flight crossing its landing threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Landing {
    pub flight: FlightId,
    pub position: Vec3,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightView {
    pub id: FlightId,
    pub kind: FlightKind,
    pub position: Vec3,
    pub opacity: f32,
    pub scale: f32,
}

#[derive(Debug, Default)]
pub struct FlightSim {
    flights: Vec<Flight>,
    next_id: FlightId,
}

impl FlightSim {
    pub fn launch(
        &mut self,
        path: FlightPath,
        duration: Duration,
        threshold: f32,
        payload: Payload,
    ) -> FlightId {
        self.next_id += 1;
        let id = self.next_id;
        self.flights.push(Flight {
            id,
            path,
            duration,
            elapsed: Duration::ZERO,
            threshold,
            fired: false,
            payload,
        });
        id
    }

    /// Advance every flight. Each flight lands exactly once, the first frame
    /// its progress reaches the threshold, and is removed once complete.
    pub fn update(&mut self, delta: Duration) -> Vec<Landing> {
        let mut landings = Vec::new();
        for flight in &mut self.flights {
            flight.elapsed += delta;
            if !flight.fired && flight.progress() >= flight.threshold {
                flight.fired = true;
                landings.push(Landing {
                    flight: flight.id,
                    position: flight.position(),
                    payload: flight.payload.clone(),
                });
            }
        }
        self.flights.retain(|f| f.progress() < 1.0);
        landings
    }

    pub fn get(&self, id: FlightId) -> Option<&Flight> {
        self.flights.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    pub fn clear(&mut self) {
        self.flights.clear();
    }

    pub fn views(&self) -> Vec<FlightView> {
        self.flights
            .iter()
            .map(|f| FlightView {
                id: f.id,
                kind: f.kind(),
                position: f.position(),
                opacity: f.opacity(),
                scale: f.scale(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn drop_payload() -> Payload {
        Payload::Drop {
            color: Color::neutral(),
        }
    }

    #[test]
    fn lands_once_at_threshold_then_expires() {
        let mut sim = FlightSim::default();
        let path = FlightPath::Linear {
            from: Vec3::ZERO,
            to: Vec3::new(10.0, 0.0, 0.0),
        };
        let id = sim.launch(path, Duration::from_millis(1000), 0.95, drop_payload());

        assert!(sim.update(Duration::from_millis(900)).is_empty());
        let landings = sim.update(Duration::from_millis(60));
        assert_eq!(landings.len(), 1);
        assert_eq!(landings[0].flight, id);
        assert_relative_eq!(landings[0].position.x, 9.6, epsilon = 1e-3);

        assert!(sim.update(Duration::from_millis(30)).is_empty());
        assert!(sim.get(id).is_some());
        assert!(sim.update(Duration::from_millis(30)).is_empty());
        assert!(sim.is_empty());
    }

    #[test]
    fn large_step_lands_and_removes_in_one_frame() {
        let mut sim = FlightSim::default();
        let path = FlightPath::Linear {
            from: Vec3::ZERO,
            to: Vec3::X,
        };
        sim.launch(path, Duration::from_millis(100), 1.0, drop_payload());
        let landings = sim.update(Duration::from_secs(5));
        assert_eq!(landings.len(), 1);
        assert_eq!(landings[0].position, Vec3::X);
        assert!(sim.is_empty());
    }

    #[test]
    fn quadratic_arc_peaks_between_endpoints() {
        let path = FlightPath::Quadratic {
            start: Vec3::ZERO,
            control: Vec3::new(1.0, 2.0, 0.0),
            end: Vec3::new(2.0, 0.0, 0.0),
        };
        let mid = path.point(0.5);
        assert_relative_eq!(mid.x, 1.0);
        assert_relative_eq!(mid.y, 1.0);
        assert_eq!(path.point(1.0), path.end());
    }

    #[test]
    fn visuals_fade_and_shrink() {
        let mut sim = FlightSim::default();
        let path = FlightPath::Linear {
            from: Vec3::ZERO,
            to: Vec3::X,
        };
        let id = sim.launch(path, Duration::from_millis(1000), 0.95, drop_payload());
        sim.update(Duration::from_millis(500));
        let flight = sim.get(id).unwrap();
        assert_relative_eq!(flight.opacity(), 0.5);
        assert_relative_eq!(flight.scale(), 0.55);
        assert_eq!(sim.views()[0].kind, FlightKind::Drop);
    }
}
