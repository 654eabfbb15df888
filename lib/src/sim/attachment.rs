//! Two-phase string attachment.
//!
//! A string is hung with two throws: the first end lands on an anchor zone,
//! then the second end must land on a different zone of the same structure.
//! All stage changes go through [`transition`]; [`AttachmentSession`] layers
//! the carried pattern, coil preview and in-flight segments on top of it.

use std::collections::VecDeque;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::effect::Notice;
use super::flight::{Flight, FlightId, FlightPath, FlightSim};
use super::tuning::TEMP_SEGMENT_MAX_POINTS;
use crate::{AnchorZone, Color};

// ---------------------------------------------------------------------------
// Stage machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Stage {
    #[default]
    Idle,
    AimingFirst,
    ThrowingFirst {
        flight: FlightId,
    },
    FirstAttached {
        first: AnchorZone,
    },
    AimingSecond {
        first: AnchorZone,
    },
    ThrowingSecond {
        first: AnchorZone,
        second: AnchorZone,
        flight: FlightId,
    },
}

/// Payload-free stage tag for the HUD and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Idle,
    AimingFirst,
    ThrowingFirst,
    FirstAttached,
    AimingSecond,
    ThrowingSecond,
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Idle => StageKind::Idle,
            Self::AimingFirst => StageKind::AimingFirst,
            Self::ThrowingFirst { .. } => StageKind::ThrowingFirst,
            Self::FirstAttached { .. } => StageKind::FirstAttached,
            Self::AimingSecond { .. } => StageKind::AimingSecond,
            Self::ThrowingSecond { .. } => StageKind::ThrowingSecond,
        }
    }

    /// A string is under way and carries its own captured pattern, so the
    /// strand no longer matters for the next throw.
    pub fn has_pattern(&self) -> bool {
        matches!(
            self,
            Self::ThrowingFirst { .. }
                | Self::FirstAttached { .. }
                | Self::AimingSecond { .. }
                | Self::ThrowingSecond { .. }
        )
    }

    /// No new throw may start until the current one resolves.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::ThrowingFirst { .. } | Self::AimingSecond { .. } | Self::ThrowingSecond { .. }
        )
    }

    pub fn first_anchor(&self) -> Option<&AnchorZone> {
        match self {
            Self::FirstAttached { first }
            | Self::AimingSecond { first }
            | Self::ThrowingSecond { first, .. } => Some(first),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringEvent {
    /// A charge began.
    Aim,
    /// A charge ended without a throw (cancel or short release).
    AimAbandoned,
    Released { flight: FlightId, zone: AnchorZone },
    Landed { flight: FlightId, zone: AnchorZone },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringEffect {
    Notice(Notice),
    /// Drop the temp segment drawn by this flight and refund its lights.
    DiscardSegment { flight: FlightId },
    Finalize { first: AnchorZone, second: AnchorZone },
    ClearVisuals,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Stage,
    pub effects: Vec<StringEffect>,
}

impl Transition {
    fn to(next: Stage) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    fn with(next: Stage, effects: Vec<StringEffect>) -> Self {
        Self { next, effects }
    }
}

/// The attachment transition function. Pairs not listed leave the stage as
/// it is and produce no effects.
pub fn transition(stage: &Stage, event: StringEvent) -> Transition {
    use StringEvent as E;

    match (stage, event) {
        (_, E::Reset) => Transition::with(Stage::Idle, vec![StringEffect::ClearVisuals]),

        (Stage::Idle, E::Aim) => Transition::to(Stage::AimingFirst),
        (Stage::FirstAttached { first }, E::Aim) => Transition::to(Stage::AimingSecond {
            first: first.clone(),
        }),

        (Stage::AimingFirst, E::AimAbandoned) => Transition::to(Stage::Idle),
        (Stage::AimingSecond { first }, E::AimAbandoned) => Transition::to(Stage::FirstAttached {
            first: first.clone(),
        }),

        (Stage::AimingFirst, E::Released { flight, .. }) => {
            Transition::to(Stage::ThrowingFirst { flight })
        }
        (Stage::AimingSecond { first }, E::Released { flight, zone }) => {
            Transition::to(Stage::ThrowingSecond {
                first: first.clone(),
                second: zone,
                flight,
            })
        }

        (Stage::ThrowingFirst { flight }, E::Landed { flight: landed, zone })
            if *flight == landed =>
        {
            Transition::with(
                Stage::FirstAttached { first: zone },
                vec![StringEffect::Notice(Notice::PickSecondAnchor)],
            )
        }
        (Stage::ThrowingSecond { first, flight, .. }, E::Landed { flight: landed, zone })
            if *flight == landed =>
        {
            let reject = if zone.id == first.id {
                Some(Notice::PickDifferentSpot)
            } else if zone.structure_id != first.structure_id {
                Some(Notice::SameStructure)
            } else {
                None
            };
            match reject {
                Some(notice) => Transition::with(
                    Stage::FirstAttached {
                        first: first.clone(),
                    },
                    vec![
                        StringEffect::DiscardSegment { flight: landed },
                        StringEffect::Notice(notice),
                    ],
                ),
                None => Transition::with(
                    Stage::Idle,
                    vec![
                        StringEffect::Finalize {
                            first: first.clone(),
                            second: zone,
                        },
                        StringEffect::ClearVisuals,
                        StringEffect::Notice(Notice::StringHung),
                    ],
                ),
            }
        }

        (stage, _) => Transition::to(stage.clone()),
    }
}

// ---------------------------------------------------------------------------
// Session data: pattern, coil, temp segments, preview
// ---------------------------------------------------------------------------

/// Lights left on the carried coil while a string is being hung.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoilPreview {
    pub total: usize,
    pub remaining: usize,
}

/// Line trailing behind a thrown string end.
#[derive(Debug, Clone, PartialEq)]
pub struct TempSegment {
    pub flight: FlightId,
    pub points: VecDeque<Vec3>,
    pub target: Vec3,
    pub bulbs_used: usize,
    pub wiggle: f32,
    pub completed: bool,
}

impl TempSegment {
    pub fn length(&self) -> f32 {
        self.points
            .iter()
            .zip(self.points.iter().skip(1))
            .map(|(a, b)| a.distance(*b))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewBulb {
    pub position: Vec3,
    pub color: Color,
}

/// Sagging line from the coil tip to the first anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringPreview {
    pub start: Vec3,
    pub mid: Vec3,
    pub anchor: Vec3,
    pub bulbs: Vec<PreviewBulb>,
}

/// A string that reached both anchors, ready to become a decoration.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedString {
    pub first: AnchorZone,
    pub second: AnchorZone,
    pub pattern: Vec<Color>,
}

/// What applying an event produced for the caller to act on.
#[derive(Debug, Default, PartialEq)]
pub struct Applied {
    pub notices: Vec<Notice>,
    pub finished: Option<FinishedString>,
}

#[derive(Debug, Default)]
pub struct AttachmentSession {
    stage: Stage,
    pattern: Vec<Color>,
    coil: CoilPreview,
    segments: Vec<TempSegment>,
}

impl AttachmentSession {
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn pattern(&self) -> &[Color] {
        &self.pattern
    }

    pub fn coil(&self) -> CoilPreview {
        self.coil
    }

    pub fn segments(&self) -> &[TempSegment] {
        &self.segments
    }

    /// Run `event` through [`transition`] and carry out the session-local
    /// effects. Notices and a finished string are handed back.
    pub fn apply(&mut self, event: StringEvent) -> Applied {
        let Transition { next, effects } = transition(&self.stage, event);
        if next.kind() != self.stage.kind() {
            tracing::debug!("attachment: {:?} -> {:?}", self.stage.kind(), next.kind());
        }
        self.stage = next;

        let mut applied = Applied::default();
        for effect in effects {
            match effect {
                StringEffect::Notice(notice) => applied.notices.push(notice),
                StringEffect::DiscardSegment { flight } => self.discard_segment(flight),
                StringEffect::Finalize { first, second } => {
                    let pattern = if self.pattern.is_empty() {
                        vec![Color::neutral()]
                    } else {
                        std::mem::take(&mut self.pattern)
                    };
                    applied.finished = Some(FinishedString {
                        first,
                        second,
                        pattern,
                    });
                }
                StringEffect::ClearVisuals => self.clear_visuals(),
            }
        }
        applied
    }

    /// Capture the strand's colors as the pattern of the string being hung
    /// and fill the coil preview.
    pub fn capture_pattern(&mut self, sockets: &[Option<Color>]) {
        self.pattern = sockets
            .iter()
            .map(|c| c.clone().unwrap_or_else(Color::neutral))
            .collect();
        self.coil = CoilPreview {
            total: self.pattern.len(),
            remaining: self.pattern.len(),
        };
    }

    pub fn start_segment(&mut self, flight: FlightId, origin: Vec3, target: Vec3, wiggle: f32) {
        self.segments.push(TempSegment {
            flight,
            points: VecDeque::from([origin]),
            target,
            bulbs_used: 0,
            wiggle,
            completed: false,
        });
    }

    /// Grow every active segment toward its flight and pay out coil lights
    /// for the distance covered.
    pub fn advance_segments(&mut self, flights: &FlightSim, spacing: f32) {
        for segment in &mut self.segments {
            if segment.completed {
                continue;
            }
            let flight = flights.get(segment.flight);
            let mut next = flight.map(Flight::position).unwrap_or(segment.target);
            let n = segment.points.len() as f32;
            next.x += (segment.wiggle + n * 0.35).sin() * 0.03;
            next.z += (segment.wiggle + n * 0.18).cos() * 0.02;
            segment.points.push_back(next);
            if segment.points.len() > TEMP_SEGMENT_MAX_POINTS {
                segment.points.pop_front();
            }

            let length = segment.length();
            while spacing > 0.0
                && self.coil.remaining > 0
                && length >= (segment.bulbs_used + 1) as f32 * spacing
            {
                segment.bulbs_used += 1;
                self.coil.remaining -= 1;
            }
            if flight.is_none_or(|f| f.progress() >= 0.99) {
                segment.completed = true;
            }
        }
    }

    fn discard_segment(&mut self, flight: FlightId) {
        if let Some(index) = self.segments.iter().position(|s| s.flight == flight) {
            let segment = self.segments.remove(index);
            self.coil.remaining = (self.coil.remaining + segment.bulbs_used).min(self.coil.total);
        }
    }

    fn clear_visuals(&mut self) {
        self.segments.clear();
        self.pattern.clear();
        self.coil.remaining = 0;
    }

    /// Live preview, shown only while waiting for the second anchor.
    pub fn preview(&self, coil_tip: Vec3) -> Option<StringPreview> {
        let Stage::FirstAttached { first } = &self.stage else {
            return None;
        };
        let start = coil_tip;
        let anchor = first.position;
        let mut mid = start.lerp(anchor, 0.45);
        mid.y = start.y.min(anchor.y) - 0.45;

        // Quadratic through `mid` at t = 0.5.
        let control = mid * 2.0 - (start + anchor) * 0.5;
        let curve = FlightPath::Quadratic {
            start,
            control,
            end: anchor,
        };
        let count = self.pattern.len().max(2);
        let bulbs = (0..count)
            .map(|i| PreviewBulb {
                position: curve.point(i as f32 / (count - 1) as f32),
                color: self
                    .pattern
                    .get(i % self.pattern.len().max(1))
                    .cloned()
                    .unwrap_or_else(Color::neutral),
            })
            .collect();
        Some(StringPreview {
            start,
            mid,
            anchor,
            bulbs,
        })
    }

    pub fn reset(&mut self) {
        self.apply(StringEvent::Reset);
    }
}
