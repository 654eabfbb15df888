//! Local decoration store kept in step with the shared session.

use std::collections::HashSet;

use glam::Vec3;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::effect::{Chime, Effect, Notice, Outbox};
use crate::{Color, DecorTransform, Decoration, DecorationType, Point3};

pub const DEFAULT_CABIN: &str = "storybook-home";
pub const DEFAULT_GLOW: f32 = 0.65;
pub const STRING_GLOW: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Applied locally, not yet seen in a session snapshot.
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedDecoration {
    pub decoration: Decoration,
    pub state: SyncState,
}

/// Current decoration type and color picked in the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct DecorSelection {
    pub type_id: DecorationType,
    pub color: Color,
}

impl DecorSelection {
    pub fn new(type_id: DecorationType) -> Self {
        Self {
            type_id,
            color: type_id.swatch(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaceOptions {
    pub id: Option<String>,
    pub type_id: Option<DecorationType>,
    pub color: Option<Color>,
    pub colors: Option<Vec<Color>>,
    pub anchor_points: Option<Vec<Point3>>,
    pub cabin_id: Option<String>,
    pub glow: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub upserted: usize,
    pub removed: usize,
    pub pending: usize,
}

#[derive(Debug)]
pub struct DecorationSync {
    entries: IndexMap<String, SyncedDecoration>,
    selection: DecorSelection,
}

impl DecorationSync {
    pub fn new(selection: DecorSelection) -> Self {
        Self {
            entries: IndexMap::new(),
            selection,
        }
    }

    pub fn selection(&self) -> &DecorSelection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: DecorSelection) {
        self.selection = selection;
    }

    /// Build a decoration, apply it locally as pending and queue the
    /// broadcast plus feedback cues.
    pub fn finalize(
        &mut self,
        point: Vec3,
        normal: Option<Vec3>,
        options: PlaceOptions,
        outbox: &mut Outbox,
    ) -> Decoration {
        let type_id = options.type_id.unwrap_or(self.selection.type_id);
        let color = options
            .color
            .or_else(|| type_id.default_color())
            .unwrap_or_else(|| self.selection.color.clone());
        let cabin_id = options.cabin_id.unwrap_or_else(|| DEFAULT_CABIN.to_string());
        let normal = normal.unwrap_or(Vec3::Y);
        let position = if type_id == DecorationType::StringLights {
            Point3::default()
        } else {
            Point3::from(point)
        };
        let heading = normal.x.atan2(normal.z);
        let decoration = Decoration {
            id: options.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            type_id,
            color,
            glow: options.glow.unwrap_or(DEFAULT_GLOW),
            cabin_id: cabin_id.clone(),
            transform: DecorTransform {
                position,
                rotation: Point3 {
                    x: 0.0,
                    y: if heading.is_finite() { heading } else { 0.0 },
                    z: 0.0,
                },
                scale: 1.0,
            },
            colors: options.colors,
            anchor_points: options.anchor_points,
        };

        tracing::debug!("sync: placed {} {} on {cabin_id}", decoration.type_id, decoration.id);
        self.entries.insert(
            decoration.id.clone(),
            SyncedDecoration {
                decoration: decoration.clone(),
                state: SyncState::Pending,
            },
        );
        self.selection.type_id = type_id;

        outbox.push(Effect::Broadcast(decoration.clone()));
        outbox.notice(Notice::Placed(type_id));
        outbox.chime(Chime::Placement);
        outbox.push(Effect::StructureGlow {
            structure_id: cabin_id,
        });
        decoration
    }

    /// Merge a full session snapshot. Safe to call repeatedly with the same
    /// snapshot.
    pub fn reconcile(&mut self, snapshot: &[Decoration]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for decoration in snapshot {
            let entry = SyncedDecoration {
                decoration: decoration.clone(),
                state: SyncState::Confirmed,
            };
            if self.entries.get(&decoration.id) != Some(&entry) {
                report.upserted += 1;
            }
            self.entries.insert(decoration.id.clone(), entry);
        }

        let present: HashSet<&str> = snapshot.iter().map(|d| d.id.as_str()).collect();
        let before = self.entries.len();
        self.entries
            .retain(|id, e| e.state == SyncState::Pending || present.contains(id.as_str()));
        report.removed = before - self.entries.len();
        report.pending = self
            .entries
            .values()
            .filter(|e| e.state == SyncState::Pending)
            .count();
        if report.upserted > 0 || report.removed > 0 {
            tracing::debug!(
                "sync: snapshot applied (+{} -{} pending {})",
                report.upserted,
                report.removed,
                report.pending
            );
        }
        report
    }

    pub fn get(&self, id: &str) -> Option<&SyncedDecoration> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncedDecoration> {
        self.entries.values()
    }

    pub fn decorations(&self) -> Vec<Decoration> {
        self.entries.values().map(|e| e.decoration.clone()).collect()
    }
}
