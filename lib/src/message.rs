//! Unified `GarlandMessage` bus types.
//!
//! All events flow through a single `broadcast<GarlandMessage>` channel.
//! Each message has a source (global ID of the originator), timestamp and a
//! typed event. Producers create messages; consumers subscribe and filter.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sim::{Chime, Notice};
use crate::{ActorState, Color, Decoration, DecorationType, HudFrame, Point3, SessionSnapshot};

// ---------------------------------------------------------------------------
// Top-level message
// ---------------------------------------------------------------------------

/// A single event on the unified bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarlandMessage {
    #[serde(default)]
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub event: GarlandEvent,
}

impl GarlandMessage {
    /// Create a new message with the current UTC timestamp. Use `.source()`
    /// to attach the originator.
    pub fn new(event: impl Into<GarlandEvent>) -> Self {
        Self {
            source: String::new(),
            timestamp: Utc::now(),
            event: event.into(),
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

// ---------------------------------------------------------------------------
// From impls: inner event types -> GarlandEvent
// ---------------------------------------------------------------------------

impl From<PlayerCommand> for GarlandEvent {
    fn from(command: PlayerCommand) -> Self {
        GarlandEvent::PlayerCommand(command)
    }
}

impl From<HudFrame> for GarlandEvent {
    fn from(frame: HudFrame) -> Self {
        GarlandEvent::Frame(Box::new(frame))
    }
}

impl From<Notice> for GarlandEvent {
    fn from(notice: Notice) -> Self {
        GarlandEvent::Notice(NoticeMessage::from(notice))
    }
}

impl From<Chime> for GarlandEvent {
    fn from(chime: Chime) -> Self {
        GarlandEvent::Chime(ChimeCue {
            chime,
            pitches: chime.pitches(),
        })
    }
}

impl From<VisualCue> for GarlandEvent {
    fn from(cue: VisualCue) -> Self {
        GarlandEvent::Cue(cue)
    }
}

impl From<SessionEvent> for GarlandEvent {
    fn from(event: SessionEvent) -> Self {
        GarlandEvent::Session(event)
    }
}

impl From<ActorState> for GarlandEvent {
    fn from(state: ActorState) -> Self {
        GarlandEvent::ActorStatus(state)
    }
}

impl From<AlertMessage> for GarlandEvent {
    fn from(alert: AlertMessage) -> Self {
        GarlandEvent::Alert(alert)
    }
}

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// The typed event payload carried by a `GarlandMessage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GarlandEvent {
    /// Player input (from a WS client or the mock player).
    PlayerCommand(PlayerCommand),
    /// Throttled presentation snapshot from the game actor.
    Frame(Box<HudFrame>),
    /// User-facing toast.
    Notice(NoticeMessage),
    /// Short audio cue.
    Chime(ChimeCue),
    /// Particle or glow cue for the scene.
    Cue(VisualCue),
    /// Shared-session traffic (outbound placements, inbound snapshots).
    Session(SessionEvent),
    /// Generic actor status update.
    ActorStatus(ActorState),
    /// Alert for user-visible warn/error conditions.
    Alert(AlertMessage),
}

impl GarlandEvent {
    /// Frames are high-rate; audit logging skips them.
    pub fn is_frame(&self) -> bool {
        matches!(self, GarlandEvent::Frame(_))
    }
}

// ---------------------------------------------------------------------------
// PlayerCommand: input for the game actor
// ---------------------------------------------------------------------------

/// Input for the local player's game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerCommand {
    /// Avatar pose from the movement controller.
    Move {
        position: Point3,
        #[serde(default)]
        heading: f32,
        #[serde(default)]
        moving: bool,
    },
    /// Press on an anchor zone (or on nothing when `zone_id` is absent).
    BeginThrow {
        #[serde(default)]
        zone_id: Option<String>,
    },
    ReleaseThrow,
    CancelThrow,
    DropBulb,
    /// Place a single-point decoration.
    PlaceDecoration {
        point: Point3,
        #[serde(default)]
        normal: Option<Point3>,
        #[serde(default)]
        type_id: Option<DecorationType>,
        #[serde(default)]
        color: Option<Color>,
        #[serde(default)]
        cabin_id: Option<String>,
    },
    /// Change the UI decoration selection.
    SelectDecor {
        type_id: DecorationType,
        #[serde(default)]
        color: Option<Color>,
    },
    NewGame,
}

// ---------------------------------------------------------------------------
// Presentation cues
// ---------------------------------------------------------------------------

/// A notice with its display text resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeMessage {
    pub notice: Notice,
    pub text: String,
}

impl From<Notice> for NoticeMessage {
    fn from(notice: Notice) -> Self {
        let text = notice.to_string();
        Self { notice, text }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChimeCue {
    pub chime: Chime,
    /// Two-note pitch pair in Hz.
    pub pitches: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisualCue {
    Spark { position: Point3, color: Color },
    StructureGlow { structure_id: String },
}

// ---------------------------------------------------------------------------
// SessionEvent: shared decoration state
// ---------------------------------------------------------------------------

/// Messages exchanged with the shared session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A locally finalized decoration, sent to the session.
    PlaceDecoration { decoration: Decoration },
    /// Full-state redelivery from the session.
    SessionState { snapshot: SessionSnapshot },
}

// ---------------------------------------------------------------------------
// AlertMessage: user-visible warn/error notifications
// ---------------------------------------------------------------------------

/// Severity level for alert messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warn,
    Error,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Warn => write!(f, "warn"),
            AlertLevel::Error => write!(f, "error"),
        }
    }
}

/// A user-visible alert. Info/debug/trace stays in the tracing backend;
/// warn/error conditions surface here for connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertMessage {
    pub level: AlertLevel,
    pub message: String,
}
