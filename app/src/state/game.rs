//! Game state store: the latest presentation frame and decoration list
//! published by the game actor.
//!
//! Schema types come from the `garland` lib. The store itself stays here
//! (it uses `RwLock` and is not part of the wire schema).

use std::sync::{Arc, RwLock};

use garland::HudFrame;
use garland::sim::{StageKind, SyncedDecoration};

struct GameStateInner {
    frame: RwLock<Option<HudFrame>>,
    decorations: RwLock<Vec<SyncedDecoration>>,
}

/// Read-only view of the running game. Lives on `SystemState.game` and is
/// accessible to all actors and the web layer.
pub struct GameState {
    inner: Arc<GameStateInner>,
}

/// Write handle for the game store.
///
/// Only the game actor holds this, so the store always reflects the one
/// `Game` that owns the simulation.
pub struct GameStateWriter {
    inner: Arc<GameStateInner>,
}

impl GameState {
    /// Create a new `GameState` and its companion `GameStateWriter`.
    pub fn new() -> (Self, GameStateWriter) {
        let inner = Arc::new(GameStateInner {
            frame: RwLock::new(None),
            decorations: RwLock::new(Vec::new()),
        });
        (
            Self {
                inner: Arc::clone(&inner),
            },
            GameStateWriter { inner },
        )
    }

    /// Latest frame, or `None` before the first tick.
    pub fn frame(&self) -> Option<HudFrame> {
        self.inner
            .frame
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn stage(&self) -> Option<StageKind> {
        self.inner
            .frame
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|f| f.stage)
    }

    /// Local decorations in placement order, with their sync state.
    pub fn decorations(&self) -> Vec<SyncedDecoration> {
        self.inner
            .decorations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl GameStateWriter {
    pub fn set_frame(&self, frame: HudFrame) {
        *self.inner.frame.write().unwrap_or_else(|e| e.into_inner()) = Some(frame);
    }

    pub fn set_decorations(&self, decorations: Vec<SyncedDecoration>) {
        *self
            .inner
            .decorations
            .write()
            .unwrap_or_else(|e| e.into_inner()) = decorations;
    }
}
