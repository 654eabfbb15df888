//! Loopback session actor: an in-process stand-in for the shared room.
//!
//! Keeps the authoritative decoration list. Every `PlaceDecoration` from any
//! bus participant is stored by id, and the full state is redelivered as a
//! `SessionState` snapshot right after the change and again on the resync
//! interval.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::actors::Actor;
use crate::bus::{BusReceiver, BusSender, PollError};
use crate::state::SystemState;
use garland::sim::tuning::MAX_CONFIGURED_INTERVAL;
use garland::{
    ActorState, ActorStatus, Decoration, GarlandEvent, SessionEvent, SessionSection,
    SessionSnapshot,
};

const DEFAULT_RESYNC: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct SessionActor {
    pub resync_interval: Duration,
}

impl SessionActor {
    pub fn from_section(section: &SessionSection) -> Self {
        Self {
            resync_interval: section
                .resync_interval
                .map(|i| i.as_duration().min(MAX_CONFIGURED_INTERVAL))
                .filter(|d| !d.is_zero())
                .unwrap_or(DEFAULT_RESYNC),
        }
    }
}

impl Actor for SessionActor {
    fn start(&self, _state: Arc<SystemState>, sender: BusSender, receiver: BusReceiver) {
        let resync = self.resync_interval;
        let thread_name = format!("session:{}", sender.actor_id());

        std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || run(resync, sender, receiver))
            .expect("failed to spawn session thread");
    }
}

/// Authoritative decoration state, in first-placement order.
#[derive(Debug, Default)]
pub struct Room {
    decorations: IndexMap<String, Decoration>,
}

impl Room {
    /// Insert or replace by id. Returns whether the stored state changed.
    pub fn place(&mut self, decoration: Decoration) -> bool {
        match self.decorations.get(&decoration.id) {
            Some(existing) if *existing == decoration => false,
            _ => {
                self.decorations.insert(decoration.id.clone(), decoration);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            decorations: self.decorations.values().cloned().collect(),
        }
    }
}

fn telemetry(room: &Room, resyncs: u64) -> HashMap<String, String> {
    HashMap::from([
        ("decorations".into(), room.len().to_string()),
        ("resyncs".into(), resyncs.to_string()),
    ])
}

fn run(resync: Duration, sender: BusSender, mut receiver: BusReceiver) {
    let mut room = Room::default();
    let mut resyncs: u64 = 0;
    let mut last_sync = Instant::now();

    sender.emit(ActorState::new(
        ActorStatus::Connected,
        telemetry(&room, resyncs),
    ));
    info!("session: loopback room open, resync every {resync:?}");

    loop {
        let mut changed = false;
        loop {
            match receiver.poll() {
                Err(PollError::Shutdown) => {
                    info!("session: closing with {} decorations", room.len());
                    return;
                }
                Ok(None) => break,
                Ok(Some(msg)) => {
                    if let GarlandEvent::Session(SessionEvent::PlaceDecoration { decoration }) =
                        msg.event
                    {
                        debug!("session: {} placed {}", msg.source, decoration.id);
                        changed |= room.place(decoration);
                    }
                }
            }
        }

        if changed || last_sync.elapsed() >= resync {
            sender.emit(SessionEvent::SessionState {
                snapshot: room.snapshot(),
            });
            resyncs += 1;
            last_sync = Instant::now();
            if changed {
                sender.emit(ActorState::new(
                    ActorStatus::Connected,
                    telemetry(&room, resyncs),
                ));
            }
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}
