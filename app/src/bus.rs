//! Bus abstraction layer. Wraps `tokio::sync::broadcast` so actors never
//! touch the broadcast types directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

use garland::{GarlandEvent, GarlandMessage};

/// Error from `BusReceiver::poll()`: the bus is closed or the actor's
/// shutdown flag is set.
#[derive(Debug)]
pub enum PollError {
    Shutdown,
}

// ---------------------------------------------------------------------------
// BusSender
// ---------------------------------------------------------------------------

/// Cloneable sender that stamps `source` on every outbound message.
pub struct BusSender {
    actor_id: String,
    inner: broadcast::Sender<GarlandMessage>,
    shutdown: Arc<AtomicBool>,
}

impl BusSender {
    pub fn new(
        actor_id: String,
        inner: broadcast::Sender<GarlandMessage>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            actor_id,
            inner,
            shutdown,
        }
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// The underlying broadcast sender, for the web layer.
    pub fn raw_sender(&self) -> &broadcast::Sender<GarlandMessage> {
        &self.inner
    }

    /// Send a message with this actor as its source. Having no subscribers
    /// is not an error.
    pub fn send(&self, mut msg: GarlandMessage) {
        msg.source = self.actor_id.clone();
        let _ = self.inner.send(msg);
    }

    /// Wrap an event in a fresh message and send it.
    pub fn emit(&self, event: impl Into<GarlandEvent>) {
        self.send(GarlandMessage::new(event));
    }

    /// New receiver on this bus sharing this sender's shutdown flag.
    pub fn subscribe(&self) -> BusReceiver {
        BusReceiver {
            inner: self.inner.subscribe(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl Clone for BusSender {
    fn clone(&self) -> Self {
        Self {
            actor_id: self.actor_id.clone(),
            inner: self.inner.clone(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

// ---------------------------------------------------------------------------
// BusReceiver
// ---------------------------------------------------------------------------

pub struct BusReceiver {
    inner: broadcast::Receiver<GarlandMessage>,
    shutdown: Arc<AtomicBool>,
}

impl BusReceiver {
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Non-blocking drain: the next message, `Ok(None)` when empty, or
    /// `Err(PollError::Shutdown)` once the bus is closed or the flag is set.
    pub fn poll(&mut self) -> Result<Option<GarlandMessage>, PollError> {
        if self.is_shutdown() {
            return Err(PollError::Shutdown);
        }
        loop {
            match self.inner.try_recv() {
                Ok(msg) => return Ok(Some(msg)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(PollError::Shutdown),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("bus: lagged, dropped {n} events");
                    continue;
                }
            }
        }
    }

    /// Drain everything currently queued. A shutdown seen mid-drain wins
    /// over the messages already taken.
    pub fn drain(&mut self) -> Result<Vec<GarlandMessage>, PollError> {
        let mut out = Vec::new();
        while let Some(msg) = self.poll()? {
            out.push(msg);
        }
        Ok(out)
    }
}
