//! Application lifecycle notifications.
//!
//! One process-wide bus carries app state transitions. Screens hold a
//! [`Subscription`] for as long as they are mounted; dropping it releases
//! the listener.

use std::sync::Mutex;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

pub struct LifecycleBus {
    tx: broadcast::Sender<AppState>,
    current: Mutex<AppState>,
}

impl LifecycleBus {
    pub fn new(initial: AppState) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        LifecycleBus {
            tx,
            current: Mutex::new(initial),
        }
    }

    pub fn current(&self) -> AppState {
        self.current
            .lock()
            .map(|state| *state)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    /// Record a new app state. Only actual changes are delivered.
    pub fn publish(&self, state: AppState) {
        {
            let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if *current == state {
                return;
            }
            *current = state;
        }

        debug!(?state, listeners = self.tx.receiver_count(), "app state changed");
        // no listeners is fine
        let _ = self.tx.send(state);
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription { rx: self.tx.subscribe() }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LifecycleBus {
    fn default() -> Self {
        Self::new(AppState::Active)
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<AppState>,
}

impl Subscription {
    /// Next queued transition, without waiting.
    pub fn try_next(&mut self) -> Option<AppState> {
        loop {
            match self.rx.try_recv() {
                Ok(state) => return Some(state),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "lifecycle listener fell behind");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next transition. `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<AppState> {
        loop {
            match self.rx.recv().await {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "lifecycle listener fell behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
