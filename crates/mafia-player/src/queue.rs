//! Per-player notification queue.
//!
//! A bounded `mpsc` channel. The engine side pushes with `try_send` so a
//! slow or absent reader can never stall delivery to other players; the
//! transport side takes the receiving half exactly once.

use std::sync::{Mutex, MutexGuard, PoisonError};

use mafia_protocol::{Notification, PlayerId};
use tokio::sync::mpsc;

use crate::PlayerError;

/// The sending side of a player's notifications, plus the not-yet-claimed
/// receiving side.
pub struct NotificationQueue {
    owner: PlayerId,
    tx: Mutex<Option<mpsc::Sender<Notification>>>,
    rx: Mutex<Option<mpsc::Receiver<Notification>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NotificationQueue {
    /// Creates a queue holding at most `capacity` undelivered events.
    pub fn new(owner: PlayerId, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            owner,
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Enqueues one event without waiting.
    ///
    /// # Errors
    /// - [`PlayerError::QueueFull`] if the reader has fallen behind
    /// - [`PlayerError::ChannelClosed`] if the queue was closed
    pub fn push(&self, event: Notification) -> Result<(), PlayerError> {
        let tx = lock(&self.tx);
        let Some(tx) = tx.as_ref() else {
            return Err(PlayerError::ChannelClosed(self.owner));
        };
        tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PlayerError::QueueFull(self.owner),
            mpsc::error::TrySendError::Closed(_) => PlayerError::ChannelClosed(self.owner),
        })
    }

    /// Hands out the receiving side. Succeeds once per player.
    ///
    /// # Errors
    /// Returns [`PlayerError::ChannelClosed`] if the stream was already
    /// taken.
    pub fn subscribe(&self) -> Result<NotificationStream, PlayerError> {
        lock(&self.rx)
            .take()
            .map(|rx| NotificationStream { rx })
            .ok_or(PlayerError::ChannelClosed(self.owner))
    }

    /// Drops the sending side. A subscriber still receives everything
    /// queued before this call, then sees the end of the stream.
    pub fn close(&self) {
        lock(&self.tx).take();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.tx).is_none()
    }
}

/// The receiving side of a player's notifications.
#[derive(Debug)]
pub struct NotificationStream {
    rx: mpsc::Receiver<Notification>,
}

impl NotificationStream {
    /// The next event, or `None` once the queue is closed and drained.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// The next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }
}
